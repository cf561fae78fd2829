//! Field definitions for entities.

use super::types::FieldType;
use rkyv::{Archive, Deserialize, Serialize};
use serde::{Deserialize as SerdeDeserialize, Serialize as SerdeSerialize};

/// A mapped field within an entity.
#[derive(
    Debug, Clone, PartialEq, Eq, Archive, Serialize, Deserialize, SerdeSerialize, SerdeDeserialize,
)]
pub struct FieldDef {
    /// Property name.
    pub name: String,
    /// Column name in the table.
    pub column: String,
    /// Column type.
    pub field_type: FieldType,
    /// Whether the column accepts null.
    pub nullable: bool,
}

impl FieldDef {
    /// Create a non-nullable field whose column has the same name.
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        let name = name.into();
        Self {
            column: name.clone(),
            name,
            field_type,
            nullable: false,
        }
    }

    /// Create a nullable field.
    pub fn optional(name: impl Into<String>, field_type: FieldType) -> Self {
        Self::new(name, field_type).with_nullable(true)
    }

    /// Set the column name.
    pub fn with_column(mut self, column: impl Into<String>) -> Self {
        self.column = column.into();
        self
    }

    /// Set whether the column is nullable.
    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }
}
