//! Entity definitions.

use super::field::FieldDef;
use crate::error::Error;
use rkyv::{Archive, Deserialize, Serialize};
use serde::{Deserialize as SerdeDeserialize, Serialize as SerdeSerialize};

/// Mapping metadata for one entity.
#[derive(
    Debug, Clone, PartialEq, Eq, Archive, Serialize, Deserialize, SerdeSerialize, SerdeDeserialize,
)]
pub struct EntityDef {
    /// Entity name (unique within a bundle).
    pub name: String,
    /// Table name.
    pub table: String,
    /// Names of the identity fields, in declaration order.
    pub identity: Vec<String>,
    /// Field definitions, identity fields included.
    pub fields: Vec<FieldDef>,
    /// Mapping file the entity was read from.
    pub source: String,
}

impl EntityDef {
    /// Create an entity whose table name is derived from the entity name.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            table: default_table_name(&name),
            name,
            identity: Vec::new(),
            fields: Vec::new(),
            source: String::new(),
        }
    }

    /// Set the table name.
    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    /// Record the mapping file.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    /// Add a mapped field, as part of the identity when `identity` is set.
    ///
    /// A field name can be mapped once, as an identity field or as a plain one.
    pub fn add_field(&mut self, field: FieldDef, identity: bool) -> Result<(), Error> {
        if self.get_field(&field.name).is_some() {
            return Err(Error::mapping(
                &self.source,
                format!("field '{}' mapped twice", field.name),
            ));
        }
        if identity {
            self.identity.push(field.name.clone());
        }
        self.fields.push(field);
        Ok(())
    }

    /// Get a field by name.
    pub fn get_field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Check if the named field is part of the identity.
    pub fn is_identity(&self, name: &str) -> bool {
        self.identity.iter().any(|id| id == name)
    }

}

/// Table name used when a mapping does not name one: the unqualified entity name.
fn default_table_name(entity: &str) -> String {
    entity
        .rsplit(['\\', ':', '.'])
        .next()
        .unwrap_or(entity)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{FieldType, ScalarType};

    #[test]
    fn test_default_table_name() {
        assert_eq!(EntityDef::new("Order").table, "Order");
        assert_eq!(EntityDef::new("Sales\\Order").table, "Order");
        assert_eq!(EntityDef::new("sales::Order").table, "Order");
    }

    #[test]
    fn test_add_field() {
        let mut entity = EntityDef::new("Order");
        entity
            .add_field(FieldDef::new("id", FieldType::scalar(ScalarType::Int32)), true)
            .unwrap();
        entity
            .add_field(FieldDef::optional("note", FieldType::scalar(ScalarType::Text)), false)
            .unwrap();

        assert!(entity.is_identity("id"));
        assert!(!entity.is_identity("note"));
        assert_eq!(entity.identity, vec!["id"]);
        assert!(entity.get_field("note").unwrap().nullable);
    }

    #[test]
    fn test_add_field_twice() {
        let mut entity = EntityDef::new("Order").with_source("Sales/Order.orm.xml");
        entity
            .add_field(FieldDef::new("id", FieldType::scalar(ScalarType::Int32)), true)
            .unwrap();

        let err = entity
            .add_field(FieldDef::new("id", FieldType::scalar(ScalarType::String)), false)
            .unwrap_err();
        match err {
            Error::Mapping { file, message } => {
                assert_eq!(file, std::path::PathBuf::from("Sales/Order.orm.xml"));
                assert_eq!(message, "field 'id' mapped twice");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(entity.fields.len(), 1);
        assert_eq!(entity.identity, vec!["id"]);
    }
}
