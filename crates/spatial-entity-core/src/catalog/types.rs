//! Core type definitions for the catalog.

use rkyv::{Archive, Deserialize, Serialize};
use serde::{Deserialize as SerdeDeserialize, Serialize as SerdeSerialize};

/// Built-in scalar column types.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Archive, Serialize, Deserialize, SerdeSerialize, SerdeDeserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ScalarType {
    /// Boolean value.
    Bool,
    /// 16-bit signed integer.
    Int16,
    /// 32-bit signed integer.
    Int32,
    /// 64-bit signed integer.
    Int64,
    /// 64-bit floating point.
    Float64,
    /// Fixed-precision decimal.
    Decimal,
    /// Bounded UTF-8 string.
    String,
    /// Unbounded UTF-8 text.
    Text,
    /// Binary data.
    Bytes,
    /// Calendar date.
    Date,
    /// Time of day.
    Time,
    /// Date and time.
    Timestamp,
    /// UUID (128-bit identifier).
    Uuid,
    /// Structured JSON document.
    Json,
}

/// Column type of a mapped field.
#[derive(
    Debug, Clone, PartialEq, Eq, Archive, Serialize, Deserialize, SerdeSerialize, SerdeDeserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    /// A built-in scalar.
    Scalar(ScalarType),
    /// A type registered through `dbal.types`.
    Custom {
        /// Registered type name.
        name: String,
    },
}

impl ScalarType {
    /// Mapping-file names of the built-in types, with the scalar each one maps to.
    pub const BUILTIN_NAMES: &'static [(&'static str, ScalarType)] = &[
        ("boolean", ScalarType::Bool),
        ("smallint", ScalarType::Int16),
        ("integer", ScalarType::Int32),
        ("bigint", ScalarType::Int64),
        ("float", ScalarType::Float64),
        ("decimal", ScalarType::Decimal),
        ("string", ScalarType::String),
        ("text", ScalarType::Text),
        ("binary", ScalarType::Bytes),
        ("blob", ScalarType::Bytes),
        ("date", ScalarType::Date),
        ("date_immutable", ScalarType::Date),
        ("time", ScalarType::Time),
        ("time_immutable", ScalarType::Time),
        ("datetime", ScalarType::Timestamp),
        ("datetime_immutable", ScalarType::Timestamp),
        ("datetimetz", ScalarType::Timestamp),
        ("guid", ScalarType::Uuid),
        ("json", ScalarType::Json),
    ];

    /// Look up a built-in type by its mapping-file name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::BUILTIN_NAMES
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, scalar)| *scalar)
    }
}

impl FieldType {
    /// Create a scalar field type.
    pub fn scalar(scalar: ScalarType) -> Self {
        FieldType::Scalar(scalar)
    }

    /// Create a custom field type.
    pub fn custom(name: impl Into<String>) -> Self {
        FieldType::Custom { name: name.into() }
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldType::Scalar(s) => write!(f, "{s:?}"),
            FieldType::Custom { name } => write!(f, "custom:{name}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_lookup() {
        assert_eq!(ScalarType::from_name("integer"), Some(ScalarType::Int32));
        assert_eq!(ScalarType::from_name("guid"), Some(ScalarType::Uuid));
        assert_eq!(ScalarType::from_name("blob"), Some(ScalarType::Bytes));
        assert_eq!(ScalarType::from_name("money"), None);
    }

    #[test]
    fn test_field_type_display() {
        assert_eq!(FieldType::scalar(ScalarType::Int64).to_string(), "Int64");
        assert_eq!(FieldType::custom("money").to_string(), "custom:money");
    }
}
