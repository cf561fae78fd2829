//! YAML mapping driver.
//!
//! ```yaml
//! Order:
//!   type: entity
//!   table: orders
//!   id:
//!     id: { type: integer }
//!   fields:
//!     total: { type: money, column: total_amount, nullable: true }
//!     note: ~
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_yaml::{Mapping, Value};

use super::{resolve_type, DriverKind, MetadataDriver};
use crate::catalog::{EntityDef, FieldDef};
use crate::error::{Error, Result};
use crate::types::TypeRegistry;

/// Reads `*.orm.yml` mapping files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YamlDriver {
    paths: Vec<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct YamlEntity {
    #[serde(rename = "type")]
    kind: Option<String>,
    table: Option<String>,
    #[serde(default)]
    id: Mapping,
    #[serde(default)]
    fields: Mapping,
}

#[derive(Debug, Default, Deserialize)]
struct YamlField {
    #[serde(rename = "type")]
    field_type: Option<String>,
    column: Option<String>,
    #[serde(default)]
    nullable: bool,
}

impl YamlDriver {
    /// Create a driver over `paths`.
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self { paths }
    }
}

fn key_name(key: &Value, file: &Path) -> Result<String> {
    key.as_str()
        .map(str::to_string)
        .ok_or_else(|| Error::mapping(file, format!("expected a string key, found {key:?}")))
}

fn fields(
    mapping: Mapping,
    file: &Path,
    types: &TypeRegistry,
) -> Result<Vec<FieldDef>> {
    mapping
        .into_iter()
        .map(|(key, value)| {
            let name = key_name(&key, file)?;
            let yaml: YamlField = if value.is_null() {
                YamlField::default()
            } else {
                serde_yaml::from_value(value)
                    .map_err(|e| Error::mapping(file, format!("field '{name}': {e}")))?
            };
            let field_type = resolve_type(yaml.field_type.as_deref(), file, types)?;
            let mut field = FieldDef::new(name, field_type).with_nullable(yaml.nullable);
            if let Some(column) = yaml.column {
                field = field.with_column(column);
            }
            Ok(field)
        })
        .collect()
}

impl MetadataDriver for YamlDriver {
    fn kind(&self) -> DriverKind {
        DriverKind::Yaml
    }

    fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    fn file_suffix(&self) -> &'static str {
        ".orm.yml"
    }

    fn parse(&self, source: &str, file: &Path, types: &TypeRegistry) -> Result<Vec<EntityDef>> {
        if source.trim().is_empty() {
            return Ok(Vec::new());
        }
        let document: Mapping =
            serde_yaml::from_str(source).map_err(|e| Error::mapping(file, e.to_string()))?;

        let mut entities = Vec::new();
        for (key, value) in document {
            let name = key_name(&key, file)?;
            let yaml: YamlEntity = serde_yaml::from_value(value)
                .map_err(|e| Error::mapping(file, format!("entity '{name}': {e}")))?;

            match yaml.kind.as_deref() {
                None | Some("entity") => {}
                Some(other) => {
                    tracing::debug!(entity = %name, kind = other, "skipping non-entity mapping");
                    continue;
                }
            }

            let mut entity = EntityDef::new(name).with_source(file.display().to_string());
            if let Some(table) = yaml.table {
                entity = entity.with_table(table);
            }
            for id in fields(yaml.id, file, types)? {
                entity.add_field(id, true)?;
            }
            for field in fields(yaml.fields, file, types)? {
                entity.add_field(field, false)?;
            }
            entities.push(entity);
        }
        Ok(entities)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{FieldType, ScalarType};

    const ORDER_YAML: &str = r#"
Order:
  type: entity
  table: orders
  id:
    id: { type: integer }
  fields:
    total: { type: money, column: total_amount, nullable: true }
    note: ~
    placedAt:
      type: datetime
Address:
  type: embeddable
  fields:
    street: ~
"#;

    #[test]
    fn test_parse_order_keeps_declaration_order() {
        let types = TypeRegistry::new();
        types.register("money", "app::types::Money").unwrap();
        let driver = YamlDriver::new(vec![PathBuf::from("Sales")]);

        let entities = driver
            .parse(ORDER_YAML, Path::new("Sales/Order.orm.yml"), &types)
            .unwrap();
        assert_eq!(entities.len(), 1);

        let order = &entities[0];
        assert_eq!(order.table, "orders");
        let names: Vec<_> = order.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["id", "total", "note", "placedAt"]);
        assert_eq!(order.get_field("total").unwrap().column, "total_amount");
        assert_eq!(
            order.get_field("note").unwrap().field_type,
            FieldType::scalar(ScalarType::String)
        );
    }

    #[test]
    fn test_empty_file() {
        let types = TypeRegistry::new();
        let driver = YamlDriver::new(vec![]);
        assert!(driver
            .parse("\n", Path::new("Empty.orm.yml"), &types)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_invalid_field_shape() {
        let types = TypeRegistry::new();
        let driver = YamlDriver::new(vec![]);
        let err = driver
            .parse(
                "Order:\n  fields:\n    total: [1, 2]\n",
                Path::new("Order.orm.yml"),
                &types,
            )
            .unwrap_err();
        assert!(err.to_string().contains("field 'total'"));
    }

    #[test]
    fn test_field_mapped_as_id_and_field() {
        let types = TypeRegistry::new();
        let driver = YamlDriver::new(vec![]);
        let source = "Order:\n  id:\n    id: { type: integer }\n  fields:\n    id: ~\n";
        let err = driver
            .parse(source, Path::new("Sales/Order.orm.yml"), &types)
            .unwrap_err();
        match err {
            Error::Mapping { file, message } => {
                assert_eq!(file, PathBuf::from("Sales/Order.orm.yml"));
                assert_eq!(message, "field 'id' mapped twice");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
