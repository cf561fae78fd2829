//! PHP mapping script driver.
//!
//! Each `*.php` file maps one entity, named after the file stem with `.`
//! read as a path separator (`Sales.Order.php` maps `Sales::Order`). Only the
//! `setPrimaryTable` and `mapField` statements are read:
//!
//! ```php
//! <?php
//! $metadata->setPrimaryTable(['name' => 'orders']);
//! $metadata->mapField(['id' => true, 'fieldName' => 'id', 'type' => 'integer']);
//! $metadata->mapField([
//!     'fieldName' => 'total',
//!     'type' => 'money',
//!     'columnName' => 'total_amount',
//!     'nullable' => true,
//! ]);
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use super::{parse_bool, resolve_type, DriverKind, MetadataDriver};
use crate::catalog::{EntityDef, FieldDef};
use crate::error::{Error, Result};
use crate::types::TypeRegistry;

static CALL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)\$metadata\s*->\s*(\w+)\s*\(\s*(?:\[(.*?)\]|array\s*\((.*?)\))\s*\)\s*;")
        .expect("call pattern compiles")
});

static ENTRY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"['"](\w+)['"]\s*=>\s*(?:'((?:[^'\\]|\\.)*)'|"((?:[^"\\]|\\.)*)"|([\w.\\-]+))"#)
        .expect("entry pattern compiles")
});

/// Reads `$metadata->...` statements from `*.php` mapping scripts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhpDriver {
    paths: Vec<PathBuf>,
}

impl PhpDriver {
    /// Create a driver over `paths`.
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self { paths }
    }
}

fn entries(array: &str) -> BTreeMap<String, String> {
    ENTRY_RE
        .captures_iter(array)
        .filter_map(|caps| {
            let key = caps.get(1)?.as_str().to_string();
            let value = caps
                .get(2)
                .or_else(|| caps.get(3))
                .or_else(|| caps.get(4))?
                .as_str()
                .to_string();
            Some((key, value))
        })
        .collect()
}

fn entity_name(file: &Path) -> Result<String> {
    let stem = file
        .file_name()
        .and_then(|n| n.to_str())
        .and_then(|n| n.strip_suffix(".php"))
        .filter(|s| !s.is_empty())
        .ok_or_else(|| Error::mapping(file, "cannot derive entity name from file name"))?;
    Ok(stem.replace('.', "::"))
}

impl MetadataDriver for PhpDriver {
    fn kind(&self) -> DriverKind {
        DriverKind::Php
    }

    fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    fn file_suffix(&self) -> &'static str {
        ".php"
    }

    fn parse(&self, source: &str, file: &Path, types: &TypeRegistry) -> Result<Vec<EntityDef>> {
        let name = entity_name(file)?;
        let mut entity: Option<EntityDef> = None;

        for caps in CALL_RE.captures_iter(source) {
            let method = &caps[1];
            let array = caps
                .get(2)
                .or_else(|| caps.get(3))
                .map(|m| m.as_str())
                .unwrap_or_default();
            let args = entries(array);

            let current = entity.get_or_insert_with(|| {
                EntityDef::new(name.clone()).with_source(file.display().to_string())
            });

            match method {
                "setPrimaryTable" => {
                    if let Some(table) = args.get("name") {
                        current.table = table.clone();
                    }
                }
                "mapField" => {
                    let name = args.get("fieldName").ok_or_else(|| {
                        Error::mapping(file, "mapField without 'fieldName'")
                    })?;
                    let field_type =
                        resolve_type(args.get("type").map(String::as_str), file, types)?;
                    let nullable = match args.get("nullable") {
                        Some(value) => parse_bool(value, file)?,
                        None => false,
                    };
                    let mut field = FieldDef::new(name.clone(), field_type).with_nullable(nullable);
                    if let Some(column) = args.get("columnName") {
                        field = field.with_column(column.clone());
                    }
                    let is_id = match args.get("id") {
                        Some(value) => parse_bool(value, file)?,
                        None => false,
                    };
                    current.add_field(field, is_id)?;
                }
                other => {
                    tracing::trace!(method = other, file = %file.display(), "ignoring metadata call");
                }
            }
        }

        Ok(entity.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{FieldType, ScalarType};

    const ORDER_PHP: &str = r#"<?php

use Doctrine\ORM\Mapping\ClassMetadataInfo;

$metadata->setInheritanceType(ClassMetadataInfo::INHERITANCE_TYPE_NONE);
$metadata->setPrimaryTable(['name' => 'orders']);
$metadata->mapField(['id' => true, 'fieldName' => 'id', 'type' => 'integer']);
$metadata->mapField([
    'fieldName' => 'total',
    'type' => 'money',
    'columnName' => 'total_amount',
    'nullable' => true,
]);
$metadata->mapField(array('fieldName' => 'note', "type" => 'text'));
"#;

    #[test]
    fn test_parse_order() {
        let types = TypeRegistry::new();
        types.register("money", "app::types::Money").unwrap();
        let driver = PhpDriver::new(vec![PathBuf::from("Sales")]);

        let entities = driver
            .parse(ORDER_PHP, Path::new("Sales/Sales.Order.php"), &types)
            .unwrap();
        assert_eq!(entities.len(), 1);

        let order = &entities[0];
        assert_eq!(order.name, "Sales::Order");
        assert_eq!(order.table, "orders");
        assert_eq!(order.identity, vec!["id"]);
        assert_eq!(order.get_field("total").unwrap().column, "total_amount");
        assert!(order.get_field("total").unwrap().nullable);
        assert_eq!(
            order.get_field("note").unwrap().field_type,
            FieldType::scalar(ScalarType::Text)
        );
    }

    #[test]
    fn test_script_without_metadata_calls() {
        let types = TypeRegistry::new();
        let driver = PhpDriver::new(vec![]);
        let entities = driver
            .parse("<?php\n// nothing mapped\n", Path::new("Empty.php"), &types)
            .unwrap();
        assert!(entities.is_empty());
    }

    #[test]
    fn test_map_field_requires_name() {
        let types = TypeRegistry::new();
        let driver = PhpDriver::new(vec![]);
        let err = driver
            .parse(
                "<?php $metadata->mapField(['type' => 'integer']);",
                Path::new("Order.php"),
                &types,
            )
            .unwrap_err();
        assert!(err.to_string().contains("fieldName"));
    }

    #[test]
    fn test_field_mapped_twice() {
        let types = TypeRegistry::new();
        let driver = PhpDriver::new(vec![]);
        let source = "<?php\n$metadata->mapField(['id' => true, 'fieldName' => 'id']);\n$metadata->mapField(['fieldName' => 'id', 'type' => 'text']);\n";
        let err = driver
            .parse(source, Path::new("Order.php"), &types)
            .unwrap_err();
        assert!(matches!(err, Error::Mapping { ref message, .. } if message == "field 'id' mapped twice"));
    }
}
