//! XML mapping driver.
//!
//! ```xml
//! <entity-mapping>
//!     <entity name="Order" table="orders">
//!         <id name="id" type="integer"/>
//!         <field name="total" type="money" column="total_amount" nullable="true"/>
//!     </entity>
//! </entity-mapping>
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::{resolve_type, DriverKind, MetadataDriver};
use crate::catalog::{EntityDef, FieldDef};
use crate::error::{Error, Result};
use crate::types::TypeRegistry;

/// Reads `*.orm.xml` mapping files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlDriver {
    paths: Vec<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct XmlMapping {
    #[serde(rename = "entity", default)]
    entities: Vec<XmlEntity>,
}

#[derive(Debug, Deserialize)]
struct XmlEntity {
    #[serde(rename = "@name")]
    name: String,
    #[serde(rename = "@table")]
    table: Option<String>,
    #[serde(rename = "id", default)]
    ids: Vec<XmlField>,
    #[serde(rename = "field", default)]
    fields: Vec<XmlField>,
}

#[derive(Debug, Deserialize)]
struct XmlField {
    #[serde(rename = "@name")]
    name: String,
    #[serde(rename = "@type")]
    field_type: Option<String>,
    #[serde(rename = "@column")]
    column: Option<String>,
    #[serde(rename = "@nullable", default)]
    nullable: bool,
}

impl XmlDriver {
    /// Create a driver over `paths`.
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self { paths }
    }
}

impl XmlField {
    fn into_field(self, file: &Path, types: &TypeRegistry) -> Result<FieldDef> {
        let field_type = resolve_type(self.field_type.as_deref(), file, types)?;
        let mut field = FieldDef::new(self.name, field_type).with_nullable(self.nullable);
        if let Some(column) = self.column {
            field = field.with_column(column);
        }
        Ok(field)
    }
}

impl MetadataDriver for XmlDriver {
    fn kind(&self) -> DriverKind {
        DriverKind::Xml
    }

    fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    fn file_suffix(&self) -> &'static str {
        ".orm.xml"
    }

    fn parse(&self, source: &str, file: &Path, types: &TypeRegistry) -> Result<Vec<EntityDef>> {
        let mapping: XmlMapping =
            quick_xml::de::from_str(source).map_err(|e| Error::mapping(file, e.to_string()))?;

        mapping
            .entities
            .into_iter()
            .map(|xml| {
                let mut entity =
                    EntityDef::new(xml.name).with_source(file.display().to_string());
                if let Some(table) = xml.table {
                    entity = entity.with_table(table);
                }
                for id in xml.ids {
                    entity.add_field(id.into_field(file, types)?, true)?;
                }
                for field in xml.fields {
                    entity.add_field(field.into_field(file, types)?, false)?;
                }
                Ok(entity)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{FieldType, ScalarType};

    const ORDER_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<entity-mapping xmlns="urn:spatial-entity:mapping">
    <entity name="Order" table="orders">
        <id name="id" type="integer"/>
        <field name="placedAt" type="datetime" column="placed_at"/>
        <id name="region" type="string"/>
        <field name="total" type="money" nullable="true"/>
    </entity>
    <entity name="OrderNote">
        <id name="id"/>
    </entity>
</entity-mapping>
"#;

    #[test]
    fn test_parse_order() {
        let types = TypeRegistry::new();
        types.register("money", "app::types::Money").unwrap();
        let driver = XmlDriver::new(vec![PathBuf::from("Sales")]);

        let entities = driver
            .parse(ORDER_XML, Path::new("Sales/Order.orm.xml"), &types)
            .unwrap();
        assert_eq!(entities.len(), 2);

        let order = &entities[0];
        assert_eq!(order.table, "orders");
        assert_eq!(order.identity, vec!["id", "region"]);
        assert_eq!(order.get_field("placedAt").unwrap().column, "placed_at");
        assert_eq!(
            order.get_field("placedAt").unwrap().field_type,
            FieldType::scalar(ScalarType::Timestamp)
        );
        assert!(order.get_field("total").unwrap().nullable);

        let note = &entities[1];
        assert_eq!(note.table, "OrderNote");
        assert_eq!(
            note.get_field("id").unwrap().field_type,
            FieldType::scalar(ScalarType::String)
        );
    }

    #[test]
    fn test_malformed_xml() {
        let types = TypeRegistry::new();
        let driver = XmlDriver::new(vec![]);
        let err = driver
            .parse("<entity-mapping><entity>", Path::new("Bad.orm.xml"), &types)
            .unwrap_err();
        assert!(matches!(err, Error::Mapping { .. }));
    }

    #[test]
    fn test_field_mapped_as_id_and_field() {
        let types = TypeRegistry::new();
        let driver = XmlDriver::new(vec![]);
        let source = r#"<entity-mapping>
    <entity name="Order">
        <id name="id" type="integer"/>
        <field name="id" type="string"/>
    </entity>
</entity-mapping>"#;
        let err = driver
            .parse(source, Path::new("Sales/Order.orm.xml"), &types)
            .unwrap_err();
        match err {
            Error::Mapping { file, message } => {
                assert_eq!(file, PathBuf::from("Sales/Order.orm.xml"));
                assert_eq!(message, "field 'id' mapped twice");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
