//! Metadata bundle - the entities loaded by one driver run.

use super::EntityDef;
use crate::error::Error;
use rkyv::{Archive, Deserialize, Serialize};
use serde::{Deserialize as SerdeDeserialize, Serialize as SerdeSerialize};

/// Entities loaded from a set of mapping paths.
#[derive(
    Debug, Clone, PartialEq, Eq, Default, Archive, Serialize, Deserialize, SerdeSerialize, SerdeDeserialize,
)]
pub struct MetadataBundle {
    /// Entity definitions in load order.
    pub entities: Vec<EntityDef>,
}

impl MetadataBundle {
    /// Create an empty bundle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entity, rejecting a second definition of the same name.
    pub fn insert(&mut self, entity: EntityDef) -> Result<(), Error> {
        if let Some(existing) = self.get_entity(&entity.name) {
            return Err(Error::mapping(
                entity.source.clone(),
                format!(
                    "entity '{}' is already mapped in {}",
                    entity.name, existing.source
                ),
            ));
        }
        self.entities.push(entity);
        Ok(())
    }

    /// Get an entity by name.
    pub fn get_entity(&self, name: &str) -> Option<&EntityDef> {
        self.entities.iter().find(|e| e.name == name)
    }

    /// List all entity names in load order.
    pub fn entity_names(&self) -> Vec<&str> {
        self.entities.iter().map(|e| e.name.as_str()).collect()
    }

    /// Number of entities.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Check if no entity was loaded.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Serialize the bundle to bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, Error> {
        rkyv::to_bytes::<rkyv::rancor::Error>(self)
            .map(|v| v.to_vec())
            .map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Deserialize a bundle from bytes.
    ///
    /// Cache backends may hand back unaligned buffers, so the bytes are copied
    /// into an aligned buffer before validation.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        let mut aligned: rkyv::util::AlignedVec<16> = rkyv::util::AlignedVec::new();
        aligned.extend_from_slice(bytes);
        rkyv::from_bytes::<Self, rkyv::rancor::Error>(&aligned)
            .map_err(|e| Error::Deserialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{FieldDef, FieldType, ScalarType};

    fn sample_bundle() -> MetadataBundle {
        let mut order = EntityDef::new("Order")
            .with_table("orders")
            .with_source("Sales/Order.orm.xml");
        order
            .add_field(FieldDef::new("id", FieldType::scalar(ScalarType::Int32)), true)
            .unwrap();
        order
            .add_field(FieldDef::new("total", FieldType::custom("money")), false)
            .unwrap();

        let mut bundle = MetadataBundle::new();
        bundle.insert(order).unwrap();
        bundle
    }

    #[test]
    fn test_duplicate_entity_rejected() {
        let mut bundle = sample_bundle();
        let err = bundle
            .insert(EntityDef::new("Order").with_source("Billing/Order.orm.xml"))
            .unwrap_err();

        assert!(matches!(err, Error::Mapping { .. }));
        assert!(err.to_string().contains("Sales/Order.orm.xml"));
        assert_eq!(bundle.len(), 1);
    }

    #[test]
    fn test_bytes_survive_cache_storage() {
        let bundle = sample_bundle();
        let bytes = bundle.to_bytes().unwrap();
        assert_eq!(MetadataBundle::from_bytes(&bytes).unwrap(), bundle);
    }

    #[test]
    fn test_garbage_bytes_rejected() {
        let err = MetadataBundle::from_bytes(&[1, 2, 3]).unwrap_err();
        assert!(matches!(err, Error::Deserialization(_)));
    }
}
