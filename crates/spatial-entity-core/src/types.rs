//! Custom scalar type registry.
//!
//! Holds the types registered through `dbal.types` next to the built-in
//! names, and resolves the type names written in mapping files. The registry
//! is owned by the caller and shared through `Arc`, so every resolver run in a
//! test can use its own.

use std::collections::BTreeMap;

use parking_lot::RwLock;

use crate::catalog::{FieldType, ScalarType};
use crate::error::{Error, Result};

/// A registered custom type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDefinition {
    /// Type name as used in mapping files.
    pub name: String,
    /// Handler identifier that converts values of this type.
    pub handler: String,
}

/// Registry of custom scalar types.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    custom: RwLock<BTreeMap<String, TypeDefinition>>,
}

impl TypeRegistry {
    /// Create a registry with only the built-in types.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a custom type.
    ///
    /// Registering the same name with the same handler again is a no-op.
    /// A different handler for an existing name, or a name that shadows a
    /// built-in type, fails with [`Error::DuplicateType`].
    pub fn register(&self, name: impl Into<String>, handler: impl Into<String>) -> Result<()> {
        let definition = TypeDefinition {
            name: name.into(),
            handler: handler.into(),
        };

        if ScalarType::from_name(&definition.name).is_some() {
            return Err(Error::DuplicateType {
                existing: format!("builtin:{}", definition.name),
                name: definition.name,
                requested: definition.handler,
            });
        }

        let mut custom = self.custom.write();
        match custom.get(&definition.name) {
            Some(existing) if *existing == definition => {
                tracing::debug!(name = %definition.name, "type already registered");
                Ok(())
            }
            Some(existing) => Err(Error::DuplicateType {
                name: definition.name,
                existing: existing.handler.clone(),
                requested: definition.handler,
            }),
            None => {
                tracing::debug!(name = %definition.name, handler = %definition.handler, "registered type");
                custom.insert(definition.name.clone(), definition);
                Ok(())
            }
        }
    }

    /// Check if a name is known, built-in or custom.
    pub fn has_type(&self, name: &str) -> bool {
        ScalarType::from_name(name).is_some() || self.custom.read().contains_key(name)
    }

    /// Get a custom type definition.
    pub fn get(&self, name: &str) -> Option<TypeDefinition> {
        self.custom.read().get(name).cloned()
    }

    /// Resolve a mapping-file type name into a field type.
    pub fn resolve(&self, name: &str) -> Option<FieldType> {
        if let Some(scalar) = ScalarType::from_name(name) {
            return Some(FieldType::Scalar(scalar));
        }
        self.custom
            .read()
            .contains_key(name)
            .then(|| FieldType::custom(name))
    }

    /// Names of the registered custom types, sorted.
    pub fn custom_names(&self) -> Vec<String> {
        self.custom.read().keys().cloned().collect()
    }

    /// Number of registered custom types.
    pub fn custom_len(&self) -> usize {
        self.custom.read().len()
    }
}
