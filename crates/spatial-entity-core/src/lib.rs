//! Spatial Entity Core - persistence configuration, mapping metadata, and services.
//!
//! This crate resolves a static persistence configuration into a ready-to-use
//! [`ResolvedConfiguration`] for an entity-manager factory, and provides the
//! [`LazyServiceLocator`] used at application start.

pub mod cache;
pub mod catalog;
pub mod config;
pub mod error;
pub mod functions;
pub mod locator;
pub mod manager;
pub mod mapping;
pub mod proxy;
pub mod resolver;
pub mod types;

pub use cache::{ArrayCache, CacheBackend, CacheKind, PersistentCache, SharedCache};
pub use catalog::{EntityDef, FieldDef, FieldType, MetadataBundle, ScalarType};
pub use config::{CacheSettings, DbalConfig, DomainSettings, OrmConfig, PersistenceConfig};
pub use error::{Error, Result};
pub use functions::{FunctionKind, QueryFunctionRegistry};
pub use locator::LazyServiceLocator;
pub use manager::{ConnectionOptions, EntityManagerFactory};
pub use mapping::{DriverKind, MappingDriver, MetadataDriver};
pub use proxy::ProxyConfig;
pub use resolver::{Mode, ModeState, PersistenceConfigResolver, ResolvedConfiguration};
pub use types::{TypeDefinition, TypeRegistry};
