//! Mapping catalog.
//!
//! Entity metadata produced by the mapping drivers: entities, their fields,
//! and the versioned bundle that is cached between runs.

mod entity;
mod field;
mod metadata;
mod types;

pub use entity::EntityDef;
pub use field::FieldDef;
pub use metadata::MetadataBundle;
pub use types::{FieldType, ScalarType};
