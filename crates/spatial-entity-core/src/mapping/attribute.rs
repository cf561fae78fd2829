//! Attribute driver, the default.
//!
//! ```text
//! #[entity(table = "invoices")]
//! pub struct Invoice {
//!     #[id]
//!     pub id: i64,
//!     #[column(type = "money")]
//!     pub amount: Money,
//! }
//! ```

use std::path::{Path, PathBuf};

use super::source::{self, TagSyntax};
use super::{DriverKind, MetadataDriver};
use crate::catalog::EntityDef;
use crate::error::Result;
use crate::types::TypeRegistry;

/// Reads `#[entity]`/`#[id]`/`#[column]` attributes from Rust sources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeDriver {
    paths: Vec<PathBuf>,
}

impl AttributeDriver {
    /// Create a driver over `paths`.
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self { paths }
    }
}

impl MetadataDriver for AttributeDriver {
    fn kind(&self) -> DriverKind {
        DriverKind::Attribute
    }

    fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    fn file_suffix(&self) -> &'static str {
        ".rs"
    }

    fn parse(&self, source: &str, file: &Path, types: &TypeRegistry) -> Result<Vec<EntityDef>> {
        source::scan(source, file, TagSyntax::Attribute, types)
    }
}
