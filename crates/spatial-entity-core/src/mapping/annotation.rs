//! Doc-comment annotation driver.
//!
//! ```text
//! /// @Entity(table = "orders")
//! pub struct Order {
//!     /// @Id @Column(type = "integer")
//!     pub id: i32,
//!     /// @Column(type = "money", name = "total_amount", nullable = true)
//!     pub total: Option<Money>,
//! }
//! ```

use std::path::{Path, PathBuf};

use super::source::{self, TagSyntax};
use super::{DriverKind, MetadataDriver};
use crate::catalog::EntityDef;
use crate::error::Result;
use crate::types::TypeRegistry;

/// Reads `@Entity`/`@Id`/`@Column` tags from doc comments.
///
/// Only the first mapping path is read. Further paths are dropped when the
/// driver is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationDriver {
    paths: Vec<PathBuf>,
}

impl AnnotationDriver {
    /// Create a driver over the first of `paths`.
    pub fn new(paths: Vec<PathBuf>) -> Self {
        let mut paths = paths.into_iter();
        let first: Vec<PathBuf> = paths.next().into_iter().collect();
        let dropped: Vec<PathBuf> = paths.collect();
        if !dropped.is_empty() {
            tracing::warn!(
                path = ?first.first(),
                dropped = ?dropped,
                "annotation driver reads only the first mapping path"
            );
        }
        Self { paths: first }
    }
}

impl MetadataDriver for AnnotationDriver {
    fn kind(&self) -> DriverKind {
        DriverKind::Annotation
    }

    fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    fn file_suffix(&self) -> &'static str {
        ".rs"
    }

    fn parse(&self, source: &str, file: &Path, types: &TypeRegistry) -> Result<Vec<EntityDef>> {
        source::scan(source, file, TagSyntax::DocComment, types)
    }
}
