//! Metadata mapping drivers.
//!
//! A driver reads entity mapping information from one source format. The
//! [`MappingDriver`] enum dispatches over the five supported strategies, all of
//! which implement [`MetadataDriver`].
//!
//! | kind       | files       | format                                     |
//! |------------|-------------|--------------------------------------------|
//! | annotation | `*.rs`      | `/// @Entity`, `/// @Id`, `/// @Column`    |
//! | attribute  | `*.rs`      | `#[entity]`, `#[id]`, `#[column]`          |
//! | xml        | `*.orm.xml` | `<entity>` elements with `<id>`/`<field>`  |
//! | yaml       | `*.orm.yml` | entity name to table, ids and fields       |
//! | php        | `*.php`     | `$metadata->mapField([...])` statements    |
//!
//! The annotation driver reads only the first mapping path. The other drivers
//! read every path, in order.

mod annotation;
mod attribute;
mod php;
mod source;
mod xml;
mod yaml;

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::catalog::{EntityDef, FieldType, MetadataBundle};
use crate::error::{Error, Result};
use crate::types::TypeRegistry;

pub use annotation::AnnotationDriver;
pub use attribute::AttributeDriver;
pub use php::PhpDriver;
pub use xml::XmlDriver;
pub use yaml::YamlDriver;

/// Type used when a mapping does not name one.
pub(crate) const DEFAULT_TYPE_NAME: &str = "string";

/// Metadata source format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DriverKind {
    /// Doc-comment tags in Rust sources.
    Annotation,
    /// Attributes in Rust sources.
    #[default]
    Attribute,
    /// XML mapping files.
    Xml,
    /// YAML mapping files.
    Yaml,
    /// PHP mapping scripts.
    Php,
}

impl DriverKind {
    /// All kinds.
    pub const ALL: [DriverKind; 5] = [
        DriverKind::Annotation,
        DriverKind::Attribute,
        DriverKind::Xml,
        DriverKind::Yaml,
        DriverKind::Php,
    ];

    /// Select a kind from an optional selector. Unset or blank selects the default.
    pub fn select(selector: Option<&str>) -> Result<Self> {
        match selector.map(str::trim) {
            None | Some("") => Ok(Self::default()),
            Some(s) => s.parse(),
        }
    }

    /// Selector string for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            DriverKind::Annotation => "annotation",
            DriverKind::Attribute => "attribute",
            DriverKind::Xml => "xml",
            DriverKind::Yaml => "yaml",
            DriverKind::Php => "php",
        }
    }

    /// Whether drivers of this kind read every mapping path.
    pub fn accepts_multiple_paths(&self) -> bool {
        !matches!(self, DriverKind::Annotation)
    }
}

impl FromStr for DriverKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "annotation" | "annotations" => Ok(DriverKind::Annotation),
            "attribute" | "attributes" => Ok(DriverKind::Attribute),
            "xml" => Ok(DriverKind::Xml),
            "yaml" | "yml" => Ok(DriverKind::Yaml),
            "php" => Ok(DriverKind::Php),
            _ => Err(Error::UnsupportedDriverKind(s.to_string())),
        }
    }
}

impl fmt::Display for DriverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reads entity metadata from mapping files.
pub trait MetadataDriver {
    /// Source format of this driver.
    fn kind(&self) -> DriverKind;

    /// Mapping paths, in the order they are read.
    fn paths(&self) -> &[PathBuf];

    /// Suffix of the files this driver reads.
    fn file_suffix(&self) -> &'static str;

    /// Parse the entities declared in one mapping file.
    fn parse(&self, source: &str, file: &Path, types: &TypeRegistry) -> Result<Vec<EntityDef>>;

    /// Mapping files under the driver's paths, sorted within each path.
    fn mapping_files(&self) -> Result<Vec<PathBuf>> {
        discover(self.paths(), self.file_suffix())
    }

    /// Load every entity under the driver's paths.
    fn load(&self, types: &TypeRegistry) -> Result<MetadataBundle> {
        let mut bundle = MetadataBundle::new();
        for file in self.mapping_files()? {
            let source = std::fs::read_to_string(&file)?;
            for entity in self.parse(&source, &file, types)? {
                bundle.insert(entity)?;
            }
        }
        tracing::debug!(
            driver = %self.kind(),
            entities = bundle.len(),
            "loaded mapping metadata"
        );
        Ok(bundle)
    }
}

/// Metadata driver selected by [`DriverKind`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MappingDriver {
    /// Doc-comment driver.
    Annotation(AnnotationDriver),
    /// Attribute driver.
    Attribute(AttributeDriver),
    /// XML driver.
    Xml(XmlDriver),
    /// YAML driver.
    Yaml(YamlDriver),
    /// PHP driver.
    Php(PhpDriver),
}

impl MappingDriver {
    /// Create the driver for `kind` over the given paths.
    pub fn new(kind: DriverKind, paths: Vec<PathBuf>) -> Self {
        match kind {
            DriverKind::Annotation => MappingDriver::Annotation(AnnotationDriver::new(paths)),
            DriverKind::Attribute => MappingDriver::Attribute(AttributeDriver::new(paths)),
            DriverKind::Xml => MappingDriver::Xml(XmlDriver::new(paths)),
            DriverKind::Yaml => MappingDriver::Yaml(YamlDriver::new(paths)),
            DriverKind::Php => MappingDriver::Php(PhpDriver::new(paths)),
        }
    }

    fn inner(&self) -> &dyn MetadataDriver {
        match self {
            MappingDriver::Annotation(d) => d,
            MappingDriver::Attribute(d) => d,
            MappingDriver::Xml(d) => d,
            MappingDriver::Yaml(d) => d,
            MappingDriver::Php(d) => d,
        }
    }
}

impl MetadataDriver for MappingDriver {
    fn kind(&self) -> DriverKind {
        self.inner().kind()
    }

    fn paths(&self) -> &[PathBuf] {
        self.inner().paths()
    }

    fn file_suffix(&self) -> &'static str {
        self.inner().file_suffix()
    }

    fn parse(&self, source: &str, file: &Path, types: &TypeRegistry) -> Result<Vec<EntityDef>> {
        self.inner().parse(source, file, types)
    }

    fn mapping_files(&self) -> Result<Vec<PathBuf>> {
        self.inner().mapping_files()
    }

    fn load(&self, types: &TypeRegistry) -> Result<MetadataBundle> {
        self.inner().load(types)
    }
}

/// Find files ending in `suffix` under each path.
fn discover(paths: &[PathBuf], suffix: &str) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        let root = path.to_str().ok_or_else(|| {
            Error::Configuration(format!("mapping path is not UTF-8: {}", path.display()))
        })?;
        let pattern = format!("{}/**/*{}", glob::Pattern::escape(root), suffix);
        let entries = glob::glob(&pattern)
            .map_err(|e| Error::Configuration(format!("invalid mapping pattern: {e}")))?;

        let mut found = Vec::new();
        for entry in entries {
            let file = entry.map_err(|e| Error::Io(e.into_error()))?;
            if file.is_file() {
                found.push(file);
            }
        }
        found.sort();
        files.extend(found);
    }
    Ok(files)
}

/// Resolve a mapping type name, defaulting to `string` when unset.
pub(crate) fn resolve_type(
    name: Option<&str>,
    file: &Path,
    types: &TypeRegistry,
) -> Result<FieldType> {
    let name = name.unwrap_or(DEFAULT_TYPE_NAME);
    types.resolve(name).ok_or_else(|| Error::UnknownType {
        name: name.to_string(),
        file: file.to_path_buf(),
    })
}

/// Parse a boolean mapping value.
pub(crate) fn parse_bool(value: &str, file: &Path) -> Result<bool> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(Error::mapping(
            file,
            format!("expected true or false, found '{other}'"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_driver_kind_parse() {
        assert_eq!("XML".parse::<DriverKind>().unwrap(), DriverKind::Xml);
        assert_eq!("yml".parse::<DriverKind>().unwrap(), DriverKind::Yaml);
        assert_eq!(
            "annotations".parse::<DriverKind>().unwrap(),
            DriverKind::Annotation
        );
        let err = "json".parse::<DriverKind>().unwrap_err();
        assert!(matches!(err, Error::UnsupportedDriverKind(ref k) if k == "json"));
    }

    #[test]
    fn test_driver_kind_select_default() {
        assert_eq!(DriverKind::select(None).unwrap(), DriverKind::Attribute);
        assert_eq!(DriverKind::select(Some("  ")).unwrap(), DriverKind::Attribute);
        assert_eq!(DriverKind::select(Some("php")).unwrap(), DriverKind::Php);
        assert!(DriverKind::select(Some("ini")).is_err());
    }

    #[test]
    fn test_mapping_driver_dispatch() {
        let paths = vec![PathBuf::from("/d/Sales"), PathBuf::from("/d/Billing")];
        for kind in DriverKind::ALL {
            let driver = MappingDriver::new(kind, paths.clone());
            assert_eq!(driver.kind(), kind);
            let expected = if kind.accepts_multiple_paths() { 2 } else { 1 };
            assert_eq!(driver.paths().len(), expected);
            assert_eq!(driver.paths()[0], paths[0]);
        }
    }

    #[test]
    fn test_discover_sorted_per_path() {
        let dir = tempfile::tempdir().unwrap();
        let sales = dir.path().join("Sales");
        let billing = dir.path().join("Billing");
        std::fs::create_dir_all(sales.join("Nested")).unwrap();
        std::fs::create_dir_all(&billing).unwrap();
        std::fs::write(sales.join("Order.orm.xml"), "").unwrap();
        std::fs::write(sales.join("Nested/Line.orm.xml"), "").unwrap();
        std::fs::write(sales.join("notes.txt"), "").unwrap();
        std::fs::write(billing.join("Invoice.orm.xml"), "").unwrap();

        let files = discover(&[sales.clone(), billing.clone()], ".orm.xml").unwrap();
        assert_eq!(
            files,
            vec![
                sales.join("Nested/Line.orm.xml"),
                sales.join("Order.orm.xml"),
                billing.join("Invoice.orm.xml"),
            ]
        );
    }

    #[test]
    fn test_resolve_type_default_and_unknown() {
        let types = TypeRegistry::new();
        let file = Path::new("Order.orm.xml");
        assert_eq!(
            resolve_type(None, file, &types).unwrap(),
            FieldType::Scalar(crate::catalog::ScalarType::String)
        );
        let err = resolve_type(Some("money"), file, &types).unwrap_err();
        assert!(matches!(err, Error::UnknownType { ref name, .. } if name == "money"));
    }
}
