//! Persistence configuration loading.
//!
//! The configuration lives in a TOML file, by default `config/config.toml`
//! under the project root:
//!
//! ```toml
//! enable_prod_mode = false
//!
//! [domains]
//! root = "src/core/Domain"
//! names = ["sales", "billing"]
//!
//! [dbal.types]
//! money = "app::types::Money"
//!
//! [orm]
//! metadata_driver = "xml"
//! proxy_dir = "var/proxies"
//! proxy_namespace = "app::proxies"
//!
//! [orm.dql.string_functions]
//! soundex = "app::dql::Soundex"
//!
//! [cache]
//! directory = "var/cache"
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};

/// Relative location of the configuration file inside a project.
pub const DEFAULT_CONFIG_PATH: &str = "config/config.toml";

/// Default domain root, relative to the project root.
pub const DEFAULT_DOMAIN_ROOT: &str = "src/core/Domain";

/// Top-level persistence configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PersistenceConfig {
    /// Production mode: persistent cache, no proxy auto-generation.
    #[serde(default)]
    pub enable_prod_mode: bool,
    /// Domain layout.
    #[serde(default)]
    pub domains: DomainSettings,
    /// Database abstraction settings.
    #[serde(default)]
    pub dbal: DbalConfig,
    /// Mapping settings.
    #[serde(default)]
    pub orm: OrmConfig,
    /// Persistent cache settings.
    #[serde(default)]
    pub cache: CacheSettings,
}

/// Domain directory layout.
#[derive(Debug, Clone, Deserialize)]
pub struct DomainSettings {
    /// Directory holding one subdirectory per domain.
    #[serde(default = "default_domain_root")]
    pub root: PathBuf,
    /// Domains to resolve when none are given explicitly.
    #[serde(default)]
    pub names: Vec<String>,
}

/// Database abstraction settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DbalConfig {
    /// Custom scalar types: name to handler identifier.
    #[serde(default)]
    pub types: BTreeMap<String, String>,
}

/// Mapping settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrmConfig {
    /// Metadata driver selector. Unset selects the attribute driver.
    #[serde(default, alias = "metadata_driver_implementation")]
    pub metadata_driver: Option<String>,
    /// Overrides the proxy auto-generation flag implied by the mode.
    #[serde(default)]
    pub generate_proxy_classes: Option<bool>,
    /// Base directory for generated proxies.
    #[serde(default)]
    pub proxy_dir: Option<PathBuf>,
    /// Namespace of generated proxies.
    #[serde(default)]
    pub proxy_namespace: Option<String>,
    /// Custom query functions: kind to (name to handler).
    #[serde(default)]
    pub dql: BTreeMap<String, BTreeMap<String, String>>,
}

/// Persistent cache settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CacheSettings {
    /// Directory of the production cache. Unset uses a temporary store.
    #[serde(default)]
    pub directory: Option<PathBuf>,
}

fn default_domain_root() -> PathBuf {
    PathBuf::from(DEFAULT_DOMAIN_ROOT)
}

impl Default for DomainSettings {
    fn default() -> Self {
        Self {
            root: default_domain_root(),
            names: Vec::new(),
        }
    }
}

impl PersistenceConfig {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load `config/config.toml` from a project root.
    ///
    /// A missing file yields the defaults (development mode). Relative
    /// directories in the loaded configuration are anchored at `root`.
    pub fn load_from_project<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref();
        let path = root.join(DEFAULT_CONFIG_PATH);
        let config = if path.is_file() {
            tracing::debug!(path = %path.display(), "loading persistence config");
            Self::load(&path)?
        } else {
            tracing::debug!(path = %path.display(), "no persistence config, using defaults");
            Self::default()
        };
        Ok(config.anchored_at(root))
    }

    /// Resolve relative directories against `root`.
    pub fn anchored_at(mut self, root: &Path) -> Self {
        self.domains.root = anchor(root, &self.domains.root);
        self.orm.proxy_dir = self.orm.proxy_dir.map(|dir| anchor(root, &dir));
        self.cache.directory = self.cache.directory.map(|dir| anchor(root, &dir));
        self
    }

    /// Set production mode.
    pub fn with_prod_mode(mut self, enabled: bool) -> Self {
        self.enable_prod_mode = enabled;
        self
    }

    /// Set the domain root.
    pub fn with_domain_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.domains.root = root.into();
        self
    }

    /// Set the metadata driver selector.
    pub fn with_metadata_driver(mut self, driver: impl Into<String>) -> Self {
        self.orm.metadata_driver = Some(driver.into());
        self
    }

    /// Set the proxy base directory.
    pub fn with_proxy_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.orm.proxy_dir = Some(dir.into());
        self
    }

    /// Set the proxy namespace.
    pub fn with_proxy_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.orm.proxy_namespace = Some(namespace.into());
        self
    }

    /// Add a custom scalar type.
    pub fn with_type(mut self, name: impl Into<String>, handler: impl Into<String>) -> Self {
        self.dbal.types.insert(name.into(), handler.into());
        self
    }

    /// Add a custom query function under a `dql` kind key.
    pub fn with_function(
        mut self,
        kind: impl Into<String>,
        name: impl Into<String>,
        handler: impl Into<String>,
    ) -> Self {
        self.orm
            .dql
            .entry(kind.into())
            .or_default()
            .insert(name.into(), handler.into());
        self
    }

    /// Set the persistent cache directory.
    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache.directory = Some(dir.into());
        self
    }
}

fn anchor(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}
