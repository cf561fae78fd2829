//! Persistence configuration resolver.
//!
//! [`PersistenceConfigResolver::resolve`] turns a [`PersistenceConfig`] and a
//! list of domain names into a [`ResolvedConfiguration`]:
//!
//! 1. register the custom scalar types,
//! 2. pick development or production mode,
//! 3. resolve `<domain root>/<Domain>` for every domain, in order,
//! 4. build the metadata driver over those paths,
//! 5. derive the proxy directory and namespace from the first domain,
//! 6. register the custom query functions.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::cache::{ArrayCache, CacheKind, PersistentCache, SharedCache};
use crate::catalog::MetadataBundle;
use crate::config::{CacheSettings, PersistenceConfig};
use crate::error::{Error, Result};
use crate::functions::{FunctionKind, QueryFunctionRegistry};
use crate::manager::{ConnectionOptions, EntityManagerFactory};
use crate::mapping::{DriverKind, MappingDriver, MetadataDriver};
use crate::proxy::{ProxyConfig, DEFAULT_PROXY_NAMESPACE, PROXY_DIR_NAME};
use crate::types::TypeRegistry;

/// Cache key prefix of loaded mapping metadata.
const METADATA_KEY_PREFIX: &str = "metadata:";

/// Runtime mode of the persistence layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Mode {
    /// Array cache, proxies generated on demand.
    #[default]
    Development,
    /// Persistent cache, proxies expected on disk.
    Production,
}

impl Mode {
    /// Mode selected by the `enable_prod_mode` flag.
    pub fn from_prod_flag(enable_prod_mode: bool) -> Self {
        if enable_prod_mode {
            Mode::Production
        } else {
            Mode::Development
        }
    }

    /// Whether proxies are generated on demand in this mode.
    pub fn auto_generates_proxies(&self) -> bool {
        matches!(self, Mode::Development)
    }

    /// Cache backend used in this mode.
    pub fn cache_kind(&self) -> CacheKind {
        match self {
            Mode::Development => CacheKind::Array,
            Mode::Production => CacheKind::Persistent,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Development => f.write_str("development"),
            Mode::Production => f.write_str("production"),
        }
    }
}

/// The mode-dependent part of a [`ResolvedConfiguration`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeState {
    /// Current mode.
    pub mode: Mode,
    /// Kind of the active cache backend.
    pub cache: CacheKind,
    /// Proxy auto-generation flag.
    pub auto_generate_proxies: bool,
}

/// Persistent caches opened so far, keyed by absolute directory.
///
/// The backing store locks its directory, so every configuration resolved
/// against the same `cache.directory` shares one opened cache.
type PersistentCaches = Arc<Mutex<HashMap<PathBuf, SharedCache>>>;

/// Resolves persistence configurations against a caller-owned type registry.
///
/// Clones share the type registry and the opened persistent caches.
#[derive(Debug, Clone, Default)]
pub struct PersistenceConfigResolver {
    types: Arc<TypeRegistry>,
    persistent_caches: PersistentCaches,
}

impl PersistenceConfigResolver {
    /// Create a resolver that registers custom types into `types`.
    pub fn new(types: Arc<TypeRegistry>) -> Self {
        Self {
            types,
            persistent_caches: PersistentCaches::default(),
        }
    }

    /// The type registry custom types are registered into.
    pub fn types(&self) -> &Arc<TypeRegistry> {
        &self.types
    }

    /// Resolve the domains listed in `config.domains.names`.
    pub fn resolve_configured(&self, config: &PersistenceConfig) -> Result<ResolvedConfiguration> {
        self.resolve(&config.domains.names, config)
    }

    /// Resolve a configuration for `domain_names`.
    ///
    /// Domain names are used with their first letter uppercased, for the
    /// domain directories as well as the proxy directory: `sales` resolves to
    /// `<domain root>/Sales` and, with `orm.proxy_dir` set, to
    /// `<proxy_dir>/Sales`. The default proxy namespace keeps the name
    /// lowercased (`core::domain::sales::proxies`).
    ///
    /// Fails with [`Error::Configuration`] when no domain is given,
    /// [`Error::DomainPathNotFound`] when a domain directory is missing,
    /// [`Error::UnsupportedDriverKind`] for an unknown driver selector, and
    /// [`Error::DuplicateType`] when a custom type conflicts with the registry.
    pub fn resolve<S: AsRef<str>>(
        &self,
        domain_names: &[S],
        config: &PersistenceConfig,
    ) -> Result<ResolvedConfiguration> {
        let domains = domain_names
            .iter()
            .map(|name| domain_dir_name(name.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        let Some(first_domain) = domains.first().cloned() else {
            return Err(Error::Configuration(
                "at least one domain name is required".to_string(),
            ));
        };

        for (name, handler) in &config.dbal.types {
            self.types.register(name.as_str(), handler.as_str())?;
        }

        let mode = Mode::from_prod_flag(config.enable_prod_mode);

        let domain_root = &config.domains.root;
        let mut domain_paths = Vec::with_capacity(domains.len());
        for domain in &domains {
            let path = domain_root.join(domain);
            if !path.is_dir() {
                return Err(Error::DomainPathNotFound(path));
            }
            domain_paths.push(std::path::absolute(&path)?);
        }

        let kind = DriverKind::select(config.orm.metadata_driver.as_deref())?;
        let driver = MappingDriver::new(kind, domain_paths.clone());

        let proxy_dir = match &config.orm.proxy_dir {
            Some(base) => base.join(&first_domain),
            None => domain_root.join(&first_domain).join(PROXY_DIR_NAME),
        };
        let proxy_namespace = config
            .orm
            .proxy_namespace
            .clone()
            .unwrap_or_else(|| ProxyConfig::default_namespace(&first_domain));
        let proxy_override = config.orm.generate_proxy_classes;
        let auto_generate = proxy_override.unwrap_or_else(|| mode.auto_generates_proxies());
        let proxy = ProxyConfig::new(proxy_dir, proxy_namespace, auto_generate);

        let mut functions = QueryFunctionRegistry::new();
        functions.register_config(&config.orm.dql);

        let mut resolved = ResolvedConfiguration {
            mode,
            domains,
            domain_root: domain_root.clone(),
            domain_paths,
            driver,
            cache: Arc::new(ArrayCache::new()),
            persistent_cache: None,
            persistent_caches: Arc::clone(&self.persistent_caches),
            cache_settings: config.cache.clone(),
            proxy,
            proxy_override,
            types: Arc::clone(&self.types),
            functions,
        };
        resolved.cache = resolved.cache_for(mode)?;

        tracing::info!(
            mode = %resolved.mode,
            driver = %kind,
            domains = ?resolved.domains,
            proxy_dir = %resolved.proxy.directory.display(),
            functions = resolved.functions.len(),
            "resolved persistence configuration"
        );
        Ok(resolved)
    }
}

/// Directory name of a domain: the name with its first letter uppercased.
fn domain_dir_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::Configuration("domain name is empty".to_string()));
    }
    if name.contains(['/', '\\']) || name == "." || name == ".." {
        return Err(Error::Configuration(format!(
            "domain name '{name}' is not a single directory name"
        )));
    }
    let mut chars = name.chars();
    Ok(match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    })
}

/// A fully populated persistence configuration.
///
/// Immutable after [`PersistenceConfigResolver::resolve`] except for the mode
/// switch and the explicit proxy and driver setters.
#[derive(Debug)]
pub struct ResolvedConfiguration {
    mode: Mode,
    domains: Vec<String>,
    domain_root: PathBuf,
    domain_paths: Vec<PathBuf>,
    driver: MappingDriver,
    cache: SharedCache,
    persistent_cache: Option<SharedCache>,
    persistent_caches: PersistentCaches,
    cache_settings: CacheSettings,
    proxy: ProxyConfig,
    proxy_override: Option<bool>,
    types: Arc<TypeRegistry>,
    functions: QueryFunctionRegistry,
}

impl ResolvedConfiguration {
    /// Current mode.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Check if the configuration runs in development mode.
    pub fn is_dev(&self) -> bool {
        self.mode == Mode::Development
    }

    /// Mode, cache kind and proxy flag.
    pub fn mode_state(&self) -> ModeState {
        ModeState {
            mode: self.mode,
            cache: self.cache.kind(),
            auto_generate_proxies: self.proxy.auto_generate,
        }
    }

    /// Switch between development and production.
    ///
    /// Swaps the cache backend and resets the proxy auto-generation flag to the
    /// mode's default, unless `orm.generate_proxy_classes` set it explicitly.
    /// Switching to the current mode does nothing. The
    /// persistent cache is opened once and reused; development mode always
    /// starts from an empty array cache.
    pub fn switch_mode(&mut self, mode: Mode) -> Result<()> {
        if mode == self.mode {
            return Ok(());
        }
        self.cache = self.cache_for(mode)?;
        self.proxy.auto_generate = self
            .proxy_override
            .unwrap_or_else(|| mode.auto_generates_proxies());
        self.mode = mode;
        tracing::info!(mode = %mode, cache = %self.cache.kind(), "switched persistence mode");
        Ok(())
    }

    fn cache_for(&mut self, mode: Mode) -> Result<SharedCache> {
        match mode {
            Mode::Development => Ok(Arc::new(ArrayCache::new())),
            Mode::Production => {
                if let Some(cache) = &self.persistent_cache {
                    return Ok(Arc::clone(cache));
                }
                let cache: SharedCache = match &self.cache_settings.directory {
                    Some(dir) => {
                        let dir = std::path::absolute(dir)?;
                        let mut opened = self.persistent_caches.lock();
                        match opened.get(&dir) {
                            Some(cache) => Arc::clone(cache),
                            None => {
                                let cache: SharedCache = Arc::new(PersistentCache::open(&dir)?);
                                opened.insert(dir, Arc::clone(&cache));
                                cache
                            }
                        }
                    }
                    None => Arc::new(PersistentCache::temporary()?),
                };
                self.persistent_cache = Some(Arc::clone(&cache));
                Ok(cache)
            }
        }
    }

    /// Domain directory names, capitalized, in input order.
    pub fn domains(&self) -> &[String] {
        &self.domains
    }

    /// Directory holding the domains.
    pub fn domain_root(&self) -> &Path {
        &self.domain_root
    }

    /// Resolved domain directories, in input order.
    pub fn domain_paths(&self) -> &[PathBuf] {
        &self.domain_paths
    }

    /// The metadata driver.
    pub fn metadata_driver(&self) -> &MappingDriver {
        &self.driver
    }

    /// Replace the metadata driver.
    pub fn set_metadata_driver(&mut self, driver: MappingDriver) {
        self.driver = driver;
    }

    /// Cache of mapping metadata.
    pub fn metadata_cache(&self) -> &SharedCache {
        &self.cache
    }

    /// Cache of parsed queries. Shares the backend of the metadata cache.
    pub fn query_cache(&self) -> &SharedCache {
        &self.cache
    }

    /// Proxy settings.
    pub fn proxy(&self) -> &ProxyConfig {
        &self.proxy
    }

    /// Set the proxy directory. `None` selects `<domain root>/Proxies`.
    pub fn set_proxy_dir(&mut self, dir: Option<PathBuf>) {
        self.proxy.directory = dir.unwrap_or_else(|| self.domain_root.join(PROXY_DIR_NAME));
    }

    /// Set the proxy namespace. `None` selects the default namespace.
    pub fn set_proxy_namespace(&mut self, namespace: Option<String>) {
        self.proxy.namespace = namespace.unwrap_or_else(|| DEFAULT_PROXY_NAMESPACE.to_string());
    }

    /// The type registry the custom types were registered into.
    pub fn types(&self) -> &Arc<TypeRegistry> {
        &self.types
    }

    /// Registered custom query functions.
    pub fn functions(&self) -> &QueryFunctionRegistry {
        &self.functions
    }

    /// Handler of a custom query function.
    pub fn custom_function(&self, kind: FunctionKind, name: &str) -> Option<&str> {
        self.functions.get(kind, name)
    }

    /// Load the mapping metadata, reading through the metadata cache.
    pub fn load_metadata(&self) -> Result<MetadataBundle> {
        let key = self.metadata_cache_key();
        if let Some(bytes) = self.cache.fetch(&key)? {
            match MetadataBundle::from_bytes(&bytes) {
                Ok(bundle) => return Ok(bundle),
                Err(e) => {
                    tracing::warn!(error = %e, "discarding unreadable cached metadata");
                }
            }
        }

        let bundle = self.driver.load(&self.types)?;
        self.cache.save(&key, &bundle.to_bytes()?)?;
        Ok(bundle)
    }

    /// Drop the cached metadata. Returns whether an entry was cached.
    pub fn clear_metadata_cache(&self) -> Result<bool> {
        self.cache.delete(&self.metadata_cache_key())
    }

    /// Cache key of the metadata read by the current driver.
    ///
    /// Covers the driver kind, its paths, and the custom types, so changing
    /// any of them misses the cache.
    pub fn metadata_cache_key(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.driver.kind().as_str().as_bytes());
        for path in self.driver.paths() {
            hasher.update(b"\0");
            hasher.update(path.to_string_lossy().as_bytes());
        }
        for name in self.types.custom_names() {
            if let Some(def) = self.types.get(&name) {
                hasher.update(b"\0");
                hasher.update(def.name.as_bytes());
                hasher.update(b"=");
                hasher.update(def.handler.as_bytes());
            }
        }
        format!(
            "{}{}",
            METADATA_KEY_PREFIX,
            hex::encode(hasher.finalize().as_bytes())
        )
    }

    /// Build an entity manager through an external factory.
    pub fn entity_manager<F: EntityManagerFactory>(
        &self,
        factory: &F,
        options: &ConnectionOptions,
    ) -> std::result::Result<F::Manager, F::Error> {
        factory.create(options, self)
    }
}
