//! Proxy class settings.

use std::path::PathBuf;

/// Directory name of generated proxies inside the domain tree.
pub const PROXY_DIR_NAME: &str = "Proxies";

/// Namespace used when none is configured and no domain is known.
pub const DEFAULT_PROXY_NAMESPACE: &str = "core::domain::proxies";

/// Marker separating the proxy namespace from the proxied entity.
pub const PROXY_MARKER: &str = "__CG__";

/// Where and how lazy-loading proxies are generated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyConfig {
    /// Output directory of generated proxy sources.
    pub directory: PathBuf,
    /// Namespace of generated proxy types.
    pub namespace: String,
    /// Regenerate proxies on demand instead of expecting them on disk.
    pub auto_generate: bool,
}

impl ProxyConfig {
    /// Create proxy settings.
    pub fn new(directory: impl Into<PathBuf>, namespace: impl Into<String>, auto_generate: bool) -> Self {
        Self {
            directory: directory.into(),
            namespace: namespace.into(),
            auto_generate,
        }
    }

    /// Default namespace for proxies of a domain.
    pub fn default_namespace(domain: &str) -> String {
        format!("core::domain::{}::proxies", domain.to_lowercase())
    }

    /// Fully qualified name of the proxy type for an entity.
    pub fn proxy_class_name(&self, entity: &str) -> String {
        format!("{}::{}{}", self.namespace, PROXY_MARKER, flatten(entity))
    }

    /// Source file of the proxy for an entity.
    pub fn proxy_file(&self, entity: &str) -> PathBuf {
        self.directory
            .join(format!("{}{}.rs", PROXY_MARKER, flatten(entity)))
    }
}

fn flatten(entity: &str) -> String {
    entity.replace(['\\', ':', '.'], "")
}
