//! Core error types.

use std::path::PathBuf;

use thiserror::Error;

/// Result alias for configuration and mapping operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while resolving a persistence configuration.
#[derive(Debug, Error)]
pub enum Error {
    /// Missing or empty required input.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The metadata driver selector is not one of the recognized kinds.
    #[error("unsupported metadata driver kind: {0}")]
    UnsupportedDriverKind(String),

    /// A domain directory does not exist under the domain root.
    #[error("domain path not found: {}", .0.display())]
    DomainPathNotFound(PathBuf),

    /// A type name is already registered with a different definition.
    #[error("type '{name}' already registered with handler '{existing}', refusing '{requested}'")]
    DuplicateType {
        /// Type name.
        name: String,
        /// Handler of the existing registration.
        existing: String,
        /// Handler of the rejected registration.
        requested: String,
    },

    /// A mapping refers to a type name the registry does not know.
    #[error("unknown type '{name}' in {}", .file.display())]
    UnknownType {
        /// Type name as written in the mapping.
        name: String,
        /// Mapping file.
        file: PathBuf,
    },

    /// A mapping file could not be parsed.
    #[error("invalid mapping in {}: {message}", .file.display())]
    Mapping {
        /// Mapping file.
        file: PathBuf,
        /// Parser message.
        message: String,
    },

    /// Configuration file could not be read.
    #[error("failed to read config file {}: {source}", .path.display())]
    ConfigRead {
        /// Config file path.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Configuration file is not valid TOML for [`crate::PersistenceConfig`].
    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Persistent cache storage error.
    #[error("storage error: {0}")]
    Storage(#[from] sled::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Deserialization error.
    #[error("deserialization error: {0}")]
    Deserialization(String),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Build a mapping error for the given file.
    pub(crate) fn mapping(file: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Error::Mapping {
            file: file.into(),
            message: message.into(),
        }
    }
}
