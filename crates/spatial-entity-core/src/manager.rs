//! Entity-manager collaborator.
//!
//! The entity manager itself lives outside this crate. A factory receives the
//! connection options and a [`ResolvedConfiguration`] and builds the manager.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::resolver::ResolvedConfiguration;

/// Database connection options handed to the entity-manager factory.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionOptions {
    /// Database driver name (e.g. `pdo_pgsql`, `sqlite`).
    pub driver: String,
    /// Connection URL. Takes precedence over the discrete fields.
    #[serde(default)]
    pub url: Option<String>,
    /// Server host.
    #[serde(default)]
    pub host: Option<String>,
    /// Server port.
    #[serde(default)]
    pub port: Option<u16>,
    /// Database name.
    #[serde(default)]
    pub dbname: Option<String>,
    /// User name.
    #[serde(default)]
    pub user: Option<String>,
    /// Password.
    #[serde(default)]
    pub password: Option<String>,
}

impl ConnectionOptions {
    /// Create options for a driver.
    pub fn new(driver: impl Into<String>) -> Self {
        Self {
            driver: driver.into(),
            ..Default::default()
        }
    }

    /// Set the connection URL.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Set host and port.
    pub fn with_host(mut self, host: impl Into<String>, port: u16) -> Self {
        self.host = Some(host.into());
        self.port = Some(port);
        self
    }

    /// Set the database name.
    pub fn with_dbname(mut self, dbname: impl Into<String>) -> Self {
        self.dbname = Some(dbname.into());
        self
    }

    /// Set the credentials.
    pub fn with_credentials(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self.password = Some(password.into());
        self
    }
}

impl fmt::Debug for ConnectionOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionOptions")
            .field("driver", &self.driver)
            .field("url", &self.url.as_ref().map(|_| "<redacted>"))
            .field("host", &self.host)
            .field("port", &self.port)
            .field("dbname", &self.dbname)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Builds entity managers from a resolved configuration.
pub trait EntityManagerFactory {
    /// Entity manager handle.
    type Manager;
    /// Error raised while building the manager.
    type Error;

    /// Create an entity manager.
    fn create(
        &self,
        options: &ConnectionOptions,
        config: &ResolvedConfiguration,
    ) -> Result<Self::Manager, Self::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_secrets() {
        let options = ConnectionOptions::new("pdo_pgsql")
            .with_url("postgres://app:hunter2@db/app")
            .with_credentials("app", "hunter2");

        let debug = format!("{options:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("pdo_pgsql"));
    }

    #[test]
    fn test_deserialize_minimal() {
        let options: ConnectionOptions =
            serde_json::from_str(r#"{"driver": "sqlite", "dbname": "app.db"}"#).unwrap();
        assert_eq!(options, ConnectionOptions::new("sqlite").with_dbname("app.db"));
    }
}
