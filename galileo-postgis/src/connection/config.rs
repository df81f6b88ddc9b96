use serde::{Deserialize, Serialize};

use crate::error::PostgisError;

/// Configuration of a database connection.
///
/// ```
/// use galileo_postgis::connection::ConnectionConfig;
///
/// let config = ConnectionConfig::from_json(r#"{"driver": "pgsql", "database": "gis", "prefix": "app_"}"#)?;
/// assert_eq!(config.driver, "pgsql");
/// assert_eq!(config.prefix, "app_");
/// # Ok::<(), galileo_postgis::error::PostgisError>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Name of the driver, e.g. `pgsql`.
    pub driver: String,
    /// Name of the database.
    #[serde(default)]
    pub database: String,
    /// Prefix added to all table names.
    #[serde(default)]
    pub prefix: String,
    /// Driver specific options.
    #[serde(default)]
    pub options: serde_json::Map<String, serde_json::Value>,
}

impl ConnectionConfig {
    /// Creates a configuration without a table prefix and options.
    pub fn new(driver: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            driver: driver.into(),
            database: database.into(),
            ..Default::default()
        }
    }

    /// Sets the table prefix.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Parses the configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self, PostgisError> {
        Ok(serde_json::from_str(json)?)
    }
}
