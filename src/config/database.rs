use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::{ConfigError, Validate};
use crate::driver::PoolOptions;

/// Sentinel accepted in config files for an uncapped pool.
pub const UNBOUNDED: &str = "unbounded";

/// Database endpoint and pool configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Driver identity handed to the pool collaborator.
    #[serde(default = "default_driver")]
    pub driver: String,
    /// URL scheme of the endpoint, e.g. `postgresql`.
    #[serde(default = "default_vendor")]
    pub vendor: String,
    /// Endpoint host.
    #[serde(default = "default_host")]
    pub host: String,
    /// Endpoint port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Database name.
    #[serde(default = "default_db")]
    pub db: String,
    /// Credentials.
    #[serde(default = "default_username")]
    pub username: String,
    #[serde(default)]
    pub password: String,
    /// Pool ceiling: a connection count, or the string `"unbounded"` to
    /// leave the pool uncapped.
    #[serde(
        default = "default_max_connections",
        deserialize_with = "de_max_connections",
        serialize_with = "ser_max_connections"
    )]
    pub max_connections: Option<u32>,
}

impl DatabaseConfig {
    /// Endpoint URL, `{vendor}://{host}:{port}/{db}`.
    pub fn url(&self) -> String {
        format!("{}://{}:{}/{}", self.vendor, self.host, self.port, self.db)
    }

    /// The options handed to the pool collaborator, both at startup and
    /// on every rebuild.
    pub fn pool_options(&self) -> PoolOptions {
        PoolOptions {
            driver: self.driver.clone(),
            url: self.url(),
            username: self.username.clone(),
            password: self.password.clone(),
            max_connections: self.max_connections,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            driver: default_driver(),
            vendor: default_vendor(),
            host: default_host(),
            port: default_port(),
            db: default_db(),
            username: default_username(),
            password: String::new(),
            max_connections: default_max_connections(),
        }
    }
}

impl Validate for DatabaseConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.driver.is_empty() {
            return Err(ConfigError::ValidationError(
                "database.driver cannot be empty".to_string(),
            ));
        }
        if self.vendor.is_empty() {
            return Err(ConfigError::ValidationError(
                "database.vendor cannot be empty".to_string(),
            ));
        }
        if self.host.is_empty() {
            return Err(ConfigError::ValidationError(
                "database.host cannot be empty".to_string(),
            ));
        }
        if self.port == 0 {
            return Err(ConfigError::ValidationError(
                "database.port must be > 0".to_string(),
            ));
        }
        if self.db.is_empty() {
            return Err(ConfigError::ValidationError(
                "database.db cannot be empty".to_string(),
            ));
        }
        if self.max_connections == Some(0) {
            return Err(ConfigError::ValidationError(
                "database.max_connections must be > 0 or \"unbounded\"".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_driver() -> String {
    "postgres".to_string()
}

fn default_vendor() -> String {
    "postgresql".to_string()
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    5432
}

fn default_db() -> String {
    "app".to_string()
}

fn default_username() -> String {
    "postgres".to_string()
}

fn default_max_connections() -> Option<u32> {
    Some(10)
}

fn de_max_connections<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Count(u32),
        Sentinel(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Count(count) => Ok(Some(count)),
        Raw::Sentinel(word) if word == UNBOUNDED => Ok(None),
        Raw::Sentinel(word) => Err(D::Error::custom(format!(
            "expected a connection count or \"{UNBOUNDED}\", got \"{word}\""
        ))),
    }
}

fn ser_max_connections<S>(value: &Option<u32>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match value {
        Some(count) => serializer.serialize_u32(*count),
        None => serializer.serialize_str(UNBOUNDED),
    }
}
