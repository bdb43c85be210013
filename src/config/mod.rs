//! Configuration loading and validation.
//!
//! Settings are layered the usual way: `config/default.toml`, then
//! `config/{APP_ENV}.toml`, then `DBGUARD__…` environment variables
//! (double underscore separating nested keys, e.g.
//! `DBGUARD__DATABASE__HOST`). The merged result is validated before it
//! is handed to the service.

mod database;

pub use database::{DatabaseConfig, UNBOUNDED};

use serde::Deserialize;
use thiserror::Error;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("configuration validation failed: {0}")]
    ValidationError(String),
}

/// Validation hook implemented by every config struct.
pub trait Validate {
    fn validate(&self) -> Result<(), ConfigError>;
}

#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    #[serde(default)]
    database: DatabaseConfig,
}

/// Load the database configuration from files and environment variables.
///
/// The environment name comes from `APP_ENV` (default `development`).
pub fn load() -> Result<DatabaseConfig, ConfigError> {
    let environment =
        std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());
    load_from("config", &environment)
}

/// Load from an explicit config directory and environment name.
pub fn load_from(dir: &str, environment: &str) -> Result<DatabaseConfig, ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name(&format!("{dir}/default")).required(false))
        .add_source(config::File::with_name(&format!("{dir}/{environment}")).required(false))
        .add_source(config::Environment::with_prefix("DBGUARD").separator("__"))
        .build()?;

    let loaded: FileConfig = settings.try_deserialize()?;
    loaded.database.validate()?;

    Ok(loaded.database)
}
