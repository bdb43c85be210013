//! Configuration loading tests.
//!
//! These tests layer real files in a temporary config directory and
//! real environment variables, so they are serialized: the `DBGUARD__`
//! namespace is process-wide.

use dbguard::config::{self, ConfigError};
use serial_test::serial;
use std::env;
use std::fs;
use tempfile::TempDir;

/// Remove every DBGUARD-prefixed variable left over by another test.
fn clean_env_vars() {
    let keys: Vec<String> = env::vars()
        .filter(|(key, _)| key.starts_with("DBGUARD"))
        .map(|(key, _)| key)
        .collect();

    for key in keys {
        unsafe { env::remove_var(&key) };
    }
}

fn config_dir(files: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().unwrap();
    for (name, content) in files {
        fs::write(dir.path().join(name), content).unwrap();
    }
    dir
}

fn load(dir: &TempDir, environment: &str) -> Result<dbguard::config::DatabaseConfig, ConfigError> {
    config::load_from(dir.path().to_str().unwrap(), environment)
}

#[test]
#[serial]
fn defaults_when_nothing_is_present() {
    clean_env_vars();
    let dir = config_dir(&[]);

    let loaded = load(&dir, "development").unwrap();

    assert_eq!(loaded.host, "localhost");
    assert_eq!(loaded.port, 5432);
    assert_eq!(loaded.db, "app");
    assert_eq!(loaded.max_connections, Some(10));
}

#[test]
#[serial]
fn default_file_is_applied() {
    clean_env_vars();
    let dir = config_dir(&[(
        "default.toml",
        r#"
[database]
host = "db1.internal"
port = 6432
max_connections = 25
"#,
    )]);

    let loaded = load(&dir, "development").unwrap();

    assert_eq!(loaded.host, "db1.internal");
    assert_eq!(loaded.port, 6432);
    assert_eq!(loaded.max_connections, Some(25));
    assert_eq!(loaded.url(), "postgresql://db1.internal:6432/app");
}

#[test]
#[serial]
fn environment_file_overrides_defaults() {
    clean_env_vars();
    let dir = config_dir(&[
        (
            "default.toml",
            r#"
[database]
host = "db1.internal"
db = "accounts"
"#,
        ),
        (
            "production.toml",
            r#"
[database]
host = "db-prod.internal"
"#,
        ),
    ]);

    let loaded = load(&dir, "production").unwrap();

    assert_eq!(loaded.host, "db-prod.internal");
    // Non-overridden keys fall through to the default file.
    assert_eq!(loaded.db, "accounts");
}

#[test]
#[serial]
fn environment_variables_win_over_files() {
    clean_env_vars();
    let dir = config_dir(&[(
        "default.toml",
        r#"
[database]
host = "db1.internal"
"#,
    )]);

    unsafe { env::set_var("DBGUARD__DATABASE__HOST", "db-override.internal") };
    let loaded = load(&dir, "development");
    unsafe { env::remove_var("DBGUARD__DATABASE__HOST") };

    assert_eq!(loaded.unwrap().host, "db-override.internal");
}

#[test]
#[serial]
fn unbounded_sentinel_lifts_the_pool_cap() {
    clean_env_vars();
    let dir = config_dir(&[(
        "default.toml",
        r#"
[database]
max_connections = "unbounded"
"#,
    )]);

    let loaded = load(&dir, "development").unwrap();

    assert_eq!(loaded.max_connections, None);
    assert!(loaded.pool_options().max_connections.is_none());
}

#[test]
#[serial]
fn merged_result_is_validated() {
    clean_env_vars();
    let dir = config_dir(&[(
        "default.toml",
        r#"
[database]
host = ""
"#,
    )]);

    let err = load(&dir, "development").unwrap_err();

    assert!(matches!(err, ConfigError::ValidationError(_)));
    assert!(err.to_string().contains("database.host"));
}
