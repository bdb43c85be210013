//! Self-healing access layer between application code and a pooled SQL
//! connection source.
//!
//! Every object reachable from a connection handed out by
//! [`PersistenceService`] (statements, prepared and callable statements,
//! metadata, result sets) is wrapped in a guarded decorator that
//! intercepts each call. A transient network failure anywhere in
//! that tree triggers exactly one rebuild of the underlying pool and
//! surfaces as [`DbError::Unavailable`]; while the rebuild is in flight
//! every caller fails fast with the same error. Non-network failures
//! pass through untouched.
//!
//! The pool itself is an external collaborator: a driver integration
//! implements [`driver::PoolProvider`] and the role traits in
//! [`driver`], and plugs in through [`PersistenceService::connect`].
//!
//! # Example
//!
//! ```rust,no_run
//! use dbguard::config::DatabaseConfig;
//! use dbguard::driver::{Connection, Statement};
//! use dbguard::testing::MockProvider;
//! use dbguard::{DbError, PersistenceService};
//!
//! # async fn example() -> Result<(), DbError> {
//! let service =
//!     PersistenceService::connect(Box::new(MockProvider::new()), DatabaseConfig::default())
//!         .await?;
//!
//! let mut conn = service.get_connection().await?;
//! let mut statement = conn.create_statement().await?;
//!
//! match statement.execute_query("SELECT id FROM accounts").await {
//!     Ok(_rows) => { /* read rows */ }
//!     Err(DbError::Unavailable) => { /* pool was rebuilt, re-acquire */ }
//!     Err(other) => return Err(other),
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod database;
pub mod driver;
pub mod error;
pub mod proxy;
pub mod resilience;

// Testing utilities (always available for integration tests)
pub mod testing;

// Re-export commonly used types for convenience
pub use database::{
    ConnectionSource, PersistenceService, RowMapError, RowMapper, close_connection,
    close_result_set, close_statement, map_rows, release_connection, release_result_set,
    release_statement,
};
pub use error::{BoxError, DbError};
pub use proxy::GuardedConnection;
pub use resilience::{FailureKind, RebuildOutcome, ReconnectGuard, classify};
