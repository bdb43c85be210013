//! Database access: the reinitializable connection source, the
//! application-facing persistence service and row mapping support.
//!
//! # Example
//!
//! ```rust,no_run
//! use dbguard::config::DatabaseConfig;
//! use dbguard::database::PersistenceService;
//! use dbguard::driver::Connection;
//! use dbguard::testing::MockProvider;
//!
//! # async fn example() -> Result<(), dbguard::DbError> {
//! let service =
//!     PersistenceService::connect(Box::new(MockProvider::new()), DatabaseConfig::default())
//!         .await?;
//!
//! let mut conn = service.get_connection().await?;
//! let _statement = conn.create_statement().await?;
//! // A dropped socket anywhere below this point rebuilds the pool and
//! // surfaces as DbError::Unavailable.
//! # Ok(())
//! # }
//! ```

mod row;
mod service;
mod source;

pub use row::{
    RowMapError, RowMapper, bool_cell, i64_cell, i64_list, map_rows, string_cell, string_list,
};
pub use service::{
    PersistenceService, close_connection, close_result_set, close_statement, release_connection,
    release_result_set, release_statement,
};
pub use source::ConnectionSource;
