//! Driver-side abstractions.
//!
//! One object-safe async trait per connection-family role, mirroring what
//! a SQL driver hands out: connection, statement, prepared statement,
//! callable statement, database metadata and result set. A driver
//! integration implements these; everything above them (the guarded
//! decorators, the persistence service) only ever talks to the traits.
//!
//! Bind parameters and column values travel as [`serde_json::Value`] so
//! the traits stay object-safe and driver-neutral.

mod pool;

pub use pool::{Pool, PoolOptions, PoolProvider};

use async_trait::async_trait;
use serde_json::Value;

use crate::error::DbError;

/// A single database connection checked out of the pool.
///
/// Statement- and metadata-producing operations return boxed trait
/// objects so implementations can be wrapped transparently.
#[async_trait]
pub trait Connection: Send + Sync {
    /// Create a plain statement for ad-hoc SQL.
    async fn create_statement(&mut self) -> Result<Box<dyn Statement>, DbError>;

    /// Prepare a parameterized statement.
    async fn prepare_statement(&mut self, sql: &str) -> Result<Box<dyn PreparedStatement>, DbError>;

    /// Prepare a stored-procedure call.
    async fn prepare_call(&mut self, sql: &str) -> Result<Box<dyn CallableStatement>, DbError>;

    /// Metadata describing the connected database.
    async fn metadata(&mut self) -> Result<Box<dyn DatabaseMetadata>, DbError>;

    /// Whether the connection has already been closed.
    async fn is_closed(&self) -> Result<bool, DbError>;

    /// Return the connection to the pool.
    async fn close(&mut self) -> Result<(), DbError>;
}

/// A statement executing ad-hoc SQL.
#[async_trait]
pub trait Statement: Send + Sync {
    /// Run a query and return its result set.
    async fn execute_query(&mut self, sql: &str) -> Result<Box<dyn ResultSet>, DbError>;

    /// Run a DML/DDL statement and return the affected row count.
    async fn execute_update(&mut self, sql: &str) -> Result<u64, DbError>;

    /// Release the statement.
    async fn close(&mut self) -> Result<(), DbError>;
}

impl std::fmt::Debug for dyn Statement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Statement")
    }
}

/// A statement prepared once and executed with bound parameters.
#[async_trait]
pub trait PreparedStatement: Statement {
    /// Bind a parameter by 1-based position.
    fn bind(&mut self, index: usize, value: Value) -> Result<(), DbError>;

    /// Execute the prepared query with the currently bound parameters.
    async fn query(&mut self) -> Result<Box<dyn ResultSet>, DbError>;

    /// Execute the prepared update with the currently bound parameters.
    async fn update(&mut self) -> Result<u64, DbError>;
}

/// A prepared call to a stored procedure, with out-parameter access.
#[async_trait]
pub trait CallableStatement: PreparedStatement {
    /// Register a 1-based out parameter before execution.
    fn register_out(&mut self, index: usize) -> Result<(), DbError>;

    /// Read a registered out parameter after execution.
    fn out_value(&self, index: usize) -> Result<Value, DbError>;
}

/// Metadata about the connected database. Metadata lookups can hit the
/// server, so the row-returning ones are async and fallible like any
/// other driver call.
#[async_trait]
pub trait DatabaseMetadata: Send + Sync {
    /// Product name reported by the server.
    async fn product_name(&mut self) -> Result<String, DbError>;

    /// Product version reported by the server.
    async fn product_version(&mut self) -> Result<String, DbError>;

    /// Tables matching the given name pattern, as a result set.
    async fn tables(&mut self, name_pattern: &str) -> Result<Box<dyn ResultSet>, DbError>;
}

/// A forward-only cursor over query results.
#[async_trait]
pub trait ResultSet: Send + Sync {
    /// Advance to the next row. Returns `false` once exhausted.
    async fn next(&mut self) -> Result<bool, DbError>;

    /// Read a column of the current row by 0-based position.
    fn get(&self, index: usize) -> Result<Value, DbError>;

    /// Release the cursor.
    async fn close(&mut self) -> Result<(), DbError>;
}

impl std::fmt::Debug for dyn ResultSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ResultSet")
    }
}
