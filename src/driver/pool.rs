//! The pooled-connection collaborator.
//!
//! Pooling itself is out of scope for this crate: a driver integration
//! brings its own pool and plugs it in through these two traits. The
//! layer above only ever configures a pool from [`PoolOptions`] and asks
//! it for connections.

use std::fmt;

use async_trait::async_trait;

use crate::driver::Connection;
use crate::error::DbError;

/// Configuration surface handed to the pool collaborator.
#[derive(Clone)]
pub struct PoolOptions {
    /// Driver identity, e.g. `postgres`.
    pub driver: String,
    /// Endpoint URL, e.g. `postgresql://db1.internal:5432/accounts`.
    pub url: String,
    /// Credentials.
    pub username: String,
    pub password: String,
    /// Pool ceiling; `None` leaves the pool uncapped.
    pub max_connections: Option<u32>,
}

impl fmt::Debug for PoolOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolOptions")
            .field("driver", &self.driver)
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("max_connections", &self.max_connections)
            .finish()
    }
}

/// Builds pools. Invoked once at startup and once per rebuild; every
/// invocation must produce a fully constructed, independent pool.
#[async_trait]
pub trait PoolProvider: Send + Sync + 'static {
    async fn build(&self, options: &PoolOptions) -> Result<Box<dyn Pool>, DbError>;
}

/// A live connection pool.
#[async_trait]
pub trait Pool: Send + Sync + 'static {
    /// Check a connection out of the pool.
    async fn acquire(&self) -> Result<Box<dyn Connection>, DbError>;
}
