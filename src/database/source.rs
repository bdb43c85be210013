//! The reinitializable connection source.
//!
//! Wraps the pool collaborator and retains the options it was built
//! from, so a rebuild can reconstruct the pool without re-reading any
//! configuration. The live pool is held behind an `Arc` that is swapped
//! wholesale: concurrent acquires see either the old pool or the new
//! one, never a half-constructed one.

use std::fmt;
use std::sync::{Arc, RwLock};

use crate::driver::{Connection, Pool, PoolOptions, PoolProvider};
use crate::error::DbError;

pub struct ConnectionSource {
    provider: Box<dyn PoolProvider>,
    options: PoolOptions,
    pool: RwLock<Arc<dyn Pool>>,
}

impl ConnectionSource {
    /// Build the initial pool from `options`.
    pub async fn connect(
        provider: Box<dyn PoolProvider>,
        options: PoolOptions,
    ) -> Result<Self, DbError> {
        tracing::info!(options = ?options, "building connection pool");
        let pool = provider.build(&options).await?;

        Ok(Self {
            provider,
            options,
            pool: RwLock::new(Arc::from(pool)),
        })
    }

    /// Check a raw connection out of the current pool.
    pub async fn acquire(&self) -> Result<Box<dyn Connection>, DbError> {
        // Snapshot under the read lock, never hold it across the await.
        let pool = self.snapshot();
        pool.acquire().await
    }

    /// Discard the current pool identity and expose a freshly built one.
    ///
    /// The replacement is fully constructed before the swap; if building
    /// it fails, the previous pool stays exposed and the error is
    /// returned. The abandoned pool is dropped, not drained.
    pub async fn reinitialize(&self) -> Result<(), DbError> {
        tracing::info!(options = ?self.options, "reinitializing connection pool");
        let fresh = self.provider.build(&self.options).await?;

        *self.pool.write().unwrap() = Arc::from(fresh);
        Ok(())
    }

    /// The options every pool (initial and rebuilt) is constructed from.
    pub fn options(&self) -> &PoolOptions {
        &self.options
    }

    fn snapshot(&self) -> Arc<dyn Pool> {
        self.pool.read().unwrap().clone()
    }
}

impl fmt::Debug for ConnectionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionSource")
            .field("options", &self.options)
            .finish()
    }
}
