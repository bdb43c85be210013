//! The recursive interception layer.
//!
//! Every object the application can reach from a database connection is
//! wrapped in a guarded decorator implementing the same role trait as
//! the raw object it holds. Each intercepted call:
//!
//! 1. fails fast with [`DbError::Unavailable`] while a pool rebuild is
//!    in flight; the raw object is never reached;
//! 2. otherwise forwards to the delegate;
//! 3. classifies any failure: network failures are logged, trigger the
//!    single shared rebuild and come back as [`DbError::Unavailable`];
//!    everything else propagates unchanged;
//! 4. re-wraps any connection-family result (statement, prepared or
//!    callable statement, metadata, result set) in the matching
//!    decorator before returning it.
//!
//! Because the decorators implement the traits they decorate, wrapping
//! is recursive by construction: a result set obtained through a
//! statement obtained through a guarded connection is still guarded. A
//! one-level wrapper around the connection alone would miss failures
//! surfacing later, while executing a statement or reading rows.
//!
//! [`DbError::Unavailable`]: crate::error::DbError::Unavailable

mod handles;

pub use handles::{
    GuardedCallableStatement, GuardedConnection, GuardedMetadata, GuardedPreparedStatement,
    GuardedResultSet, GuardedStatement,
};

use crate::database::ConnectionSource;
use crate::error::DbError;
use crate::resilience::{FailureKind, RebuildOutcome, ReconnectGuard, classify};

/// Shared state behind every guarded handle: the process-wide guard and
/// the reinitializable source it rebuilds.
#[derive(Debug)]
pub(crate) struct Reconnector {
    guard: ReconnectGuard,
    source: ConnectionSource,
}

impl Reconnector {
    pub(crate) fn new(source: ConnectionSource) -> Self {
        Self {
            guard: ReconnectGuard::new(),
            source,
        }
    }

    pub(crate) fn guard(&self) -> &ReconnectGuard {
        &self.guard
    }

    pub(crate) fn source(&self) -> &ConnectionSource {
        &self.source
    }

    /// Fail fast while a rebuild is in flight.
    pub(crate) fn ensure_available(&self) -> Result<(), DbError> {
        if self.guard.is_rebuilding() {
            return Err(DbError::Unavailable);
        }
        Ok(())
    }

    /// Route a failed call's error through the classifier.
    ///
    /// Network failures are absorbed here: the original error is logged,
    /// the pool is rebuilt (once, system-wide) and the caller gets
    /// [`DbError::Unavailable`] instead. Anything else is handed back
    /// untouched so the caller keeps the full diagnostic detail.
    pub(crate) async fn absorb(&self, error: DbError) -> DbError {
        match classify(&error) {
            FailureKind::Network => {
                tracing::warn!(
                    error = %error,
                    "network failure on database call, rebuilding connection pool"
                );
                match self.guard.rebuild(|| self.source.reinitialize()).await {
                    RebuildOutcome::Performed => {}
                    RebuildOutcome::Observed => {
                        tracing::debug!("joined in-flight pool rebuild");
                    }
                }
                DbError::Unavailable
            }
            FailureKind::Other => error,
        }
    }
}
