//! Crate-wide error types for the database access layer.

use thiserror::Error;

/// Boxed error kept as a `#[source]` so the failure classifier can walk
/// the full cause chain of whatever the driver reported.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Error surfaced by pool, driver and proxy operations.
#[derive(Debug, Error)]
pub enum DbError {
    /// Raised by this layer whenever a call arrives during (or is the
    /// trigger of) a pool rebuild. Callers never see the underlying
    /// network error, only this.
    #[error("database connection unavailable")]
    Unavailable,

    /// The pool collaborator failed to hand out a connection.
    #[error("failed to acquire connection: {0}")]
    Acquire(#[source] BoxError),

    /// Failure reported by the underlying driver while executing an
    /// operation. Propagated verbatim unless classified as a network
    /// failure.
    #[error("driver error: {0}")]
    Driver(#[source] BoxError),

    /// The pool or driver configuration was rejected.
    #[error("invalid database configuration: {0}")]
    Config(String),
}

impl DbError {
    /// Wrap a driver-reported failure, keeping its cause chain intact.
    pub fn driver<E>(err: E) -> Self
    where
        E: Into<BoxError>,
    {
        DbError::Driver(err.into())
    }

    /// Wrap a pool acquisition failure, keeping its cause chain intact.
    pub fn acquire<E>(err: E) -> Self
    where
        E: Into<BoxError>,
    {
        DbError::Acquire(err.into())
    }

    /// True for the synthetic fail-fast error raised by this layer.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, DbError::Unavailable)
    }
}
