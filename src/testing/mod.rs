//! Test support: a scripted in-memory driver.
//!
//! The mock implements the full collaborator surface (pool provider,
//! pool, every connection-family role) around a shared [`DriverScript`]
//! that tests use to plan failures, can rows and observe what the layer
//! actually did (pools built, statements created, closes attempted).
//!
//! Kept in the crate proper, not behind `cfg(test)`, so integration
//! tests under `tests/` can drive the real service against it.

mod driver;

pub use driver::{DriverScript, MockProvider, SqlFailure};

use std::io;

use crate::driver::PoolOptions;
use crate::error::DbError;

/// Pool options used throughout the test suites.
pub fn options() -> PoolOptions {
    PoolOptions {
        driver: "mock".into(),
        url: "mock://db1.internal:5432/app".into(),
        username: "app".into(),
        password: "secret".into(),
        max_connections: Some(10),
    }
}

/// A dropped socket, as a driver failure.
pub fn socket_reset() -> DbError {
    DbError::driver(io::Error::new(
        io::ErrorKind::ConnectionReset,
        "connection reset by peer",
    ))
}

/// A refused connection, as a pool acquisition failure.
pub fn connection_refused() -> DbError {
    DbError::acquire(io::Error::new(
        io::ErrorKind::ConnectionRefused,
        "connection refused",
    ))
}

/// A driver failure whose socket cause is buried two levels deep,
/// exercising the classifier's chain walk.
pub fn wrapped_socket_failure(message: &str) -> DbError {
    let socket = io::Error::new(io::ErrorKind::ConnectionAborted, "connection aborted");
    let stream = SqlFailure::caused_by("protocol stream broke", socket);
    DbError::driver(SqlFailure::caused_by(message, stream))
}

/// An ordinary SQL failure with no network cause anywhere in its chain.
pub fn sql_failure(message: &str) -> DbError {
    DbError::driver(SqlFailure::new(message))
}
