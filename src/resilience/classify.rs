//! Failure classification for intercepted database calls.
//!
//! Every failure that surfaces through the proxy layer is classified
//! exactly once: either it is a transient network failure (a dropped or
//! refused socket somewhere in its cause chain) and the connection pool
//! must be rebuilt, or it is an ordinary database error that the caller
//! should see untouched.

use std::error::Error;
use std::io;

/// How many `source()` links the classifier will follow before giving
/// up. Cause chains are expected to terminate well before this; the
/// bound keeps a malformed cyclic chain from looping forever.
const MAX_CAUSE_DEPTH: usize = 32;

/// Outcome of classifying a single failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Socket-level connectivity failure. Triggers a pool rebuild; the
    /// caller observes `DbError::Unavailable` instead of the raw error.
    Network,
    /// Anything else (constraint violations, syntax errors, timeouts).
    /// Propagated to the caller unchanged.
    Other,
}

/// Classify a failure by walking its cause chain.
///
/// The walk is a pure read: no logging, no state. An error counts as
/// `Network` if the error itself, or any cause reachable through
/// [`Error::source`], is an [`io::Error`] with a socket-connectivity or
/// connection-refused kind.
pub fn classify(error: &(dyn Error + 'static)) -> FailureKind {
    let mut current = Some(error);
    let mut depth = 0;

    while let Some(err) = current {
        if depth >= MAX_CAUSE_DEPTH {
            break;
        }
        if let Some(io_err) = err.downcast_ref::<io::Error>() {
            if is_network_kind(io_err.kind()) {
                return FailureKind::Network;
            }
        }
        current = err.source();
        depth += 1;
    }

    FailureKind::Other
}

/// Socket-connectivity kinds. Deliberately excludes `TimedOut`: a slow
/// server is not a dropped one, and rebuilding the pool for it would
/// discard healthy in-flight connections.
fn is_network_kind(kind: io::ErrorKind) -> bool {
    matches!(
        kind,
        io::ErrorKind::ConnectionRefused
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::NotConnected
            | io::ErrorKind::BrokenPipe
            | io::ErrorKind::HostUnreachable
            | io::ErrorKind::NetworkUnreachable
            | io::ErrorKind::NetworkDown
    )
}
