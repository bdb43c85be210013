//! Resilience primitives for the self-healing database layer.
//!
//! Two pieces live here:
//!
//! - **Failure classification** ([`classify`]): decides whether a failure
//!   that surfaced through the proxy layer is a transient network failure
//!   (dropped or refused socket anywhere in its cause chain) or an
//!   ordinary database error.
//! - **Reconnection guard** ([`ReconnectGuard`]): the process-wide flag
//!   and compare-and-set election that make sure at most one pool rebuild
//!   runs at a time, while every other caller fails fast.
//!
//! # Example
//!
//! ```rust
//! use dbguard::resilience::{classify, FailureKind};
//! use std::io;
//!
//! let err = io::Error::new(io::ErrorKind::ConnectionRefused, "connection refused");
//! assert_eq!(classify(&err), FailureKind::Network);
//! ```

mod classify;
mod guard;

pub use classify::{FailureKind, classify};
pub use guard::{RebuildOutcome, ReconnectGuard};
