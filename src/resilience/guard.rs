//! Process-wide coordination of pool rebuilds.
//!
//! The guard owns a single shared `rebuilding` flag. While it is set, no
//! new connection handle is issued and no intercepted call reaches the
//! driver; everything fails fast with [`DbError::Unavailable`]. Exactly
//! one task may perform the rebuild at a time: ownership is decided with
//! a compare-and-set on the flag, so two tasks that both observe "not
//! rebuilding" can never both run the rebuild.
//!
//! [`DbError::Unavailable`]: crate::error::DbError::Unavailable

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Notify;

use crate::error::DbError;

/// Which role a caller played in a rebuild episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebuildOutcome {
    /// This caller won the election and executed the rebuild.
    Performed,
    /// Another task was already rebuilding; this caller waited for that
    /// rebuild to finish instead of starting a redundant one.
    Observed,
}

/// Shared flag plus completion signal for the single in-flight rebuild.
///
/// The flag is read with `Acquire` and written with `Release` ordering:
/// a task that sees `is_rebuilding() == false` after a rebuild is
/// guaranteed to also see the freshly swapped pool.
#[derive(Debug, Default)]
pub struct ReconnectGuard {
    rebuilding: AtomicBool,
    completed: Notify,
}

/// Clears the flag and wakes waiters on every exit path out of the
/// rebuild, including panic or cancellation of the rebuild future.
struct ClearOnExit<'a> {
    guard: &'a ReconnectGuard,
}

impl Drop for ClearOnExit<'_> {
    fn drop(&mut self) {
        self.guard.rebuilding.store(false, Ordering::Release);
        self.guard.completed.notify_waiters();
    }
}

impl ReconnectGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Non-blocking read of the shared flag.
    pub fn is_rebuilding(&self) -> bool {
        self.rebuilding.load(Ordering::Acquire)
    }

    /// Run `rebuild_fn` as the single system-wide rebuild, or wait for
    /// the rebuild already in flight.
    ///
    /// The winner of the compare-and-set election executes `rebuild_fn`
    /// with the flag held; the flag is cleared on the way out whether the
    /// rebuild succeeds or fails. Losers never run `rebuild_fn`; they
    /// wait until the in-flight rebuild completes.
    ///
    /// Either way, the triggering call site is expected to fail its
    /// caller with [`DbError::Unavailable`] afterwards: a rebuild never
    /// hands back a usable connection synchronously, retry policy belongs
    /// to the caller.
    pub async fn rebuild<F, Fut>(&self, rebuild_fn: F) -> RebuildOutcome
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<(), DbError>>,
    {
        if self
            .rebuilding
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!("pool rebuild already in flight, waiting for it to complete");
            self.wait_until_idle().await;
            return RebuildOutcome::Observed;
        }

        let _clear = ClearOnExit { guard: self };
        tracing::warn!("rebuilding connection pool");

        match rebuild_fn().await {
            Ok(()) => tracing::info!("connection pool rebuilt"),
            Err(error) => tracing::error!(error = %error, "connection pool rebuild failed"),
        }

        RebuildOutcome::Performed
    }

    /// Wait until no rebuild is in flight. Returns immediately if the
    /// flag is already clear.
    pub async fn wait_until_idle(&self) {
        loop {
            let notified = self.completed.notified();
            tokio::pin!(notified);
            // Register interest before re-checking the flag so a rebuild
            // finishing in between cannot be missed.
            notified.as_mut().enable();

            if !self.is_rebuilding() {
                return;
            }
            notified.await;
        }
    }
}
