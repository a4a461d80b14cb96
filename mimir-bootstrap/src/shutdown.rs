// /////////////////////////////////////////////////////////////////////////////
// Mimir Pipeline Platform
// Licensed under the BSD-3-Clause license.
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Cooperative Cancellation and Shutdown Coordination
//!
//! [`CancellationScope`] is the handle passed into every step execution and
//! down into every suspension point (broker pop, DB query, plugin I/O). It
//! is cooperative: a scope that is cancelled does not forcibly interrupt
//! in-flight work, it only flips a flag and wakes anyone waiting on it.
//!
//! [`ShutdownCoordinator`] owns the scope for an entire worker process and
//! adds a grace period: `ready -> draining` cancels the scope but lets
//! in-flight tasks keep running for up to `grace_period` before the process
//! considers shutdown complete regardless.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;

pub const DEFAULT_GRACE_PERIOD_SECS: u64 = 5;

/// Lightweight, clonable cooperative-cancellation handle.
#[derive(Clone)]
pub struct CancellationScope {
    cancelled: Arc<AtomicBool>,
    notify: Arc<Notify>,
}

impl Default for CancellationScope {
    fn default() -> Self {
        Self::new()
    }
}

impl CancellationScope {
    pub fn new() -> Self {
        Self { cancelled: Arc::new(AtomicBool::new(false)), notify: Arc::new(Notify::new()) }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Resolves immediately if already cancelled; otherwise waits.
    pub async fn cancelled(&self) {
        if self.is_cancelled() {
            return;
        }
        self.notify.notified().await;
    }
}

/// Owns the cancellation scope for a whole worker process and coordinates
/// the `ready -> draining -> stopped` transition.
#[derive(Clone)]
pub struct ShutdownCoordinator {
    scope: CancellationScope,
    grace_period: Duration,
    shutdown_initiated: Arc<AtomicBool>,
    shutdown_complete: Arc<Notify>,
}

impl ShutdownCoordinator {
    pub fn new(grace_period: Duration) -> Self {
        Self {
            scope: CancellationScope::new(),
            grace_period,
            shutdown_initiated: Arc::new(AtomicBool::new(false)),
            shutdown_complete: Arc::new(Notify::new()),
        }
    }

    pub fn scope(&self) -> CancellationScope {
        self.scope.clone()
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutdown_initiated.load(Ordering::SeqCst)
    }

    /// `ready -> draining`: stop popping new tasks, let in-flight ones
    /// finish within the grace window.
    pub fn initiate_shutdown(&self) {
        if self.shutdown_initiated.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst).is_ok() {
            tracing::info!(grace_period_secs = self.grace_period.as_secs(), "initiating graceful shutdown");
            self.scope.cancel();
        }
    }

    /// Marks `draining -> stopped`: all in-flight tasks finished.
    pub fn mark_complete(&self) {
        self.shutdown_complete.notify_waiters();
    }

    /// Waits for `mark_complete` or the grace period, whichever comes
    /// first. Returns `true` if shutdown completed gracefully, `false` if
    /// the grace period expired first.
    pub async fn wait_for_shutdown(&self) -> bool {
        tokio::select! {
            _ = self.shutdown_complete.notified() => true,
            _ = tokio::time::sleep(self.grace_period) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn cancellation_resolves_after_cancel() {
        let scope = CancellationScope::new();
        let waiter = scope.clone();
        let handle = tokio::spawn(async move {
            waiter.cancelled().await;
        });
        scope.cancel();
        tokio::time::timeout(Duration::from_secs(1), handle).await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn coordinator_reports_grace_timeout() {
        let coordinator = ShutdownCoordinator::new(Duration::from_millis(20));
        coordinator.initiate_shutdown();
        assert!(!coordinator.wait_for_shutdown().await);
    }

    #[tokio::test]
    async fn coordinator_reports_graceful_completion() {
        let coordinator = ShutdownCoordinator::new(Duration::from_secs(5));
        coordinator.initiate_shutdown();
        coordinator.mark_complete();
        assert!(coordinator.wait_for_shutdown().await);
    }
}
