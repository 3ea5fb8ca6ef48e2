//! Recurring session keep-alive ping.
//!
//! While a blocking "operation in progress" dialog is open the server must
//! not expire the idle session, so the owning dialog runs one of these.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::api::AuthBackend;

/// Interval between keep-alive pings.
/// 30 s is well under typical server-side idle timeouts.
pub const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    Stopped,
    Scheduled,
}

/// Single recurring cancellable timer that pings `GET api/keep-alive-session`.
///
/// There is always exactly zero or one pending timer: `start()` cancels any
/// existing one before scheduling. A successful ping reschedules; a failed
/// ping stops the monitor and raises `ping_failed()` for the owner to
/// inspect — it is never retried and never opens UI of its own.
pub struct KeepAliveMonitor<B: AuthBackend> {
    backend: B,
    interval: Duration,
    state: Arc<Mutex<MonitorState>>,
    ping_failed: Arc<AtomicBool>,
    task: Option<JoinHandle<()>>,
}

impl<B: AuthBackend> KeepAliveMonitor<B> {
    pub fn new(backend: B) -> Self {
        Self::with_interval(backend, KEEP_ALIVE_INTERVAL)
    }

    /// Like `new`, with a custom ping interval.
    pub fn with_interval(backend: B, interval: Duration) -> Self {
        Self {
            backend,
            interval,
            state: Arc::new(Mutex::new(MonitorState::Stopped)),
            ping_failed: Arc::new(AtomicBool::new(false)),
            task: None,
        }
    }

    /// Schedule pinging. Idempotent: any pending timer is cancelled first,
    /// so two consecutive starts leave exactly one timer.
    pub fn start(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.ping_failed.store(false, Ordering::SeqCst);
        *self.state.lock() = MonitorState::Scheduled;

        let backend = self.backend.clone();
        let interval = self.interval;
        let state = Arc::clone(&self.state);
        let ping_failed = Arc::clone(&self.ping_failed);
        self.task = Some(tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;
                match backend.keep_alive().await {
                    Ok(()) => debug!("keep-alive ping ok"),
                    Err(e) => {
                        warn!(error = %e, "keep-alive ping failed, stopping monitor");
                        ping_failed.store(true, Ordering::SeqCst);
                        *state.lock() = MonitorState::Stopped;
                        break;
                    }
                }
            }
        }));
    }

    /// Cancel any pending timer. Safe to call repeatedly or when stopped.
    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        *self.state.lock() = MonitorState::Stopped;
    }

    pub fn state(&self) -> MonitorState {
        *self.state.lock()
    }

    /// Whether the monitor stopped because a ping failed.
    pub fn ping_failed(&self) -> bool {
        self.ping_failed.load(Ordering::SeqCst)
    }
}

impl<B: AuthBackend> Drop for KeepAliveMonitor<B> {
    // A dropped monitor must not leave a timer running.
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::AuthApiError;
    use crate::testutil::MockBackend;

    #[tokio::test]
    async fn test_start_twice_leaves_one_pending_timer() {
        let backend = MockBackend::new();
        let mut monitor = KeepAliveMonitor::with_interval(backend.clone(), Duration::from_millis(50));

        monitor.start();
        monitor.start();
        tokio::time::sleep(Duration::from_millis(120)).await;

        // One timer pings at ~50ms and ~100ms; a leaked second timer would
        // double the count.
        let calls = backend.keep_alive_calls();
        assert!((1..=2).contains(&calls), "unexpected ping count {}", calls);
        assert_eq!(monitor.state(), MonitorState::Scheduled);
    }

    #[tokio::test]
    async fn test_successful_ping_reschedules() {
        let backend = MockBackend::new();
        let mut monitor = KeepAliveMonitor::with_interval(backend.clone(), Duration::from_millis(10));

        monitor.start();
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert!(backend.keep_alive_calls() >= 2);
        assert_eq!(monitor.state(), MonitorState::Scheduled);
        assert!(!monitor.ping_failed());
    }

    #[tokio::test]
    async fn test_failed_ping_stops_without_retry() {
        let backend = MockBackend::new();
        backend.push_keep_alive_result(Ok(()));
        backend.push_keep_alive_result(Err(AuthApiError::Status(
            reqwest::StatusCode::UNAUTHORIZED,
        )));
        let mut monitor = KeepAliveMonitor::with_interval(backend.clone(), Duration::from_millis(10));

        monitor.start();
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(backend.keep_alive_calls(), 2);
        assert_eq!(monitor.state(), MonitorState::Stopped);
        assert!(monitor.ping_failed());

        // Stopped means stopped: no further pings show up.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(backend.keep_alive_calls(), 2);
    }

    #[tokio::test]
    async fn test_stop_is_idempotent() {
        let backend = MockBackend::new();
        let mut monitor = KeepAliveMonitor::with_interval(backend.clone(), Duration::from_millis(30));

        monitor.start();
        monitor.stop();
        monitor.stop();
        assert_eq!(monitor.state(), MonitorState::Stopped);

        tokio::time::sleep(Duration::from_millis(80)).await;
        assert_eq!(backend.keep_alive_calls(), 0);
    }

    #[tokio::test]
    async fn test_drop_cancels_pending_timer() {
        let backend = MockBackend::new();
        {
            let mut monitor =
                KeepAliveMonitor::with_interval(backend.clone(), Duration::from_millis(20));
            monitor.start();
        }
        tokio::time::sleep(Duration::from_millis(80)).await;
        assert_eq!(backend.keep_alive_calls(), 0);
    }
}
