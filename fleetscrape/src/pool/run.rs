//! Result stream of a running collection.

use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

use futures_core::Stream;
use futures_util::StreamExt;
use serde::Serialize;
use tokio::sync::mpsc;

use crate::driver::{DeviceResult, SessionRegistry};
use crate::error::FailureKind;

/// Run-level counts, accumulated while results are drained.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Devices submitted.
    pub total: usize,

    /// Devices whose session completed.
    pub succeeded: usize,

    /// Devices whose session failed.
    pub failed: usize,

    /// Failed devices that could not be reached or logged into.
    pub connection_failures: usize,

    /// Failed devices that ran out of time.
    pub timeouts: usize,

    /// Commands with a per-command anomaly on completed devices.
    pub command_errors: usize,
}

impl RunSummary {
    fn record(&mut self, result: &DeviceResult) {
        if result.success {
            self.succeeded += 1;
            self.command_errors += result.command_errors();
        } else {
            self.failed += 1;
            match result.failure {
                Some(FailureKind::Connection) => self.connection_failures += 1,
                Some(FailureKind::Timeout) => self.timeouts += 1,
                None => {}
            }
        }
    }

    /// Devices with a result so far.
    pub fn completed(&self) -> usize {
        self.succeeded + self.failed
    }
}

impl std::fmt::Display for RunSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} devices: {} succeeded, {} failed ({} connection, {} timeout), {} command errors",
            self.total,
            self.succeeded,
            self.failed,
            self.connection_failures,
            self.timeouts,
            self.command_errors
        )
    }
}

/// Handle to a running collection.
///
/// Yields one [`DeviceResult`] per device, in completion order, and ends once
/// every worker has exited. Dropping the handle stops draining; sessions
/// already in flight still finish or time out on their own.
#[derive(Debug)]
pub struct RunHandle {
    results: mpsc::Receiver<DeviceResult>,
    summary: RunSummary,
    registry: SessionRegistry,
    started: Instant,
}

impl RunHandle {
    pub(crate) fn new(
        results: mpsc::Receiver<DeviceResult>,
        total: usize,
        registry: SessionRegistry,
    ) -> Self {
        Self {
            results,
            summary: RunSummary {
                total,
                ..Default::default()
            },
            registry,
            started: Instant::now(),
        }
    }

    /// Next device result, or `None` when the run is complete.
    pub async fn next(&mut self) -> Option<DeviceResult> {
        let result = self.results.recv().await?;
        self.summary.record(&result);
        Some(result)
    }

    /// Drain every remaining result.
    pub async fn collect_all(&mut self) -> Vec<DeviceResult> {
        self.by_ref().collect().await
    }

    /// Counts over the results drained so far.
    pub fn summary(&self) -> &RunSummary {
        &self.summary
    }

    /// Sessions of this run.
    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    /// Time since the run started.
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

impl Stream for RunHandle {
    type Item = DeviceResult;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        match self.results.poll_recv(cx) {
            Poll::Ready(Some(result)) => {
                self.summary.record(&result);
                Poll::Ready(Some(result))
            }
            Poll::Ready(None) => Poll::Ready(None),
            Poll::Pending => Poll::Pending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::CommandBatch;
    use crate::device::{DeviceProfile, OsFamily};
    use crate::error::SessionError;

    fn ok(name: &str) -> DeviceResult {
        DeviceResult::completed(
            DeviceProfile::new(name, "10.0.0.1", OsFamily::IosXe),
            Vec::new(),
            Duration::ZERO,
        )
    }

    fn timed_out(name: &str) -> DeviceResult {
        let error = SessionError::Timeout {
            host: name.to_string(),
            timeout: Duration::from_secs(1),
        };
        DeviceResult::failed(
            DeviceProfile::new(name, "10.0.0.2", OsFamily::IosXr),
            &CommandBatch::new(["show clock"]),
            &error,
            Duration::from_secs(1),
        )
    }

    #[tokio::test]
    async fn test_summary_accumulates_while_draining() {
        let (tx, rx) = mpsc::channel(4);
        let mut handle = RunHandle::new(rx, 3, SessionRegistry::new());

        tx.send(ok("r1")).await.unwrap();
        tx.send(timed_out("r2")).await.unwrap();
        tx.send(ok("r3")).await.unwrap();
        drop(tx);

        let first = handle.next().await.unwrap();
        assert_eq!(first.device.hostname, "r1");
        assert_eq!(handle.summary().completed(), 1);

        let rest = handle.collect_all().await;
        assert_eq!(rest.len(), 2);

        let summary = handle.summary();
        assert_eq!(summary.total, 3);
        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.timeouts, 1);
        assert!(handle.next().await.is_none());
    }

    #[test]
    fn test_summary_display() {
        let summary = RunSummary {
            total: 3,
            succeeded: 2,
            failed: 1,
            connection_failures: 1,
            timeouts: 0,
            command_errors: 4,
        };
        assert_eq!(
            summary.to_string(),
            "3 devices: 2 succeeded, 1 failed (1 connection, 0 timeout), 4 command errors"
        );
    }
}
