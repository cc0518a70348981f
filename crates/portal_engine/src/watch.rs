//! The job watch: an owned, cancellable poller for the remote job status.
//!
//! A watch exists only as the [`JobWatch`] value returned by
//! [`JobWatch::start`]. Stopping it, or dropping it, cancels the poll loop;
//! there is no ambient poller to leak.

use std::sync::{mpsc, Arc};
use std::time::Duration;

use portal_core::JobStatus;
use portal_logging::{portal_debug, portal_info, portal_warn};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::client::JobClient;
use crate::types::EngineEvent;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchPolicy {
    pub interval: Duration,
    /// Consecutive transport failures tolerated before giving up. `None`
    /// polls until the remote answers or the watch is stopped.
    pub max_consecutive_failures: Option<u32>,
}

impl Default for WatchPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
            max_consecutive_failures: None,
        }
    }
}

pub trait WatchSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

pub struct ChannelSink {
    tx: mpsc::Sender<EngineEvent>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl WatchSink for ChannelSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}

/// How a watch ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchOutcome {
    /// The remote went idle.
    Completed,
    /// The remote reported `status: "error"`.
    RemoteError { message: String },
    /// Protocol violation or failure cap reached.
    Aborted { message: String },
    Stopped,
}

pub struct JobWatch {
    cancel: CancellationToken,
    task: Option<JoinHandle<WatchOutcome>>,
}

impl JobWatch {
    /// Spawns the poll loop on `runtime`. The first probe happens one
    /// interval after start.
    pub fn start(
        runtime: &Handle,
        client: Arc<dyn JobClient>,
        policy: WatchPolicy,
        sink: Arc<dyn WatchSink>,
    ) -> Self {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        portal_info!(
            "Watch started interval_ms={} max_failures={:?}",
            policy.interval.as_millis(),
            policy.max_consecutive_failures
        );
        let task = runtime.spawn(async move {
            let outcome = run_watch(client.as_ref(), &policy, sink.as_ref(), &token).await;
            portal_debug!("Watch ended: {:?}", outcome);
            outcome
        });
        Self {
            cancel,
            task: Some(task),
        }
    }

    /// Cancels the poll loop. Calling it again, or after the loop ended on
    /// its own, does nothing.
    pub fn stop(&mut self) {
        if !self.cancel.is_cancelled() {
            portal_debug!("Watch stop requested");
            self.cancel.cancel();
        }
    }

    pub fn is_active(&self) -> bool {
        !self.cancel.is_cancelled()
            && self
                .task
                .as_ref()
                .is_some_and(|task| !task.is_finished())
    }

    /// Waits for the loop to end and reports why it did.
    pub async fn wait(mut self) -> WatchOutcome {
        match self.task.take() {
            Some(task) => task.await.unwrap_or_else(|err| WatchOutcome::Aborted {
                message: err.to_string(),
            }),
            None => WatchOutcome::Stopped,
        }
    }
}

impl Drop for JobWatch {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn run_watch(
    client: &dyn JobClient,
    policy: &WatchPolicy,
    sink: &dyn WatchSink,
    cancel: &CancellationToken,
) -> WatchOutcome {
    let mut failures: u32 = 0;
    loop {
        tokio::select! {
            _ = cancel.cancelled() => return WatchOutcome::Stopped,
            _ = tokio::time::sleep(policy.interval) => {}
        }

        let result = tokio::select! {
            _ = cancel.cancelled() => return WatchOutcome::Stopped,
            result = client.probe_status() => result,
        };
        // A stop that raced the probe wins; no event after stop.
        if cancel.is_cancelled() {
            return WatchOutcome::Stopped;
        }

        match result {
            Ok(status) => {
                failures = 0;
                sink.emit(EngineEvent::StatusProbed(status.clone()));
                match status {
                    JobStatus::Processing => {}
                    JobStatus::Idle => return WatchOutcome::Completed,
                    JobStatus::Error { message } => return WatchOutcome::RemoteError { message },
                }
            }
            Err(err) if err.kind.is_terminal_for_watch() => {
                portal_warn!("Watch aborted ({}): {}", err.kind, err.message);
                sink.emit(EngineEvent::WatchAborted {
                    message: err.message.clone(),
                });
                return WatchOutcome::Aborted {
                    message: err.message,
                };
            }
            Err(err) => {
                failures += 1;
                portal_warn!(
                    "Status probe failed ({} consecutive, {}): {}",
                    failures,
                    err.kind,
                    err.message
                );
                if policy
                    .max_consecutive_failures
                    .is_some_and(|max| failures >= max)
                {
                    let message = format!(
                        "Lost contact with the server after {failures} failed status checks: {}",
                        err.message
                    );
                    sink.emit(EngineEvent::WatchAborted {
                        message: message.clone(),
                    });
                    return WatchOutcome::Aborted { message };
                }
            }
        }
    }
}
