use serde::{Deserialize, Serialize};
use telemetry_core::SessionState;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch};
use tracing::warn;

/// How long a start or stop request waits for the driver to answer.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(2);

/// Result reported back to whoever asked for a start or stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommandOutcome {
    Success,
    Failure,
}

impl CommandOutcome {
    pub fn is_success(self) -> bool {
        self == CommandOutcome::Success
    }
}

impl<E> From<Result<(), E>> for CommandOutcome {
    fn from(result: Result<(), E>) -> Self {
        match result {
            Ok(()) => CommandOutcome::Success,
            Err(_) => CommandOutcome::Failure,
        }
    }
}

/// Snapshot of the driver as seen by the command surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverStatus {
    pub connected: bool,
    pub state: SessionState,
    pub interval: i32,
}

/// Requests handled one at a time by the driver loop.
#[derive(Debug)]
pub enum Command {
    Start {
        interval: i32,
        reply: oneshot::Sender<CommandOutcome>,
    },
    Stop {
        reply: oneshot::Sender<CommandOutcome>,
    },
}

/// Cloneable front door to a running driver.
///
/// Status is read from a watch channel the driver publishes to, so it
/// answers even while the driver is blocked on a device read.
#[derive(Debug, Clone)]
pub struct DriverHandle {
    tx: mpsc::Sender<Command>,
    status: watch::Receiver<DriverStatus>,
    timeout: Duration,
}

impl DriverHandle {
    /// Create a handle and the receiver the driver should consume.
    pub fn channel(
        buffer: usize,
        status: watch::Receiver<DriverStatus>,
    ) -> (Self, mpsc::Receiver<Command>) {
        let (tx, rx) = mpsc::channel(buffer);
        let handle = Self {
            tx,
            status,
            timeout: DEFAULT_COMMAND_TIMEOUT,
        };
        (handle, rx)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub async fn start(&self, interval: i32) -> CommandOutcome {
        self.start_or_stop(|reply| Command::Start { interval, reply })
            .await
    }

    pub async fn stop(&self) -> CommandOutcome {
        self.start_or_stop(|reply| Command::Stop { reply }).await
    }

    /// Last status published by the driver, or `None` once it has exited.
    pub fn status(&self) -> Option<DriverStatus> {
        if self.status.has_changed().is_err() {
            return None;
        }
        Some(*self.status.borrow())
    }

    /// Send a start or stop request and wait for the answer.
    ///
    /// A request that is not answered within the timeout reports `Failure`.
    /// It stays queued and the driver still runs it once it is free.
    async fn start_or_stop(
        &self,
        build: impl FnOnce(oneshot::Sender<CommandOutcome>) -> Command,
    ) -> CommandOutcome {
        let (reply, response) = oneshot::channel();

        let exchange = async {
            if self.tx.send(build(reply)).await.is_err() {
                warn!("Driver is not running, command dropped");
                return CommandOutcome::Failure;
            }

            response.await.unwrap_or_else(|_| {
                warn!("Driver exited before answering command");
                CommandOutcome::Failure
            })
        };

        match tokio::time::timeout(self.timeout, exchange).await {
            Ok(outcome) => outcome,
            Err(_) => {
                warn!(
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Driver did not answer command in time"
                );
                CommandOutcome::Failure
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status() -> DriverStatus {
        DriverStatus {
            connected: true,
            state: SessionState::Stopped,
            interval: 1000,
        }
    }

    #[tokio::test]
    async fn stopped_driver_yields_failure() {
        let (status_tx, status_rx) = watch::channel(status());
        let (handle, rx) = DriverHandle::channel(1, status_rx);
        drop(rx);
        drop(status_tx);

        assert_eq!(handle.start(1000).await, CommandOutcome::Failure);
        assert_eq!(handle.stop().await, CommandOutcome::Failure);
        assert_eq!(handle.status(), None);
    }

    #[tokio::test]
    async fn unanswered_command_times_out() {
        let (_status_tx, status_rx) = watch::channel(status());
        let (handle, _rx) = DriverHandle::channel(1, status_rx);
        let handle = handle.with_timeout(Duration::from_millis(20));

        // Nobody reads the receiver, so no reply ever comes.
        assert_eq!(handle.stop().await, CommandOutcome::Failure);
        assert_eq!(handle.status(), Some(status()));
    }

    #[tokio::test]
    async fn status_follows_published_value() {
        let (status_tx, status_rx) = watch::channel(status());
        let (handle, _rx) = DriverHandle::channel(1, status_rx);

        status_tx.send_replace(DriverStatus {
            state: SessionState::Started,
            ..status()
        });

        assert_eq!(handle.status().unwrap().state, SessionState::Started);
    }

    #[tokio::test]
    async fn reply_is_forwarded() {
        let (_status_tx, status_rx) = watch::channel(status());
        let (handle, mut rx) = DriverHandle::channel(1, status_rx);

        let responder = tokio::spawn(async move {
            match rx.recv().await {
                Some(Command::Start { interval, reply }) => {
                    assert_eq!(interval, 250);
                    let _ = reply.send(CommandOutcome::Success);
                }
                other => panic!("unexpected command {other:?}"),
            }
        });

        assert_eq!(handle.start(250).await, CommandOutcome::Success);
        responder.await.unwrap();
    }
}
