use std::time::Duration;

use telemetry_core::SessionState;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};

use crate::command::{Command, CommandOutcome, DriverStatus};
use crate::config::{DeviceConfig, PollConfig};
use crate::poller::Poller;
use crate::session::{self, Session, SessionError};
use crate::sink::Sinks;

/// Owns the session and the poller and reacts to commands and poll ticks.
pub struct Driver<C> {
    session: Session<C>,
    poller: Poller,
    interval: i32,
    poll_period: Duration,
    status_tx: watch::Sender<DriverStatus>,
}

impl Driver<TcpStream> {
    /// Connect to the device and send the initial start command.
    ///
    /// A failed connection is logged and leaves a driver that cannot poll
    /// or send; every command on it reports failure.
    pub async fn connect(device: &DeviceConfig, poll: &PollConfig, sinks: Sinks) -> Self {
        let connection = match session::connect(&device.host, device.port).await {
            Ok(stream) => {
                info!(host = %device.host, port = device.port, "Connected to the device");
                Some(stream)
            }
            Err(e) => {
                error!(error = %e, "Could not connect to device");
                None
            }
        };

        let mut driver = Driver::new(
            Session::new(connection),
            sinks,
            device.interval,
            poll.period(),
        );
        driver.send_initial_start().await;
        driver
    }
}

impl<C> Driver<C>
where
    C: AsyncRead + AsyncWrite + Unpin + Send,
{
    pub fn new(session: Session<C>, sinks: Sinks, interval: i32, poll_period: Duration) -> Self {
        let status = DriverStatus {
            connected: session.is_connected(),
            state: session.state(),
            interval,
        };
        let (status_tx, _) = watch::channel(status);

        Self {
            session,
            poller: Poller::new(sinks),
            interval,
            poll_period,
            status_tx,
        }
    }

    pub fn status(&self) -> DriverStatus {
        DriverStatus {
            connected: self.session.is_connected(),
            state: self.session.state(),
            interval: self.interval,
        }
    }

    /// Receiver that sees the status after every command. It reports the
    /// sender closed once the driver is dropped.
    pub fn subscribe(&self) -> watch::Receiver<DriverStatus> {
        self.status_tx.subscribe()
    }

    fn publish_status(&self) {
        self.status_tx.send_replace(self.status());
    }

    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    /// Start the device with the configured interval, logging any failure.
    pub async fn send_initial_start(&mut self) {
        if let Err(e) = self.session.send_start(self.interval).await {
            log_command_error("start", &e);
        }
        self.publish_status();
    }

    pub async fn handle_start_request(&mut self, requested_interval: i32) -> CommandOutcome {
        // Only a zero request replaces the stored interval. Any other value
        // is ignored and the stored interval is sent instead.
        if requested_interval == 0 {
            self.interval = requested_interval;
        }

        let result = self.session.send_start(self.interval).await;
        if let Err(e) = &result {
            log_command_error("start", e);
        } else {
            info!(interval = self.interval, "Device started");
        }
        self.publish_status();
        result.into()
    }

    pub async fn handle_stop_request(&mut self) -> CommandOutcome {
        let result = self.session.send_stop().await;
        if let Err(e) = &result {
            log_command_error("stop", e);
        } else {
            info!("Successfully stopped");
        }
        self.publish_status();
        result.into()
    }

    pub async fn poll_once(&mut self) {
        self.poller.poll_once(&mut self.session).await;
    }

    async fn handle(&mut self, command: Command) {
        match command {
            Command::Start { interval, reply } => {
                let outcome = self.handle_start_request(interval).await;
                let _ = reply.send(outcome);
            }
            Command::Stop { reply } => {
                let outcome = self.handle_stop_request().await;
                let _ = reply.send(outcome);
            }
        }
    }

    /// Serve commands and poll ticks until `cancel` fires.
    ///
    /// Only one event is handled at a time. Polling is enabled only when a
    /// connection was established.
    #[instrument(name = "driver", skip_all, fields(poll_period_ms = self.poll_period.as_millis() as u64))]
    pub async fn run(mut self, mut commands: mpsc::Receiver<Command>, cancel: CancellationToken) {
        let polling = self.session.is_connected();
        if polling {
            info!("Driver started");
        } else {
            warn!("Driver started without a device connection, polling disabled");
        }

        let mut ticker = tokio::time::interval(self.poll_period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Driver shutting down");
                    break;
                }
                Some(command) = commands.recv() => {
                    self.handle(command).await;
                }
                _ = ticker.tick(), if polling => {
                    self.poll_once().await;
                }
            }
        }
    }
}

fn log_command_error(command: &'static str, e: &SessionError) {
    match e {
        SessionError::NotConnected => {
            warn!(command, "Trying to send a command to an unconnected device")
        }
        SessionError::AlreadyStarted => {
            warn!(command, "Trying to start a device that was already started")
        }
        SessionError::NotStarted => warn!(command, "Trying to stop without starting"),
        other => error!(command, error = %other, "Failed to send command"),
    }
}
