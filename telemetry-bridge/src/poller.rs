use telemetry_core::{ProtocolError, TelemetryReport, decode_report_bytes};
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, error};

use crate::session::{Session, SessionError};
use crate::sink::{SinkError, Sinks};

#[derive(Debug, thiserror::Error)]
pub enum PollError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error("Failed to dispatch report: {0}")]
    Sink(#[from] SinkError),
}

/// Reads one report per tick and fans it out to the sinks.
pub struct Poller {
    sinks: Sinks,
}

impl Poller {
    pub fn new(sinks: Sinks) -> Self {
        Self { sinks }
    }

    /// Run one polling cycle. Failures are logged and swallowed so the
    /// trigger driving this keeps firing.
    pub async fn poll_once<C>(&self, session: &mut Session<C>)
    where
        C: AsyncRead + AsyncWrite + Unpin + Send,
    {
        match self.try_poll(session).await {
            Ok(report) => debug!(?report, "Successfully received and processed data"),
            Err(PollError::Protocol(e)) => error!(error = %e, "Invalid data"),
            Err(e) => error!(error = %e, "Failed to receive and process data"),
        }
    }

    /// Read, decode and dispatch a single report.
    ///
    /// Nothing reaches the sinks unless the whole frame decodes.
    pub async fn try_poll<C>(&self, session: &mut Session<C>) -> Result<TelemetryReport, PollError>
    where
        C: AsyncRead + AsyncWrite + Unpin + Send,
    {
        let frame = session.read_frame().await?;
        let report = decode_report_bytes(&frame)?;
        self.sinks.dispatch(&report).await?;
        Ok(report)
    }
}
