use std::io;

use telemetry_core::protocol::REPORT_FRAME_SIZE;
use telemetry_core::{SessionState, encode_start, encode_stop};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::info;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Could not connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("No live connection to the device")]
    NotConnected,

    #[error("Device was already started")]
    AlreadyStarted,

    #[error("Device has not been started")]
    NotStarted,

    #[error("Failed to send command: {0}")]
    Send(#[source] io::Error),

    #[error("Failed to receive frame: {0}")]
    Receive(#[source] io::Error),
}

/// Open the TCP stream to the device.
pub async fn connect(host: &str, port: u16) -> Result<TcpStream, SessionError> {
    let addr = format!("{host}:{port}");
    info!(%addr, "Trying to connect to device");

    let result = TcpStream::connect(addr.as_str()).await;
    result.map_err(|source| SessionError::Connect { addr, source })
}

/// The device connection plus its started/stopped state.
///
/// All traffic to and from the device goes through here. Without a
/// connection every operation fails with [`SessionError::NotConnected`].
pub struct Session<C> {
    connection: Option<C>,
    state: SessionState,
}

impl<C> Session<C>
where
    C: AsyncRead + AsyncWrite + Unpin + Send,
{
    pub fn new(connection: Option<C>) -> Self {
        Self {
            connection,
            state: SessionState::Stopped,
        }
    }

    pub fn connected(connection: C) -> Self {
        Self::new(Some(connection))
    }

    pub fn disconnected() -> Self {
        Self::new(None)
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Send the start command and mark the session started.
    ///
    /// The state only changes once the whole frame has been written.
    pub async fn send_start(&mut self, interval: i32) -> Result<(), SessionError> {
        let connection = self.connection.as_mut().ok_or(SessionError::NotConnected)?;

        if self.state == SessionState::Started {
            return Err(SessionError::AlreadyStarted);
        }

        let frame = encode_start(interval);
        info!(interval, %frame, "Sending start command");
        write_frame(connection, &frame).await?;

        self.state = SessionState::Started;
        Ok(())
    }

    /// Send the stop command.
    ///
    /// The session stays `Started` afterwards, so a later start request is
    /// still rejected with `AlreadyStarted`.
    pub async fn send_stop(&mut self) -> Result<(), SessionError> {
        if self.state == SessionState::Stopped {
            return Err(SessionError::NotStarted);
        }

        let connection = self.connection.as_mut().ok_or(SessionError::NotConnected)?;

        let frame = encode_stop();
        info!(%frame, "Sending stop command");
        write_frame(connection, &frame).await
    }

    /// Read one fixed-size report frame from the device.
    ///
    /// Blocks until all bytes have arrived or the stream fails.
    pub async fn read_frame(&mut self) -> Result<[u8; REPORT_FRAME_SIZE], SessionError> {
        let connection = self.connection.as_mut().ok_or(SessionError::NotConnected)?;

        let mut buf = [0u8; REPORT_FRAME_SIZE];
        connection
            .read_exact(&mut buf)
            .await
            .map_err(SessionError::Receive)?;

        Ok(buf)
    }
}

async fn write_frame<C>(connection: &mut C, frame: &str) -> Result<(), SessionError>
where
    C: AsyncWrite + Unpin,
{
    connection
        .write_all(frame.as_bytes())
        .await
        .map_err(SessionError::Send)?;
    connection.flush().await.map_err(SessionError::Send)
}
