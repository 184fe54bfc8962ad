pub mod latest;
pub mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use telemetry_core::TelemetryReport;

pub const VOLTAGE_TOPIC: &str = "supply_voltage";
pub const ENV_TEMP_TOPIC: &str = "env_temp";
pub const YAW_TOPIC: &str = "yaw";
pub const PITCH_TOPIC: &str = "pitch";
pub const ROLL_TOPIC: &str = "roll";

#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("Sink for topic {0} is closed")]
    Closed(&'static str),

    #[error("Mutex poisoned: {0}")]
    Poisoned(String),
}

impl<T> From<std::sync::PoisonError<T>> for SinkError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        SinkError::Poisoned(err.to_string())
    }
}

/// Receiver for one decoded field per successful poll.
#[async_trait]
pub trait Sink<T>: Send + Sync + 'static {
    async fn publish(&self, value: T) -> Result<(), SinkError>;
}

/// The five outputs a report is split across.
#[derive(Clone)]
pub struct Sinks {
    pub voltage: Arc<dyn Sink<u16>>,
    pub env_temp: Arc<dyn Sink<i16>>,
    pub yaw: Arc<dyn Sink<i16>>,
    pub pitch: Arc<dyn Sink<i16>>,
    pub roll: Arc<dyn Sink<i16>>,
}

impl Sinks {
    /// Publish every field of `report`, voltage first and roll last.
    ///
    /// Stops at the first sink that fails; later sinks see nothing for this
    /// report.
    pub async fn dispatch(&self, report: &TelemetryReport) -> Result<(), SinkError> {
        self.voltage.publish(report.voltage).await?;
        self.env_temp.publish(report.env_temp).await?;
        self.yaw.publish(report.yaw).await?;
        self.pitch.publish(report.pitch).await?;
        self.roll.publish(report.roll).await?;
        Ok(())
    }
}
