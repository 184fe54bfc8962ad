use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::Serialize;

use super::{
    ENV_TEMP_TOPIC, PITCH_TOPIC, ROLL_TOPIC, Sink, SinkError, Sinks, VOLTAGE_TOPIC, YAW_TOPIC,
};

/// The most recent value seen on one topic.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reading {
    pub topic: &'static str,
    pub value: i32,
    pub received_at: jiff::Timestamp,
}

/// Latest reading per topic, shared between the sinks writing it and
/// whoever wants a snapshot.
#[derive(Debug, Clone, Default)]
pub struct Latest {
    readings: Arc<Mutex<BTreeMap<&'static str, Reading>>>,
}

impl Latest {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink that records into this store under `topic`.
    pub fn sink(&self, topic: &'static str) -> LatestSink {
        LatestSink {
            topic,
            readings: Arc::clone(&self.readings),
        }
    }

    /// One sink per report field, all recording into this store.
    pub fn sinks(&self) -> Sinks {
        Sinks {
            voltage: Arc::new(self.sink(VOLTAGE_TOPIC)),
            env_temp: Arc::new(self.sink(ENV_TEMP_TOPIC)),
            yaw: Arc::new(self.sink(YAW_TOPIC)),
            pitch: Arc::new(self.sink(PITCH_TOPIC)),
            roll: Arc::new(self.sink(ROLL_TOPIC)),
        }
    }

    /// Current readings, ordered by topic name.
    pub fn snapshot(&self) -> Result<Vec<Reading>, SinkError> {
        Ok(self.readings.lock()?.values().cloned().collect())
    }
}

pub struct LatestSink {
    topic: &'static str,
    readings: Arc<Mutex<BTreeMap<&'static str, Reading>>>,
}

#[async_trait]
impl<T> Sink<T> for LatestSink
where
    T: Into<i32> + Send + 'static,
{
    async fn publish(&self, value: T) -> Result<(), SinkError> {
        let reading = Reading {
            topic: self.topic,
            value: value.into(),
            received_at: jiff::Timestamp::now(),
        };
        self.readings.lock()?.insert(self.topic, reading);
        Ok(())
    }
}
