use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::{Sink, SinkError};

/// Sink that keeps every published value in memory.
/// This is primarily intended for testing and as a reference
/// implementation of the Sink trait.
#[derive(Debug)]
pub struct MemorySink<T> {
    values: Arc<Mutex<Vec<T>>>,
}

impl<T: Clone> MemorySink<T> {
    pub fn new() -> Self {
        Self {
            values: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Everything published so far, oldest first.
    pub fn values(&self) -> Result<Vec<T>, SinkError> {
        Ok(self.values.lock()?.clone())
    }
}

impl<T: Clone> Default for MemorySink<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for MemorySink<T> {
    fn clone(&self) -> Self {
        Self {
            values: Arc::clone(&self.values),
        }
    }
}

#[async_trait]
impl<T> Sink<T> for MemorySink<T>
where
    T: Send + 'static,
{
    async fn publish(&self, value: T) -> Result<(), SinkError> {
        self.values.lock()?.push(value);
        Ok(())
    }
}
