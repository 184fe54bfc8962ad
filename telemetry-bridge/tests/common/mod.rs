#![allow(dead_code)]

use std::time::Duration;

use telemetry_bridge::{DeviceConfig, Latest, PollConfig};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::time::{sleep, timeout};

pub const REPORT: &[u8] = b"$11E80301009CFF3412CBED0D0A";

/// A device that streams `REPORT` on a fixed period and records every
/// byte the driver sends it.
pub struct FakeDevice {
    pub port: u16,
    received: mpsc::UnboundedReceiver<Vec<u8>>,
    buffer: Vec<u8>,
}

impl FakeDevice {
    pub async fn bind(report: &'static [u8], period: Duration) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let (tx, received) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            let Ok((stream, _)) = listener.accept().await else {
                return;
            };
            let (mut rd, mut wr) = stream.into_split();

            tokio::spawn(async move {
                while wr.write_all(report).await.is_ok() {
                    sleep(period).await;
                }
            });

            let mut buf = [0u8; 64];
            loop {
                match rd.read(&mut buf).await {
                    Ok(0) | Err(_) => break,
                    Ok(n) => {
                        if tx.send(buf[..n].to_vec()).is_err() {
                            break;
                        }
                    }
                }
            }
        });

        Self {
            port,
            received,
            buffer: Vec::new(),
        }
    }

    pub fn device_config(&self, interval: i32) -> DeviceConfig {
        DeviceConfig {
            host: "127.0.0.1".to_string(),
            port: self.port,
            interval,
        }
    }

    /// The next `len` bytes sent by the driver, as text.
    pub async fn expect(&mut self, len: usize) -> String {
        timeout(Duration::from_secs(5), async {
            while self.buffer.len() < len {
                let chunk = self
                    .received
                    .recv()
                    .await
                    .expect("device connection closed");
                self.buffer.extend(chunk);
            }
        })
        .await
        .expect("timed out waiting for a command");

        let rest = self.buffer.split_off(len);
        String::from_utf8(std::mem::replace(&mut self.buffer, rest)).unwrap()
    }
}

pub fn fast_poll() -> PollConfig {
    PollConfig { period_ms: 10 }
}

/// A port nothing is listening on.
pub async fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap().port()
}

pub async fn wait_for_readings(latest: &Latest, count: usize) {
    timeout(Duration::from_secs(5), async {
        while latest.snapshot().unwrap().len() < count {
            sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("timed out waiting for readings");
}
