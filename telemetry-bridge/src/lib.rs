pub mod api;
pub mod command;
pub mod config;
pub mod driver;
pub mod logging;
pub mod poller;
pub mod session;
pub mod sink;

pub use command::{Command, CommandOutcome, DriverHandle, DriverStatus};
pub use config::{Config, DeviceConfig, PollConfig, ServerConfig};
pub use driver::Driver;
pub use poller::{PollError, Poller};
pub use session::{Session, SessionError};
pub use sink::latest::{Latest, LatestSink, Reading};
pub use sink::memory::MemorySink;
pub use sink::{Sink, SinkError, Sinks};
