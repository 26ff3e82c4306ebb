//! Non-blocking logger shared by every execution context of the client.
//!
//! Messages are handed to a dedicated writer thread over a channel, so a
//! caller on a real-time path (tick, audio streaming, transport callbacks)
//! never waits on file or console I/O.

pub mod error;
mod log_level;
mod log_message;
mod log_writer;
mod logger;

pub use error::{LoggingError, Result};
pub use log_level::LogLevel;
pub use logger::Logger;
