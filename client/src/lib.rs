//! Voice assistant connection controller.
//!
//! Establishes a real-time media session with a voice assistant through a
//! signaling server, streams microphone audio while connected and recovers
//! from failures by tearing the transport down and building a fresh one.
//! [`session::SessionController`] is the heart of it; the other modules are
//! the seams it drives.

pub mod audio;
pub mod config;
pub mod control;
pub mod error;
pub mod session;
pub mod signaling;
pub mod status;
pub mod transport;

pub use error::{ClientError, Result};
pub use session::{
    Phase, SessionConfig, SessionController, SessionHandle, SessionParts, run_main_tick,
};
