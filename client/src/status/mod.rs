//! Status reporting.
//!
//! The state machine reports every transition as a [`StatusUpdate`]. A
//! reporter is a one-way sink: it must return promptly and never fail the
//! caller.

mod board;
mod logged;

pub use board::{
    LogLine, MAX_LOG_LINES, StatusBoard, StatusSnapshot, Tone, TranscriptObserver, button_label,
};
pub use logged::LoggedReporter;

use crate::session::Phase;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    /// Startup finished, first transport built
    Ready,
    Connecting,
    Connected,
    /// A user disconnect is being carried out
    Disconnecting,
    /// User disconnect finished
    Disconnected,
    /// The transport failed or closed on its own
    ConnectionLost,
    /// Offer, signaling or answer failed
    ConnectionFailed,
    /// `Connecting` outlived the connect timeout
    Timeout,
}

impl StatusKind {
    /// User-facing status line.
    pub fn message(self) -> &'static str {
        match self {
            StatusKind::Ready => "Ready - Tap Connect button to start",
            StatusKind::Connecting => "Connecting to voice assistant...",
            StatusKind::Connected => "Connected - Voice assistant ready!",
            StatusKind::Disconnecting => "Disconnecting...",
            StatusKind::Disconnected => "Disconnected - Tap Connect button",
            StatusKind::ConnectionLost => "Disconnected - Tap Connect to reconnect",
            StatusKind::ConnectionFailed => "Connection failed - Tap Connect to retry",
            StatusKind::Timeout => "Connection timeout - Tap Connect to retry",
        }
    }

    pub fn is_failure(self) -> bool {
        matches!(
            self,
            StatusKind::ConnectionLost | StatusKind::ConnectionFailed | StatusKind::Timeout
        )
    }
}

impl fmt::Display for StatusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// One transition report: the phase after the transition and why.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusUpdate {
    pub phase: Phase,
    pub kind: StatusKind,
}

impl StatusUpdate {
    pub fn new(phase: Phase, kind: StatusKind) -> Self {
        Self { phase, kind }
    }

    pub fn message(&self) -> &'static str {
        self.kind.message()
    }
}

pub trait StatusReporter: Send + Sync {
    fn report(&self, update: &StatusUpdate);
}
