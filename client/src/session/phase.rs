use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

/// Coarse connection lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Phase {
    Disconnected = 0,
    Connecting = 1,
    Connected = 2,
}

impl Phase {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => Phase::Connecting,
            2 => Phase::Connected,
            _ => Phase::Disconnected,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Disconnected => write!(f, "Disconnected"),
            Phase::Connecting => write!(f, "Connecting"),
            Phase::Connected => write!(f, "Connected"),
        }
    }
}

/// The phase, readable from every execution context.
///
/// Only the session controller writes it. Readers must re-check it right
/// before touching the transport, since nothing spans "check" and "use".
#[derive(Debug, Clone, Default)]
pub struct PhaseCell(Arc<AtomicU8>);

impl PhaseCell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Phase {
        Phase::from_u8(self.0.load(Ordering::Acquire))
    }

    pub(crate) fn set(&self, phase: Phase) {
        self.0.store(phase as u8, Ordering::Release);
    }
}
