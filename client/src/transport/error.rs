use std::fmt;

/// Errors reported by a transport implementation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The transport could not be built. Fatal for the runtime.
    Create(String),
    /// An operation on a live transport failed.
    Operation(String),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Create(msg) => write!(f, "Failed to create transport: {}", msg),
            TransportError::Operation(msg) => write!(f, "Transport operation failed: {}", msg),
        }
    }
}

impl std::error::Error for TransportError {}
