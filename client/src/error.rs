//! Top-level errors: the only failures that end the process.

use crate::config::ConfigError;
use crate::signaling::SignalingError;
use crate::transport::TransportError;
use logging::LoggingError;
use std::fmt;

/// Result type for process startup and the runtime loop.
pub type Result<T> = std::result::Result<T, ClientError>;

#[derive(Debug)]
pub enum ClientError {
    /// Configuration could not be loaded or validated.
    Config(ConfigError),
    /// The logger could not be started.
    Logging(LoggingError),
    /// The signaling endpoint could not be set up.
    Signaling(SignalingError),
    /// A transport instance could not be built. There is no recovery path
    /// below the session controller, so this ends the runtime.
    Transport(TransportError),
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::Config(e) => write!(f, "Configuration error: {}", e),
            ClientError::Logging(e) => write!(f, "Logging error: {}", e),
            ClientError::Signaling(e) => write!(f, "Signaling error: {}", e),
            ClientError::Transport(e) => write!(f, "Transport error: {}", e),
        }
    }
}

impl std::error::Error for ClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ClientError::Config(e) => Some(e),
            ClientError::Logging(e) => Some(e),
            ClientError::Signaling(e) => Some(e),
            ClientError::Transport(e) => Some(e),
        }
    }
}

impl From<ConfigError> for ClientError {
    fn from(err: ConfigError) -> Self {
        ClientError::Config(err)
    }
}

impl From<LoggingError> for ClientError {
    fn from(err: LoggingError) -> Self {
        ClientError::Logging(err)
    }
}

impl From<SignalingError> for ClientError {
    fn from(err: SignalingError) -> Self {
        ClientError::Signaling(err)
    }
}

impl From<TransportError> for ClientError {
    fn from(err: TransportError) -> Self {
        ClientError::Transport(err)
    }
}
