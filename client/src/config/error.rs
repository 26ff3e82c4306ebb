use std::fmt;

/// Errors that can occur while loading configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// The configuration file does not exist.
    FileNotFound(String),
    /// The file exists but could not be read.
    Read(String),
    /// A key has a value that cannot be used.
    InvalidValue { key: String, value: String, reason: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::FileNotFound(path) => {
                write!(f, "Configuration file not found: {}", path)
            }
            ConfigError::Read(msg) => write!(f, "Failed to read configuration file: {}", msg),
            ConfigError::InvalidValue { key, value, reason } => {
                write!(f, "Invalid value '{}' for '{}': {}", value, key, reason)
            }
        }
    }
}

impl std::error::Error for ConfigError {}
