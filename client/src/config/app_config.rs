//! Application Configuration
//!
//! Format (one `key=value` per line, `#` starts a comment):
//!
//! ```text
//! signaling_url=https://assistant.example.com/api/offer
//! connect_timeout_ms=15000
//! log_level=debug
//! ```

use super::error::ConfigError;
use crate::session::SessionConfig;
use crate::signaling::{HttpSignalingConfig, SignalingEndpoint};
use logging::LogLevel;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable naming an explicit configuration file.
pub const CONFIG_ENV_VAR: &str = "VOICE_CLIENT_CONFIG";

/// File name searched for in `./config/` and `./`.
pub const CONFIG_FILE_NAME: &str = "voice-client.conf";

/// Application configuration structure
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Endpoint that trades the local offer for the remote answer
    pub signaling_url: String,
    /// Optional bearer token sent with the offer
    pub signaling_token: Option<String>,
    /// Upper bound for one signaling exchange
    pub signaling_timeout: Duration,
    /// Accept self-signed certificates (development servers only)
    pub tls_accept_invalid_certs: bool,
    /// How long a connection attempt may stay in `Connecting`
    pub connect_timeout: Duration,
    /// Period of the main tick and of the audio streaming task
    pub tick_interval: Duration,
    /// Label of the control data channel
    pub control_channel_label: String,
    pub log_path: PathBuf,
    pub log_level: LogLevel,
    /// Mirror log lines to stderr
    pub console_log: bool,
    /// Keys present in the file that this version does not know
    pub ignored_keys: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            signaling_url: "http://127.0.0.1:7860/api/offer".to_string(),
            signaling_token: None,
            signaling_timeout: Duration::from_millis(10_000),
            tls_accept_invalid_certs: false,
            connect_timeout: Duration::from_millis(15_000),
            tick_interval: Duration::from_millis(15),
            control_channel_label: "rtvi-ai".to_string(),
            log_path: PathBuf::from("voice-client.log"),
            log_level: LogLevel::Info,
            console_log: true,
            ignored_keys: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Loads and validates configuration from a `.conf` file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }
        let content = fs::read_to_string(path)
            .map_err(|e| ConfigError::Read(format!("{}: {}", path.display(), e)))?;
        Self::parse(&content)
    }

    /// Parses configuration text on top of the defaults.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        for line in content.lines() {
            let line = line.trim();

            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                config.ignored_keys.push(line.to_string());
                continue;
            };
            let key = key.trim();
            let value = value.trim();

            match key {
                "signaling_url" => config.signaling_url = value.to_string(),
                "signaling_token" => {
                    config.signaling_token = (!value.is_empty()).then(|| value.to_string());
                }
                "signaling_timeout_ms" => config.signaling_timeout = parse_millis(key, value)?,
                "tls_accept_invalid_certs" => {
                    config.tls_accept_invalid_certs = parse_bool(key, value)?;
                }
                "connect_timeout_ms" => config.connect_timeout = parse_millis(key, value)?,
                "tick_interval_ms" => config.tick_interval = parse_millis(key, value)?,
                "control_channel_label" => config.control_channel_label = value.to_string(),
                "log_path" => config.log_path = PathBuf::from(value),
                "log_level" => {
                    config.log_level = value.parse().map_err(|_| ConfigError::InvalidValue {
                        key: key.to_string(),
                        value: value.to_string(),
                        reason: "expected debug, info, warn or error".to_string(),
                    })?;
                }
                "console_log" => config.console_log = parse_bool(key, value)?,
                _ => config.ignored_keys.push(key.to_string()),
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Loads the file found by [`find_config_file`], or the defaults when
    /// there is none. Returns the path that was used, if any.
    pub fn load(explicit: Option<&str>) -> Result<(Self, Option<PathBuf>), ConfigError> {
        match find_config_file(explicit) {
            Some(path) => Ok((Self::load_from_file(&path)?, Some(path))),
            None => Ok((Self::default(), None)),
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        SignalingEndpoint::parse(&self.signaling_url).map_err(|e| ConfigError::InvalidValue {
            key: "signaling_url".to_string(),
            value: self.signaling_url.clone(),
            reason: e.to_string(),
        })?;

        if self.signaling_timeout >= self.connect_timeout {
            return Err(ConfigError::InvalidValue {
                key: "signaling_timeout_ms".to_string(),
                value: self.signaling_timeout.as_millis().to_string(),
                reason: format!(
                    "must be shorter than connect_timeout_ms ({})",
                    self.connect_timeout.as_millis()
                ),
            });
        }

        if self.control_channel_label.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "control_channel_label".to_string(),
                value: String::new(),
                reason: "must not be empty".to_string(),
            });
        }

        Ok(())
    }

    /// Settings for the session state machine.
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            connect_timeout: self.connect_timeout,
            tick_interval: self.tick_interval,
            control_channel_label: self.control_channel_label.clone(),
        }
    }

    /// Settings for the HTTP signaling exchange.
    pub fn signaling_config(&self) -> HttpSignalingConfig {
        HttpSignalingConfig {
            url: self.signaling_url.clone(),
            bearer_token: self.signaling_token.clone(),
            timeout: self.signaling_timeout,
            accept_invalid_certs: self.tls_accept_invalid_certs,
        }
    }
}

fn parse_millis(key: &str, value: &str) -> Result<Duration, ConfigError> {
    match value.parse::<u64>() {
        Ok(ms) if ms > 0 => Ok(Duration::from_millis(ms)),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            reason: "expected a positive number of milliseconds".to_string(),
        }),
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            reason: "expected true or false".to_string(),
        }),
    }
}

/// Looks for a configuration file.
///
/// Order: `explicit` (command line), the [`CONFIG_ENV_VAR`] variable,
/// `./config/voice-client.conf`, `./voice-client.conf`.
pub fn find_config_file(explicit: Option<&str>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        // An explicit path is returned even if missing so the caller
        // reports it instead of silently using defaults.
        return Some(PathBuf::from(path));
    }

    if let Ok(path) = env::var(CONFIG_ENV_VAR) {
        let path = PathBuf::from(path);
        if path.exists() {
            return Some(path);
        }
    }

    [
        PathBuf::from("./config").join(CONFIG_FILE_NAME),
        PathBuf::from("./").join(CONFIG_FILE_NAME),
    ]
    .into_iter()
    .find(|candidate| candidate.exists())
}
