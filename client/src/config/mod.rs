//! Configuration Module
//!
//! Loads the `key=value` configuration file and turns it into the settings
//! each component needs.

mod app_config;
mod error;

pub use app_config::{AppConfig, CONFIG_ENV_VAR, CONFIG_FILE_NAME, find_config_file};
pub use error::ConfigError;
