//! The [`Logger`] handle.

use crate::error::Result;
use crate::log_level::LogLevel;
use crate::log_message::LogMessage;
use crate::log_writer::{LogWriter, spawn_writer_thread};
use std::path::Path;
use std::sync::Arc;
use std::sync::mpsc::{Sender, channel};

/// Thread-safe, non-blocking logger.
///
/// Clones and component loggers share one channel to a single writer thread.
///
/// # Examples
///
/// ```no_run
/// use logging::{Logger, LogLevel};
///
/// let logger = Logger::to_file("voice-client.log".as_ref(), LogLevel::Info, false).unwrap();
/// let session = logger.for_component("Session");
/// session.info("Connecting");
/// ```
#[derive(Clone)]
pub struct Logger {
    sender: Option<Sender<LogMessage>>,
    level: LogLevel,
    component: Option<Arc<str>>,
}

impl Logger {
    /// Logs to `log_path` (append mode), optionally mirrored to stderr.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be opened or the writer thread
    /// cannot be spawned.
    pub fn to_file(log_path: &Path, level: LogLevel, console: bool) -> Result<Self> {
        let writer = LogWriter::with_file(log_path, console)?;
        Self::spawn(writer, level)
    }

    /// Logs to stderr only.
    pub fn console(level: LogLevel) -> Result<Self> {
        Self::spawn(LogWriter::console_only(), level)
    }

    /// A logger that drops everything. Used by tests and headless tools.
    pub fn disabled() -> Self {
        Self {
            sender: None,
            level: LogLevel::Error,
            component: None,
        }
    }

    fn spawn(writer: LogWriter, level: LogLevel) -> Result<Self> {
        let (sender, receiver) = channel();
        spawn_writer_thread(writer, receiver)?;
        Ok(Self {
            sender: Some(sender),
            level,
            component: None,
        })
    }

    /// Returns a logger tagged with `component` that shares this writer.
    pub fn for_component(&self, component: &str) -> Self {
        Self {
            sender: self.sender.clone(),
            level: self.level,
            component: Some(Arc::from(component)),
        }
    }

    /// True when a message at `level` would be recorded.
    pub fn enabled(&self, level: LogLevel) -> bool {
        self.sender.is_some() && level >= self.level
    }

    pub fn debug(&self, message: &str) {
        self.log(LogLevel::Debug, message);
    }

    pub fn info(&self, message: &str) {
        self.log(LogLevel::Info, message);
    }

    pub fn warn(&self, message: &str) {
        self.log(LogLevel::Warn, message);
    }

    pub fn error(&self, message: &str) {
        self.log(LogLevel::Error, message);
    }

    fn log(&self, level: LogLevel, message: &str) {
        if !self.enabled(level) {
            return;
        }
        if let Some(sender) = &self.sender {
            // A closed writer is not the caller's problem.
            let _ = sender.send(LogMessage::new(
                level,
                self.component.clone(),
                message.to_string(),
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::thread;
    use std::time::Duration;
    use tempfile::tempdir;

    fn wait_for_write() {
        thread::sleep(Duration::from_millis(50));
    }

    #[test]
    fn test_logger_respects_level() {
        let dir = tempdir().unwrap();
        let log_path = dir.path().join("test.log");

        let logger = Logger::to_file(&log_path, LogLevel::Warn, false).unwrap();
        logger.debug("Debug message");
        logger.info("Info message");
        logger.warn("Warn message");
        wait_for_write();

        let content = fs::read_to_string(log_path).unwrap();
        assert!(!content.contains("Debug message"));
        assert!(!content.contains("Info message"));
        assert!(content.contains("Warn message"));
    }

    #[test]
    fn test_component_loggers_share_file() {
        let dir = tempdir().unwrap();
        let log_path = dir.path().join("test.log");

        let logger = Logger::to_file(&log_path, LogLevel::Debug, false).unwrap();
        let session = logger.for_component("Session");
        let streaming = logger.for_component("AudioStream");

        let handle = thread::spawn(move || streaming.debug("frame sent"));
        session.info("phase -> connecting");
        handle.join().unwrap();
        wait_for_write();

        let content = fs::read_to_string(log_path).unwrap();
        assert!(content.contains("[Session]: phase -> connecting"));
        assert!(content.contains("[AudioStream]: frame sent"));
    }

    #[test]
    fn test_disabled_logger_records_nothing() {
        let logger = Logger::disabled();
        assert!(!logger.enabled(LogLevel::Error));
        logger.error("ignored");
        logger.for_component("Session").warn("ignored too");
    }
}
