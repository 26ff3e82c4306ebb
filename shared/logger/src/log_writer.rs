//! Dedicated log writer thread.

use crate::error::{LoggingError, Result};
use crate::log_message::LogMessage;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::mpsc::Receiver;

/// Where the writer thread puts each formatted line.
pub(crate) struct LogWriter {
    file: Option<File>,
    console: bool,
}

impl LogWriter {
    /// Opens (or creates) `log_path` in append mode.
    pub fn with_file(log_path: &Path, console: bool) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_path)?;
        Ok(Self {
            file: Some(file),
            console,
        })
    }

    /// Writer that only mirrors to stderr.
    pub fn console_only() -> Self {
        Self {
            file: None,
            console: true,
        }
    }

    fn write_message(&mut self, message: &LogMessage) {
        let line = message.format();

        if self.console {
            let _ = io::stderr().write_all(line.as_bytes());
        }

        if let Some(file) = self.file.as_mut()
            && let Err(e) = file.write_all(line.as_bytes()).and_then(|_| file.flush())
        {
            eprintln!("Error writing log: {}", e);
        }
    }

    /// Runs until every sender has been dropped.
    pub fn run(mut self, receiver: Receiver<LogMessage>) {
        for message in receiver {
            self.write_message(&message);
        }
    }
}

/// Spawns the writer thread that drains `receiver`.
pub(crate) fn spawn_writer_thread(writer: LogWriter, receiver: Receiver<LogMessage>) -> Result<()> {
    std::thread::Builder::new()
        .name("log-writer".to_string())
        .spawn(move || writer.run(receiver))
        .map(|_| ())
        .map_err(LoggingError::WriterThread)
}
