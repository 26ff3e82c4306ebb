use super::{StatusBoard, StatusReporter, StatusUpdate};
use logging::Logger;

/// Records every transition through the logger and mirrors it onto the
/// status board.
///
/// Console output, when enabled, comes from the logger's writer thread,
/// so the session thread never writes to a terminal itself.
pub struct LoggedReporter {
    board: StatusBoard,
    logger: Logger,
}

impl LoggedReporter {
    pub fn new(board: StatusBoard, logger: Logger) -> Self {
        Self { board, logger }
    }
}

impl StatusReporter for LoggedReporter {
    fn report(&self, update: &StatusUpdate) {
        let line = format!("[{}] {}", update.phase, update.message());
        if update.kind.is_failure() {
            self.logger.warn(&line);
        } else {
            self.logger.info(&line);
        }
        self.board.report(update);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Phase;
    use crate::status::StatusKind;
    use logging::LogLevel;
    use std::fs;
    use std::thread;
    use std::time::{Duration, Instant};
    use tempfile::tempdir;

    fn wait_for(path: &std::path::Path, needle: &str) -> String {
        let deadline = Instant::now() + Duration::from_secs(2);
        loop {
            let content = fs::read_to_string(path).unwrap_or_default();
            if content.contains(needle) || Instant::now() >= deadline {
                return content;
            }
            thread::sleep(Duration::from_millis(10));
        }
    }

    #[test]
    fn test_report_goes_to_log_and_board() {
        let dir = tempdir().unwrap();
        let log_path = dir.path().join("status.log");
        let logger = Logger::to_file(&log_path, LogLevel::Info, false).unwrap();
        let board = StatusBoard::new();
        let reporter = LoggedReporter::new(board.clone(), logger.for_component("Status"));

        reporter.report(&StatusUpdate::new(Phase::Connecting, StatusKind::Connecting));
        reporter.report(&StatusUpdate::new(Phase::Disconnected, StatusKind::Timeout));

        let content = wait_for(&log_path, "Connection timeout");
        assert!(content.contains("[Status]: [Connecting] Connecting to voice assistant..."));
        assert!(content.contains("[Disconnected] Connection timeout - Tap Connect to retry"));
        assert_eq!(board.snapshot().button_label, "CONNECT");
    }

    #[test]
    fn test_report_with_disabled_logger_still_updates_board() {
        let board = StatusBoard::new();
        let reporter = LoggedReporter::new(board.clone(), Logger::disabled());

        reporter.report(&StatusUpdate::new(Phase::Connected, StatusKind::Connected));
        assert_eq!(board.snapshot().button_label, "DISCONNECT");
    }
}
