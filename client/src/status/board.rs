//! Display-side status model.
//!
//! Holds what the screen shows: a status line, the label of the single
//! button, a color tone and a short scrolling log. Writers never wait on
//! the board lock. A status update that finds it busy is parked and
//! applied by the next writer or snapshot; a log edit is dropped.

use super::{StatusReporter, StatusUpdate};
use crate::control::RtviObserver;
use crate::session::Phase;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, TryLockError};

/// Log lines kept on screen; older ones scroll away.
pub const MAX_LOG_LINES: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Neutral,
    /// Connecting, bot speech
    Blue,
    Green,
    Red,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    pub text: String,
    pub tone: Tone,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusSnapshot {
    pub status: String,
    pub button_label: &'static str,
    pub tone: Tone,
    pub log: Vec<LogLine>,
}

#[derive(Debug)]
struct BoardState {
    status: String,
    button_label: &'static str,
    tone: Tone,
    log: VecDeque<LogLine>,
}

#[derive(Clone)]
pub struct StatusBoard {
    state: Arc<Mutex<BoardState>>,
    /// Latest update that could not be applied; held only to swap it.
    pending: Arc<Mutex<Option<StatusUpdate>>>,
}

impl Default for StatusBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusBoard {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(BoardState {
                status: String::new(),
                button_label: button_label(Phase::Disconnected),
                tone: Tone::Neutral,
                log: VecDeque::with_capacity(MAX_LOG_LINES),
            })),
            pending: Arc::new(Mutex::new(None)),
        }
    }

    /// Starts a neutral log line with `text`.
    pub fn system_log(&self, text: &str) {
        self.with_state(|state| push_line(state, text, Tone::Neutral));
    }

    /// Starts an empty highlighted line for the next bot turn.
    pub fn new_line(&self) {
        self.with_state(|state| push_line(state, "", Tone::Blue));
    }

    /// Appends to the newest log line.
    pub fn append(&self, text: &str) {
        self.with_state(|state| match state.log.back_mut() {
            Some(line) => line.text.push_str(text),
            None => push_line(state, text, Tone::Neutral),
        });
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        let mut state = match self.state.lock() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        };
        self.apply_pending(&mut state);
        StatusSnapshot {
            status: state.status.clone(),
            button_label: state.button_label,
            tone: state.tone,
            log: state.log.iter().cloned().collect(),
        }
    }

    /// Returns `false` without running `f` when the board is busy.
    fn with_state(&self, f: impl FnOnce(&mut BoardState)) -> bool {
        let mut state = match self.state.try_lock() {
            Ok(state) => state,
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
            Err(TryLockError::WouldBlock) => return false,
        };
        self.apply_pending(&mut state);
        f(&mut state);
        true
    }

    fn pending_slot(&self) -> MutexGuard<'_, Option<StatusUpdate>> {
        match self.pending.lock() {
            Ok(slot) => slot,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn apply_pending(&self, state: &mut BoardState) {
        if let Some(update) = self.pending_slot().take() {
            apply_update(state, &update);
        }
    }
}

impl StatusReporter for StatusBoard {
    fn report(&self, update: &StatusUpdate) {
        if !self.with_state(|state| apply_update(state, update)) {
            *self.pending_slot() = Some(*update);
        }
    }
}

fn apply_update(state: &mut BoardState, update: &StatusUpdate) {
    state.status = update.message().to_string();
    state.button_label = button_label(update.phase);
    state.tone = match update.phase {
        Phase::Disconnected => Tone::Red,
        Phase::Connecting => Tone::Blue,
        Phase::Connected => Tone::Green,
    };
}

/// Label of the single button for a phase.
pub fn button_label(phase: Phase) -> &'static str {
    match phase {
        Phase::Disconnected => "CONNECT",
        Phase::Connecting => "CANCEL",
        Phase::Connected => "DISCONNECT",
    }
}

fn push_line(state: &mut BoardState, text: &str, tone: Tone) {
    if state.log.len() >= MAX_LOG_LINES {
        state.log.pop_front();
    }
    state.log.push_back(LogLine {
        text: text.to_string(),
        tone,
    });
}

/// Writes the assistant's speech into the board log, one line per turn.
pub struct TranscriptObserver {
    board: StatusBoard,
}

impl TranscriptObserver {
    pub fn new(board: StatusBoard) -> Self {
        Self { board }
    }
}

impl RtviObserver for TranscriptObserver {
    fn on_bot_ready(&mut self) {
        self.board.system_log("Assistant ready");
    }

    fn on_bot_started_speaking(&mut self) {
        self.board.new_line();
    }

    fn on_bot_tts_text(&mut self, text: &str) {
        if !text.is_empty() {
            self.board.append(text);
            self.board.append(" ");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::StatusKind;

    #[test]
    fn test_report_sets_status_button_and_tone() {
        let board = StatusBoard::new();

        board.report(&StatusUpdate::new(Phase::Connecting, StatusKind::Connecting));
        let snapshot = board.snapshot();
        assert_eq!(snapshot.status, "Connecting to voice assistant...");
        assert_eq!(snapshot.button_label, "CANCEL");
        assert_eq!(snapshot.tone, Tone::Blue);

        board.report(&StatusUpdate::new(Phase::Connected, StatusKind::Connected));
        assert_eq!(board.snapshot().button_label, "DISCONNECT");

        board.report(&StatusUpdate::new(Phase::Disconnected, StatusKind::Timeout));
        let snapshot = board.snapshot();
        assert_eq!(snapshot.button_label, "CONNECT");
        assert_eq!(snapshot.tone, Tone::Red);
    }

    #[test]
    fn test_log_is_bounded() {
        let board = StatusBoard::new();
        for i in 0..MAX_LOG_LINES + 3 {
            board.system_log(&format!("line {}", i));
        }

        let log = board.snapshot().log;
        assert_eq!(log.len(), MAX_LOG_LINES);
        assert_eq!(log[0].text, "line 3");
        assert_eq!(log[MAX_LOG_LINES - 1].text, format!("line {}", MAX_LOG_LINES + 2));
    }

    #[test]
    fn test_transcript_builds_bot_turns() {
        let board = StatusBoard::new();
        let mut observer = TranscriptObserver::new(board.clone());

        observer.on_bot_started_speaking();
        observer.on_bot_tts_text("Hello");
        observer.on_bot_tts_text("there.");
        observer.on_bot_stopped_speaking();

        let log = board.snapshot().log;
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].text, "Hello there. ");
        assert_eq!(log[0].tone, Tone::Blue);
    }

    #[test]
    fn test_report_on_busy_board_is_applied_later() {
        let board = StatusBoard::new();
        let held = board.state.lock().unwrap();
        // Returns immediately while the board is held elsewhere.
        board.report(&StatusUpdate::new(Phase::Connecting, StatusKind::Connecting));
        board.report(&StatusUpdate::new(Phase::Connected, StatusKind::Connected));
        drop(held);

        let snapshot = board.snapshot();
        assert_eq!(snapshot.status, "Connected - Voice assistant ready!");
        assert_eq!(snapshot.button_label, "DISCONNECT");
        assert_eq!(snapshot.tone, Tone::Green);
    }

    #[test]
    fn test_parked_report_precedes_next_write() {
        let board = StatusBoard::new();
        let held = board.state.lock().unwrap();
        board.report(&StatusUpdate::new(Phase::Connected, StatusKind::Connected));
        drop(held);

        board.report(&StatusUpdate::new(
            Phase::Disconnected,
            StatusKind::ConnectionLost,
        ));
        let snapshot = board.snapshot();
        assert_eq!(snapshot.status, "Disconnected - Tap Connect to reconnect");
        assert_eq!(snapshot.button_label, "CONNECT");
    }
}
