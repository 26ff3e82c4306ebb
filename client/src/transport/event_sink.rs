//! Callbacks the transport invokes.

use crate::audio::AudioPlayback;
use crate::session::{Phase, PhaseCell, SessionEvent, TransportEvent};
use crate::transport::TransportState;
use std::sync::Arc;
use std::sync::mpsc::Sender;

/// The transport's only way to reach the session controller.
///
/// Each sink is bound to one transport generation. State changes,
/// descriptions and control-channel traffic are queued for the main tick
/// tagged with that generation, so events from a transport that has since
/// been destroyed are recognised and dropped. Inbound audio bypasses the
/// queue and goes straight to playback while the session is connected.
#[derive(Clone)]
pub struct EventSink {
    generation: u64,
    events: Sender<SessionEvent>,
    phase: PhaseCell,
    playback: Arc<dyn AudioPlayback>,
}

impl EventSink {
    pub(crate) fn new(
        generation: u64,
        events: Sender<SessionEvent>,
        phase: PhaseCell,
        playback: Arc<dyn AudioPlayback>,
    ) -> Self {
        Self {
            generation,
            events,
            phase,
            playback,
        }
    }

    /// Generation of the transport this sink belongs to.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn on_state_change(&self, state: TransportState) {
        self.push(TransportEvent::StateChanged(state));
    }

    pub fn on_local_description(&self, description: impl Into<String>) {
        self.push(TransportEvent::LocalDescription(description.into()));
    }

    pub fn on_data_channel_open(&self) {
        self.push(TransportEvent::DataChannelOpen);
    }

    pub fn on_data_channel_message(&self, message: impl Into<String>) {
        self.push(TransportEvent::DataChannelMessage(message.into()));
    }

    /// Hands one inbound encoded frame to playback.
    pub fn on_remote_audio(&self, frame: &[u8]) {
        if self.phase.get() == Phase::Connected {
            self.playback.submit(frame);
        }
    }

    fn push(&self, event: TransportEvent) {
        // The receiver only goes away when the controller shuts down.
        let _ = self.events.send(SessionEvent::Transport {
            generation: self.generation,
            event,
        });
    }
}
