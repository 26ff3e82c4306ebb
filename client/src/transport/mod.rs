//! The seam between the session controller and the media transport.
//!
//! The transport (ICE, DTLS, SCTP, RTP, codec plumbing) is an external
//! collaborator. The controller only sees the [`Transport`] trait, builds a
//! fresh instance through a [`TransportFactory`] for every connection
//! attempt, and hears back exclusively through the [`EventSink`] it hands
//! to the factory.

mod error;
mod event_sink;
mod simulated;
mod state;

pub use error::TransportError;
pub use event_sink::EventSink;
pub use simulated::SimulatedTransport;
pub use state::TransportState;

use std::sync::{Arc, Mutex, MutexGuard};

/// Operations the controller needs from a peer connection.
///
/// Callbacks are never invoked re-entrantly through the sink: an
/// implementation may emit events from inside any of these calls, and the
/// sink only queues them.
pub trait Transport: Send {
    /// Starts negotiation. The local description arrives later through
    /// [`EventSink::on_local_description`].
    fn create_offer(&mut self) -> Result<(), TransportError>;

    /// Applies the answer returned by the signaling server.
    fn set_remote_description(&mut self, description: &str) -> Result<(), TransportError>;

    /// Opens the reliable control channel with the given label.
    fn create_data_channel(&mut self, label: &str) -> Result<(), TransportError>;

    fn send_data_channel_message(&mut self, message: &str) -> Result<(), TransportError>;

    /// Sends one encoded audio frame.
    fn send_audio(&mut self, frame: &[u8]) -> Result<(), TransportError>;

    /// Must be called periodically so the transport can make progress
    /// (negotiation, keepalives, delivering queued callbacks).
    fn service(&mut self);

    /// Releases network resources. The instance is dropped right after.
    fn close(&mut self);
}

/// Parameters for building one transport instance.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Label the control channel is expected to carry
    pub control_channel_label: String,
}

/// Builds transports and registers the event sink on them.
pub trait TransportFactory: Send {
    fn create(
        &self,
        config: &TransportConfig,
        sink: EventSink,
    ) -> Result<Box<dyn Transport>, TransportError>;
}

impl<F> TransportFactory for F
where
    F: Fn(&TransportConfig, EventSink) -> Result<Box<dyn Transport>, TransportError> + Send,
{
    fn create(
        &self,
        config: &TransportConfig,
        sink: EventSink,
    ) -> Result<Box<dyn Transport>, TransportError> {
        self(config, sink)
    }
}

/// A transport shared between the main tick and the audio streaming task.
pub type SharedTransport = Arc<Mutex<Box<dyn Transport>>>;

/// Locks a shared transport, recovering the guard if a holder panicked.
pub fn lock_transport(transport: &SharedTransport) -> MutexGuard<'_, Box<dyn Transport>> {
    match transport.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
