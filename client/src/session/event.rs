use crate::transport::TransportState;

/// Requests coming from the user (button, console).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserRequest {
    Connect,
    Disconnect,
    /// Single-button behavior: connect when idle, otherwise disconnect.
    Toggle,
}

/// What a transport reported through its sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    StateChanged(TransportState),
    LocalDescription(String),
    DataChannelOpen,
    DataChannelMessage(String),
}

/// Everything the main tick applies to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Request(UserRequest),
    /// Tagged with the generation of the transport that emitted it.
    Transport { generation: u64, event: TransportEvent },
}
