//! Signaling Exchange
//!
//! One blocking request/response hop that trades the local session
//! description for the remote one. The controller only depends on
//! [`SignalingChannel`]; [`HttpSignaling`] is the HTTP(S) binding.

mod endpoint;
mod error;
mod http;
mod tls;

pub use endpoint::SignalingEndpoint;
pub use error::SignalingError;
pub use http::{HttpSignaling, HttpSignalingConfig};

/// Largest session description accepted in either direction, in bytes.
pub const MAX_DESCRIPTION_BYTES: usize = 4096;

/// A bounded, blocking description exchange with a known server.
pub trait SignalingChannel: Send {
    /// Sends `local_description` and returns the remote description.
    ///
    /// Blocks for at most the channel's configured timeout.
    fn exchange(&mut self, local_description: &str) -> Result<String, SignalingError>;
}

/// Checks the payload bounds shared by requests and responses.
pub fn validate_description(description: &str) -> Result<(), SignalingError> {
    if description.trim().is_empty() {
        return Err(SignalingError::EmptyDescription);
    }
    if description.len() > MAX_DESCRIPTION_BYTES {
        return Err(SignalingError::DescriptionTooLarge {
            len: description.len(),
            max: MAX_DESCRIPTION_BYTES,
        });
    }
    Ok(())
}
