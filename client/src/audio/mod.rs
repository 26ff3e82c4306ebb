//! Audio collaborators and the background streaming task.
//!
//! Capture, echo cancellation and encoding live behind [`AudioSource`];
//! decoding and the speaker behind [`AudioPlayback`].

mod silence;
mod streamer;

pub use silence::{DiscardPlayback, SilenceSource};
pub use streamer::AudioStreamer;

/// One encoded audio frame ready to be sent.
pub type EncodedFrame = Vec<u8>;

/// Microphone side: capture plus encode.
pub trait AudioSource: Send {
    /// Returns the next encoded frame, or `None` if nothing is ready yet.
    fn next_encoded_frame(&mut self) -> Option<EncodedFrame>;

    /// Called every time streaming (re)starts, before the first frame is
    /// pulled. Encoders reset their state here.
    fn reset(&mut self) {}
}

/// Speaker side: decode plus playback. Called from transport contexts, so
/// implementations must be cheap and must not block.
pub trait AudioPlayback: Send + Sync {
    fn submit(&self, frame: &[u8]);
}
