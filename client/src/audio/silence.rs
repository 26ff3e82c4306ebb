//! Audio stand-ins for hosts without the device's codec hardware.

use super::{AudioPlayback, AudioSource, EncodedFrame};
use std::sync::atomic::{AtomicU64, Ordering};

/// Opus packet for one 20 ms frame of silence (DTX, TOC byte 0xF8).
const OPUS_SILENCE_FRAME: [u8; 3] = [0xF8, 0xFF, 0xFE];

/// Produces Opus silence, one frame per pull.
#[derive(Debug, Default)]
pub struct SilenceSource {
    frames: u64,
}

impl SilenceSource {
    pub fn frames_produced(&self) -> u64 {
        self.frames
    }
}

impl AudioSource for SilenceSource {
    fn next_encoded_frame(&mut self) -> Option<EncodedFrame> {
        self.frames += 1;
        Some(OPUS_SILENCE_FRAME.to_vec())
    }

    fn reset(&mut self) {
        self.frames = 0;
    }
}

/// Drops inbound audio, counting what arrived.
#[derive(Debug, Default)]
pub struct DiscardPlayback {
    frames: AtomicU64,
    bytes: AtomicU64,
}

impl DiscardPlayback {
    pub fn frames_received(&self) -> u64 {
        self.frames.load(Ordering::Relaxed)
    }

    pub fn bytes_received(&self) -> u64 {
        self.bytes.load(Ordering::Relaxed)
    }
}

impl AudioPlayback for DiscardPlayback {
    fn submit(&self, frame: &[u8]) {
        self.frames.fetch_add(1, Ordering::Relaxed);
        self.bytes.fetch_add(frame.len() as u64, Ordering::Relaxed);
    }
}
