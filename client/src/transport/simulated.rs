//! Stand-in transport for running the client on a desktop host.
//!
//! It produces a real-looking offer, accepts any SDP answer the signaling
//! server returns, and then walks through `checking -> connected` and opens
//! the control channel after a few service calls. No media leaves the host:
//! audio frames are only counted.

use super::{EventSink, Transport, TransportConfig, TransportError, TransportState};
use logging::Logger;
use std::collections::VecDeque;

/// Service calls spent "gathering candidates" before the offer is ready.
const GATHER_TICKS: u32 = 3;

/// Service calls spent in connectivity checks once the answer is applied.
const CHECK_TICKS: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Idle,
    Gathering,
    AwaitingAnswer,
    Checking,
    Connected,
    Closed,
}

pub struct SimulatedTransport {
    sink: EventSink,
    logger: Logger,
    control_channel_label: String,
    stage: Stage,
    ticks_in_stage: u32,
    data_channel: Option<String>,
    inbound: VecDeque<String>,
    frames_sent: u64,
    bytes_sent: u64,
}

impl SimulatedTransport {
    pub fn new(config: &TransportConfig, sink: EventSink, logger: Logger) -> Self {
        logger.info(&format!(
            "Simulated transport created (generation {})",
            sink.generation()
        ));
        Self {
            sink,
            logger,
            control_channel_label: config.control_channel_label.clone(),
            stage: Stage::Idle,
            ticks_in_stage: 0,
            data_channel: None,
            inbound: VecDeque::new(),
            frames_sent: 0,
            bytes_sent: 0,
        }
    }

    /// Audio frames accepted so far.
    pub fn frames_sent(&self) -> u64 {
        self.frames_sent
    }

    fn enter(&mut self, stage: Stage) {
        self.stage = stage;
        self.ticks_in_stage = 0;
    }

    fn build_offer(&self) -> String {
        let session_id: u64 = rand::random::<u64>() >> 1;
        format!(
            "v=0\r\n\
             o=- {} 2 IN IP4 127.0.0.1\r\n\
             s=-\r\n\
             t=0 0\r\n\
             a=group:BUNDLE 0 1\r\n\
             m=audio 9 UDP/TLS/RTP/SAVPF 111\r\n\
             c=IN IP4 0.0.0.0\r\n\
             a=rtpmap:111 opus/48000/2\r\n\
             a=sendrecv\r\n\
             a=mid:0\r\n\
             m=application 9 UDP/DTLS/SCTP webrtc-datachannel\r\n\
             a=mid:1\r\n\
             a=sctp-port:5000\r\n",
            session_id
        )
    }
}

impl Transport for SimulatedTransport {
    fn create_offer(&mut self) -> Result<(), TransportError> {
        if self.stage != Stage::Idle {
            return Err(TransportError::Operation(
                "offer already created on this transport".to_string(),
            ));
        }
        self.enter(Stage::Gathering);
        self.sink.on_state_change(TransportState::New);
        Ok(())
    }

    fn set_remote_description(&mut self, description: &str) -> Result<(), TransportError> {
        if self.stage != Stage::AwaitingAnswer {
            return Err(TransportError::Operation("no offer pending".to_string()));
        }
        if !description.starts_with("v=0") {
            return Err(TransportError::Operation(
                "remote description is not SDP".to_string(),
            ));
        }
        self.logger.info(&format!(
            "Remote description applied ({} bytes)",
            description.len()
        ));
        self.enter(Stage::Checking);
        self.sink.on_state_change(TransportState::Checking);
        Ok(())
    }

    fn create_data_channel(&mut self, label: &str) -> Result<(), TransportError> {
        if self.stage != Stage::Connected {
            return Err(TransportError::Operation("transport not connected".to_string()));
        }
        if label != self.control_channel_label {
            self.logger.warn(&format!(
                "Data channel '{}' does not match configured label '{}'",
                label, self.control_channel_label
            ));
        }
        self.data_channel = Some(label.to_string());
        Ok(())
    }

    fn send_data_channel_message(&mut self, message: &str) -> Result<(), TransportError> {
        if self.data_channel.is_none() {
            return Err(TransportError::Operation("data channel not open".to_string()));
        }
        self.logger.debug(&format!("Data channel out: {}", message));
        if message.contains("\"client-ready\"") {
            self.inbound.push_back(
                r#"{"label":"rtvi-ai","type":"bot-ready","data":{"version":"1.0.0"}}"#
                    .to_string(),
            );
        }
        Ok(())
    }

    fn send_audio(&mut self, frame: &[u8]) -> Result<(), TransportError> {
        if self.stage != Stage::Connected {
            return Err(TransportError::Operation("transport not connected".to_string()));
        }
        self.frames_sent += 1;
        self.bytes_sent += frame.len() as u64;
        if self.frames_sent.is_multiple_of(500) {
            self.logger.debug(&format!(
                "Simulated uplink: {} frames, {} bytes",
                self.frames_sent, self.bytes_sent
            ));
        }
        Ok(())
    }

    fn service(&mut self) {
        self.ticks_in_stage += 1;
        match self.stage {
            Stage::Gathering if self.ticks_in_stage >= GATHER_TICKS => {
                let offer = self.build_offer();
                self.enter(Stage::AwaitingAnswer);
                self.sink.on_local_description(offer);
            }
            Stage::Checking if self.ticks_in_stage >= CHECK_TICKS => {
                self.enter(Stage::Connected);
                self.sink.on_state_change(TransportState::Connected);
                self.sink.on_data_channel_open();
            }
            Stage::Connected => {
                while let Some(message) = self.inbound.pop_front() {
                    self.sink.on_data_channel_message(message);
                }
            }
            _ => {}
        }
    }

    fn close(&mut self) {
        if self.stage == Stage::Closed {
            return;
        }
        self.logger.info(&format!(
            "Simulated transport closed after {} audio frames",
            self.frames_sent
        ));
        self.enter(Stage::Closed);
        self.data_channel = None;
        self.sink.on_state_change(TransportState::Closed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::DiscardPlayback;
    use crate::session::{PhaseCell, SessionEvent, TransportEvent};
    use std::sync::Arc;
    use std::sync::mpsc::{Receiver, channel};

    fn transport() -> (SimulatedTransport, Receiver<SessionEvent>) {
        let (tx, rx) = channel();
        let sink = EventSink::new(1, tx, PhaseCell::new(), Arc::new(DiscardPlayback::default()));
        let config = TransportConfig {
            control_channel_label: "rtvi-ai".to_string(),
        };
        (SimulatedTransport::new(&config, sink, Logger::disabled()), rx)
    }

    fn transport_events(rx: &Receiver<SessionEvent>) -> Vec<TransportEvent> {
        rx.try_iter()
            .filter_map(|event| match event {
                SessionEvent::Transport { event, .. } => Some(event),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_negotiation_walkthrough() {
        let (mut transport, rx) = transport();

        transport.create_offer().unwrap();
        for _ in 0..GATHER_TICKS {
            transport.service();
        }
        let events = transport_events(&rx);
        assert!(matches!(
            events.last(),
            Some(TransportEvent::LocalDescription(sdp)) if sdp.starts_with("v=0")
        ));

        transport.set_remote_description("v=0\r\ns=answer\r\n").unwrap();
        for _ in 0..CHECK_TICKS {
            transport.service();
        }
        let events = transport_events(&rx);
        assert!(events.contains(&TransportEvent::StateChanged(TransportState::Connected)));
        assert!(events.contains(&TransportEvent::DataChannelOpen));

        transport.send_audio(&[0xF8, 0xFF, 0xFE]).unwrap();
        assert_eq!(transport.frames_sent(), 1);
    }

    #[test]
    fn test_rejects_answer_without_offer() {
        let (mut transport, _rx) = transport();
        assert!(transport.set_remote_description("v=0").is_err());
    }

    #[test]
    fn test_rejects_audio_before_connected() {
        let (mut transport, _rx) = transport();
        assert!(transport.send_audio(&[1]).is_err());
    }

    #[test]
    fn test_client_ready_gets_bot_ready_reply() {
        let (mut transport, rx) = transport();
        transport.create_offer().unwrap();
        for _ in 0..GATHER_TICKS {
            transport.service();
        }
        transport.set_remote_description("v=0").unwrap();
        for _ in 0..CHECK_TICKS {
            transport.service();
        }
        transport.create_data_channel("rtvi-ai").unwrap();
        transport
            .send_data_channel_message(r#"{"type":"client-ready"}"#)
            .unwrap();
        transport.service();

        let events = transport_events(&rx);
        assert!(events.iter().any(|event| matches!(
            event,
            TransportEvent::DataChannelMessage(msg) if msg.contains("bot-ready")
        )));
    }

    #[test]
    fn test_close_reports_closed_once() {
        let (mut transport, rx) = transport();
        transport.close();
        transport.close();
        let closed = transport_events(&rx)
            .into_iter()
            .filter(|event| *event == TransportEvent::StateChanged(TransportState::Closed))
            .count();
        assert_eq!(closed, 1);
    }
}
