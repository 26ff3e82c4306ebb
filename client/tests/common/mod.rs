//! Fakes shared by the session integration tests.
#![allow(dead_code)]

use logging::Logger;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};
use voice_client::audio::{AudioSource, DiscardPlayback, EncodedFrame};
use voice_client::control::ControlMessageHandler;
use voice_client::signaling::{SignalingChannel, SignalingError};
use voice_client::status::{StatusKind, StatusReporter, StatusUpdate};
use voice_client::transport::{
    EventSink, Transport, TransportConfig, TransportError, TransportFactory, TransportState,
};
use voice_client::{Phase, SessionConfig, SessionController, SessionParts};

pub const OFFER: &str = "v=0\r\no=- 1 2 IN IP4 127.0.0.1\r\ns=-\r\n";
pub const ANSWER: &str = "v=0\r\no=- 9 2 IN IP4 10.0.0.1\r\ns=-\r\n";
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);

/// Everything the fake transports and factory observed.
#[derive(Default)]
pub struct Probe {
    ops: Mutex<Vec<String>>,
    sinks: Mutex<Vec<EventSink>>,
    sent_messages: Mutex<Vec<String>>,
    pub frames_sent: AtomicU64,
    pub service_calls: AtomicU64,
    pub in_send: AtomicBool,
    pub closed_while_sending: AtomicBool,
    pub audio_after_close: AtomicBool,
    pub fail_create: AtomicBool,
    pub fail_offer: AtomicBool,
    pub fail_remote: AtomicBool,
}

impl Probe {
    fn record(&self, op: String) {
        self.ops.lock().unwrap().push(op);
    }

    pub fn ops(&self) -> Vec<String> {
        self.ops.lock().unwrap().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.ops
            .lock()
            .unwrap()
            .iter()
            .filter(|op| op.starts_with(prefix))
            .count()
    }

    pub fn position(&self, op: &str) -> Option<usize> {
        self.ops.lock().unwrap().iter().position(|o| o == op)
    }

    /// Sink of the most recently built transport.
    pub fn sink(&self) -> EventSink {
        self.sinks.lock().unwrap().last().cloned().unwrap()
    }

    /// Sink of a specific transport generation.
    pub fn sink_for(&self, generation: u64) -> EventSink {
        self.sinks
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.generation() == generation)
            .cloned()
            .unwrap()
    }

    pub fn sent_messages(&self) -> Vec<String> {
        self.sent_messages.lock().unwrap().clone()
    }
}

pub struct FakeTransport {
    generation: u64,
    probe: Arc<Probe>,
    closed: bool,
}

impl Transport for FakeTransport {
    fn create_offer(&mut self) -> Result<(), TransportError> {
        self.probe.record(format!("offer:{}", self.generation));
        if self.probe.fail_offer.load(Ordering::SeqCst) {
            return Err(TransportError::Operation("offer refused".to_string()));
        }
        Ok(())
    }

    fn set_remote_description(&mut self, description: &str) -> Result<(), TransportError> {
        self.probe.record(format!("answer:{}", self.generation));
        if self.probe.fail_remote.load(Ordering::SeqCst) || description.is_empty() {
            return Err(TransportError::Operation("answer rejected".to_string()));
        }
        Ok(())
    }

    fn create_data_channel(&mut self, label: &str) -> Result<(), TransportError> {
        self.probe
            .record(format!("channel:{}:{}", self.generation, label));
        Ok(())
    }

    fn send_data_channel_message(&mut self, message: &str) -> Result<(), TransportError> {
        self.probe
            .sent_messages
            .lock()
            .unwrap()
            .push(message.to_string());
        Ok(())
    }

    fn send_audio(&mut self, _frame: &[u8]) -> Result<(), TransportError> {
        if self.closed {
            self.probe.audio_after_close.store(true, Ordering::SeqCst);
        }
        self.probe.in_send.store(true, Ordering::SeqCst);
        thread::sleep(Duration::from_micros(200));
        self.probe.frames_sent.fetch_add(1, Ordering::SeqCst);
        self.probe.in_send.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn service(&mut self) {
        self.probe.service_calls.fetch_add(1, Ordering::SeqCst);
    }

    fn close(&mut self) {
        if self.probe.in_send.load(Ordering::SeqCst) {
            self.probe.closed_while_sending.store(true, Ordering::SeqCst);
        }
        self.closed = true;
        self.probe.record(format!("close:{}", self.generation));
    }
}

impl Drop for FakeTransport {
    fn drop(&mut self) {
        self.probe.record(format!("drop:{}", self.generation));
    }
}

pub struct FakeFactory {
    pub probe: Arc<Probe>,
}

impl TransportFactory for FakeFactory {
    fn create(
        &self,
        _config: &TransportConfig,
        sink: EventSink,
    ) -> Result<Box<dyn Transport>, TransportError> {
        if self.probe.fail_create.load(Ordering::SeqCst) {
            return Err(TransportError::Create("out of sockets".to_string()));
        }
        let generation = sink.generation();
        self.probe.record(format!("create:{}", generation));
        self.probe.sinks.lock().unwrap().push(sink);
        Ok(Box::new(FakeTransport {
            generation,
            probe: self.probe.clone(),
            closed: false,
        }))
    }
}

/// Answers from a script; `ANSWER` once the script runs out.
#[derive(Clone, Default)]
pub struct ScriptedSignaling {
    script: Arc<Mutex<VecDeque<Result<String, SignalingError>>>>,
    offers: Arc<Mutex<Vec<String>>>,
}

impl ScriptedSignaling {
    pub fn push(&self, response: Result<String, SignalingError>) {
        self.script.lock().unwrap().push_back(response);
    }

    pub fn offers(&self) -> Vec<String> {
        self.offers.lock().unwrap().clone()
    }
}

impl SignalingChannel for ScriptedSignaling {
    fn exchange(&mut self, local_description: &str) -> Result<String, SignalingError> {
        self.offers
            .lock()
            .unwrap()
            .push(local_description.to_string());
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(ANSWER.to_string()))
    }
}

#[derive(Clone, Default)]
pub struct RecordingReporter {
    updates: Arc<Mutex<Vec<StatusUpdate>>>,
}

impl RecordingReporter {
    pub fn updates(&self) -> Vec<StatusUpdate> {
        self.updates.lock().unwrap().clone()
    }

    pub fn kinds(&self) -> Vec<StatusKind> {
        self.updates().iter().map(|u| u.kind).collect()
    }

    pub fn last(&self) -> Option<StatusUpdate> {
        self.updates.lock().unwrap().last().copied()
    }
}

impl StatusReporter for RecordingReporter {
    fn report(&self, update: &StatusUpdate) {
        self.updates.lock().unwrap().push(*update);
    }
}

#[derive(Clone, Default)]
pub struct RecordingHandler {
    handled: Arc<Mutex<Vec<String>>>,
}

impl RecordingHandler {
    pub fn handled(&self) -> Vec<String> {
        self.handled.lock().unwrap().clone()
    }
}

impl ControlMessageHandler for RecordingHandler {
    fn handle(&mut self, message: &str) {
        self.handled.lock().unwrap().push(message.to_string());
    }

    fn greeting(&mut self) -> Option<String> {
        Some("client-ready".to_string())
    }
}

/// Counts resets; yields a frame on every pull.
#[derive(Clone, Default)]
pub struct CountingSource {
    pub resets: Arc<AtomicU64>,
}

impl AudioSource for CountingSource {
    fn next_encoded_frame(&mut self) -> Option<EncodedFrame> {
        Some(vec![0xF8, 0xFF, 0xFE])
    }

    fn reset(&mut self) {
        self.resets.fetch_add(1, Ordering::SeqCst);
    }
}

pub struct Harness {
    pub controller: SessionController,
    pub probe: Arc<Probe>,
    pub signaling: ScriptedSignaling,
    pub reporter: RecordingReporter,
    pub handler: RecordingHandler,
    pub playback: Arc<DiscardPlayback>,
    pub source: CountingSource,
}

impl Harness {
    pub fn new() -> Self {
        Self::try_new(Arc::new(Probe::default())).unwrap()
    }

    pub fn try_new(probe: Arc<Probe>) -> Result<Self, TransportError> {
        let signaling = ScriptedSignaling::default();
        let reporter = RecordingReporter::default();
        let handler = RecordingHandler::default();
        let playback = Arc::new(DiscardPlayback::default());
        let source = CountingSource::default();

        let parts = SessionParts {
            transport_factory: Box::new(FakeFactory {
                probe: probe.clone(),
            }),
            signaling: Box::new(signaling.clone()),
            audio_source: Box::new(source.clone()),
            playback: playback.clone(),
            reporter: Arc::new(reporter.clone()),
            control_handler: Box::new(handler.clone()),
        };
        let config = SessionConfig {
            connect_timeout: CONNECT_TIMEOUT,
            tick_interval: Duration::from_millis(2),
            control_channel_label: "rtvi-ai".to_string(),
        };

        let controller = SessionController::new(config, parts, Logger::disabled())?;
        Ok(Self {
            controller,
            probe,
            signaling,
            reporter,
            handler,
            playback,
            source,
        })
    }

    pub fn tick(&mut self) {
        self.controller.run_tick().unwrap();
    }

    pub fn tick_at(&mut self, now: Instant) {
        self.controller.tick_at(now).unwrap();
    }

    pub fn phase(&self) -> Phase {
        self.controller.phase()
    }

    pub fn last_kind(&self) -> Option<StatusKind> {
        self.reporter.last().map(|u| u.kind)
    }

    /// Connect request applied: phase Connecting, offer requested.
    pub fn connect(&mut self) {
        assert!(self.controller.handle().connect());
        self.tick();
        assert_eq!(self.phase(), Phase::Connecting);
    }

    /// Local description produced and answered.
    pub fn negotiate(&mut self) {
        self.probe.sink().on_local_description(OFFER);
        self.tick();
    }

    /// Full path from Disconnected to Connected.
    pub fn establish(&mut self) {
        self.connect();
        self.negotiate();
        self.probe.sink().on_state_change(TransportState::Connected);
        self.tick();
        assert_eq!(self.phase(), Phase::Connected);
    }

    pub fn disconnect(&mut self) {
        assert!(self.controller.handle().disconnect());
        self.tick();
    }
}

/// Polls `condition` for up to two seconds.
pub fn wait_until(condition: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(2));
    }
    false
}
