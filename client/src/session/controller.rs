//! Session State Machine
//!
//! | From                   | Trigger                         | To           |
//! |------------------------|---------------------------------|--------------|
//! | Disconnected           | connect request                 | Connecting   |
//! | Connecting             | local description ready         | Connecting   |
//! | Connecting             | signaling or offer failure      | Disconnected |
//! | Connecting             | transport connected             | Connected    |
//! | Connecting             | deadline passed (tick)          | Disconnected |
//! | Connecting / Connected | transport failed/closed/lost    | Disconnected |
//! | Connecting / Connected | disconnect request              | Disconnected |
//!
//! Anything else leaves the phase unchanged. Every entry into
//! `Disconnected` stops the streaming task (joined), destroys the transport
//! and builds the next one, in that order.

use super::handle::RequestSlot;
use super::{Phase, PhaseCell, SessionEvent, SessionHandle, TransportEvent, UserRequest};
use crate::audio::{AudioPlayback, AudioSource, AudioStreamer};
use crate::control::{ControlChannel, ControlMessageHandler};
use crate::signaling::SignalingChannel;
use crate::status::{StatusKind, StatusReporter, StatusUpdate};
use crate::transport::{
    EventSink, SharedTransport, TransportConfig, TransportError, TransportFactory, TransportState,
    lock_transport,
};
use logging::Logger;
use std::sync::mpsc::{Receiver, Sender, TryRecvError, channel};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Timing and naming for one session controller.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Longest time a connection attempt may stay in `Connecting`
    pub connect_timeout: Duration,
    /// Main tick and streaming period
    pub tick_interval: Duration,
    pub control_channel_label: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(15),
            tick_interval: Duration::from_millis(15),
            control_channel_label: "rtvi-ai".to_string(),
        }
    }
}

/// The collaborators a controller drives.
pub struct SessionParts {
    pub transport_factory: Box<dyn TransportFactory>,
    pub signaling: Box<dyn SignalingChannel>,
    pub audio_source: Box<dyn AudioSource>,
    pub playback: Arc<dyn AudioPlayback>,
    pub reporter: Arc<dyn StatusReporter>,
    pub control_handler: Box<dyn ControlMessageHandler>,
}

pub struct SessionController {
    config: SessionConfig,
    phase: PhaseCell,
    factory: Box<dyn TransportFactory>,
    signaling: Box<dyn SignalingChannel>,
    playback: Arc<dyn AudioPlayback>,
    reporter: Arc<dyn StatusReporter>,
    control: ControlChannel,
    streamer: AudioStreamer,
    transport: Option<SharedTransport>,
    generation: u64,
    connect_deadline: Option<Instant>,
    remote_applied: bool,
    requests: RequestSlot,
    events_tx: Sender<SessionEvent>,
    events_rx: Receiver<SessionEvent>,
    logger: Logger,
}

impl SessionController {
    /// Builds the controller and its first transport.
    ///
    /// # Errors
    ///
    /// Returns error if the first transport cannot be created.
    pub fn new(
        config: SessionConfig,
        parts: SessionParts,
        logger: Logger,
    ) -> Result<Self, TransportError> {
        let (events_tx, events_rx) = channel();
        let streamer = AudioStreamer::new(
            parts.audio_source,
            config.tick_interval,
            logger.for_component("AudioStream"),
        );
        let control = ControlChannel::new(
            config.control_channel_label.clone(),
            parts.control_handler,
            logger.for_component("ControlChannel"),
        );

        let mut controller = Self {
            config,
            phase: PhaseCell::new(),
            factory: parts.transport_factory,
            signaling: parts.signaling,
            playback: parts.playback,
            reporter: parts.reporter,
            control,
            streamer,
            transport: None,
            generation: 0,
            connect_deadline: None,
            remote_applied: false,
            requests: RequestSlot::default(),
            events_tx,
            events_rx,
            logger,
        };

        controller.build_transport()?;
        controller.report(StatusKind::Ready);
        Ok(controller)
    }

    /// Handle for contexts that issue user requests.
    pub fn handle(&self) -> SessionHandle {
        SessionHandle::new(&self.requests, self.phase.clone())
    }

    pub fn phase(&self) -> Phase {
        self.phase.get()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub(crate) fn logger(&self) -> &Logger {
        &self.logger
    }

    /// Generation of the current transport; bumps on every rebuild.
    pub fn transport_generation(&self) -> u64 {
        self.generation
    }

    pub fn connect_deadline(&self) -> Option<Instant> {
        self.connect_deadline
    }

    pub fn is_streaming(&self) -> bool {
        self.streamer.is_running()
    }

    /// Streaming loops currently executing (0 or 1).
    pub fn streaming_instances(&self) -> usize {
        self.streamer.live_instances()
    }

    /// One main tick at the current time.
    pub fn run_tick(&mut self) -> Result<(), TransportError> {
        self.tick_at(Instant::now())
    }

    /// One main tick: service the transport, apply the pending user
    /// request and queued transport events, then check the connection
    /// deadline.
    ///
    /// # Errors
    ///
    /// Only a failed transport rebuild is returned; every other failure is
    /// absorbed into a transition and a status report.
    pub fn tick_at(&mut self, now: Instant) -> Result<(), TransportError> {
        if let Some(transport) = &self.transport {
            lock_transport(transport).service();
        }
        self.process_pending(now)?;
        self.check_deadline(now)
    }

    /// Applies the latest user request, then every queued transport
    /// event, without servicing the transport.
    pub fn process_pending(&mut self, now: Instant) -> Result<(), TransportError> {
        if let Some(request) = self.requests.take() {
            self.handle_event(SessionEvent::Request(request), now)?;
        }
        loop {
            match self.events_rx.try_recv() {
                Ok(event) => self.handle_event(event, now)?,
                Err(TryRecvError::Empty) => return Ok(()),
                // The controller holds a sender itself.
                Err(TryRecvError::Disconnected) => return Ok(()),
            }
        }
    }

    /// Applies one event.
    pub fn handle_event(&mut self, event: SessionEvent, now: Instant) -> Result<(), TransportError> {
        match event {
            SessionEvent::Request(UserRequest::Connect) => self.connect(now),
            SessionEvent::Request(UserRequest::Disconnect) => self.disconnect(),
            SessionEvent::Request(UserRequest::Toggle) => match self.phase.get() {
                Phase::Disconnected => self.connect(now),
                Phase::Connecting | Phase::Connected => self.disconnect(),
            },
            SessionEvent::Transport { generation, event } if generation != self.generation => {
                self.logger.debug(&format!(
                    "Dropping {:?} from stale transport generation {} (current {})",
                    event, generation, self.generation
                ));
                Ok(())
            }
            SessionEvent::Transport { event, .. } => self.on_transport_event(event),
        }
    }

    /// Stops streaming and closes the transport without rebuilding it.
    pub fn shutdown(&mut self) {
        self.logger.info("Shutting down session");
        self.phase.set(Phase::Disconnected);
        self.connect_deadline = None;
        self.streamer.stop();
        self.control.reset();
        self.destroy_transport();
    }

    fn connect(&mut self, now: Instant) -> Result<(), TransportError> {
        let phase = self.phase.get();
        if phase != Phase::Disconnected {
            self.logger
                .debug(&format!("Connect request ignored while {}", phase));
            return Ok(());
        }

        if self.transport.is_none() {
            self.build_transport()?;
        }

        self.logger.info("Connecting to signaling server");
        self.phase.set(Phase::Connecting);
        self.connect_deadline = Some(now + self.config.connect_timeout);
        self.remote_applied = false;
        self.report(StatusKind::Connecting);

        // Borrow only: teardown below needs the sole reference.
        let offer = match &self.transport {
            Some(transport) => lock_transport(transport).create_offer(),
            None => Ok(()),
        };
        if let Err(e) = offer {
            self.logger.error(&format!("Failed to create offer: {}", e));
            return self.enter_disconnected(StatusKind::ConnectionFailed);
        }
        Ok(())
    }

    fn disconnect(&mut self) -> Result<(), TransportError> {
        let phase = self.phase.get();
        if phase == Phase::Disconnected {
            self.logger.debug("Disconnect request ignored while Disconnected");
            return Ok(());
        }

        self.logger.info(&format!("Disconnecting (was {})", phase));
        self.report(StatusKind::Disconnecting);
        self.enter_disconnected(StatusKind::Disconnected)
    }

    fn check_deadline(&mut self, now: Instant) -> Result<(), TransportError> {
        if self.phase.get() != Phase::Connecting {
            return Ok(());
        }
        match self.connect_deadline {
            Some(deadline) if now > deadline => {
                self.logger.warn(&format!(
                    "Connection timeout after {} ms",
                    self.config.connect_timeout.as_millis()
                ));
                self.enter_disconnected(StatusKind::Timeout)
            }
            _ => Ok(()),
        }
    }

    fn on_transport_event(&mut self, event: TransportEvent) -> Result<(), TransportError> {
        match event {
            TransportEvent::StateChanged(state) => self.on_state_change(state),
            TransportEvent::LocalDescription(description) => {
                self.on_local_description(&description)
            }
            TransportEvent::DataChannelOpen => {
                let phase = self.phase.get();
                if phase == Phase::Disconnected {
                    return Ok(());
                }
                if let Some(transport) = &self.transport {
                    self.control.on_open(transport, phase == Phase::Connected);
                }
                Ok(())
            }
            TransportEvent::DataChannelMessage(message) => {
                if self.phase.get() == Phase::Connected {
                    self.control.on_message(&message);
                } else {
                    self.logger
                        .debug("Control message ignored: session not connected");
                }
                Ok(())
            }
        }
    }

    fn on_state_change(&mut self, state: TransportState) -> Result<(), TransportError> {
        let phase = self.phase.get();
        self.logger
            .info(&format!("Transport state: {} (phase {})", state, phase));

        match state {
            TransportState::Connected | TransportState::Completed if phase == Phase::Connecting => {
                self.enter_connected();
                Ok(())
            }
            s if s.is_terminal() && phase != Phase::Disconnected => {
                self.enter_disconnected(StatusKind::ConnectionLost)
            }
            _ => Ok(()),
        }
    }

    fn on_local_description(&mut self, description: &str) -> Result<(), TransportError> {
        if self.phase.get() != Phase::Connecting || self.remote_applied {
            self.logger
                .debug("Local description ignored: no exchange pending");
            return Ok(());
        }
        if self.transport.is_none() {
            return Ok(());
        }

        self.logger.info(&format!(
            "Local description ready ({} bytes), exchanging with signaling server",
            description.len()
        ));

        let answer = match self.signaling.exchange(description) {
            Ok(answer) => answer,
            Err(e) => {
                self.logger
                    .error(&format!("Signaling exchange failed: {}", e));
                return self.enter_disconnected(StatusKind::ConnectionFailed);
            }
        };

        self.logger.info(&format!(
            "Remote description received ({} bytes)",
            answer.len()
        ));
        let applied = match &self.transport {
            Some(transport) => lock_transport(transport).set_remote_description(&answer),
            None => return Ok(()),
        };
        match applied {
            Ok(()) => {
                self.remote_applied = true;
                Ok(())
            }
            Err(e) => {
                self.logger
                    .error(&format!("Failed to apply remote description: {}", e));
                self.enter_disconnected(StatusKind::ConnectionFailed)
            }
        }
    }

    fn enter_connected(&mut self) {
        let Some(transport) = self.transport.clone() else {
            return;
        };

        self.phase.set(Phase::Connected);
        self.connect_deadline = None;
        self.streamer.start(transport.clone(), self.phase.clone());
        self.report(StatusKind::Connected);
        self.control.on_connected(&transport);
    }

    /// Shared path into `Disconnected`: stop streaming (joined), destroy the
    /// transport, build the next one, report.
    fn enter_disconnected(&mut self, kind: StatusKind) -> Result<(), TransportError> {
        self.phase.set(Phase::Disconnected);
        self.connect_deadline = None;
        self.remote_applied = false;

        self.streamer.stop();
        self.control.reset();
        self.destroy_transport();
        let rebuilt = self.build_transport();

        self.report(kind);
        rebuilt
    }

    fn destroy_transport(&mut self) {
        let Some(transport) = self.transport.take() else {
            return;
        };

        match Arc::try_unwrap(transport) {
            Ok(mutex) => {
                let mut transport = match mutex.into_inner() {
                    Ok(transport) => transport,
                    Err(poisoned) => poisoned.into_inner(),
                };
                transport.close();
            }
            Err(shared) => {
                self.logger.error(&format!(
                    "Transport generation {} still referenced by {} holder(s) at teardown",
                    self.generation,
                    Arc::strong_count(&shared) - 1
                ));
                lock_transport(&shared).close();
            }
        }
        self.logger
            .info(&format!("Transport generation {} destroyed", self.generation));
    }

    fn build_transport(&mut self) -> Result<(), TransportError> {
        self.generation += 1;
        let sink = EventSink::new(
            self.generation,
            self.events_tx.clone(),
            self.phase.clone(),
            self.playback.clone(),
        );
        let config = TransportConfig {
            control_channel_label: self.config.control_channel_label.clone(),
        };

        match self.factory.create(&config, sink) {
            Ok(transport) => {
                self.transport = Some(Arc::new(Mutex::new(transport)));
                self.logger
                    .info(&format!("Transport generation {} ready", self.generation));
                Ok(())
            }
            Err(e) => {
                self.logger.error(&format!(
                    "Failed to build transport generation {}: {}",
                    self.generation, e
                ));
                Err(e)
            }
        }
    }

    fn report(&self, kind: StatusKind) {
        self.reporter
            .report(&StatusUpdate::new(self.phase.get(), kind));
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        self.streamer.stop();
        self.destroy_transport();
    }
}
