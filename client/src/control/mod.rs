//! Auxiliary control channel.
//!
//! A reliable, text-only data channel over the transport used for
//! application-level signaling with the assistant. [`ControlChannel`] owns
//! the per-connection bookkeeping (created once, greeted once) and routes
//! inbound text to a [`ControlMessageHandler`].

mod rtvi;

pub use rtvi::{RtviClient, RtviObserver};

use crate::transport::{SharedTransport, lock_transport};
use logging::Logger;

/// Interprets inbound control messages.
pub trait ControlMessageHandler: Send {
    fn handle(&mut self, message: &str);

    /// Message to send once the session is connected and the channel is
    /// open, if any.
    fn greeting(&mut self) -> Option<String> {
        None
    }

    /// Called when the connection ends.
    fn reset(&mut self) {}
}

pub struct ControlChannel {
    label: String,
    handler: Box<dyn ControlMessageHandler>,
    created: bool,
    opened: bool,
    greeted: bool,
    logger: Logger,
}

impl ControlChannel {
    pub fn new(label: String, handler: Box<dyn ControlMessageHandler>, logger: Logger) -> Self {
        Self {
            label,
            handler,
            created: false,
            opened: false,
            greeted: false,
            logger,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_open(&self) -> bool {
        self.opened
    }

    /// The transport reported the channel as open. Creates it on the
    /// transport once per connection and greets if already connected.
    pub fn on_open(&mut self, transport: &SharedTransport, connected: bool) {
        if !self.created {
            match lock_transport(transport).create_data_channel(&self.label) {
                Ok(()) => {
                    self.created = true;
                    self.logger
                        .info(&format!("Control channel '{}' created", self.label));
                }
                Err(e) => {
                    self.logger.error(&format!(
                        "Failed to create control channel '{}': {}",
                        self.label, e
                    ));
                    return;
                }
            }
        }

        self.opened = true;
        if connected {
            self.send_greeting(transport);
        }
    }

    /// The session entered Connected.
    pub fn on_connected(&mut self, transport: &SharedTransport) {
        if self.opened {
            self.send_greeting(transport);
        }
    }

    pub fn on_message(&mut self, message: &str) {
        if !self.opened {
            self.logger
                .debug("Message on control channel before open, handling anyway");
        }
        self.handler.handle(message);
    }

    /// Forgets the channel; the next connection starts from scratch.
    pub fn reset(&mut self) {
        self.created = false;
        self.opened = false;
        self.greeted = false;
        self.handler.reset();
    }

    fn send_greeting(&mut self, transport: &SharedTransport) {
        if self.greeted {
            return;
        }
        let Some(greeting) = self.handler.greeting() else {
            self.greeted = true;
            return;
        };

        match lock_transport(transport).send_data_channel_message(&greeting) {
            Ok(()) => {
                self.greeted = true;
                self.logger.info(&format!("Sent greeting: {}", greeting));
            }
            Err(e) => self
                .logger
                .warn(&format!("Failed to send greeting on '{}': {}", self.label, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{Transport, TransportError};
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct Recorded {
        channels: Vec<String>,
        sent: Vec<String>,
    }

    struct RecordingTransport(Arc<Mutex<Recorded>>);

    impl Transport for RecordingTransport {
        fn create_offer(&mut self) -> Result<(), TransportError> {
            Ok(())
        }
        fn set_remote_description(&mut self, _: &str) -> Result<(), TransportError> {
            Ok(())
        }
        fn create_data_channel(&mut self, label: &str) -> Result<(), TransportError> {
            self.0.lock().unwrap().channels.push(label.to_string());
            Ok(())
        }
        fn send_data_channel_message(&mut self, message: &str) -> Result<(), TransportError> {
            self.0.lock().unwrap().sent.push(message.to_string());
            Ok(())
        }
        fn send_audio(&mut self, _: &[u8]) -> Result<(), TransportError> {
            Ok(())
        }
        fn service(&mut self) {}
        fn close(&mut self) {}
    }

    struct Greeter {
        handled: Arc<Mutex<Vec<String>>>,
    }

    impl ControlMessageHandler for Greeter {
        fn handle(&mut self, message: &str) {
            self.handled.lock().unwrap().push(message.to_string());
        }
        fn greeting(&mut self) -> Option<String> {
            Some("hello".to_string())
        }
    }

    fn setup() -> (ControlChannel, SharedTransport, Arc<Mutex<Recorded>>, Arc<Mutex<Vec<String>>>) {
        let recorded = Arc::new(Mutex::new(Recorded::default()));
        let transport: Box<dyn Transport> = Box::new(RecordingTransport(recorded.clone()));
        let handled = Arc::new(Mutex::new(Vec::new()));
        let channel = ControlChannel::new(
            "rtvi-ai".to_string(),
            Box::new(Greeter {
                handled: handled.clone(),
            }),
            Logger::disabled(),
        );
        (channel, Arc::new(Mutex::new(transport)), recorded, handled)
    }

    #[test]
    fn test_channel_created_once_and_greeted_once() {
        let (mut channel, transport, recorded, _) = setup();

        channel.on_open(&transport, false);
        channel.on_open(&transport, false);
        assert_eq!(recorded.lock().unwrap().channels, vec!["rtvi-ai"]);
        assert!(recorded.lock().unwrap().sent.is_empty());

        channel.on_connected(&transport);
        channel.on_connected(&transport);
        channel.on_open(&transport, true);
        assert_eq!(recorded.lock().unwrap().sent, vec!["hello"]);
    }

    #[test]
    fn test_greeting_waits_for_open() {
        let (mut channel, transport, recorded, _) = setup();

        channel.on_connected(&transport);
        assert!(recorded.lock().unwrap().sent.is_empty());

        channel.on_open(&transport, true);
        assert_eq!(recorded.lock().unwrap().sent, vec!["hello"]);
    }

    #[test]
    fn test_reset_allows_new_channel() {
        let (mut channel, transport, recorded, handled) = setup();
        channel.on_open(&transport, true);
        channel.on_message("bot says hi");
        channel.reset();
        assert!(!channel.is_open());

        channel.on_open(&transport, true);
        let recorded = recorded.lock().unwrap();
        assert_eq!(recorded.channels.len(), 2);
        assert_eq!(recorded.sent.len(), 2);
        assert_eq!(*handled.lock().unwrap(), vec!["bot says hi"]);
    }
}
