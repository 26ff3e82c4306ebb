//! RTVI messages exchanged with the voice assistant over the control
//! channel.

use super::ControlMessageHandler;
use logging::Logger;
use serde::{Deserialize, Serialize};
use serde_json::Value;

const PROTOCOL_LABEL: &str = "rtvi-ai";
const PROTOCOL_VERSION: &str = "1.0.0";
const LIBRARY_NAME: &str = "voice-client";

/// Receives the assistant's conversational events.
pub trait RtviObserver: Send {
    fn on_bot_ready(&mut self) {}
    fn on_bot_started_speaking(&mut self) {}
    fn on_bot_stopped_speaking(&mut self) {}
    fn on_bot_tts_text(&mut self, _text: &str) {}
    fn on_user_transcription(&mut self, _text: &str, _is_final: bool) {}
}

#[derive(Debug, Serialize)]
struct OutboundMessage<'a, T: Serialize> {
    label: &'a str,
    #[serde(rename = "type")]
    kind: &'a str,
    id: String,
    data: T,
}

#[derive(Debug, Serialize)]
struct ClientReadyData<'a> {
    version: &'a str,
    about: AboutClient<'a>,
}

#[derive(Debug, Serialize)]
struct AboutClient<'a> {
    library: &'a str,
    platform: &'a str,
}

#[derive(Debug, Deserialize)]
struct InboundMessage {
    #[serde(default)]
    label: Option<String>,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: Value,
}

#[derive(Debug, Default, Deserialize)]
struct TextData {
    #[serde(default)]
    text: String,
    #[serde(default, rename = "final")]
    is_final: bool,
}

pub struct RtviClient {
    observer: Box<dyn RtviObserver>,
    logger: Logger,
}

impl RtviClient {
    pub fn new(observer: Box<dyn RtviObserver>, logger: Logger) -> Self {
        Self { observer, logger }
    }

    /// Builds a `client-ready` message with a fresh id.
    pub fn client_ready_message() -> Result<String, serde_json::Error> {
        let message = OutboundMessage {
            label: PROTOCOL_LABEL,
            kind: "client-ready",
            id: format!("{:08x}", rand::random::<u32>()),
            data: ClientReadyData {
                version: PROTOCOL_VERSION,
                about: AboutClient {
                    library: LIBRARY_NAME,
                    platform: std::env::consts::OS,
                },
            },
        };
        serde_json::to_string(&message)
    }

    fn dispatch(&mut self, message: InboundMessage) {
        match message.kind.as_str() {
            "bot-ready" => {
                self.logger.info("Assistant ready");
                self.observer.on_bot_ready();
            }
            "bot-started-speaking" => self.observer.on_bot_started_speaking(),
            "bot-stopped-speaking" => self.observer.on_bot_stopped_speaking(),
            "bot-tts-text" => {
                let data = text_data(message.data);
                self.observer.on_bot_tts_text(&data.text);
            }
            "user-transcription" => {
                let data = text_data(message.data);
                self.observer
                    .on_user_transcription(&data.text, data.is_final);
            }
            other => self
                .logger
                .debug(&format!("Ignoring RTVI message type '{}'", other)),
        }
    }
}

fn text_data(data: Value) -> TextData {
    serde_json::from_value(data).unwrap_or_default()
}

impl ControlMessageHandler for RtviClient {
    fn handle(&mut self, message: &str) {
        let parsed: InboundMessage = match serde_json::from_str(message) {
            Ok(parsed) => parsed,
            Err(e) => {
                self.logger
                    .debug(&format!("Ignoring non-RTVI control message: {}", e));
                return;
            }
        };

        if let Some(label) = &parsed.label
            && label != PROTOCOL_LABEL
        {
            self.logger
                .debug(&format!("Ignoring message with label '{}'", label));
            return;
        }
        self.dispatch(parsed);
    }

    fn greeting(&mut self) -> Option<String> {
        match Self::client_ready_message() {
            Ok(message) => Some(message),
            Err(e) => {
                self.logger
                    .error(&format!("Failed to encode client-ready: {}", e));
                None
            }
        }
    }
}
