//! HTTP(S) binding of the signaling exchange.
//!
//! One `POST` of the local description per exchange. The client's
//! timeout bounds connect, TLS handshake, write and body read, so the
//! call never blocks longer than the configured timeout.

use super::endpoint::SignalingEndpoint;
use super::tls::build_connector;
use super::{MAX_DESCRIPTION_BYTES, SignalingChannel, SignalingError, validate_description};
use logging::Logger;
use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use std::io::{self, ErrorKind, Read};
use std::time::Duration;

const SDP_MIME: &str = "application/sdp";

const USER_AGENT: &str = concat!("voice-client/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone)]
pub struct HttpSignalingConfig {
    pub url: String,
    /// Sent as `Authorization: Bearer <token>` when set
    pub bearer_token: Option<String>,
    /// Bound on one whole exchange
    pub timeout: Duration,
    pub accept_invalid_certs: bool,
}

pub struct HttpSignaling {
    endpoint: SignalingEndpoint,
    client: Client,
    bearer_token: Option<String>,
    logger: Logger,
}

impl HttpSignaling {
    /// # Errors
    ///
    /// Returns error if the URL is not a usable `http`/`https` endpoint
    /// or the TLS backend cannot be initialised.
    pub fn new(config: HttpSignalingConfig, logger: Logger) -> Result<Self, SignalingError> {
        let endpoint = SignalingEndpoint::parse(&config.url)?;
        let connector = build_connector(config.accept_invalid_certs)?;

        let client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.timeout)
            .user_agent(USER_AGENT)
            .use_preconfigured_tls(connector)
            .build()
            .map_err(|e| SignalingError::Tls(format!("HTTP client setup failed: {}", e)))?;

        Ok(Self {
            endpoint,
            client,
            bearer_token: config.bearer_token,
            logger,
        })
    }

    pub fn endpoint(&self) -> &SignalingEndpoint {
        &self.endpoint
    }
}

impl SignalingChannel for HttpSignaling {
    fn exchange(&mut self, local_description: &str) -> Result<String, SignalingError> {
        validate_description(local_description)?;

        self.logger.info(&format!(
            "POST {} ({} bytes)",
            self.endpoint,
            local_description.len()
        ));

        let mut request = self
            .client
            .post(self.endpoint.url().clone())
            .header(CONTENT_TYPE, SDP_MIME)
            .header(ACCEPT, SDP_MIME)
            .body(local_description.to_string());
        if let Some(token) = &self.bearer_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().map_err(request_error)?;

        let status = response.status();
        if status != StatusCode::OK && status != StatusCode::CREATED {
            return Err(SignalingError::HttpStatus {
                code: status.as_u16(),
                reason: status.canonical_reason().unwrap_or_default().to_string(),
            });
        }
        if response
            .content_length()
            .is_some_and(|len| len > MAX_DESCRIPTION_BYTES as u64)
        {
            return Err(SignalingError::ResponseTooLarge {
                max: MAX_DESCRIPTION_BYTES,
            });
        }

        let answer = read_answer(response)?;
        self.logger
            .info(&format!("Answer received ({} bytes)", answer.len()));
        Ok(answer)
    }
}

/// Reads at most one byte past the limit so an oversized body is
/// detected without buffering it.
fn read_answer(body: impl Read) -> Result<String, SignalingError> {
    let mut buf = Vec::with_capacity(1024);
    body.take(MAX_DESCRIPTION_BYTES as u64 + 1)
        .read_to_end(&mut buf)
        .map_err(read_error)?;

    if buf.len() > MAX_DESCRIPTION_BYTES {
        return Err(SignalingError::ResponseTooLarge {
            max: MAX_DESCRIPTION_BYTES,
        });
    }

    let answer = String::from_utf8(buf)
        .map_err(|_| SignalingError::MalformedResponse("body is not UTF-8".to_string()))?;
    if answer.trim().is_empty() {
        return Err(SignalingError::MalformedResponse(
            "empty answer body".to_string(),
        ));
    }
    Ok(answer)
}

fn request_error(e: reqwest::Error) -> SignalingError {
    if e.is_timeout() {
        SignalingError::Timeout
    } else if e.is_connect() {
        SignalingError::Connect(error_chain(&e))
    } else if e.is_builder() {
        SignalingError::InvalidEndpoint(error_chain(&e))
    } else if e.is_decode() || e.is_body() {
        SignalingError::MalformedResponse(error_chain(&e))
    } else {
        SignalingError::Io(error_chain(&e))
    }
}

fn read_error(e: io::Error) -> SignalingError {
    let timed_out = matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut)
        || e.get_ref()
            .and_then(|inner| inner.downcast_ref::<reqwest::Error>())
            .is_some_and(reqwest::Error::is_timeout);
    if timed_out {
        SignalingError::Timeout
    } else {
        SignalingError::MalformedResponse(e.to_string())
    }
}

/// reqwest's top-level message hides the cause (refused, reset, ...).
fn error_chain(e: &(dyn std::error::Error + 'static)) -> String {
    let mut message = e.to_string();
    let mut source = e.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
