use super::SignalingError;
use std::fmt;
use url::Url;

/// A validated `http`/`https` signaling URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalingEndpoint {
    url: Url,
}

impl SignalingEndpoint {
    pub fn parse(raw: &str) -> Result<Self, SignalingError> {
        let raw = raw.trim();
        let url = Url::parse(raw)
            .map_err(|e| SignalingError::InvalidEndpoint(format!("'{}': {}", raw, e)))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(SignalingError::InvalidEndpoint(format!(
                "unsupported scheme '{}' in '{}'",
                url.scheme(),
                raw
            )));
        }
        if url.host_str().is_none_or(str::is_empty) {
            return Err(SignalingError::InvalidEndpoint(format!(
                "missing host in '{}'",
                raw
            )));
        }
        if url.port() == Some(0) {
            return Err(SignalingError::InvalidEndpoint(format!(
                "invalid port 0 in '{}'",
                raw
            )));
        }

        Ok(Self { url })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn is_secure(&self) -> bool {
        self.url.scheme() == "https"
    }
}

impl fmt::Display for SignalingEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.url)
    }
}
