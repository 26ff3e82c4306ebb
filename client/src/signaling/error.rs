use std::fmt;

/// Ways a signaling exchange can fail. All of them end the connection
/// attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignalingError {
    /// The local description was empty.
    EmptyDescription,
    /// The local description exceeds the payload limit.
    DescriptionTooLarge { len: usize, max: usize },
    /// The signaling URL cannot be used.
    InvalidEndpoint(String),
    /// The server could not be reached.
    Connect(String),
    /// TLS setup or handshake failed.
    Tls(String),
    /// Reading or writing the connection failed.
    Io(String),
    /// The exchange did not finish within its time bound.
    Timeout,
    /// The server answered with a non-success status.
    HttpStatus { code: u16, reason: String },
    /// The response could not be understood.
    MalformedResponse(String),
    /// The response body exceeds the payload limit.
    ResponseTooLarge { max: usize },
}

impl fmt::Display for SignalingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalingError::EmptyDescription => write!(f, "Local description is empty"),
            SignalingError::DescriptionTooLarge { len, max } => write!(
                f,
                "Local description too large: {} bytes (max {})",
                len, max
            ),
            SignalingError::InvalidEndpoint(msg) => write!(f, "Invalid signaling endpoint: {}", msg),
            SignalingError::Connect(msg) => write!(f, "Failed to connect: {}", msg),
            SignalingError::Tls(msg) => write!(f, "TLS error: {}", msg),
            SignalingError::Io(msg) => write!(f, "I/O error: {}", msg),
            SignalingError::Timeout => write!(f, "Signaling exchange timed out"),
            SignalingError::HttpStatus { code, reason } => {
                write!(f, "Server returned HTTP {} {}", code, reason)
            }
            SignalingError::MalformedResponse(msg) => write!(f, "Malformed response: {}", msg),
            SignalingError::ResponseTooLarge { max } => {
                write!(f, "Response exceeds {} bytes", max)
            }
        }
    }
}

impl std::error::Error for SignalingError {}
