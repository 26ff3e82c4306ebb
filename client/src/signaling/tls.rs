use super::SignalingError;
use native_tls::TlsConnector;

/// Builds the TLS connector handed to the HTTP client.
///
/// Certificate and hostname validation are only disabled when
/// `accept_invalid_certs` is set (self-signed development servers).
pub fn build_connector(accept_invalid_certs: bool) -> Result<TlsConnector, SignalingError> {
    TlsConnector::builder()
        .danger_accept_invalid_certs(accept_invalid_certs)
        .danger_accept_invalid_hostnames(accept_invalid_certs)
        .build()
        .map_err(|e| SignalingError::Tls(format!("TLS connector error: {}", e)))
}
