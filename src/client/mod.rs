//! Client side: send one request, receive one response.
//!
//! Two implementations sit behind [`Client`]:
//! - [`RawClient`] writes the request line and header lines itself, exactly as configured,
//!   and reads the response straight off the socket;
//! - [`CanonicalClient`] hands the request to a conformant HTTP client library,
//!   for comparison with what the raw client observes.

mod canonical;
mod raw;

pub use canonical::CanonicalClient;
pub use raw::RawClient;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::ClientConfig;
use crate::http::headers::HeaderError;
use crate::net::dial::DialError;

const SAMPLE_DATA_PATTERN: &[u8] = b"1234567890";

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("error parsing URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("error building TLS configuration: {0}")]
    Tls(#[from] rustls::Error),
    #[error(transparent)]
    Dial(#[from] DialError),
    #[error("error adding custom headers: {0}")]
    Headers(#[from] HeaderError),
    #[error("error sending request: {0}")]
    Request(#[source] std::io::Error),
    #[error("error reading response: {0}")]
    Response(#[source] std::io::Error),
    #[error("canonical client error: {0}")]
    Canonical(#[from] reqwest::Error),
    #[error("invalid method: {0}")]
    Method(String),
}

#[derive(Debug, Clone, Default)]
pub struct ClientRequest {
    pub method: String,
    pub url: String,
    /// Raw `name: value` lines, in the order they should be sent.
    pub header_lines: Vec<String>,
    pub body: Vec<u8>,
}

#[derive(Debug, Clone, Default)]
pub struct ClientResponse {
    pub status_line: String,
    pub header_lines: Vec<String>,
    pub body: Vec<u8>,
}

#[async_trait]
pub trait Client: Send + Sync {
    async fn send(&self, request: &ClientRequest) -> Result<ClientResponse, ClientError>;
}

/// Picks the client variant named by `config`.
pub fn build_client(config: &ClientConfig) -> Result<Box<dyn Client>, ClientError> {
    if config.canonical {
        Ok(Box::new(CanonicalClient::new(config)?))
    } else {
        Ok(Box::new(RawClient::new(config)?))
    }
}

/// Prepends `https://` to targets that don't name an http(s) scheme.
pub fn normalize_url(target: &str) -> String {
    if target.starts_with("http") {
        target.to_string()
    } else {
        format!("https://{target}")
    }
}

/// `length` bytes of the repeating pattern `1234567890`.
pub fn generate_sample_data(length: usize) -> Vec<u8> {
    SAMPLE_DATA_PATTERN
        .iter()
        .copied()
        .cycle()
        .take(length)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_data_repeats_pattern() {
        assert!(generate_sample_data(0).is_empty());
        assert_eq!(generate_sample_data(4), b"1234");
        assert_eq!(generate_sample_data(13), b"1234567890123");
        assert_eq!(generate_sample_data(1024).len(), 1024);
        assert_eq!(generate_sample_data(1024), generate_sample_data(1024));
    }

    #[test]
    fn url_gets_https_by_default() {
        assert_eq!(normalize_url("example.com/x"), "https://example.com/x");
        assert_eq!(normalize_url("http://example.com"), "http://example.com");
        assert_eq!(normalize_url("https://example.com"), "https://example.com");
    }
}
