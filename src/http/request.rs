use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::http::headers::HttpHeaders;
use crate::http::{HttpMethod, SLEEP_DURATION_QUERY_PARAM, http_method_from_str};
use crate::units::parse_duration;

/// Digest reported when no body was read.
pub const EMPTY_BODY_HASH: &str = "empty";

/// Why reading a request stopped early. Recorded, never escalated.
#[derive(Debug, Error)]
pub enum ReadError {
    #[error("failed to read request line: {0}")]
    RequestLine(#[source] std::io::Error),
    #[error("failed to read header line: {0}")]
    HeaderLine(#[source] std::io::Error),
    #[error("failed to read body: {0}")]
    Body(#[source] std::io::Error),
    #[error("body ended after {read} of {expected} bytes")]
    ShortBody { read: usize, expected: usize },
}

/// `METHOD TARGET VERSION`, empty unless the start line has exactly three tokens.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestLine {
    pub method: String,
    pub target: String,
    pub version: String,
}

impl RequestLine {
    pub fn parse(line: &str) -> Self {
        let parts: Vec<&str> = line.split(' ').collect();
        match parts.as_slice() {
            [method, target, version] => Self {
                method: method.to_string(),
                target: target.to_string(),
                version: version.to_string(),
            },
            _ => Self::default(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.method.is_empty() && self.target.is_empty() && self.version.is_empty()
    }

    pub fn method(&self) -> HttpMethod {
        http_method_from_str(&self.method)
    }
}

/// Everything the server learned about one request.
///
/// Created per connection, filled by the parser, consumed by the responder.
#[derive(Debug)]
pub struct RequestRecord {
    pub start_line: String,
    pub request_line: RequestLine,
    pub headers: HttpHeaders,
    pub body_size: usize,
    pub body_hash: String,
    pub read_duration: Duration,
    pub sleep_duration: Duration,
    pub content_length: usize,
    pub error: Option<ReadError>,
}

impl RequestRecord {
    pub fn new(normalize_headers: bool) -> Self {
        Self {
            start_line: String::new(),
            request_line: RequestLine::default(),
            headers: HttpHeaders::new(normalize_headers),
            body_size: 0,
            body_hash: EMPTY_BODY_HASH.to_string(),
            read_duration: Duration::ZERO,
            sleep_duration: Duration::ZERO,
            content_length: 0,
            error: None,
        }
    }

    /// Stores the raw start line and, when it splits into three tokens,
    /// picks up a provisional delay from the target's query string.
    pub fn set_start_line(&mut self, line: &str) {
        let line = line.trim();
        self.start_line = line.to_string();
        self.request_line = RequestLine::parse(line);
        if !self.request_line.is_empty() {
            self.sleep_duration = sleep_duration_from_target(&self.request_line.target);
        }
    }

    /// Applies the header-derived control values once all headers are read.
    ///
    /// A positive header delay overrides the query delay; content length only
    /// ever comes from headers.
    pub fn resolve_controls(&mut self) {
        if let Some(delay) = self.headers.sleep_duration().filter(|d| !d.is_zero()) {
            self.sleep_duration = delay;
        }
        self.content_length = self.headers.content_length().unwrap_or(0);
    }

    pub fn expects_body(&self) -> bool {
        !self.request_line.method().skips_body() && self.content_length > 0
    }
}

/// Delay requested through the `rawh-sleep-duration` query parameter, zero if absent or invalid.
pub fn sleep_duration_from_target(target: &str) -> Duration {
    let base = match Url::parse("http://rawh.invalid/") {
        Ok(base) => base,
        Err(_) => return Duration::ZERO,
    };
    let url = match base.join(target) {
        Ok(url) => url,
        Err(err) => {
            tracing::warn!(target_uri = target, error = %err, "Error parsing request target");
            return Duration::ZERO;
        }
    };

    let value = match url
        .query_pairs()
        .find(|(name, _)| name == SLEEP_DURATION_QUERY_PARAM)
    {
        Some((_, value)) if !value.is_empty() => value,
        _ => return Duration::ZERO,
    };

    match parse_duration(&value) {
        Ok(duration) => duration,
        Err(err) => {
            tracing::warn!(
                param = SLEEP_DURATION_QUERY_PARAM,
                value = %value,
                error = %err,
                "Invalid query parameter format"
            );
            Duration::ZERO
        }
    }
}
