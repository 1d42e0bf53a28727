use thiserror::Error;

pub mod headers;
pub mod line;
pub mod parser;
pub mod request;
pub mod response;

/// Header carrying an artificial processing delay, e.g. `Rawh-Sleep-Duration: 250ms`.
pub const SLEEP_DURATION_HEADER: &str = "Rawh-Sleep-Duration";
/// Query parameter carrying an artificial processing delay, e.g. `/?rawh-sleep-duration=1s`.
pub const SLEEP_DURATION_QUERY_PARAM: &str = "rawh-sleep-duration";
/// Header listing space separated header names to mirror back in the response.
pub const ECHO_HEADER: &str = "Rawh-Echo";
pub const CONTENT_LENGTH_HEADER: &str = "Content-Length";
pub const HOST_HEADER: &str = "Host";

#[derive(Debug, Error, PartialEq)]
pub enum VersionError {
    #[error("unsupported TLS version: {0}")]
    UnsupportedTls(String),
    #[error("unsupported HTTP version: {0}")]
    UnsupportedHttp(String),
}

/// HTTP versions a client can be asked to speak.
#[derive(PartialEq, PartialOrd, Debug, Clone, Copy)]
pub enum HttpVersion {
    V1_0,
    V1_1,
    V2_0,
}

const HTTP_VERSIONS: &[(&str, HttpVersion)] = &[
    ("1.0", HttpVersion::V1_0),
    ("1.1", HttpVersion::V1_1),
    ("2.0", HttpVersion::V2_0),
    ("2", HttpVersion::V2_0),
];

impl HttpVersion {
    /// Looks up a version by its command line name (`1.0`, `1.1`, `2.0`, `2`).
    pub fn from_name(name: &str) -> Result<HttpVersion, VersionError> {
        HTTP_VERSIONS
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| *v)
            .ok_or_else(|| VersionError::UnsupportedHttp(name.to_string()))
    }

    /// Protocol string as written in a request line.
    pub fn proto(&self) -> &'static str {
        match self {
            HttpVersion::V1_0 => "HTTP/1.0",
            HttpVersion::V1_1 => "HTTP/1.1",
            HttpVersion::V2_0 => "HTTP/2.0",
        }
    }

    pub fn major(&self) -> u8 {
        match self {
            HttpVersion::V1_0 | HttpVersion::V1_1 => 1,
            HttpVersion::V2_0 => 2,
        }
    }
}

#[derive(PartialEq, Debug)]
pub enum HttpMethod {
    Get,
    Head,
    Post,
    Put,
    Delete,
    Connect,
    Options,
    Trace,
    Patch,
    Unknown,
}

impl HttpMethod {
    /// GET and HEAD requests never have their body read.
    pub fn skips_body(&self) -> bool {
        matches!(self, HttpMethod::Get | HttpMethod::Head)
    }
}

/// Method tokens are matched case-sensitively, as they appear on the wire.
pub fn http_method_from_str(method: &str) -> HttpMethod {
    match method {
        "GET" => HttpMethod::Get,
        "HEAD" => HttpMethod::Head,
        "POST" => HttpMethod::Post,
        "PUT" => HttpMethod::Put,
        "DELETE" => HttpMethod::Delete,
        "TRACE" => HttpMethod::Trace,
        "OPTIONS" => HttpMethod::Options,
        "CONNECT" => HttpMethod::Connect,
        "PATCH" => HttpMethod::Patch,
        _ => HttpMethod::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_version_table() {
        assert_eq!(HttpVersion::from_name("1.0").unwrap().proto(), "HTTP/1.0");
        assert_eq!(HttpVersion::from_name("1.1").unwrap().proto(), "HTTP/1.1");
        assert_eq!(HttpVersion::from_name("2"), HttpVersion::from_name("2.0"));
        assert_eq!(HttpVersion::from_name("2").unwrap().major(), 2);
        assert_eq!(
            HttpVersion::from_name("3"),
            Err(VersionError::UnsupportedHttp("3".to_string()))
        );
    }

    #[test]
    fn method_matching_is_exact() {
        assert!(http_method_from_str("GET").skips_body());
        assert!(http_method_from_str("HEAD").skips_body());
        assert!(!http_method_from_str("get").skips_body());
        assert_eq!(http_method_from_str("BREW"), HttpMethod::Unknown);
    }
}
