//! Client that delegates to `reqwest`, for comparison with the raw client.

use async_std::task;
use async_trait::async_trait;
use reqwest::blocking::{Client as HttpClient, Request};
use reqwest::header::{HeaderName, HeaderValue};
use reqwest::{Method, Version};

use super::{Client, ClientError, ClientRequest, ClientResponse};
use crate::config::ClientConfig;
use crate::http::HttpVersion;
use crate::http::headers::split_header_line;
use crate::net::tls::TlsVersion;

pub struct CanonicalClient {
    verbose: bool,
    version: Version,
    http: HttpClient,
}

impl CanonicalClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let mut builder = HttpClient::builder()
            .use_rustls_tls()
            .min_tls_version(min_tls_version(config.tls_version))
            .danger_accept_invalid_certs(config.insecure);

        builder = if config.http_version.major() == 2 {
            builder.http2_prior_knowledge()
        } else {
            builder.http1_only()
        };

        Ok(Self {
            verbose: config.verbose,
            version: version(config.http_version),
            http: builder.build()?,
        })
    }

    fn build_request(&self, request: &ClientRequest) -> Result<Request, ClientError> {
        let method = Method::from_bytes(request.method.as_bytes())
            .map_err(|_| ClientError::Method(request.method.clone()))?;

        let mut builder = self
            .http
            .request(method, request.url.as_str())
            .version(self.version)
            .body(request.body.clone());
        for line in &request.header_lines {
            match parse_header(line) {
                Some((name, value)) => builder = builder.header(name, value),
                None => tracing::warn!(line = %line, "Skipping header line"),
            }
        }
        Ok(builder.build()?)
    }

    fn log_request(&self, request: &Request) {
        if !self.verbose {
            return;
        }
        let url = request.url();
        let target = &url[url::Position::BeforePath..url::Position::AfterQuery];
        tracing::info!("> {} {} {:?}", request.method(), target, request.version());
        for (name, value) in request.headers() {
            tracing::info!("> {}: {}", name, String::from_utf8_lossy(value.as_bytes()));
        }
        tracing::info!(">");
    }
}

#[async_trait]
impl Client for CanonicalClient {
    async fn send(&self, request: &ClientRequest) -> Result<ClientResponse, ClientError> {
        let http_request = self.build_request(request)?;
        self.log_request(&http_request);

        let http = self.http.clone();
        let verbose = self.verbose;
        task::spawn_blocking(move || -> Result<ClientResponse, ClientError> {
            let response = http.execute(http_request)?;
            let status_line = format!("{:?} {}", response.version(), response.status());
            let header_lines: Vec<String> = response
                .headers()
                .iter()
                .map(|(name, value)| format!("{}: {}", name, String::from_utf8_lossy(value.as_bytes())))
                .collect();
            if verbose {
                tracing::info!("< {status_line}");
                for line in &header_lines {
                    tracing::info!("< {line}");
                }
                tracing::info!("<");
            }
            let body = response.bytes()?.to_vec();
            Ok(ClientResponse {
                status_line,
                header_lines,
                body,
            })
        })
        .await
    }
}

fn parse_header(line: &str) -> Option<(HeaderName, HeaderValue)> {
    let (name, value) = split_header_line(line).ok()?;
    let name = HeaderName::from_bytes(name.trim().as_bytes()).ok()?;
    let value = HeaderValue::from_str(value.trim()).ok()?;
    Some((name, value))
}

fn version(version: HttpVersion) -> Version {
    match version {
        HttpVersion::V1_0 => Version::HTTP_10,
        HttpVersion::V1_1 => Version::HTTP_11,
        HttpVersion::V2_0 => Version::HTTP_2,
    }
}

fn min_tls_version(version: TlsVersion) -> reqwest::tls::Version {
    match version {
        TlsVersion::Tls10 => reqwest::tls::Version::TLS_1_0,
        TlsVersion::Tls11 => reqwest::tls::Version::TLS_1_1,
        TlsVersion::Tls12 => reqwest::tls::Version::TLS_1_2,
        TlsVersion::Tls13 => reqwest::tls::Version::TLS_1_3,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_lines_become_typed_headers() {
        let (name, value) = parse_header("X-Trace:  abc ").unwrap();
        assert_eq!(name.as_str(), "x-trace");
        assert_eq!(value, "abc");
        assert!(parse_header("no colon").is_none());
        assert!(parse_header("bad name: x").is_none());
    }

    #[test]
    fn versions_map() {
        assert_eq!(version(HttpVersion::V1_0), Version::HTTP_10);
        assert_eq!(version(HttpVersion::V1_1), Version::HTTP_11);
        assert_eq!(version(HttpVersion::V2_0), Version::HTTP_2);
    }
}
