//! Wire level client.
//!
//! The request is written line by line in this order:
//!
//! ```text
//! METHOD TARGET VERSION
//! Host: <authority from the URL>
//! <caller header lines, except Host, in caller order>
//! Content-Length: <body length>
//! <blank line>
//! <body bytes, as is>
//! ```
//!
//! The response is read as a status line, header lines up to the first blank
//! line, then everything until the peer closes the connection.
//!
//! In verbose mode the exchange is logged as a `>`/`<` transcript, one plain
//! message per line (see [`crate::http::line`]).

use std::pin::Pin;
use std::sync::Arc;

use async_std::io::prelude::*;
use async_std::io::{BufRead, BufReader};
use async_trait::async_trait;
use url::{Position, Url};

use super::{Client, ClientError, ClientRequest, ClientResponse};
use crate::config::ClientConfig;
use crate::http::headers::HttpHeaders;
use crate::http::line::{read_line, write_line};
use crate::http::{CONTENT_LENGTH_HEADER, HOST_HEADER};
use crate::net::dial::{Connection, Endpoint, dial};
use crate::net::tls;

pub struct RawClient {
    config: ClientConfig,
    tls: Arc<rustls::ClientConfig>,
}

impl RawClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let tls = tls::client_config(config.tls_version, config.insecure)?;
        Ok(Self {
            config: config.clone(),
            tls,
        })
    }

    async fn write_request<W>(
        &self,
        writer: &mut W,
        start_line: &str,
        authority: &str,
        headers: &HttpHeaders,
        body: &[u8],
    ) -> std::io::Result<()>
    where
        W: Write + Unpin,
    {
        let verbose = self.config.verbose;
        write_line(writer, start_line, ">", verbose).await?;
        write_line(writer, &format!("{HOST_HEADER}: {authority}"), ">", verbose).await?;
        for (name, value) in headers.iter() {
            if !name.eq_ignore_ascii_case(HOST_HEADER) {
                write_line(writer, &format!("{name}: {value}"), ">", verbose).await?;
            }
        }
        write_line(
            writer,
            &format!("{CONTENT_LENGTH_HEADER}: {}", body.len()),
            ">",
            verbose,
        )
        .await?;
        write_line(writer, "", ">", verbose).await?;

        if !body.is_empty() {
            if verbose {
                tracing::info!("> {}", String::from_utf8_lossy(body));
            }
            writer.write_all(body).await?;
        }
        writer.flush().await
    }

    async fn read_response<R>(&self, reader: &mut R) -> Result<ClientResponse, ClientError>
    where
        R: BufRead + Unpin,
    {
        let status_line = read_line(reader).await.map_err(ClientError::Response)?;
        self.log_received(&status_line);

        let mut header_lines = Vec::new();
        loop {
            let line = read_line(reader).await.map_err(ClientError::Response)?;
            let line = line.trim();
            self.log_received(line);
            if line.is_empty() {
                break;
            }
            header_lines.push(line.to_string());
        }

        let mut body = Vec::new();
        reader
            .read_to_end(&mut body)
            .await
            .map_err(ClientError::Response)?;

        Ok(ClientResponse {
            status_line,
            header_lines,
            body,
        })
    }

    fn log_received(&self, line: &str) {
        if self.config.verbose {
            tracing::info!("< {}", line.trim());
        }
    }
}

#[async_trait]
impl Client for RawClient {
    async fn send(&self, request: &ClientRequest) -> Result<ClientResponse, ClientError> {
        let url = Url::parse(&request.url)?;
        let endpoint = Endpoint::from_url(&url)?;

        let mut headers = HttpHeaders::new(self.config.normalize_headers);
        headers.add_lines(&request.header_lines)?;

        let start_line = format!(
            "{} {} {}",
            request.method,
            request_target(&url),
            self.config.http_version.proto()
        );

        let mut conn = dial(&endpoint, Arc::clone(&self.tls)).await?;
        self.write_request(
            &mut conn,
            &start_line,
            &endpoint.authority,
            &headers,
            &request.body,
        )
        .await
        .map_err(ClientError::Request)?;

        let response = self.read_response(&mut BufReader::new(&mut conn)).await;
        close(conn).await;
        response
    }
}

/// Path and query of `url`, as they appear in a request line.
fn request_target(url: &Url) -> &str {
    let target = &url[Position::BeforePath..Position::AfterQuery];
    if target.is_empty() { "/" } else { target }
}

async fn close(mut conn: Connection) {
    let closed = std::future::poll_fn(|cx| Pin::new(&mut conn).poll_close(cx)).await;
    if let Err(err) = closed {
        tracing::debug!(error = %err, "Error closing connection");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_std::io::Cursor;

    fn client() -> RawClient {
        RawClient::new(&ClientConfig::default()).unwrap()
    }

    #[test]
    fn target_keeps_query() {
        let url = Url::parse("http://h/a/b?x=1&y=2#frag").unwrap();
        assert_eq!(request_target(&url), "/a/b?x=1&y=2");
        let url = Url::parse("http://h").unwrap();
        assert_eq!(request_target(&url), "/");
    }

    #[async_std::test]
    async fn writes_host_first_and_content_length_last() {
        let mut headers = HttpHeaders::new(false);
        headers
            .add_lines(["x-b: 2", "host: ignored", "X-A: 1", "x-b: 3"])
            .unwrap();

        let mut out = Vec::new();
        client()
            .write_request(&mut out, "PUT /p HTTP/1.1", "h:81", &headers, b"a\r\nb")
            .await
            .unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "PUT /p HTTP/1.1\r\nHost: h:81\r\nx-b: 2\r\nX-A: 1\r\nx-b: 3\r\nContent-Length: 4\r\n\r\na\r\nb"
        );
    }

    #[async_std::test]
    async fn empty_body_still_sends_content_length() {
        let mut out = Vec::new();
        client()
            .write_request(&mut out, "GET / HTTP/1.0", "h", &HttpHeaders::new(false), b"")
            .await
            .unwrap();
        assert_eq!(out, b"GET / HTTP/1.0\r\nHost: h\r\nContent-Length: 0\r\n\r\n");
    }

    #[async_std::test]
    async fn reads_until_close() {
        let raw = b"HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: 2\r\n\r\nbody longer than declared";
        let response = client()
            .read_response(&mut Cursor::new(raw.to_vec()))
            .await
            .unwrap();
        assert_eq!(response.status_line, "HTTP/1.1 200 OK");
        assert_eq!(
            response.header_lines,
            vec!["Content-Type: text/plain", "Content-Length: 2"]
        );
        assert_eq!(response.body, b"body longer than declared");
    }

    #[async_std::test]
    async fn truncated_headers_fail() {
        let raw = b"HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\n";
        let result = client().read_response(&mut Cursor::new(raw.to_vec())).await;
        assert!(matches!(result, Err(ClientError::Response(_))));
    }
}
