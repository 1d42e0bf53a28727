//! Opens the byte stream a raw request is written to.

use std::io;
use std::net::IpAddr;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use async_std::io::{Read, Write};
use async_std::net::TcpStream;
use futures_rustls::TlsConnector;
use futures_rustls::client::TlsStream;
use rustls::ClientConfig;
use rustls::pki_types::{InvalidDnsNameError, ServerName};
use thiserror::Error;
use url::{Host, Url};

#[derive(Debug, Error)]
pub enum DialError {
    #[error("URL has no host: {0}")]
    MissingHost(String),
    #[error("URL has no port and scheme '{0}' has no default")]
    MissingPort(String),
    #[error("error establishing connection: {0}")]
    Connect(#[source] io::Error),
    #[error("invalid TLS server name: {0}")]
    ServerName(#[from] InvalidDnsNameError),
    #[error("error establishing secure connection: {0}")]
    Handshake(#[source] io::Error),
}

/// Where a URL points: what goes into `Host:` and what gets dialed.
#[derive(Debug, Clone, PartialEq)]
pub struct Endpoint {
    /// `host` or `host:port`, as written in the URL.
    pub authority: String,
    pub host: Host<String>,
    pub port: u16,
    pub secure: bool,
}

impl Endpoint {
    pub fn from_url(url: &Url) -> Result<Self, DialError> {
        let host = url
            .host()
            .ok_or_else(|| DialError::MissingHost(url.to_string()))?
            .to_owned();
        let port = url
            .port_or_known_default()
            .ok_or_else(|| DialError::MissingPort(url.scheme().to_string()))?;

        let mut authority = url.host_str().unwrap_or_default().to_string();
        if let Some(explicit) = url.port() {
            authority.push_str(&format!(":{explicit}"));
        }

        Ok(Self {
            authority,
            host,
            port,
            secure: url.scheme() == "https",
        })
    }

    fn server_name(&self) -> Result<ServerName<'static>, DialError> {
        Ok(match &self.host {
            Host::Domain(domain) => ServerName::try_from(domain.as_str())?.to_owned(),
            Host::Ipv4(ip) => ServerName::IpAddress(IpAddr::V4(*ip).into()),
            Host::Ipv6(ip) => ServerName::IpAddress(IpAddr::V6(*ip).into()),
        })
    }
}

/// A plain or TLS wrapped TCP stream. Dropping it closes the socket.
pub enum Connection {
    Plain(TcpStream),
    Tls(Box<TlsStream<TcpStream>>),
}

/// Connects to `endpoint`, wrapping the stream in TLS when the endpoint is secure.
pub async fn dial(endpoint: &Endpoint, tls: Arc<ClientConfig>) -> Result<Connection, DialError> {
    let tcp = match &endpoint.host {
        Host::Domain(domain) => TcpStream::connect((domain.as_str(), endpoint.port)).await,
        Host::Ipv4(ip) => TcpStream::connect((*ip, endpoint.port)).await,
        Host::Ipv6(ip) => TcpStream::connect((*ip, endpoint.port)).await,
    }
    .map_err(DialError::Connect)?;
    tracing::debug!(authority = %endpoint.authority, secure = endpoint.secure, "Connected");

    if !endpoint.secure {
        return Ok(Connection::Plain(tcp));
    }

    let stream = TlsConnector::from(tls)
        .connect(endpoint.server_name()?, tcp)
        .await
        .map_err(DialError::Handshake)?;
    Ok(Connection::Tls(Box::new(stream)))
}

impl Read for Connection {
    fn poll_read(self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &mut [u8]) -> Poll<io::Result<usize>> {
        match self.get_mut() {
            Connection::Plain(s) => Pin::new(s).poll_read(cx, buf),
            Connection::Tls(s) => Pin::new(s.as_mut()).poll_read(cx, buf),
        }
    }
}

impl Write for Connection {
    fn poll_write(self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &[u8]) -> Poll<io::Result<usize>> {
        match self.get_mut() {
            Connection::Plain(s) => Pin::new(s).poll_write(cx, buf),
            Connection::Tls(s) => Pin::new(s.as_mut()).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Connection::Plain(s) => Pin::new(s).poll_flush(cx),
            Connection::Tls(s) => Pin::new(s.as_mut()).poll_flush(cx),
        }
    }

    fn poll_close(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Connection::Plain(s) => Pin::new(s).poll_close(cx),
            Connection::Tls(s) => Pin::new(s.as_mut()).poll_close(cx),
        }
    }
}
