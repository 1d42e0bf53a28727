//! Diagnostic HTTP server.
//!
//! This module implements the server runtime: it accepts TCP connections
//! and answers each one with a plain text description of the request it
//! received. It is responsible only for networking concerns such as:
//! - binding the listener and accepting connections,
//! - running one task per connection,
//! - applying the requested artificial delay,
//! - writing the response lines back and closing the connection.
//!
//! Request decoding is delegated to [`http::parser`](crate::http::parser)
//! and response generation to [`handler::handle_request`](crate::handler::handle_request).
//!
//! ## Request handling flow
//!
//! 1. Accept a TCP connection
//! 2. Read the start line, header lines and body into a
//!    [`RequestRecord`](crate::http::request::RequestRecord)
//! 3. Sleep for the resolved delay, if any
//! 4. Write the diagnostic response line by line
//! 5. Close the connection
//!
//! Handlers share no state. Nothing a peer sends can stop the accept loop;
//! only a failing `accept` does.

use std::net::{Shutdown, SocketAddr};
use std::time::Instant;

use async_std::io::BufReader;
use async_std::net::{TcpListener, TcpStream};
use async_std::task;
use thiserror::Error;

use crate::config::ServerConfig;
use crate::handler;
use crate::http::line::write_line;
use crate::http::parser::RequestParser;
use crate::http::response::HttpResponse;
use crate::units::format_duration;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("error setting up TCP server: {0}")]
    Bind(#[source] std::io::Error),
    #[error("error accepting connection: {0}")]
    Accept(#[source] std::io::Error),
}

pub struct Server {
    config: ServerConfig,
    listener: TcpListener,
}

impl Server {
    /// Binds the listener to the configured address and port.
    pub async fn bind(config: ServerConfig) -> Result<Self, ServerError> {
        let listener = TcpListener::bind((config.address, config.port))
            .await
            .map_err(ServerError::Bind)?;
        Ok(Self { config, listener })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        self.listener.local_addr().map_err(ServerError::Bind)
    }

    /// Accepts connections forever, spawning a task for each one.
    ///
    /// Returns on the first accept failure; tasks already running are not affected.
    pub async fn run(self) -> Result<(), ServerError> {
        tracing::info!(address = %self.local_addr()?, "TCP Server is running");

        loop {
            let (stream, peer) = self.listener.accept().await.map_err(ServerError::Accept)?;
            tracing::debug!(peer = %peer, "Connection accepted");
            task::spawn(Self::handle_client(stream, self.config.clone()));
        }
    }

    /// Handles a single client connection: read, sleep, respond, close.
    async fn handle_client(stream: TcpStream, config: ServerConfig) {
        let parser = RequestParser::new(config.normalize_headers, config.verbose);
        let mut reader = BufReader::new(&stream);
        let record = parser.read_request(&mut reader).await;

        if !record.sleep_duration.is_zero() {
            let started = Instant::now();
            if config.verbose {
                tracing::info!("# Going to sleep for {}", format_duration(record.sleep_duration));
            }
            task::sleep(record.sleep_duration).await;
            if config.verbose {
                tracing::info!("# Woke up after {}", format_duration(started.elapsed()));
            }
        }

        let response = handler::handle_request(&record);
        Self::write_response(&stream, &response, config.verbose).await;

        if let Err(err) = stream.shutdown(Shutdown::Both) {
            tracing::debug!(error = %err, "Error closing connection");
        }
    }

    /// Writes every response line, logging failures and carrying on.
    async fn write_response(stream: &TcpStream, response: &HttpResponse, verbose: bool) {
        let mut writer = stream;
        for line in response.lines() {
            if let Err(err) = write_line(&mut writer, &line, ">", verbose).await {
                tracing::warn!(error = %err, "Failed to write response line");
            }
        }
    }
}
