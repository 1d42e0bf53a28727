//! Server side request reader.
//!
//! Reads one request off an accepted connection into a [`RequestRecord`]:
//! the start line, header lines up to the first blank line, then exactly
//! `Content-Length` body bytes. Nothing here fails the caller; problems are
//! logged and recorded in [`RequestRecord::error`] and the record is answered
//! with whatever was read so far.

use std::time::{Duration, Instant};

use async_std::io::prelude::*;
use async_std::io::BufRead;
use md5::{Digest, Md5};

use crate::http::line::read_line;
use crate::http::request::{ReadError, RequestRecord};
use crate::units::format_duration;

pub struct RequestParser {
    normalize_headers: bool,
    verbose: bool,
}

impl RequestParser {
    pub fn new(normalize_headers: bool, verbose: bool) -> Self {
        Self {
            normalize_headers,
            verbose,
        }
    }

    pub async fn read_request<R>(&self, reader: &mut R) -> RequestRecord
    where
        R: BufRead + Unpin,
    {
        self.log_step("Read request: start");
        let started = Instant::now();
        let mut record = RequestRecord::new(self.normalize_headers);

        match read_line(reader).await {
            Ok(line) => {
                self.log_received(&line);
                record.set_start_line(&line);
                self.read_headers(reader, &mut record).await;
                record.resolve_controls();
                if record.expects_body() {
                    self.read_body(reader, &mut record).await;
                } else {
                    self.log_step("Body reading skipped");
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "Failed to read request line");
                record.error = Some(ReadError::RequestLine(err));
            }
        }

        // reported with millisecond granularity
        record.read_duration = Duration::from_millis(started.elapsed().as_millis() as u64);
        self.log_step(&format!(
            "Read request: done [{}]",
            format_duration(record.read_duration)
        ));
        record
    }

    /// Reads header lines until a blank line. A read error ends the loop
    /// silently and keeps what was parsed so far; malformed lines are skipped.
    async fn read_headers<R>(&self, reader: &mut R, record: &mut RequestRecord)
    where
        R: BufRead + Unpin,
    {
        loop {
            let line = match read_line(reader).await {
                Ok(line) => line,
                Err(err) => {
                    tracing::warn!(error = %err, "Header reading stopped");
                    record.error = Some(ReadError::HeaderLine(err));
                    return;
                }
            };
            self.log_received(&line);

            let line = line.trim();
            if line.is_empty() {
                return;
            }
            if let Err(err) = record.headers.add_line(line) {
                tracing::warn!(error = %err, "Skipping header line");
            }
        }
    }

    /// Reads exactly `content_length` bytes and hashes them. A short read
    /// leaves the body size and hash at their defaults.
    async fn read_body<R>(&self, reader: &mut R, record: &mut RequestRecord)
    where
        R: BufRead + Unpin,
    {
        self.log_step("Start of body reading");
        let expected = record.content_length;
        let mut body = Vec::new();

        match (&mut *reader).take(expected as u64).read_to_end(&mut body).await {
            Ok(read) if read == expected => {
                record.body_size = read;
                record.body_hash = body_hash(&body);
                self.log_step(&format!("body-size: {}", record.body_size));
                self.log_step(&format!("body-hash: {}", record.body_hash));
            }
            Ok(read) => {
                tracing::warn!(read, expected, "Request body ended early");
                record.error = Some(ReadError::ShortBody { read, expected });
            }
            Err(err) => {
                tracing::warn!(error = %err, "Failed to read request body");
                record.error = Some(ReadError::Body(err));
            }
        }
        self.log_step("End of body reading");
    }

    fn log_step(&self, message: &str) {
        if self.verbose {
            tracing::info!("# {}", message.trim());
        }
    }

    fn log_received(&self, line: &str) {
        if self.verbose {
            tracing::info!("< {}", line.trim());
        }
    }
}

/// `MD5:<lowercase hex>` digest of a request body.
pub fn body_hash(body: &[u8]) -> String {
    format!("MD5:{:x}", Md5::digest(body))
}
