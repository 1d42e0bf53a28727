//! Line framing shared by every read and write path.
//!
//! A line is read up to and including `\n`; the `\n` and then one trailing
//! `\r` are stripped. Written lines have trailing whitespace trimmed and are
//! terminated with `\r\n`.
//!
//! Verbose wire logging emits each line as a plain message prefixed with
//! `>` (sent), `<` (received) or `#` (server step) rather than as structured
//! fields, so the log reads as a transcript of the exchange.

use std::io;

use async_std::io::prelude::*;
use async_std::io::{BufRead, Write};

pub const CRLF: &str = "\r\n";

/// Reads one line, failing with `UnexpectedEof` if the stream ends before `\n`.
pub async fn read_line<R>(reader: &mut R) -> io::Result<String>
where
    R: BufRead + Unpin,
{
    let mut raw = Vec::new();
    reader.read_until(b'\n', &mut raw).await?;

    if raw.last() != Some(&b'\n') {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "stream closed before end of line",
        ));
    }
    raw.pop();
    if raw.last() == Some(&b'\r') {
        raw.pop();
    }

    Ok(String::from_utf8_lossy(&raw).into_owned())
}

/// Writes `line` followed by CRLF, logging it with `prefix` when `verbose` is on.
pub async fn write_line<W>(writer: &mut W, line: &str, prefix: &str, verbose: bool) -> io::Result<()>
where
    W: Write + Unpin,
{
    let line = line.trim_end();
    if verbose {
        tracing::info!("{prefix} {line}");
    }
    let mut framed = String::with_capacity(line.len() + CRLF.len());
    framed.push_str(line);
    framed.push_str(CRLF);
    writer.write_all(framed.as_bytes()).await
}
