//! `rawh` works either as an HTTP server or as an HTTP client to diagnose
//! requests and responses at the wire level.
//!
//! The client writes requests byte for byte as configured (header order,
//! casing, duplicates, version string) and prints what comes back. The
//! server answers every request with a plain text report of what it read,
//! optionally delaying the answer and mirroring selected headers.

pub mod client;
pub mod config;
pub mod handler;
pub mod http;
pub mod net;
pub mod units;
