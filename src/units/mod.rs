//! Human-oriented units used on both sides of the wire.
//!
//! - byte sizes: `1.00 KB` in diagnostic responses, `--generate-data-size 2MB` on the CLI
//! - durations: `rawh-sleep-duration=10ms` in query strings and headers,
//!   `request-read-duration: 3ms` in diagnostic responses

pub mod bytes;
pub mod duration;

pub use bytes::{ByteSizeError, parse_byte_size, pretty_byte_size};
pub use duration::{DurationError, format_duration, parse_duration};
