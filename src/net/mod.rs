//! Network layer.
//!
//! ```text
//! client:  dial.rs (TCP, optional TLS via tls.rs) -> client::raw
//! server:  server.rs (accept loop, one task per connection)
//!              -> http::parser -> handler -> back onto the connection
//! ```

pub mod dial;
pub mod server;
pub mod tls;
