//! Client-side SOCKS5 framing for a fixed destination endpoint
//!
//! Builds the outbound greeting + CONNECT request frame, encodes the
//! destination in the three SOCKS5 address forms, wraps payloads for the
//! TCP and UDP relays and incrementally parses the server's response from
//! a possibly fragmented stream. Socket setup, connection lifecycle and
//! retries belong to the caller; this crate only speaks the wire format.
//!
//! ```no_run
//! use socks5_endpoint::Socks5Endpoint;
//!
//! # async fn doc() -> Result<(), socks5_endpoint::Error> {
//! # let (mut stream, _server) = tokio::io::duplex(64);
//! let endpoint = Socks5Endpoint::new("dns.google", 53)?;
//! let frame = endpoint.tcp_wrap(b"a dns query")?;
//! // write `frame` to the proxy, then parse what comes back
//! let payload = endpoint.tcp_unwrap(&mut stream, 512).await?;
//! # let _ = (frame, payload);
//! # Ok(())
//! # }
//! ```

pub use self::{
    endpoint::Socks5Endpoint,
    socks5::{Address, Error, Reply},
};

pub mod endpoint;
pub mod socks5;
