//! Client for the mlog message-logging protocol.
//!
//! A [`ProtocolClient`] authenticates with a NAME/PASS handshake, sends
//! acknowledged MSG frames, and closes the session with DISCONNECT.

pub mod client;
pub mod config;
pub mod error;
pub mod transport;

pub use client::{ConnectionState, ProtocolClient};
pub use config::ClientConfig;
pub use error::{ClientError, Result};
pub use transport::{Connector, TcpConnector};

/// Port used when none is configured
pub const DEFAULT_PORT: u16 = 5555;

/// Host used when none is configured
pub const DEFAULT_HOST: &str = "localhost";

/// Joins host and port into the `host:port` form tokio resolves.
///
/// IPv6 literals are bracketed; an already bracketed host is left alone.
pub fn format_address(host: &str, port: u16) -> String {
    if host.contains(':') && !host.starts_with('[') {
        format!("[{}]:{}", host, port)
    } else {
        format!("{}:{}", host, port)
    }
}
