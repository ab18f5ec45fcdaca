//! Byte-stream transport used by the client.
//!
//! A [`Connector`] opens one stream per connection attempt. Sending and
//! receiving go through tokio's `AsyncRead`/`AsyncWrite`; closing is a
//! `shutdown` followed by dropping the stream.

use std::future::Future;
use std::io;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tracing::debug;

/// Opens byte streams to a server address
pub trait Connector: Send + Sync {
    type Stream: AsyncRead + AsyncWrite + Unpin + Send;

    fn connect(&self, addr: &str) -> impl Future<Output = io::Result<Self::Stream>> + Send;
}

/// TCP transport with a bounded connect time
#[derive(Debug, Clone)]
pub struct TcpConnector {
    connect_timeout: Duration,
}

impl TcpConnector {
    pub fn new(connect_timeout_secs: u64) -> Self {
        Self {
            connect_timeout: Duration::from_secs(connect_timeout_secs),
        }
    }
}

impl Default for TcpConnector {
    fn default() -> Self {
        Self::new(10)
    }
}

impl Connector for TcpConnector {
    type Stream = TcpStream;

    async fn connect(&self, addr: &str) -> io::Result<TcpStream> {
        let stream = tokio::time::timeout(self.connect_timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "connect timeout"))??;

        // Frames are small and every one waits for an ack
        stream.set_nodelay(true)?;

        debug!("TCP connection established to {}", addr);
        Ok(stream)
    }
}
