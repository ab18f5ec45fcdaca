use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::transport::{Connector, TcpConnector};
use mlog_proto::{framing, Ack, Frame};
use std::fmt;
use std::io;
use tokio::io::AsyncWriteExt;
use tokio::time::{timeout, Duration};
use tracing::{debug, info, warn};

const DEFAULT_READ_TIMEOUT_SECS: u64 = 30;
const DEFAULT_WRITE_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connected,
}

/// Client side of the NAME/PASS/MSG/DISCONNECT protocol.
///
/// The client owns at most one stream. It is `Connected` exactly when it
/// holds one, so the state can never disagree with the transport. Every
/// operation takes `&mut self`, which keeps request/ack exchanges on one
/// client strictly sequential; share a client between tasks through a
/// `tokio::sync::Mutex`.
///
/// Dropping a connected client drops its stream, which closes the
/// underlying connection without the DISCONNECT exchange.
pub struct ProtocolClient<C: Connector = TcpConnector> {
    connector: C,
    name: String,
    password: String,
    addr: String,
    stream: Option<C::Stream>,
    read_timeout: Duration,
    write_timeout: Duration,
}

impl ProtocolClient<TcpConnector> {
    /// Creates a disconnected TCP client; call [`connect`](Self::connect) to handshake.
    pub fn new(name: impl Into<String>, password: impl Into<String>, host: &str, port: u16) -> Self {
        Self::with_connector(
            TcpConnector::default(),
            name,
            password,
            crate::format_address(host, port),
        )
    }

    /// Creates a TCP client and performs the handshake before returning
    pub async fn open(
        name: impl Into<String>,
        password: impl Into<String>,
        host: &str,
        port: u16,
    ) -> Result<Self> {
        let mut client = Self::new(name, password, host, port);
        client.connect().await?;
        Ok(client)
    }

    /// Builds a client from configuration, connecting unless `defer_connect` is set
    pub async fn from_config(config: &ClientConfig) -> Result<Self> {
        let timeouts = &config.timeouts;
        let mut client = Self::with_connector(
            TcpConnector::new(timeouts.connect_timeout_secs),
            config.client.name.clone(),
            config.client.password.clone(),
            config.address(),
        )
        .with_timeouts(
            Duration::from_secs(timeouts.read_timeout_secs),
            Duration::from_secs(timeouts.write_timeout_secs),
        );

        if !config.client.defer_connect {
            client.connect().await?;
        }

        Ok(client)
    }
}

impl<C: Connector> ProtocolClient<C> {
    pub fn with_connector(
        connector: C,
        name: impl Into<String>,
        password: impl Into<String>,
        addr: impl Into<String>,
    ) -> Self {
        Self {
            connector,
            name: name.into(),
            password: password.into(),
            addr: addr.into(),
            stream: None,
            read_timeout: Duration::from_secs(DEFAULT_READ_TIMEOUT_SECS),
            write_timeout: Duration::from_secs(DEFAULT_WRITE_TIMEOUT_SECS),
        }
    }

    pub fn with_timeouts(mut self, read_timeout: Duration, write_timeout: Duration) -> Self {
        self.read_timeout = read_timeout;
        self.write_timeout = write_timeout;
        self
    }

    pub fn state(&self) -> ConnectionState {
        if self.stream.is_some() {
            ConnectionState::Connected
        } else {
            ConnectionState::Disconnected
        }
    }

    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    pub fn identity(&self) -> &str {
        &self.name
    }

    pub fn address(&self) -> &str {
        &self.addr
    }

    /// Connects with the stored identity and credential
    pub async fn connect(&mut self) -> Result<()> {
        self.connect_as(None, None).await
    }

    /// Opens a stream and runs the NAME then PASS handshake.
    ///
    /// Overrides replace the stored identity/credential for this and later
    /// attempts. Any failure closes the stream and leaves the client
    /// disconnected.
    ///
    /// # Errors
    ///
    /// `AlreadyConnected` (no I/O), `PayloadTooLarge` (no I/O),
    /// `NameRejected`, `PassRejected`, `Transport`.
    pub async fn connect_as(
        &mut self,
        name: Option<String>,
        password: Option<String>,
    ) -> Result<()> {
        if self.stream.is_some() {
            return Err(ClientError::AlreadyConnected);
        }

        if let Some(name) = name {
            self.name = name;
        }
        if let Some(password) = password {
            self.password = password;
        }

        let name_frame = Frame::name(&self.name)?;
        let pass_frame = Frame::pass(&self.password)?;

        info!("Connecting to {} as {}", self.addr, self.name);

        let mut stream = self.connector.connect(&self.addr).await.map_err(|e| {
            warn!("Failed to connect to {}: {}", self.addr, e);
            ClientError::Transport(e)
        })?;

        match self.handshake(&mut stream, &name_frame, &pass_frame).await {
            Ok(()) => {
                self.stream = Some(stream);
                info!("Authenticated as {}", self.name);
                Ok(())
            }
            Err(e) => {
                // Server position in the handshake is unknown; start over next time
                warn!("Handshake with {} aborted: {}", self.addr, e);
                if let Err(close_err) = self.close(stream).await {
                    debug!("Error closing aborted connection: {}", close_err);
                }
                Err(e)
            }
        }
    }

    /// Sends one MSG frame and waits for its acknowledgement.
    ///
    /// A rejection keeps the connection; a transport failure drops it.
    ///
    /// # Errors
    ///
    /// `NotConnected` (no I/O), `PayloadTooLarge` (no I/O), `MsgRejected`,
    /// `Transport`.
    pub async fn send_message(&mut self, text: &str) -> Result<()> {
        if self.stream.is_none() {
            return Err(ClientError::NotConnected);
        }

        let frame = Frame::msg(text)?;

        // Held outside `self` for the exchange; only put back if still in sync
        let mut stream = self.stream.take().ok_or(ClientError::NotConnected)?;

        match self.exchange(&mut stream, &frame).await {
            Ok(Ack::Accepted) => {
                self.stream = Some(stream);
                debug!("MSG accepted ({} bytes)", frame.payload().len());
                Ok(())
            }
            Ok(Ack::Rejected(code)) => {
                self.stream = Some(stream);
                warn!("Server rejected MSG with code {}", code);
                Err(ClientError::MsgRejected(code))
            }
            Err(e) => {
                warn!("Transport failure while sending MSG, disconnecting: {}", e);
                if let Err(close_err) = self.close(stream).await {
                    debug!("Error closing failed connection: {}", close_err);
                }
                Err(e)
            }
        }
    }

    /// Sends DISCONNECT, consumes the reply byte and closes the stream.
    ///
    /// Calling this while disconnected is a no-op. The client always ends up
    /// disconnected; an I/O error during the exchange or close is still
    /// returned.
    pub async fn disconnect(&mut self) -> Result<()> {
        let Some(mut stream) = self.stream.take() else {
            debug!("Disconnect requested while already disconnected");
            return Ok(());
        };

        let exchanged = self.exchange(&mut stream, &Frame::disconnect()).await;
        let closed = self.close(stream).await;

        match (exchanged, closed) {
            (Ok(_), Ok(())) => {
                info!("Disconnected from {}", self.addr);
                Ok(())
            }
            (Err(e), _) => {
                warn!("DISCONNECT exchange with {} failed: {}", self.addr, e);
                Err(e)
            }
            (Ok(_), Err(e)) => {
                warn!("Error closing connection to {}: {}", self.addr, e);
                Err(ClientError::Transport(e))
            }
        }
    }

    async fn handshake(
        &self,
        stream: &mut C::Stream,
        name_frame: &Frame,
        pass_frame: &Frame,
    ) -> Result<()> {
        if let Ack::Rejected(code) = self.exchange(stream, name_frame).await? {
            return Err(ClientError::NameRejected(code));
        }
        debug!("NAME accepted");

        if let Ack::Rejected(code) = self.exchange(stream, pass_frame).await? {
            return Err(ClientError::PassRejected(code));
        }
        debug!("PASS accepted");

        Ok(())
    }

    /// Writes a frame and reads the single reply byte
    async fn exchange(&self, stream: &mut C::Stream, frame: &Frame) -> Result<Ack> {
        timeout(self.write_timeout, framing::write_frame(stream, frame))
            .await
            .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "write timeout"))??;

        let ack = timeout(self.read_timeout, framing::read_ack(stream))
            .await
            .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "read timeout"))??;

        Ok(ack)
    }

    /// Shuts the stream down; it is released when dropped here even if shutdown fails
    async fn close(&self, mut stream: C::Stream) -> io::Result<()> {
        timeout(self.write_timeout, stream.shutdown())
            .await
            .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "shutdown timeout"))?
    }
}

impl<C: Connector> fmt::Debug for ProtocolClient<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProtocolClient")
            .field("name", &self.name)
            .field("password", &"<redacted>")
            .field("addr", &self.addr)
            .field("state", &self.state())
            .finish()
    }
}
