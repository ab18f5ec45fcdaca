use mlog_proto::ProtocolError;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Already connected")]
    AlreadyConnected,

    #[error("Not connected")]
    NotConnected,

    #[error("Server rejected NAME (code {0})")]
    NameRejected(u8),

    #[error("Server rejected PASS (code {0})")]
    PassRejected(u8),

    #[error("Server rejected MSG (code {0})")]
    MsgRejected(u8),

    #[error("Payload too large: {size} bytes (max: {max})")]
    PayloadTooLarge { size: usize, max: usize },

    #[error("Transport error: {0}")]
    Transport(#[from] std::io::Error),
}

impl ClientError {
    /// Whether the failure tore down the connection.
    ///
    /// Handshake rejections and transport failures leave the client
    /// disconnected; everything else leaves the state untouched.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ClientError::NameRejected(_) | ClientError::PassRejected(_) | ClientError::Transport(_)
        )
    }
}

impl From<ProtocolError> for ClientError {
    fn from(err: ProtocolError) -> Self {
        match err {
            ProtocolError::Io(e) => ClientError::Transport(e),
            ProtocolError::PayloadTooLarge { size, max } => {
                ClientError::PayloadTooLarge { size, max }
            }
            // The client only ever reads single ack bytes
            ProtocolError::InvalidTag(tag) => ClientError::Transport(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("invalid frame tag {}", tag),
            )),
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_errors() {
        assert!(ClientError::NameRejected(1).is_fatal());
        assert!(ClientError::PassRejected(1).is_fatal());
        assert!(ClientError::Transport(std::io::ErrorKind::BrokenPipe.into()).is_fatal());

        assert!(!ClientError::MsgRejected(1).is_fatal());
        assert!(!ClientError::AlreadyConnected.is_fatal());
        assert!(!ClientError::NotConnected.is_fatal());
        assert!(!ClientError::PayloadTooLarge { size: 65536, max: 65535 }.is_fatal());
    }

    #[test]
    fn test_protocol_error_conversion() {
        let err: ClientError = ProtocolError::PayloadTooLarge { size: 70000, max: 65535 }.into();
        assert!(matches!(err, ClientError::PayloadTooLarge { size: 70000, max: 65535 }));

        let err: ClientError = ProtocolError::Io(std::io::ErrorKind::UnexpectedEof.into()).into();
        assert!(matches!(err, ClientError::Transport(_)));
    }
}
