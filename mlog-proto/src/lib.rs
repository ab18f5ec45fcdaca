pub mod messages;
pub mod framing;

pub use messages::*;
pub use framing::*;

#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Payload too large: {size} bytes (max: {max})")]
    PayloadTooLarge { size: usize, max: usize },

    #[error("Invalid frame tag: {0}")]
    InvalidTag(u8),
}

pub type Result<T> = std::result::Result<T, ProtocolError>;
