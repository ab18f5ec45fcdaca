use crate::{ProtocolError, Result, MAX_PAYLOAD_SIZE};
use bytes::Bytes;
use std::fmt;

/// Operation tag carried in the first byte of every frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Tag {
    Name = 1,
    Pass = 2,
    Msg = 3,
    Disconnect = 4,
}

impl Tag {
    pub fn as_byte(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for Tag {
    type Error = ProtocolError;

    fn try_from(byte: u8) -> Result<Self> {
        match byte {
            1 => Ok(Tag::Name),
            2 => Ok(Tag::Pass),
            3 => Ok(Tag::Msg),
            4 => Ok(Tag::Disconnect),
            other => Err(ProtocolError::InvalidTag(other)),
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Tag::Name => "NAME",
            Tag::Pass => "PASS",
            Tag::Msg => "MSG",
            Tag::Disconnect => "DISCONNECT",
        };
        f.write_str(name)
    }
}

/// Server reply to a NAME, PASS or MSG frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ack {
    Accepted,
    Rejected(u8),
}

impl Ack {
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            0 => Ack::Accepted,
            code => Ack::Rejected(code),
        }
    }

    pub fn as_byte(self) -> u8 {
        match self {
            Ack::Accepted => 0,
            Ack::Rejected(code) => code,
        }
    }

    pub fn is_accepted(self) -> bool {
        matches!(self, Ack::Accepted)
    }
}

/// One tagged, length-prefixed unit of protocol data.
///
/// The payload never exceeds [`MAX_PAYLOAD_SIZE`]. Fields are only set
/// through the checked constructors and the decoder, so an encoded length
/// field always matches the payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub(crate) tag: Tag,
    pub(crate) payload: Bytes,
}

impl Frame {
    pub fn new(tag: Tag, payload: impl Into<Bytes>) -> Result<Self> {
        let payload = payload.into();
        if payload.len() > MAX_PAYLOAD_SIZE {
            return Err(ProtocolError::PayloadTooLarge {
                size: payload.len(),
                max: MAX_PAYLOAD_SIZE,
            });
        }
        Ok(Self { tag, payload })
    }

    fn text(tag: Tag, text: &str) -> Result<Self> {
        Self::new(tag, Bytes::copy_from_slice(text.as_bytes()))
    }

    pub fn name(identity: &str) -> Result<Self> {
        Self::text(Tag::Name, identity)
    }

    pub fn pass(credential: &str) -> Result<Self> {
        Self::text(Tag::Pass, credential)
    }

    pub fn msg(text: &str) -> Result<Self> {
        Self::text(Tag::Msg, text)
    }

    pub fn disconnect() -> Self {
        Self {
            tag: Tag::Disconnect,
            payload: Bytes::new(),
        }
    }

    pub fn tag(&self) -> Tag {
        self.tag
    }

    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    /// Value of the length field on the wire
    pub fn payload_len(&self) -> u16 {
        // Bounded by MAX_PAYLOAD_SIZE at construction.
        self.payload.len() as u16
    }

    pub fn encoded_len(&self) -> usize {
        crate::FRAME_HEADER_SIZE + self.payload.len()
    }
}
