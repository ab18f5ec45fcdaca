use crate::{Ack, Frame, Result, Tag};
use bytes::{Buf, BufMut, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::debug;

/// Largest payload the 2-byte length field can describe
pub const MAX_PAYLOAD_SIZE: usize = u16::MAX as usize;

/// Tag byte plus little-endian u16 length
pub const FRAME_HEADER_SIZE: usize = 3;

/// Writes one frame to an async writer.
///
/// The frame is encoded into a single buffer and written with one call so
/// header and payload are never separated by another writer's bytes.
pub async fn write_frame<W>(writer: &mut W, frame: &Frame) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut buf = BytesMut::with_capacity(frame.encoded_len());
    encode_frame(frame, &mut buf);

    debug!("Writing {} frame, {} payload bytes", frame.tag, frame.payload.len());

    writer.write_all(&buf).await?;
    writer.flush().await?;

    Ok(())
}

/// Reads exactly one frame from an async reader
pub async fn read_frame<R>(reader: &mut R) -> Result<Frame>
where
    R: AsyncRead + Unpin,
{
    let tag = Tag::try_from(reader.read_u8().await?)?;
    let length = reader.read_u16_le().await?;

    let mut payload = vec![0u8; length as usize];
    reader.read_exact(&mut payload).await?;

    debug!("Read {} frame, {} payload bytes", tag, length);

    Frame::new(tag, payload)
}

/// Reads the single acknowledgement byte that follows a request frame
pub async fn read_ack<R>(reader: &mut R) -> Result<Ack>
where
    R: AsyncRead + Unpin,
{
    let ack = Ack::from_byte(reader.read_u8().await?);
    debug!("Read ack: {:?}", ack);
    Ok(ack)
}

pub async fn write_ack<W>(writer: &mut W, ack: Ack) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_u8(ack.as_byte()).await?;
    writer.flush().await?;
    Ok(())
}

fn encode_frame(frame: &Frame, dst: &mut BytesMut) {
    dst.reserve(frame.encoded_len());
    dst.put_u8(frame.tag.as_byte());
    dst.put_u16_le(frame.payload_len());
    dst.put_slice(&frame.payload);
}

/// Codec for use with tokio_util::codec::Framed
#[derive(Debug, Default, Clone, Copy)]
pub struct FrameCodec;

impl FrameCodec {
    pub fn new() -> Self {
        Self
    }
}

impl tokio_util::codec::Decoder for FrameCodec {
    type Item = Frame;
    type Error = crate::ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        if src.is_empty() {
            return Ok(None);
        }

        // Reject garbage as soon as the tag byte arrives
        let tag = Tag::try_from(src[0])?;

        if src.len() < FRAME_HEADER_SIZE {
            return Ok(None);
        }

        let length = u16::from_le_bytes([src[1], src[2]]) as usize;

        let frame_size = FRAME_HEADER_SIZE + length;
        if src.len() < frame_size {
            src.reserve(frame_size - src.len());
            return Ok(None);
        }

        src.advance(FRAME_HEADER_SIZE);
        let payload = src.split_to(length).freeze();

        debug!("Decoded {} frame, {} payload bytes", tag, length);

        Ok(Some(Frame { tag, payload }))
    }
}

impl tokio_util::codec::Encoder<Frame> for FrameCodec {
    type Error = crate::ProtocolError;

    fn encode(&mut self, item: Frame, dst: &mut BytesMut) -> Result<()> {
        encode_frame(&item, dst);
        Ok(())
    }
}
