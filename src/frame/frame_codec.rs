use crate::{
    constants::FRAME_HEADER_SIZE,
    frame::{Frame, FrameHeader, ProtocolError},
};

/// Converts frames to and from their byte representation.
///
/// Both header layouts are exactly `FRAME_HEADER_SIZE` bytes; which one is
/// used is decided by the header's version byte. All multi-byte integers are
/// big-endian.
pub struct FrameCodec;

impl FrameCodec {
    /// Encodes a frame as header bytes immediately followed by the body.
    ///
    /// The body length written to the wire always reflects `frame.body`, even
    /// if `frame.header.body_length` disagrees.
    pub fn encode(frame: &Frame) -> Result<Vec<u8>, ProtocolError> {
        let body_length =
            u32::try_from(frame.body.len()).map_err(|_| ProtocolError::BodyTooLarge {
                length: frame.body.len(),
                max: u32::MAX as usize,
            })?;

        let mut header = frame.header;
        header.body_length = body_length;

        let mut buf = vec![0u8; FRAME_HEADER_SIZE + frame.body.len()];
        header.write_to(&mut buf[..FRAME_HEADER_SIZE])?;
        buf[FRAME_HEADER_SIZE..].copy_from_slice(&frame.body);

        Ok(buf)
    }

    pub fn decode_header(buf: &[u8]) -> Result<FrameHeader, ProtocolError> {
        FrameHeader::read_from(buf)
    }

    /// Decodes one frame from the start of `buf`.
    ///
    /// Exactly `body_length` bytes are consumed as the body; anything after
    /// that is ignored.
    pub fn decode(buf: &[u8]) -> Result<Frame, ProtocolError> {
        let header = FrameHeader::read_from(buf)?;
        let total = FRAME_HEADER_SIZE + header.body_length as usize;

        if buf.len() < total {
            return Err(ProtocolError::Truncated {
                expected: total,
                actual: buf.len(),
            });
        }

        Ok(Frame {
            header,
            body: buf[FRAME_HEADER_SIZE..total].to_vec(),
        })
    }
}
