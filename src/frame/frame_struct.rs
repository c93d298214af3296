use crate::frame::{FrameHeader, ProtocolError};

/// A single unit on the wire: a fixed-size header followed by exactly
/// `header.body_length` bytes of serialized body.
///
/// Frames are transport-agnostic. Several frames, or fractions of one, may
/// arrive in a single read from the socket; see `FrameStreamDecoder`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub header: FrameHeader,
    pub body: Vec<u8>,
}

impl Frame {
    /// Builds a frame, stamping the header with the body length.
    pub fn new(mut header: FrameHeader, body: Vec<u8>) -> Self {
        header.body_length = body.len() as u32;
        Self { header, body }
    }
}

/// A frame whose boundaries were recoverable but whose header fields were not.
///
/// When the request id could be read it is kept, so that a waiting caller can
/// be failed immediately instead of timing out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameDecodeError {
    pub request_id: Option<u64>,
    pub error: ProtocolError,
}

impl FrameDecodeError {
    pub fn new(request_id: Option<u64>, error: ProtocolError) -> Self {
        Self { request_id, error }
    }
}
