use crate::constants::{DEFAULT_MAX_BODY_LENGTH, FRAME_HEADER_SIZE, FRAME_VERSION_OFFSET};
use crate::frame::{Frame, FrameCodec, FrameDecodeError, FrameHeader, ProtocolError};
use bytes::{Buf, BytesMut};
use std::collections::VecDeque;

/// Incremental decoder for a byte stream carrying back-to-back frames.
///
/// Bytes may be fed in chunks of any size, including a single byte at a time
/// or several frames at once. A frame is emitted only when its header and full
/// body are buffered, so no body is ever surfaced short.
///
/// ### Failure handling
/// - A frame whose header parses up to its length but carries an unknown
///   serializer, type or status is skipped and reported as an error; the
///   following frames are still decoded.
/// - A bad magic byte, an unsupported version or an oversized body means the
///   frame boundaries can no longer be trusted. The decoder is then poisoned:
///   its buffer is dropped and every later call yields `StreamPoisoned`.
pub struct FrameStreamDecoder {
    buffer: BytesMut,
    max_body_length: usize,
    poisoned: bool,
}

pub struct FrameDecoderIterator {
    queue: VecDeque<Result<Frame, FrameDecodeError>>,
}

impl Iterator for FrameDecoderIterator {
    type Item = Result<Frame, FrameDecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.queue.pop_front()
    }
}

impl Default for FrameStreamDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameStreamDecoder {
    pub fn new() -> Self {
        Self::with_max_body_length(DEFAULT_MAX_BODY_LENGTH)
    }

    pub fn with_max_body_length(max_body_length: usize) -> Self {
        Self {
            buffer: BytesMut::new(),
            max_body_length,
            poisoned: false,
        }
    }

    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    /// Number of bytes held back waiting for the rest of a frame.
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    pub fn read_bytes(&mut self, data: &[u8]) -> FrameDecoderIterator {
        let mut queue = VecDeque::new();

        if self.poisoned {
            queue.push_back(Err(FrameDecodeError::new(
                None,
                ProtocolError::StreamPoisoned,
            )));
            return FrameDecoderIterator { queue };
        }

        self.buffer.extend_from_slice(data);

        while !self.buffer.is_empty() {
            // Magic and version can be judged before the header is complete.
            let layout = match FrameHeader::peek_layout(&self.buffer) {
                Ok(layout) => layout,
                Err(ProtocolError::Truncated { .. }) => break,
                Err(err) => {
                    self.poison();
                    queue.push_back(Err(FrameDecodeError::new(None, err)));
                    break;
                }
            };

            if self.buffer.len() < FRAME_HEADER_SIZE {
                break;
            }

            let body_length = FrameHeader::peek_body_length(&self.buffer, layout);
            if body_length > self.max_body_length {
                let request_id = FrameHeader::peek_request_id(&self.buffer, layout);
                self.poison();
                queue.push_back(Err(FrameDecodeError::new(
                    Some(request_id),
                    ProtocolError::BodyTooLarge {
                        length: body_length,
                        max: self.max_body_length,
                    },
                )));
                break;
            }

            let total = FRAME_HEADER_SIZE + body_length;
            if self.buffer.len() < total {
                self.buffer.reserve(total - self.buffer.len());
                break;
            }

            let request_id = FrameHeader::peek_request_id(&self.buffer, layout);
            match FrameCodec::decode(&self.buffer[..total]) {
                Ok(frame) => queue.push_back(Ok(frame)),
                Err(err) => {
                    tracing::debug!(
                        request_id,
                        version = self.buffer[FRAME_VERSION_OFFSET],
                        error = %err,
                        "skipping undecodable frame"
                    );
                    queue.push_back(Err(FrameDecodeError::new(Some(request_id), err)));
                }
            }

            self.buffer.advance(total);
        }

        FrameDecoderIterator { queue }
    }

    fn poison(&mut self) {
        tracing::warn!(
            buffered = self.buffer.len(),
            "frame stream poisoned, dropping buffered bytes"
        );
        self.poisoned = true;
        self.buffer.clear();
    }
}
