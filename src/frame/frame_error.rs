use thiserror::Error;

/// Errors raised while framing or unframing a protocol message.
///
/// A `ProtocolError` is never retried: the bytes on the wire will not change
/// on a second attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("invalid protocol magic 0x{0:02x}")]
    BadMagic(u8),

    #[error("unsupported protocol version 0x{0:02x}")]
    UnsupportedVersion(u8),

    #[error("unknown serializer id {0}")]
    UnknownSerializer(u8),

    #[error("unknown message type id {0}")]
    UnknownMessageType(u8),

    #[error("unknown message status {0}")]
    UnknownStatus(u8),

    /// Serializer and message type ids must each fit in four bits to be packed.
    #[error("serializer id {serializer} / message type {message_type} do not fit the packed layout")]
    NibbleOverflow { serializer: u8, message_type: u8 },

    #[error("truncated frame: needed {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },

    #[error("frame body of {length} bytes exceeds the {max} byte limit")]
    BodyTooLarge { length: usize, max: usize },

    #[error("message type {0:?} does not carry a body of this kind")]
    UnexpectedBody(crate::frame::MessageType),

    /// The stream decoder saw a corrupt header and can no longer find
    /// message boundaries.
    #[error("frame stream is poisoned by an earlier corrupt frame")]
    StreamPoisoned,
}
