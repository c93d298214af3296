use crate::constants::{
    BODY_LENGTH_SIZE, FRAME_HEADER_SIZE, FRAME_MAGIC_OFFSET, FRAME_SERIALIZER_OFFSET,
    FRAME_VERSION_OFFSET, LEGACY_BODY_LENGTH_OFFSET, LEGACY_REQUEST_ID_OFFSET,
    LEGACY_STATUS_OFFSET, LEGACY_TYPE_OFFSET, MAX_NIBBLE_VALUE, PACKED_BODY_LENGTH_OFFSET,
    PACKED_REQUEST_ID_OFFSET, PACKED_RESERVED_OFFSET, PACKED_STATUS_OFFSET, PROTOCOL_MAGIC,
    PROTOCOL_VERSION_LEGACY, PROTOCOL_VERSION_PACKED, REQUEST_ID_SIZE,
};
use crate::frame::{MessageStatus, MessageType, ProtocolError};
use crate::serializer::SerializerKind;
use serde::{Deserialize, Serialize};

/// Packs a serializer id into the high nibble and a message type id into the
/// low nibble of one byte.
#[inline]
pub fn pack_serializer_and_type(serializer: u8, message_type: u8) -> u8 {
    (serializer << 4) | (message_type & MAX_NIBBLE_VALUE)
}

#[inline]
pub fn extract_serializer(packed: u8) -> u8 {
    (packed >> 4) & MAX_NIBBLE_VALUE
}

#[inline]
pub fn extract_type(packed: u8) -> u8 {
    packed & MAX_NIBBLE_VALUE
}

/// The two header layouts understood on the wire, selected by the version byte.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeaderLayout {
    /// Version 0x01: separate serializer and message-type bytes.
    Legacy,
    /// Version 0x02: serializer and message type share byte 2, byte 16 is reserved.
    #[default]
    Packed,
}

impl HeaderLayout {
    pub fn version(self) -> u8 {
        match self {
            HeaderLayout::Legacy => PROTOCOL_VERSION_LEGACY,
            HeaderLayout::Packed => PROTOCOL_VERSION_PACKED,
        }
    }

    pub fn from_version(version: u8) -> Result<Self, ProtocolError> {
        match version {
            PROTOCOL_VERSION_LEGACY => Ok(HeaderLayout::Legacy),
            PROTOCOL_VERSION_PACKED => Ok(HeaderLayout::Packed),
            other => Err(ProtocolError::UnsupportedVersion(other)),
        }
    }

    fn status_offset(self) -> usize {
        match self {
            HeaderLayout::Legacy => LEGACY_STATUS_OFFSET,
            HeaderLayout::Packed => PACKED_STATUS_OFFSET,
        }
    }

    fn request_id_offset(self) -> usize {
        match self {
            HeaderLayout::Legacy => LEGACY_REQUEST_ID_OFFSET,
            HeaderLayout::Packed => PACKED_REQUEST_ID_OFFSET,
        }
    }

    fn body_length_offset(self) -> usize {
        match self {
            HeaderLayout::Legacy => LEGACY_BODY_LENGTH_OFFSET,
            HeaderLayout::Packed => PACKED_BODY_LENGTH_OFFSET,
        }
    }
}

/// Fixed-size metadata preceding every frame body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// Always `PROTOCOL_MAGIC`; anything else is rejected before parsing.
    pub magic: u8,

    /// Selects the layout; see [`HeaderLayout`].
    pub version: u8,

    /// Codec used for the body bytes.
    pub serializer: SerializerKind,

    pub message_type: MessageType,

    pub status: MessageStatus,

    /// Correlates a response with the request that caused it.
    pub request_id: u64,

    /// Exact number of body bytes following the header.
    pub body_length: u32,

    /// Only present on the wire in the packed layout. Always zero for legacy.
    pub reserved: u8,
}

impl FrameHeader {
    pub fn new(
        layout: HeaderLayout,
        serializer: SerializerKind,
        message_type: MessageType,
        status: MessageStatus,
        request_id: u64,
    ) -> Self {
        Self {
            magic: PROTOCOL_MAGIC,
            version: layout.version(),
            serializer,
            message_type,
            status,
            request_id,
            body_length: 0,
            reserved: 0,
        }
    }

    pub fn layout(&self) -> Result<HeaderLayout, ProtocolError> {
        HeaderLayout::from_version(self.version)
    }

    /// Writes the header into `buf`, which must hold at least `FRAME_HEADER_SIZE` bytes.
    pub(crate) fn write_to(&self, buf: &mut [u8]) -> Result<(), ProtocolError> {
        if buf.len() < FRAME_HEADER_SIZE {
            return Err(ProtocolError::Truncated {
                expected: FRAME_HEADER_SIZE,
                actual: buf.len(),
            });
        }

        let layout = self.layout()?;
        let serializer_id = self.serializer.id();
        let type_id = self.message_type.id();

        buf[FRAME_MAGIC_OFFSET] = self.magic;
        buf[FRAME_VERSION_OFFSET] = self.version;

        match layout {
            HeaderLayout::Legacy => {
                buf[FRAME_SERIALIZER_OFFSET] = serializer_id;
                buf[LEGACY_TYPE_OFFSET] = type_id;
            }
            HeaderLayout::Packed => {
                if serializer_id > MAX_NIBBLE_VALUE || type_id > MAX_NIBBLE_VALUE {
                    return Err(ProtocolError::NibbleOverflow {
                        serializer: serializer_id,
                        message_type: type_id,
                    });
                }
                buf[FRAME_SERIALIZER_OFFSET] = pack_serializer_and_type(serializer_id, type_id);
                buf[PACKED_RESERVED_OFFSET] = self.reserved;
            }
        }

        buf[layout.status_offset()] = self.status.into();

        let id_offset = layout.request_id_offset();
        buf[id_offset..id_offset + REQUEST_ID_SIZE].copy_from_slice(&self.request_id.to_be_bytes());

        let len_offset = layout.body_length_offset();
        buf[len_offset..len_offset + BODY_LENGTH_SIZE]
            .copy_from_slice(&self.body_length.to_be_bytes());

        Ok(())
    }

    /// Parses a header from the start of `buf`.
    ///
    /// The magic byte is checked first, then the version picks the layout.
    /// Ids are validated only after the header is known to be complete.
    pub fn read_from(buf: &[u8]) -> Result<Self, ProtocolError> {
        let layout = Self::peek_layout(buf)?;

        if buf.len() < FRAME_HEADER_SIZE {
            return Err(ProtocolError::Truncated {
                expected: FRAME_HEADER_SIZE,
                actual: buf.len(),
            });
        }

        let (serializer_id, type_id, reserved) = match layout {
            HeaderLayout::Legacy => (buf[FRAME_SERIALIZER_OFFSET], buf[LEGACY_TYPE_OFFSET], 0),
            HeaderLayout::Packed => {
                let packed = buf[FRAME_SERIALIZER_OFFSET];
                (
                    extract_serializer(packed),
                    extract_type(packed),
                    buf[PACKED_RESERVED_OFFSET],
                )
            }
        };

        let serializer = SerializerKind::from_id(serializer_id)?;
        let message_type = MessageType::from_id(type_id)?;
        let status_byte = buf[layout.status_offset()];
        let status = MessageStatus::try_from(status_byte)
            .map_err(|_| ProtocolError::UnknownStatus(status_byte))?;

        Ok(Self {
            magic: PROTOCOL_MAGIC,
            version: layout.version(),
            serializer,
            message_type,
            status,
            request_id: read_u64(buf, layout.request_id_offset()),
            body_length: read_u32(buf, layout.body_length_offset()),
            reserved,
        })
    }

    /// Validates magic and version without requiring a complete header.
    pub(crate) fn peek_layout(buf: &[u8]) -> Result<HeaderLayout, ProtocolError> {
        let magic = *buf.get(FRAME_MAGIC_OFFSET).ok_or(ProtocolError::Truncated {
            expected: FRAME_HEADER_SIZE,
            actual: 0,
        })?;

        if magic != PROTOCOL_MAGIC {
            return Err(ProtocolError::BadMagic(magic));
        }

        let version = *buf
            .get(FRAME_VERSION_OFFSET)
            .ok_or(ProtocolError::Truncated {
                expected: FRAME_HEADER_SIZE,
                actual: buf.len(),
            })?;

        HeaderLayout::from_version(version)
    }

    /// Reads the body length of a complete header whose layout is already known.
    pub(crate) fn peek_body_length(buf: &[u8], layout: HeaderLayout) -> usize {
        read_u32(buf, layout.body_length_offset()) as usize
    }

    pub(crate) fn peek_request_id(buf: &[u8], layout: HeaderLayout) -> u64 {
        read_u64(buf, layout.request_id_offset())
    }
}

// Callers guarantee `buf` holds a full header, so the fixed-width reads below
// cannot go out of bounds.
fn read_u64(buf: &[u8], offset: usize) -> u64 {
    let mut bytes = [0u8; REQUEST_ID_SIZE];
    bytes.copy_from_slice(&buf[offset..offset + REQUEST_ID_SIZE]);
    u64::from_be_bytes(bytes)
}

fn read_u32(buf: &[u8], offset: usize) -> u32 {
    let mut bytes = [0u8; BODY_LENGTH_SIZE];
    bytes.copy_from_slice(&buf[offset..offset + BODY_LENGTH_SIZE]);
    u32::from_be_bytes(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packed_byte_splits_into_nibbles() {
        assert_eq!(pack_serializer_and_type(1, 0), 0x10);
        assert_eq!(pack_serializer_and_type(2, 3), 0x23);
        assert_eq!(extract_serializer(0xF1), 0x0F);
        assert_eq!(extract_type(0xF1), 0x01);
    }

    #[test]
    fn write_rejects_unknown_version() {
        let mut header = FrameHeader::new(
            HeaderLayout::Packed,
            SerializerKind::Json,
            MessageType::Request,
            MessageStatus::Ok,
            1,
        );
        header.version = 0x7F;

        let mut buf = [0u8; FRAME_HEADER_SIZE];
        assert_eq!(
            header.write_to(&mut buf),
            Err(ProtocolError::UnsupportedVersion(0x7F))
        );
    }

    #[test]
    fn legacy_header_keeps_separate_bytes() {
        let mut header = FrameHeader::new(
            HeaderLayout::Legacy,
            SerializerKind::Compact,
            MessageType::Response,
            MessageStatus::BadResponse,
            0x0102_0304_0506_0708,
        );
        header.body_length = 5;

        let mut buf = [0u8; FRAME_HEADER_SIZE];
        header.write_to(&mut buf).unwrap();

        assert_eq!(buf[0], PROTOCOL_MAGIC);
        assert_eq!(buf[1], PROTOCOL_VERSION_LEGACY);
        assert_eq!(buf[2], 2);
        assert_eq!(buf[3], 1);
        assert_eq!(buf[4], 50);
        assert_eq!(&buf[5..13], &[1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(&buf[13..17], &[0, 0, 0, 5]);
        assert_eq!(FrameHeader::read_from(&buf).unwrap(), header);
    }

    #[test]
    fn magic_is_checked_before_anything_else() {
        // Version and ids are garbage too, but magic must win.
        let buf = [0xAB, 0xFF, 0xFF, 0xFF];
        assert_eq!(
            FrameHeader::read_from(&buf),
            Err(ProtocolError::BadMagic(0xAB))
        );
    }
}
