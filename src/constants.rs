// Protocol identity
pub const PROTOCOL_MAGIC: u8 = 0x01;
pub const PROTOCOL_VERSION_LEGACY: u8 = 0x01;
pub const PROTOCOL_VERSION_PACKED: u8 = 0x02;

/// Both header layouts occupy the same number of bytes. The packed layout
/// trades the separate message-type byte for a trailing reserved byte.
pub const FRAME_HEADER_SIZE: usize = 17;

// Offsets shared by both layouts
pub const FRAME_MAGIC_OFFSET: usize = 0;
pub const FRAME_VERSION_OFFSET: usize = 1;
pub const FRAME_SERIALIZER_OFFSET: usize = 2;

// Legacy (version 0x01) layout
pub const LEGACY_TYPE_OFFSET: usize = 3;
pub const LEGACY_STATUS_OFFSET: usize = 4;
pub const LEGACY_REQUEST_ID_OFFSET: usize = 5;
pub const LEGACY_BODY_LENGTH_OFFSET: usize = 13;

// Packed (version 0x02) layout
pub const PACKED_STATUS_OFFSET: usize = 3;
pub const PACKED_REQUEST_ID_OFFSET: usize = 4;
pub const PACKED_BODY_LENGTH_OFFSET: usize = 12;
pub const PACKED_RESERVED_OFFSET: usize = 16;

pub const REQUEST_ID_SIZE: usize = 8;
pub const BODY_LENGTH_SIZE: usize = 4;

/// Largest id that fits in one nibble of the packed serializer/type byte.
pub const MAX_NIBBLE_VALUE: u8 = 0x0F;

/// Upper bound on a single frame body. A length field above this is treated
/// as corruption instead of a reason to buffer unbounded input.
pub const DEFAULT_MAX_BODY_LENGTH: usize = 16 * 1024 * 1024;

pub const DEFAULT_SERVICE_VERSION: &str = "1.0";
pub const DEFAULT_SERVICE_GROUP: &str = "default";
