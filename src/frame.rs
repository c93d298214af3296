mod frame_codec;
mod frame_error;
mod frame_header;
mod frame_stream_decoder;
mod frame_struct;
mod message_type;

pub use frame_codec::FrameCodec;
pub use frame_error::ProtocolError;
pub use frame_header::{
    FrameHeader, HeaderLayout, extract_serializer, extract_type, pack_serializer_and_type,
};
pub use frame_stream_decoder::{FrameDecoderIterator, FrameStreamDecoder};
pub use frame_struct::{Frame, FrameDecodeError};
pub use message_type::{MessageStatus, MessageType};
