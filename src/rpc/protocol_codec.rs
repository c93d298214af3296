use crate::error::RpcError;
use crate::frame::{Frame, FrameCodec, MessageType, ProtocolError};
use crate::rpc::{MessageBody, ProtocolMessage, RpcRequest, RpcResponse};

/// Turns protocol messages into frames and back.
///
/// Bodies are encoded with the serializer named in the header, so a single
/// connection can carry messages in different encodings.
pub struct ProtocolCodec;

impl ProtocolCodec {
    pub fn encode(message: &ProtocolMessage) -> Result<Vec<u8>, RpcError> {
        let header = &message.header;
        if header.message_type != message.body.message_type() {
            return Err(ProtocolError::UnexpectedBody(header.message_type).into());
        }

        let serializer = header.serializer;
        let body = match &message.body {
            MessageBody::Request(request) => serializer.serialize(request)?,
            MessageBody::Response(response) => serializer.serialize(response)?,
            MessageBody::HeartBeat => Vec::new(),
        };

        Ok(FrameCodec::encode(&Frame::new(*header, body))?)
    }

    pub fn decode(buf: &[u8]) -> Result<ProtocolMessage, RpcError> {
        Self::decode_frame(FrameCodec::decode(buf)?)
    }

    pub fn decode_frame(frame: Frame) -> Result<ProtocolMessage, RpcError> {
        let serializer = frame.header.serializer;
        let body = match frame.header.message_type {
            MessageType::Request => {
                MessageBody::Request(serializer.deserialize::<RpcRequest>(&frame.body)?)
            }
            MessageType::Response => {
                MessageBody::Response(serializer.deserialize::<RpcResponse>(&frame.body)?)
            }
            MessageType::HeartBeat => MessageBody::HeartBeat,
            MessageType::Others => {
                return Err(ProtocolError::UnexpectedBody(MessageType::Others).into());
            }
        };

        Ok(ProtocolMessage {
            header: frame.header,
            body,
        })
    }
}
