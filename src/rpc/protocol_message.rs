use crate::frame::{FrameHeader, HeaderLayout, MessageStatus, MessageType};
use crate::rpc::{RpcRequest, RpcResponse};
use crate::serializer::SerializerKind;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageBody {
    Request(RpcRequest),
    Response(RpcResponse),
    /// Heartbeats carry no body bytes.
    HeartBeat,
}

impl MessageBody {
    pub fn message_type(&self) -> MessageType {
        match self {
            MessageBody::Request(_) => MessageType::Request,
            MessageBody::Response(_) => MessageType::Response,
            MessageBody::HeartBeat => MessageType::HeartBeat,
        }
    }
}

/// One framed transmission: header plus typed body.
///
/// `header.body_length` is recomputed on encode, so callers never need to
/// fill it in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolMessage {
    pub header: FrameHeader,
    pub body: MessageBody,
}

impl ProtocolMessage {
    pub fn request(
        layout: HeaderLayout,
        serializer: SerializerKind,
        request_id: u64,
        request: RpcRequest,
    ) -> Self {
        Self {
            header: FrameHeader::new(
                layout,
                serializer,
                MessageType::Request,
                MessageStatus::Ok,
                request_id,
            ),
            body: MessageBody::Request(request),
        }
    }

    pub fn response(
        layout: HeaderLayout,
        serializer: SerializerKind,
        request_id: u64,
        status: MessageStatus,
        response: RpcResponse,
    ) -> Self {
        Self {
            header: FrameHeader::new(
                layout,
                serializer,
                MessageType::Response,
                status,
                request_id,
            ),
            body: MessageBody::Response(response),
        }
    }

    pub fn heartbeat(layout: HeaderLayout, serializer: SerializerKind, request_id: u64) -> Self {
        Self {
            header: FrameHeader::new(
                layout,
                serializer,
                MessageType::HeartBeat,
                MessageStatus::Ok,
                request_id,
            ),
            body: MessageBody::HeartBeat,
        }
    }

    /// Builds the reply to `request_header`, mirroring its id, serializer
    /// and layout.
    pub fn reply_to(
        request_header: &FrameHeader,
        status: MessageStatus,
        response: RpcResponse,
    ) -> Self {
        let mut header = *request_header;
        header.message_type = MessageType::Response;
        header.status = status;
        header.body_length = 0;

        Self {
            header,
            body: MessageBody::Response(response),
        }
    }

    pub fn request_id(&self) -> u64 {
        self.header.request_id
    }
}
