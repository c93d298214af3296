mod protocol_codec;
mod protocol_message;
mod rpc_request_response;
mod service_meta_info;

pub use protocol_codec::ProtocolCodec;
pub use protocol_message::{MessageBody, ProtocolMessage};
pub use rpc_request_response::{RpcRequest, RpcRequestBuilder, RpcResponse};
pub use service_meta_info::ServiceMetaInfo;
