use wirecall::error::RpcError;
use wirecall::rpc::{RpcRequest, RpcResponse, ServiceMetaInfo};
use wirecall::serializer::SerializerKind;

/// Sends one request to one instance and waits for its response.
///
/// Implementations own their connections; the caller only names the target.
#[async_trait::async_trait]
pub trait RpcTransport: Send + Sync {
    async fn do_request(
        &self,
        request: &RpcRequest,
        target: &ServiceMetaInfo,
    ) -> Result<RpcResponse, RpcError>;

    /// Serializer used for request bodies, and therefore for arguments.
    fn serializer(&self) -> SerializerKind;
}
