use crate::{TolerantContext, TolerantStrategy};
use wirecall::error::RpcError;
use wirecall::rpc::RpcResponse;

/// Swallows the error and hands back an empty response.
#[derive(Debug, Default, Clone, Copy)]
pub struct FailSafeTolerant;

#[async_trait::async_trait]
impl TolerantStrategy for FailSafeTolerant {
    async fn do_tolerant(
        &self,
        context: TolerantContext,
        error: RpcError,
    ) -> Result<RpcResponse, RpcError> {
        tracing::warn!(
            service = %context.request.service_key(),
            method = %context.request.method_name,
            %error,
            "call failed; returning empty response"
        );
        Ok(RpcResponse::empty(format!("fail-safe: {error}")))
    }
}
