use crate::{TolerantContext, TolerantStrategy};
use wirecall::error::RpcError;
use wirecall::rpc::RpcResponse;

#[derive(Debug, Default, Clone, Copy)]
pub struct FailFastTolerant;

#[async_trait::async_trait]
impl TolerantStrategy for FailFastTolerant {
    async fn do_tolerant(
        &self,
        _context: TolerantContext,
        error: RpcError,
    ) -> Result<RpcResponse, RpcError> {
        Err(error)
    }
}
