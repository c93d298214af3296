use crate::{RetryStrategy, RetryTask};
use wirecall::error::RpcError;
use wirecall::rpc::RpcResponse;

#[derive(Debug, Default, Clone, Copy)]
pub struct NoRetry;

#[async_trait::async_trait]
impl RetryStrategy for NoRetry {
    async fn do_retry<'a>(&self, mut task: RetryTask<'a>) -> Result<RpcResponse, RpcError> {
        task().await
    }
}
