mod fixed_interval;
mod no_retry;

pub use fixed_interval::{FixedIntervalRetry, RetryListener};
pub use no_retry::NoRetry;

use futures::future::BoxFuture;
use wirecall::error::RpcError;
use wirecall::rpc::RpcResponse;

/// One attempt of a call. Invoked again for every retry.
pub type RetryTask<'a> =
    Box<dyn FnMut() -> BoxFuture<'a, Result<RpcResponse, RpcError>> + Send + 'a>;

#[async_trait::async_trait]
pub trait RetryStrategy: Send + Sync {
    /// Runs `task` until it succeeds or the strategy gives up, returning the
    /// first success or the last error.
    async fn do_retry<'a>(&self, task: RetryTask<'a>) -> Result<RpcResponse, RpcError>;
}
