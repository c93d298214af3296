mod fail_back;
mod fail_fast;
mod fail_over;
mod fail_safe;

pub use fail_back::FailBackTolerant;
pub use fail_fast::FailFastTolerant;
pub use fail_over::{FAIL_OVER_MESSAGE, FailOverTolerant};
pub use fail_safe::FailSafeTolerant;

use std::collections::HashMap;
use wirecall::error::RpcError;
use wirecall::rpc::{RpcRequest, RpcResponse, ServiceMetaInfo};

/// What a tolerant strategy knows about the call that failed.
#[derive(Debug, Clone)]
pub struct TolerantContext {
    pub request: RpcRequest,
    pub candidates: Vec<ServiceMetaInfo>,
    /// The instance the last attempt went to, when one was selected.
    pub failed: Option<ServiceMetaInfo>,
    pub extras: HashMap<String, String>,
}

impl TolerantContext {
    pub fn new(request: RpcRequest, candidates: Vec<ServiceMetaInfo>) -> Self {
        Self {
            request,
            candidates,
            failed: None,
            extras: HashMap::new(),
        }
    }

    pub fn with_failed(mut self, failed: ServiceMetaInfo) -> Self {
        self.failed = Some(failed);
        self
    }
}

/// Decides what the caller sees once retries are exhausted.
#[async_trait::async_trait]
pub trait TolerantStrategy: Send + Sync {
    async fn do_tolerant(
        &self,
        context: TolerantContext,
        error: RpcError,
    ) -> Result<RpcResponse, RpcError>;
}
