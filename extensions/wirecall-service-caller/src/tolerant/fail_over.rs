use crate::{RpcTransport, TolerantContext, TolerantStrategy};
use std::sync::Arc;
use wirecall::error::RpcError;
use wirecall::rpc::RpcResponse;

pub const FAIL_OVER_MESSAGE: &str = "fail-over succeeded";

/// Tries the remaining candidates, in discovery order, skipping the one that
/// already failed.
pub struct FailOverTolerant {
    transport: Arc<dyn RpcTransport>,
}

impl FailOverTolerant {
    pub fn new(transport: Arc<dyn RpcTransport>) -> Self {
        Self { transport }
    }
}

#[async_trait::async_trait]
impl TolerantStrategy for FailOverTolerant {
    async fn do_tolerant(
        &self,
        context: TolerantContext,
        error: RpcError,
    ) -> Result<RpcResponse, RpcError> {
        let failed_address = context.failed.as_ref().map(|failed| failed.address());
        let mut last_error = error;

        for candidate in &context.candidates {
            if failed_address.as_deref() == Some(candidate.address().as_str()) {
                continue;
            }

            match self.transport.do_request(&context.request, candidate).await {
                Ok(mut response) => {
                    tracing::warn!(addr = %candidate.address(), error = %last_error, "failed over");
                    response.message = FAIL_OVER_MESSAGE.to_string();
                    return Ok(response);
                }
                Err(error) => {
                    tracing::warn!(addr = %candidate.address(), %error, "fail-over candidate failed");
                    last_error = error;
                }
            }
        }

        Ok(RpcResponse::failure(
            "fail-over exhausted every candidate",
            last_error.to_string(),
        ))
    }
}
