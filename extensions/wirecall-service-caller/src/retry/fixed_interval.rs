use crate::{RetryStrategy, RetryTask};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use wirecall::error::RpcError;
use wirecall::rpc::RpcResponse;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_WAIT: Duration = Duration::from_secs(3);

/// Observer invoked with the number of the attempt that just failed.
pub type RetryListener = Arc<dyn Fn(u32, &RpcError) + Send + Sync>;

/// Retries transport failures after a fixed pause.
///
/// Errors that are not retryable are returned straight away, without waiting
/// and without notifying the listener.
#[derive(Clone)]
pub struct FixedIntervalRetry {
    max_attempts: u32,
    wait: Duration,
    listener: Option<RetryListener>,
}

impl fmt::Debug for FixedIntervalRetry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FixedIntervalRetry")
            .field("max_attempts", &self.max_attempts)
            .field("wait", &self.wait)
            .field("listener", &self.listener.is_some())
            .finish()
    }
}

impl Default for FixedIntervalRetry {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, DEFAULT_WAIT)
    }
}

impl FixedIntervalRetry {
    pub fn new(max_attempts: u32, wait: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            wait,
            listener: None,
        }
    }

    pub fn with_listener(mut self, listener: RetryListener) -> Self {
        self.listener = Some(listener);
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }
}

#[async_trait::async_trait]
impl RetryStrategy for FixedIntervalRetry {
    async fn do_retry<'a>(&self, mut task: RetryTask<'a>) -> Result<RpcResponse, RpcError> {
        let mut attempt = 1;
        loop {
            let error = match task().await {
                Ok(response) => return Ok(response),
                Err(error) => error,
            };

            if !error.is_retryable() || attempt >= self.max_attempts {
                return Err(error);
            }

            tracing::warn!(attempt, max_attempts = self.max_attempts, %error, "retrying call");
            if let Some(listener) = &self.listener {
                listener(attempt, &error);
            }

            tokio::time::sleep(self.wait).await;
            attempt += 1;
        }
    }
}
