use futures::FutureExt;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use wirecall::error::{RpcError, SerializationError, TransportError};
use wirecall::rpc::RpcResponse;
use wirecall_service_caller::{FixedIntervalRetry, NoRetry, RetryListener, RetryStrategy, RetryTask};

fn closed() -> RpcError {
    TransportError::ConnectionClosed {
        addr: "10.0.0.1:8080".to_string(),
    }
    .into()
}

/// A task that fails with `error` for its first `failures` attempts.
fn flaky(attempts: &AtomicU32, failures: u32, error: fn() -> RpcError) -> RetryTask<'_> {
    Box::new(move || {
        async move {
            let attempt = attempts.fetch_add(1, Ordering::SeqCst) + 1;
            if attempt <= failures {
                Err(error())
            } else {
                Ok(RpcResponse::empty("ok"))
            }
        }
        .boxed()
    })
}

#[tokio::test]
async fn no_retry_makes_a_single_attempt() {
    let attempts = AtomicU32::new(0);
    let result = NoRetry.do_retry(flaky(&attempts, 1, closed)).await;

    assert_eq!(result, Err(closed()));
    assert_eq!(attempts.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn fixed_interval_recovers_after_transient_failures() {
    let attempts = AtomicU32::new(0);
    let seen = Arc::new(Mutex::new(Vec::new()));
    let recorder = seen.clone();
    let listener: RetryListener = Arc::new(move |attempt: u32, _error: &RpcError| {
        recorder.lock().unwrap().push(attempt);
    });

    let retry = FixedIntervalRetry::new(3, Duration::from_secs(3)).with_listener(listener);
    let started = tokio::time::Instant::now();
    let result = retry.do_retry(flaky(&attempts, 2, closed)).await;

    assert!(result.is_ok());
    assert_eq!(attempts.load(Ordering::SeqCst), 3);
    assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
    assert!(started.elapsed() >= Duration::from_secs(6));
}

#[tokio::test(start_paused = true)]
async fn fixed_interval_returns_last_error_when_exhausted() {
    let attempts = AtomicU32::new(0);
    let retry = FixedIntervalRetry::default();

    let result = retry.do_retry(flaky(&attempts, u32::MAX, closed)).await;

    assert_eq!(result, Err(closed()));
    assert_eq!(attempts.load(Ordering::SeqCst), retry.max_attempts());
}

#[tokio::test(start_paused = true)]
async fn non_transport_errors_are_not_retried() {
    fn malformed() -> RpcError {
        SerializationError::Deserialize {
            serializer: "json",
            reason: "expected value".to_string(),
        }
        .into()
    }

    let attempts = AtomicU32::new(0);
    let result = FixedIntervalRetry::default()
        .do_retry(flaky(&attempts, u32::MAX, malformed))
        .await;

    assert_eq!(result, Err(malformed()));
    assert_eq!(attempts.load(Ordering::SeqCst), 1);
}
