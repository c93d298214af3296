use crate::{ConnectionPool, PendingRequests};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::time::Instant;
use wirecall::config::TransportConfig;
use wirecall::error::{RpcError, TransportError};
use wirecall::frame::ProtocolError;
use wirecall::rpc::{
    MessageBody, ProtocolCodec, ProtocolMessage, RpcRequest, RpcResponse, ServiceMetaInfo,
};
use wirecall::serializer::SerializerKind;
use wirecall::utils::RequestIdGenerator;
use wirecall_service_caller::RpcTransport;

/// Sends requests over pooled TCP sockets and matches responses back to
/// their callers by request id.
pub struct TransportClient {
    config: TransportConfig,
    pool: ConnectionPool,
    pending: Arc<PendingRequests>,
    ids: RequestIdGenerator,
    shut_down: AtomicBool,
}

impl Default for TransportClient {
    fn default() -> Self {
        Self::new(TransportConfig::default())
    }
}

impl TransportClient {
    pub fn new(config: TransportConfig) -> Self {
        let pending = Arc::new(PendingRequests::new());
        let pool = ConnectionPool::new(
            config.pool.clone(),
            config.connect_timeout(),
            config.max_body_length,
            pending.clone(),
        );

        Self {
            config,
            pool,
            pending,
            ids: RequestIdGenerator::new(),
            shut_down: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    pub fn pool(&self) -> &ConnectionPool {
        &self.pool
    }

    /// Calls currently awaiting a response.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Writes `message` to `addr` and waits for the frame carrying the same
    /// request id.
    ///
    /// The socket goes back to the pool as soon as the frame is queued, so
    /// other calls can be written while this one waits.
    pub async fn send(&self, addr: &str, message: ProtocolMessage) -> Result<ProtocolMessage, RpcError> {
        if self.shut_down.load(Ordering::SeqCst) {
            return Err(TransportError::ShutDown.into());
        }

        let request_id = message.request_id();
        let bytes = ProtocolCodec::encode(&message)?;

        let lease = self.pool.acquire(addr).await?;
        let rx = self.pending.register(request_id, lease.id());
        if let Err(e) = lease.send(bytes).await {
            self.pending.cancel(request_id);
            return Err(e.into());
        }
        drop(lease);

        tracing::debug!(addr, request_id, "request written");

        let timeout = self.config.response_timeout();
        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(result)) => result,
            // The entry was dropped without an answer, which only happens
            // when the connection went away.
            Ok(Err(_)) => Err(TransportError::ConnectionClosed {
                addr: addr.to_string(),
            }
            .into()),
            Err(_) => {
                self.pending.cancel(request_id);
                tracing::warn!(addr, request_id, "response timed out");
                Err(TransportError::ResponseTimeout {
                    request_id,
                    timeout_ms: timeout.as_millis() as u64,
                }
                .into())
            }
        }
    }

    /// Sends a heartbeat to `target` and returns the round-trip time.
    pub async fn heartbeat(&self, target: &ServiceMetaInfo) -> Result<Duration, RpcError> {
        let message = ProtocolMessage::heartbeat(
            self.config.layout,
            self.config.serializer,
            self.ids.next_id(),
        );

        let started = Instant::now();
        let reply = self.send(&target.address(), message).await?;
        match reply.body {
            MessageBody::HeartBeat => Ok(started.elapsed()),
            other => Err(ProtocolError::UnexpectedBody(other.message_type()).into()),
        }
    }

    /// Closes the pool and fails every call still waiting. Idempotent.
    pub fn shutdown(&self) {
        if self.shut_down.swap(true, Ordering::SeqCst) {
            return;
        }
        self.pool.shutdown();
        let failed = self.pending.fail_all(&TransportError::ShutDown.into());
        tracing::info!(failed, "transport client shut down");
    }
}

impl Drop for TransportClient {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[async_trait::async_trait]
impl RpcTransport for TransportClient {
    async fn do_request(
        &self,
        request: &RpcRequest,
        target: &ServiceMetaInfo,
    ) -> Result<RpcResponse, RpcError> {
        let message = ProtocolMessage::request(
            self.config.layout,
            self.config.serializer,
            self.ids.next_id(),
            request.clone(),
        );

        let reply = self.send(&target.address(), message).await?;
        match reply.body {
            MessageBody::Response(response) => Ok(response),
            other => Err(ProtocolError::UnexpectedBody(other.message_type()).into()),
        }
    }

    fn serializer(&self) -> SerializerKind {
        self.config.serializer
    }
}
