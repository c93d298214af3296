#![allow(dead_code)]

use dashmap::DashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use wirecall::error::{RpcError, TransportError};
use wirecall::rpc::{RpcRequest, RpcResponse, ServiceMetaInfo};
use wirecall::serializer::SerializerKind;
use wirecall_service_caller::RpcTransport;

/// Transport double: every address either answers with its own address as
/// the payload or fails with a transport error.
#[derive(Default)]
pub struct ScriptedTransport {
    down: DashMap<String, ()>,
    calls: DashMap<String, usize>,
    total: AtomicUsize,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn take_down(&self, instance: &ServiceMetaInfo) {
        self.down.insert(instance.address(), ());
    }

    pub fn bring_up(&self, instance: &ServiceMetaInfo) {
        self.down.remove(&instance.address());
    }

    pub fn calls_to(&self, instance: &ServiceMetaInfo) -> usize {
        self.calls
            .get(&instance.address())
            .map(|count| *count)
            .unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl RpcTransport for ScriptedTransport {
    async fn do_request(
        &self,
        _request: &RpcRequest,
        target: &ServiceMetaInfo,
    ) -> Result<RpcResponse, RpcError> {
        let addr = target.address();
        self.total.fetch_add(1, Ordering::SeqCst);
        *self.calls.entry(addr.clone()).or_insert(0) += 1;

        if self.down.contains_key(&addr) {
            return Err(TransportError::ConnectionClosed { addr }.into());
        }
        Ok(RpcResponse::with_data(SerializerKind::Json, &addr)?)
    }

    fn serializer(&self) -> SerializerKind {
        SerializerKind::Json
    }
}

pub fn user_service(host: &str) -> ServiceMetaInfo {
    ServiceMetaInfo::new("UserService", host, 8080)
}
