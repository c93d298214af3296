mod common;

use common::{ScriptedTransport, user_service};
use std::sync::Arc;
use std::time::Duration;
use wirecall::error::{RpcError, TransportError};
use wirecall::rpc::{RpcRequest, RpcResponse, ServiceMetaInfo};
use wirecall::serializer::SerializerKind;
use wirecall_registry::{MemoryRegistry, MemoryStore, RegistryConfig, ServiceRegistry};
use wirecall_service_caller::{
    FAIL_OVER_MESSAGE, FailOverTolerant, FixedIntervalRetry, LeastActiveLoadBalancer, RpcConfig,
    RpcTransport, ServiceProxy, TolerantStrategyKind,
};

async fn registry_with(instances: &[ServiceMetaInfo]) -> Arc<MemoryRegistry> {
    let registry = Arc::new(MemoryRegistry::new(MemoryStore::new()));
    registry.init(&RegistryConfig::default()).await.unwrap();
    for instance in instances {
        registry.register(instance).await.unwrap();
    }
    registry
}

#[tokio::test]
async fn empty_discovery_is_no_available_instance() {
    let proxy = ServiceProxy::new(registry_with(&[]).await, ScriptedTransport::new());

    let result = proxy.invoke(RpcRequest::new("UserService", "getUser")).await;
    assert_eq!(
        result,
        Err(RpcError::NoAvailableInstance("UserService:1.0".to_string()))
    );
}

#[tokio::test]
async fn call_decodes_the_selected_instance_response() {
    let a = user_service("10.0.0.1");
    let proxy = ServiceProxy::new(registry_with(&[a.clone()]).await, ScriptedTransport::new());

    let request = proxy.request("UserService", "getUser").arg(&42u32).unwrap().build();
    assert_eq!(request.args.len(), 1);

    let answered_by: Option<String> = proxy.call(request).await.unwrap();
    assert_eq!(answered_by, Some(a.address()));
}

#[tokio::test]
async fn fail_over_scenario_returns_second_instance() {
    let a = user_service("10.0.0.1");
    let b = user_service("10.0.0.2");
    let transport = ScriptedTransport::new();
    transport.take_down(&a);

    let registry = registry_with(&[a.clone(), b.clone()]).await;
    let proxy = ServiceProxy::new(registry, transport.clone())
        .with_tolerant(Arc::new(FailOverTolerant::new(transport.clone())));

    // Round-robin starts with A, which fails; fail-over then reaches B.
    let response = proxy
        .invoke(RpcRequest::new("UserService", "getUser"))
        .await
        .unwrap();

    assert_eq!(response.message, FAIL_OVER_MESSAGE);
    assert_eq!(
        response.decode_data::<String>(SerializerKind::Json).unwrap(),
        Some(b.address())
    );
}

#[tokio::test(start_paused = true)]
async fn retry_runs_before_the_tolerant_strategy() {
    let a = user_service("10.0.0.1");
    let transport = ScriptedTransport::new();
    transport.take_down(&a);

    let config = RpcConfig {
        tolerant_strategy: TolerantStrategyKind::FailSafe,
        ..RpcConfig::default()
    };
    let proxy = ServiceProxy::from_config(&config, registry_with(&[a.clone()]).await, transport.clone())
        .with_retry(Arc::new(FixedIntervalRetry::new(3, Duration::from_millis(100))));

    let response = proxy
        .invoke(RpcRequest::new("UserService", "getUser"))
        .await
        .unwrap();

    assert_eq!(transport.calls_to(&a), 3);
    assert_eq!(response.data, None);
    assert!(response.message.starts_with("fail-safe"));
}

#[tokio::test]
async fn least_active_counters_are_released_after_each_call() {
    let a = user_service("10.0.0.1");
    let b = user_service("10.0.0.2");
    let lb = Arc::new(LeastActiveLoadBalancer::new());
    let transport = ScriptedTransport::new();
    transport.take_down(&b);

    let proxy = ServiceProxy::new(registry_with(&[a.clone(), b.clone()]).await, transport.clone())
        .with_load_balancer(lb.clone());

    for _ in 0..4 {
        let _ = proxy.invoke(RpcRequest::new("UserService", "getUser")).await;
    }

    assert_eq!(lb.active_count(&a.address()), 0);
    assert_eq!(lb.active_count(&b.address()), 0);
}

/// Answers with a provider-side exception.
struct RejectingTransport;

#[async_trait::async_trait]
impl RpcTransport for RejectingTransport {
    async fn do_request(
        &self,
        _request: &RpcRequest,
        _target: &ServiceMetaInfo,
    ) -> Result<RpcResponse, RpcError> {
        Ok(RpcResponse::failure("handler failed", "user 42 not found"))
    }

    fn serializer(&self) -> SerializerKind {
        SerializerKind::Json
    }
}

#[tokio::test]
async fn carried_exception_becomes_remote_error() {
    let proxy = ServiceProxy::new(
        registry_with(&[user_service("10.0.0.1")]).await,
        Arc::new(RejectingTransport),
    );

    let result: Result<Option<String>, RpcError> =
        proxy.call(RpcRequest::new("UserService", "getUser")).await;
    assert_eq!(result, Err(RpcError::Remote("user 42 not found".to_string())));
}

#[tokio::test]
async fn transport_errors_surface_with_fail_fast() {
    let a = user_service("10.0.0.1");
    let transport = ScriptedTransport::new();
    transport.take_down(&a);
    let proxy = ServiceProxy::new(registry_with(&[a.clone()]).await, transport);

    let result = proxy.invoke(RpcRequest::new("UserService", "getUser")).await;
    assert_eq!(
        result,
        Err(TransportError::ConnectionClosed { addr: a.address() }.into())
    );
}
