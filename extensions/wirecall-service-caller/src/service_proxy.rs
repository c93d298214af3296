use crate::{
    FailFastTolerant, LoadBalancer, NoRetry, RetryStrategy, RetryTask, RoundRobinLoadBalancer,
    RpcConfig, RpcTransport, TolerantContext, TolerantStrategy,
};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::sync::Arc;
use wirecall::error::RpcError;
use wirecall::rpc::{RpcRequest, RpcRequestBuilder, RpcResponse};
use wirecall_registry::ServiceRegistry;

/// Runs one remote call end to end: discover, select, send with retries, and
/// hand exhausted failures to the tolerant strategy.
///
/// Client stubs hold a `ServiceProxy` and build their requests with
/// [`ServiceProxy::request`].
#[derive(Clone)]
pub struct ServiceProxy {
    registry: Arc<dyn ServiceRegistry>,
    transport: Arc<dyn RpcTransport>,
    load_balancer: Arc<dyn LoadBalancer>,
    retry: Arc<dyn RetryStrategy>,
    tolerant: Arc<dyn TolerantStrategy>,
}

impl ServiceProxy {
    /// Round-robin selection, no retries, fail-fast.
    pub fn new(registry: Arc<dyn ServiceRegistry>, transport: Arc<dyn RpcTransport>) -> Self {
        Self {
            registry,
            transport,
            load_balancer: Arc::new(RoundRobinLoadBalancer::new()),
            retry: Arc::new(NoRetry),
            tolerant: Arc::new(FailFastTolerant),
        }
    }

    pub fn from_config(
        config: &RpcConfig,
        registry: Arc<dyn ServiceRegistry>,
        transport: Arc<dyn RpcTransport>,
    ) -> Self {
        let tolerant = config.tolerant_strategy.build(&transport);
        Self {
            registry,
            load_balancer: config.load_balancer.build(),
            retry: config.retry_strategy.build(),
            tolerant,
            transport,
        }
    }

    pub fn with_load_balancer(mut self, load_balancer: Arc<dyn LoadBalancer>) -> Self {
        self.load_balancer = load_balancer;
        self
    }

    pub fn with_retry(mut self, retry: Arc<dyn RetryStrategy>) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_tolerant(mut self, tolerant: Arc<dyn TolerantStrategy>) -> Self {
        self.tolerant = tolerant;
        self
    }

    /// Starts a request whose arguments are encoded with the transport's
    /// serializer.
    pub fn request(&self, service_name: &str, method_name: &str) -> RpcRequestBuilder {
        RpcRequest::builder(self.transport.serializer(), service_name, method_name)
    }

    pub async fn invoke(&self, request: RpcRequest) -> Result<RpcResponse, RpcError> {
        let service_key = request.service_key();
        let candidates = self.registry.discover(&service_key).await?;
        self.load_balancer.cleanup(&candidates);

        let params = HashMap::from([("method_name".to_string(), request.method_name.clone())]);
        let Some(selected) = self.load_balancer.select(&params, &candidates) else {
            return Err(RpcError::NoAvailableInstance(service_key));
        };

        tracing::debug!(
            service = %service_key,
            method = %request.method_name,
            addr = %selected.address(),
            "invoking"
        );

        let transport: &dyn RpcTransport = self.transport.as_ref();
        let (request_ref, target) = (&request, &selected);
        let task: RetryTask<'_> = Box::new(move || transport.do_request(request_ref, target));
        let outcome = self.retry.do_retry(task).await;

        self.load_balancer.release(&selected);

        match outcome {
            Ok(response) => Ok(response),
            Err(error) => {
                let context = TolerantContext::new(request, candidates).with_failed(selected);
                self.tolerant.do_tolerant(context, error).await
            }
        }
    }

    /// Invokes `request` and decodes the returned data.
    ///
    /// A response carrying an exception becomes [`RpcError::Remote`]. A
    /// response without data decodes to `None`.
    pub async fn call<T>(&self, request: RpcRequest) -> Result<Option<T>, RpcError>
    where
        T: DeserializeOwned,
    {
        let response = self.invoke(request).await?;
        if let Some(exception) = &response.exception {
            return Err(RpcError::Remote(exception.clone()));
        }
        Ok(response.decode_data(self.transport.serializer())?)
    }
}
