use crate::RpcServiceEndpointError;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use wirecall::frame::MessageStatus;
use wirecall::rpc::{RpcRequest, RpcResponse};
use wirecall::serializer::SerializerKind;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

pub type RpcMethodHandler = Arc<
    dyn Fn(
            RequestContext,
            RpcRequest,
        ) -> Pin<Box<dyn Future<Output = Result<RpcResponse, BoxError>> + Send>>
        + Send
        + Sync,
>;

/// What a handler knows about the call besides its arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestContext {
    /// The serializer the request arrived in; replies use it as well.
    pub serializer: SerializerKind,
    pub peer: SocketAddr,
    pub request_id: u64,
}

/// Method handlers keyed by `(service name, method name)`.
#[derive(Default)]
pub struct RpcServiceEndpoint {
    handlers: DashMap<(String, String), RpcMethodHandler>,
}

impl RpcServiceEndpoint {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_method<F, Fut>(
        &self,
        service_name: &str,
        method_name: &str,
        handler: F,
    ) -> Result<(), RpcServiceEndpointError>
    where
        F: Fn(RequestContext, RpcRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<RpcResponse, BoxError>> + Send + 'static,
    {
        match self
            .handlers
            .entry((service_name.to_string(), method_name.to_string()))
        {
            Entry::Occupied(_) => Err(RpcServiceEndpointError::DuplicateHandler {
                service: service_name.to_string(),
                method: method_name.to_string(),
            }),
            Entry::Vacant(entry) => {
                let wrapped: RpcMethodHandler = Arc::new(move |ctx, request| {
                    Box::pin(handler(ctx, request))
                        as Pin<Box<dyn Future<Output = _> + Send>>
                });
                entry.insert(wrapped);
                tracing::debug!(service = service_name, method = method_name, "registered handler");
                Ok(())
            }
        }
    }

    pub fn has_method(&self, service_name: &str, method_name: &str) -> bool {
        self.handlers
            .contains_key(&(service_name.to_string(), method_name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Runs the handler for `request`.
    ///
    /// Unknown methods and failing handlers produce a response carrying the
    /// exception rather than an error, so the caller always gets an answer.
    pub async fn dispatch(
        &self,
        ctx: RequestContext,
        request: RpcRequest,
    ) -> (MessageStatus, RpcResponse) {
        let key = (request.service_name.clone(), request.method_name.clone());
        // Clone out of the map so no shard lock is held across the await.
        let handler = match self.handlers.get(&key) {
            Some(handler) => handler.clone(),
            None => {
                tracing::warn!(
                    service = %key.0,
                    method = %key.1,
                    request_id = ctx.request_id,
                    "no handler registered"
                );
                return (
                    MessageStatus::BadResponse,
                    RpcResponse::failure(
                        "method not found",
                        format!("no handler registered for {}.{}", key.0, key.1),
                    ),
                );
            }
        };

        match handler(ctx, request).await {
            Ok(response) => (MessageStatus::Ok, response),
            Err(e) => {
                tracing::warn!(service = %key.0, method = %key.1, error = %e, "handler failed");
                (
                    MessageStatus::BadResponse,
                    RpcResponse::failure("handler failed", e.to_string()),
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> RequestContext {
        RequestContext {
            serializer: SerializerKind::Json,
            peer: "127.0.0.1:9".parse().unwrap(),
            request_id: 1,
        }
    }

    #[test]
    fn registering_a_pair_twice_is_rejected() {
        let endpoint = RpcServiceEndpoint::new();
        let echo = |_ctx: RequestContext, _request: RpcRequest| async {
            Ok::<_, BoxError>(RpcResponse::empty("ok"))
        };

        endpoint.register_method("UserService", "getUser", echo).unwrap();
        assert_eq!(
            endpoint.register_method("UserService", "getUser", echo),
            Err(RpcServiceEndpointError::DuplicateHandler {
                service: "UserService".to_string(),
                method: "getUser".to_string(),
            })
        );
        endpoint.register_method("OrderService", "getUser", echo).unwrap();
        assert_eq!(endpoint.len(), 2);
    }

    #[tokio::test]
    async fn unknown_method_answers_with_exception() {
        let endpoint = RpcServiceEndpoint::new();
        let (status, response) = endpoint
            .dispatch(ctx(), RpcRequest::new("UserService", "getUser"))
            .await;

        assert_eq!(status, MessageStatus::BadResponse);
        assert!(response.is_failure());
    }

    #[tokio::test]
    async fn handler_errors_become_failure_responses() {
        let endpoint = RpcServiceEndpoint::new();
        endpoint
            .register_method("UserService", "getUser", |_ctx, _request| async {
                Err::<RpcResponse, BoxError>("user store offline".into())
            })
            .unwrap();

        let (status, response) = endpoint
            .dispatch(ctx(), RpcRequest::new("UserService", "getUser"))
            .await;

        assert_eq!(status, MessageStatus::BadResponse);
        assert_eq!(response.exception.as_deref(), Some("user store offline"));
    }
}
