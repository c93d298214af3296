use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RpcServiceEndpointError {
    #[error("a handler for {service}.{method} is already registered")]
    DuplicateHandler { service: String, method: String },
}
