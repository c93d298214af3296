mod endpoint;
mod error;
mod rpc_server;
pub mod utils;

pub use endpoint::{BoxError, RequestContext, RpcMethodHandler, RpcServiceEndpoint};
pub use error::RpcServiceEndpointError;
pub use rpc_server::RpcServer;
