use crate::service_definition::{USER_SERVICE, User, user_methods};
use wirecall::rpc::{RpcRequest, RpcResponse};
use wirecall_tokio_rpc_server::{BoxError, RequestContext, RpcServiceEndpoint, RpcServiceEndpointError};

pub fn register_user_service(endpoint: &RpcServiceEndpoint) -> Result<(), RpcServiceEndpointError> {
    endpoint.register_method(
        USER_SERVICE,
        user_methods::GET_USER,
        |ctx: RequestContext, request: RpcRequest| async move {
            let user: User = request.arg(ctx.serializer, 0)?;
            tracing::info!(name = %user.name, peer = %ctx.peer, "getUser");
            Ok::<_, BoxError>(RpcResponse::with_data(ctx.serializer, &user)?)
        },
    )?;

    endpoint.register_method(
        USER_SERVICE,
        user_methods::GET_NUMBER,
        |ctx: RequestContext, _request: RpcRequest| async move {
            Ok::<_, BoxError>(RpcResponse::with_data(ctx.serializer, &1i16)?)
        },
    )
}
