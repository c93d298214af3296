use std::io::Result;
use tokio::net::TcpListener;
use wirecall::rpc::ServiceMetaInfo;

/// Describes `service_name` as served from the address `listener` is bound
/// to, ready to be registered.
pub fn listener_service_info(listener: &TcpListener, service_name: &str) -> Result<ServiceMetaInfo> {
    let local = listener.local_addr()?;
    Ok(ServiceMetaInfo::new(
        service_name,
        local.ip().to_string(),
        local.port(),
    ))
}
