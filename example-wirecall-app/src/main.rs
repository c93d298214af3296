use example_wirecall_app::{USER_SERVICE, User, UserServiceClient, register_user_service};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use wirecall_registry::{CachedRegistry, MemoryRegistry, MemoryStore, ServiceRegistry};
use wirecall_service_caller::{RpcConfig, RpcTransport, ServiceProxy};
use wirecall_tokio_rpc_client::TransportClient;
use wirecall_tokio_rpc_server::RpcServer;
use wirecall_tokio_rpc_server::utils::{bind_tcp_listener_on_random_port, listener_service_info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Optional JSON config file as the first argument.
    let config = match std::env::args().nth(1) {
        Some(path) => RpcConfig::from_json_str(&std::fs::read_to_string(path)?)?,
        None => RpcConfig::default(),
    };

    // One in-process store stands in for the shared registry backend.
    let store = MemoryStore::new();

    // Provider side
    let (listener, _port) = bind_tcp_listener_on_random_port().await?;
    let info = listener_service_info(&listener, USER_SERVICE)?;

    let server = Arc::new(RpcServer::new().with_max_body_length(config.transport.max_body_length));
    register_user_service(&server.endpoint())?;
    let serving = tokio::spawn(server.clone().serve_with_listener(listener));

    let provider_registry = MemoryRegistry::new(store.clone());
    provider_registry.init(&config.registry).await?;
    provider_registry.register(&info).await?;
    provider_registry.heart_beat().await?;

    // Consumer side
    let consumer_registry = CachedRegistry::new(Arc::new(MemoryRegistry::new(store.clone())));
    consumer_registry.init(&config.registry).await?;
    let transport: Arc<dyn RpcTransport> = Arc::new(TransportClient::new(config.transport.clone()));
    let proxy = ServiceProxy::from_config(&config, Arc::new(consumer_registry), transport);
    let users = UserServiceClient::new(proxy);

    let ada = User::new("ada");
    let (user, number) = tokio::join!(users.get_user(&ada), users.get_number());
    println!("getUser() returned {:?}", user?);
    println!("getNumber() returned {}", number?);

    provider_registry.destroy().await;
    server.shutdown();
    let _ = serving.await;
    Ok(())
}
