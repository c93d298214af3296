use example_wirecall_app::{User, UserServiceClient, register_user_service};
use futures::future::join_all;
use std::sync::Arc;
use wirecall::config::TransportConfig;
use wirecall::serializer::SerializerKind;
use wirecall_registry::{CachedRegistry, MemoryRegistry, MemoryStore, RegistryConfig, ServiceRegistry};
use wirecall_service_caller::{RpcConfig, RpcTransport, ServiceProxy};
use wirecall_tokio_rpc_client::TransportClient;
use wirecall_tokio_rpc_server::RpcServer;
use wirecall_tokio_rpc_server::utils::{bind_tcp_listener_on_random_port, listener_service_info};

async fn setup(serializer: SerializerKind) -> (UserServiceClient, Arc<RpcServer>) {
    let store = MemoryStore::new();

    let (listener, _port) = bind_tcp_listener_on_random_port().await.unwrap();
    let info = listener_service_info(&listener, "UserService").unwrap();
    let server = Arc::new(RpcServer::new());
    register_user_service(&server.endpoint()).unwrap();
    tokio::spawn(server.clone().serve_with_listener(listener));

    let provider = MemoryRegistry::new(store.clone());
    provider.init(&RegistryConfig::default()).await.unwrap();
    provider.register(&info).await.unwrap();

    let config = RpcConfig {
        transport: TransportConfig {
            serializer,
            ..TransportConfig::default()
        },
        ..RpcConfig::default()
    };
    let registry = CachedRegistry::new(Arc::new(MemoryRegistry::new(store)));
    registry.init(&config.registry).await.unwrap();
    let transport: Arc<dyn RpcTransport> = Arc::new(TransportClient::new(config.transport.clone()));

    let client = UserServiceClient::new(ServiceProxy::from_config(&config, Arc::new(registry), transport));
    (client, server)
}

#[tokio::test]
async fn stub_calls_reach_the_provider_with_every_serializer() {
    for serializer in [SerializerKind::Native, SerializerKind::Json, SerializerKind::Compact] {
        let (users, server) = setup(serializer).await;

        assert_eq!(
            users.get_user(&User::new("ada")).await.unwrap(),
            Some(User::new("ada"))
        );
        assert_eq!(users.get_number().await.unwrap(), 1);

        server.shutdown();
    }
}

#[tokio::test]
async fn concurrent_stub_calls_all_complete() {
    let (users, server) = setup(SerializerKind::Json).await;

    let names: Vec<String> = (0..32).map(|i| format!("user-{i}")).collect();
    let results = join_all(names.iter().map(|name| {
        let users = users.clone();
        let user = User::new(name.clone());
        async move { users.get_user(&user).await }
    }))
    .await;

    for (name, result) in names.iter().zip(results) {
        assert_eq!(result.unwrap(), Some(User::new(name.clone())));
    }

    server.shutdown();
}
