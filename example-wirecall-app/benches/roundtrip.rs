use criterion::{Criterion, criterion_group, criterion_main};
use example_wirecall_app::{USER_SERVICE, User, register_user_service};
use std::sync::Arc;
use tokio::runtime::Runtime;
use wirecall::config::TransportConfig;
use wirecall::rpc::{ProtocolCodec, ProtocolMessage, RpcRequest};
use wirecall::serializer::SerializerKind;
use wirecall_service_caller::RpcTransport;
use wirecall_tokio_rpc_client::TransportClient;
use wirecall_tokio_rpc_server::RpcServer;
use wirecall_tokio_rpc_server::utils::{bind_tcp_listener_on_random_port, listener_service_info};

fn get_user(serializer: SerializerKind) -> RpcRequest {
    RpcRequest::builder(serializer, USER_SERVICE, "getUser")
        .arg(&User::new("bench"))
        .unwrap()
        .build()
}

fn bench_codec(c: &mut Criterion) {
    for serializer in [SerializerKind::Native, SerializerKind::Json, SerializerKind::Compact] {
        let message = ProtocolMessage::request(
            Default::default(),
            serializer,
            1,
            get_user(serializer),
        );
        let bytes = ProtocolCodec::encode(&message).unwrap();

        c.bench_function(&format!("encode_request_{}", serializer.name()), |b| {
            b.iter(|| ProtocolCodec::encode(&message).unwrap())
        });
        c.bench_function(&format!("decode_request_{}", serializer.name()), |b| {
            b.iter(|| ProtocolCodec::decode(&bytes).unwrap())
        });
    }
}

fn bench_roundtrip(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();

    let (client, target) = rt.block_on(async {
        let (listener, _port) = bind_tcp_listener_on_random_port().await.unwrap();
        let target = listener_service_info(&listener, USER_SERVICE).unwrap();

        let server = Arc::new(RpcServer::new());
        register_user_service(&server.endpoint()).unwrap();
        tokio::spawn(server.serve_with_listener(listener));

        (TransportClient::new(TransportConfig::default()), target)
    });

    let request = get_user(client.serializer());
    c.bench_function("loopback_get_user", |b| {
        b.to_async(&rt)
            .iter(|| async { client.do_request(&request, &target).await.unwrap() })
    });
}

criterion_group!(benches, bench_codec, bench_roundtrip);
criterion_main!(benches);
