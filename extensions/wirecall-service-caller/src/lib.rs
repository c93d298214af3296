mod load_balancer;
mod retry;
mod rpc_config;
mod rpc_transport;
mod service_proxy;
mod tolerant;

pub use load_balancer::{
    ConsistentHashLoadBalancer, LeastActiveLoadBalancer, LoadBalancer, RandomLoadBalancer,
    RoundRobinLoadBalancer,
};
pub use retry::{FixedIntervalRetry, NoRetry, RetryListener, RetryStrategy, RetryTask};
pub use rpc_config::{LoadBalancerKind, RetryStrategyKind, RpcConfig, TolerantStrategyKind};
pub use rpc_transport::RpcTransport;
pub use service_proxy::ServiceProxy;
pub use tolerant::{
    FAIL_OVER_MESSAGE, FailBackTolerant, FailFastTolerant, FailOverTolerant, FailSafeTolerant,
    TolerantContext, TolerantStrategy,
};
