use crate::{
    ConsistentHashLoadBalancer, FailBackTolerant, FailFastTolerant, FailOverTolerant,
    FailSafeTolerant, FixedIntervalRetry, LeastActiveLoadBalancer, LoadBalancer, NoRetry,
    RandomLoadBalancer, RetryStrategy, RoundRobinLoadBalancer, RpcTransport, TolerantStrategy,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use wirecall::config::TransportConfig;
use wirecall_registry::RegistryConfig;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadBalancerKind {
    #[default]
    RoundRobin,
    Random,
    LeastActive,
    ConsistentHash,
}

impl LoadBalancerKind {
    pub fn build(self) -> Arc<dyn LoadBalancer> {
        match self {
            LoadBalancerKind::RoundRobin => Arc::new(RoundRobinLoadBalancer::new()),
            LoadBalancerKind::Random => Arc::new(RandomLoadBalancer::new()),
            LoadBalancerKind::LeastActive => Arc::new(LeastActiveLoadBalancer::new()),
            LoadBalancerKind::ConsistentHash => Arc::new(ConsistentHashLoadBalancer::default()),
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetryStrategyKind {
    #[default]
    No,
    FixedInterval,
}

impl RetryStrategyKind {
    pub fn build(self) -> Arc<dyn RetryStrategy> {
        match self {
            RetryStrategyKind::No => Arc::new(NoRetry),
            RetryStrategyKind::FixedInterval => Arc::new(FixedIntervalRetry::default()),
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TolerantStrategyKind {
    #[default]
    FailFast,
    FailSafe,
    FailBack,
    FailOver,
}

impl TolerantStrategyKind {
    /// Fail-back is built with an empty defaults table; use
    /// [`FailBackTolerant::with_default`] directly to populate one.
    pub fn build(self, transport: &Arc<dyn RpcTransport>) -> Arc<dyn TolerantStrategy> {
        match self {
            TolerantStrategyKind::FailFast => Arc::new(FailFastTolerant),
            TolerantStrategyKind::FailSafe => Arc::new(FailSafeTolerant),
            TolerantStrategyKind::FailBack => {
                Arc::new(FailBackTolerant::new(transport.serializer()))
            }
            TolerantStrategyKind::FailOver => Arc::new(FailOverTolerant::new(transport.clone())),
        }
    }
}

/// Top-level settings for a caller or provider process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RpcConfig {
    pub name: String,
    pub version: String,
    pub server_host: String,
    pub server_port: u16,
    pub load_balancer: LoadBalancerKind,
    pub retry_strategy: RetryStrategyKind,
    pub tolerant_strategy: TolerantStrategyKind,
    pub transport: TransportConfig,
    pub registry: RegistryConfig,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            name: "wirecall".to_string(),
            version: "1.0".to_string(),
            server_host: "localhost".to_string(),
            server_port: 8080,
            load_balancer: LoadBalancerKind::default(),
            retry_strategy: RetryStrategyKind::default(),
            tolerant_strategy: TolerantStrategyKind::default(),
            transport: TransportConfig::default(),
            registry: RegistryConfig::default(),
        }
    }
}

impl RpcConfig {
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
