mod consistent_hash;
mod least_active;
mod random;
mod round_robin;

pub use consistent_hash::ConsistentHashLoadBalancer;
pub use least_active::LeastActiveLoadBalancer;
pub use random::RandomLoadBalancer;
pub use round_robin::RoundRobinLoadBalancer;

use std::collections::HashMap;
use wirecall::rpc::ServiceMetaInfo;

/// Picks one instance out of the discovered candidates.
///
/// `select` returns `None` only when `candidates` is empty.
pub trait LoadBalancer: Send + Sync {
    fn select(
        &self,
        params: &HashMap<String, String>,
        candidates: &[ServiceMetaInfo],
    ) -> Option<ServiceMetaInfo>;

    /// Called once the call to `instance` has finished, successfully or not.
    fn release(&self, _instance: &ServiceMetaInfo) {}

    /// Called with every fresh discovery result so state for instances that
    /// disappeared can be dropped.
    fn cleanup(&self, _current: &[ServiceMetaInfo]) {}
}
