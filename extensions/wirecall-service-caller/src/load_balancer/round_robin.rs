use crate::LoadBalancer;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use wirecall::rpc::ServiceMetaInfo;

#[derive(Debug, Default)]
pub struct RoundRobinLoadBalancer {
    next: AtomicUsize,
}

impl RoundRobinLoadBalancer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LoadBalancer for RoundRobinLoadBalancer {
    fn select(
        &self,
        _params: &HashMap<String, String>,
        candidates: &[ServiceMetaInfo],
    ) -> Option<ServiceMetaInfo> {
        if candidates.is_empty() {
            return None;
        }
        let index = self.next.fetch_add(1, Ordering::Relaxed) % candidates.len();
        candidates.get(index).cloned()
    }
}
