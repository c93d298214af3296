use crate::LoadBalancer;
use dashmap::DashMap;
use std::collections::{HashMap, HashSet};
use wirecall::rpc::ServiceMetaInfo;

/// Routes to the instance with the fewest calls in flight.
///
/// Counters are keyed by address. Ties go to the candidate listed first.
/// A counter never drops below zero, even if `release` is called for an
/// instance that was never selected.
#[derive(Debug, Default)]
pub struct LeastActiveLoadBalancer {
    active: DashMap<String, usize>,
}

impl LeastActiveLoadBalancer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Calls currently counted against `address`.
    pub fn active_count(&self, address: &str) -> usize {
        self.active.get(address).map(|count| *count).unwrap_or(0)
    }

    fn acquire(&self, instance: &ServiceMetaInfo) {
        *self.active.entry(instance.address()).or_insert(0) += 1;
    }
}

impl LoadBalancer for LeastActiveLoadBalancer {
    fn select(
        &self,
        _params: &HashMap<String, String>,
        candidates: &[ServiceMetaInfo],
    ) -> Option<ServiceMetaInfo> {
        let chosen = match candidates {
            [] => return None,
            [only] => only,
            _ => candidates
                .iter()
                .enumerate()
                .min_by_key(|(position, candidate)| {
                    (self.active_count(&candidate.address()), *position)
                })
                .map(|(_, candidate)| candidate)?,
        };

        self.acquire(chosen);
        Some(chosen.clone())
    }

    fn release(&self, instance: &ServiceMetaInfo) {
        if let Some(mut count) = self.active.get_mut(&instance.address()) {
            *count = count.saturating_sub(1);
        }
    }

    fn cleanup(&self, current: &[ServiceMetaInfo]) {
        let live: HashSet<String> = current.iter().map(ServiceMetaInfo::address).collect();
        self.active.retain(|address, _| live.contains(address));
    }
}
