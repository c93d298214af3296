use crate::LoadBalancer;
use rand::Rng;
use std::collections::HashMap;
use wirecall::rpc::ServiceMetaInfo;

#[derive(Debug, Default)]
pub struct RandomLoadBalancer;

impl RandomLoadBalancer {
    pub fn new() -> Self {
        Self
    }
}

impl LoadBalancer for RandomLoadBalancer {
    fn select(
        &self,
        _params: &HashMap<String, String>,
        candidates: &[ServiceMetaInfo],
    ) -> Option<ServiceMetaInfo> {
        match candidates.len() {
            0 => None,
            1 => candidates.first().cloned(),
            len => candidates.get(rand::rng().random_range(0..len)).cloned(),
        }
    }
}
