use crate::LoadBalancer;
use std::collections::{BTreeMap, HashMap};
use wirecall::rpc::ServiceMetaInfo;
use xxhash_rust::xxh3::xxh3_64;

pub const DEFAULT_VIRTUAL_NODES: usize = 100;

/// Sticks equal request parameters to the same instance.
///
/// Every candidate is placed on a hash ring `virtual_nodes` times. The
/// request parameters, in key order, are hashed onto the ring and the first
/// virtual node at or after that point wins, wrapping around at the end.
#[derive(Debug)]
pub struct ConsistentHashLoadBalancer {
    virtual_nodes: usize,
}

impl Default for ConsistentHashLoadBalancer {
    fn default() -> Self {
        Self::new(DEFAULT_VIRTUAL_NODES)
    }
}

impl ConsistentHashLoadBalancer {
    pub fn new(virtual_nodes: usize) -> Self {
        Self {
            virtual_nodes: virtual_nodes.max(1),
        }
    }

    fn ring<'a>(&self, candidates: &'a [ServiceMetaInfo]) -> BTreeMap<u64, &'a ServiceMetaInfo> {
        let mut ring = BTreeMap::new();
        for candidate in candidates {
            let address = candidate.address();
            for replica in 0..self.virtual_nodes {
                ring.insert(xxh3_64(format!("{address}#{replica}").as_bytes()), candidate);
            }
        }
        ring
    }

    fn params_hash(params: &HashMap<String, String>) -> u64 {
        let mut keys: Vec<&String> = params.keys().collect();
        keys.sort();

        let mut canonical = String::new();
        for key in keys {
            canonical.push_str(key);
            canonical.push('=');
            canonical.push_str(&params[key]);
            canonical.push(';');
        }
        xxh3_64(canonical.as_bytes())
    }
}

impl LoadBalancer for ConsistentHashLoadBalancer {
    fn select(
        &self,
        params: &HashMap<String, String>,
        candidates: &[ServiceMetaInfo],
    ) -> Option<ServiceMetaInfo> {
        if candidates.len() <= 1 {
            return candidates.first().cloned();
        }

        let ring = self.ring(candidates);
        let point = Self::params_hash(params);

        ring.range(point..)
            .next()
            .or_else(|| ring.iter().next())
            .map(|(_, candidate)| (*candidate).clone())
    }
}
