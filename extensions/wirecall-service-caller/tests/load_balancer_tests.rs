use std::collections::HashMap;
use wirecall::rpc::ServiceMetaInfo;
use wirecall_service_caller::{
    ConsistentHashLoadBalancer, LeastActiveLoadBalancer, LoadBalancer, RandomLoadBalancer,
    RoundRobinLoadBalancer,
};

fn instances(count: u16) -> Vec<ServiceMetaInfo> {
    (0..count)
        .map(|port| ServiceMetaInfo::new("UserService", "10.0.0.1", 9000 + port))
        .collect()
}

fn params(method: &str) -> HashMap<String, String> {
    HashMap::from([("method_name".to_string(), method.to_string())])
}

#[test]
fn every_strategy_returns_none_for_no_candidates() {
    let strategies: Vec<Box<dyn LoadBalancer>> = vec![
        Box::new(RoundRobinLoadBalancer::new()),
        Box::new(RandomLoadBalancer::new()),
        Box::new(LeastActiveLoadBalancer::new()),
        Box::new(ConsistentHashLoadBalancer::default()),
    ];

    for strategy in strategies {
        assert_eq!(strategy.select(&params("getUser"), &[]), None);
    }
}

#[test]
fn round_robin_cycles_through_candidates() {
    let lb = RoundRobinLoadBalancer::new();
    let candidates = instances(3);

    let picked: Vec<u16> = (0..6)
        .map(|_| lb.select(&params("getUser"), &candidates).unwrap().service_port)
        .collect();

    assert_eq!(picked, vec![9000, 9001, 9002, 9000, 9001, 9002]);
}

#[test]
fn random_only_picks_from_candidates() {
    let lb = RandomLoadBalancer::new();
    let candidates = instances(4);

    for _ in 0..100 {
        let chosen = lb.select(&params("getUser"), &candidates).unwrap();
        assert!(candidates.contains(&chosen));
    }
}

#[test]
fn least_active_prefers_idle_instances() {
    let lb = LeastActiveLoadBalancer::new();
    let candidates = instances(2);

    let first = lb.select(&params("getUser"), &candidates).unwrap();
    let second = lb.select(&params("getUser"), &candidates).unwrap();
    assert_ne!(first, second);

    // Finishing the first call makes its instance the least loaded again.
    lb.release(&first);
    assert_eq!(lb.select(&params("getUser"), &candidates), Some(first));
}

#[test]
fn least_active_counts_a_lone_candidate() {
    let lb = LeastActiveLoadBalancer::new();
    let only = instances(1);

    lb.select(&params("getUser"), &only);
    lb.select(&params("getUser"), &only);

    assert_eq!(lb.active_count(&only[0].address()), 2);
}

#[test]
fn least_active_cleanup_forgets_vanished_instances() {
    let lb = LeastActiveLoadBalancer::new();
    let candidates = instances(2);

    lb.select(&params("getUser"), &candidates);
    lb.select(&params("getUser"), &candidates);
    lb.cleanup(&candidates[1..]);

    assert_eq!(lb.active_count(&candidates[0].address()), 0);
    assert_eq!(lb.active_count(&candidates[1].address()), 1);
}

#[test]
fn consistent_hash_sticks_to_one_instance_per_key() {
    let lb = ConsistentHashLoadBalancer::default();
    let candidates = instances(5);

    let first = lb.select(&params("getUser"), &candidates).unwrap();
    for _ in 0..20 {
        assert_eq!(lb.select(&params("getUser"), &candidates), Some(first.clone()));
    }
}

#[test]
fn consistent_hash_keeps_keys_whose_instance_survives() {
    let lb = ConsistentHashLoadBalancer::default();
    let candidates = instances(5);

    let methods: Vec<String> = (0..50).map(|i| format!("method{i}")).collect();
    let before: Vec<ServiceMetaInfo> = methods
        .iter()
        .map(|method| lb.select(&params(method), &candidates).unwrap())
        .collect();

    let removed = candidates[2].clone();
    let remaining: Vec<ServiceMetaInfo> = candidates
        .iter()
        .filter(|candidate| **candidate != removed)
        .cloned()
        .collect();

    for (method, previous) in methods.iter().zip(before) {
        let now = lb.select(&params(method), &remaining).unwrap();
        if previous != removed {
            assert_eq!(now, previous, "{method} moved although its instance stayed");
        }
    }
}
