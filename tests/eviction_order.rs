use std::collections::{HashSet, VecDeque};

use cache_policy::{EvictionPolicy, Item, LruPolicy, PolicyError};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Insert(u64),
    Hit(u64),
    Update(u64),
    EvictVictim,
    EvictOther(u64),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (0..16u64).prop_map(Op::Insert),
        3 => (0..16u64).prop_map(Op::Hit),
        1 => (0..16u64).prop_map(Op::Update),
        2 => Just(Op::EvictVictim),
        1 => (0..16u64).prop_map(Op::EvictOther),
    ]
}

fn item(key: u64) -> Item<u64, ()> {
    Item::new(key, (), 1)
}

/// Recency model: front is the least recently used key, back the most recent.
#[derive(Debug, Default)]
struct Model(VecDeque<u64>);

impl Model {
    fn contains(&self, key: u64) -> bool {
        self.0.contains(&key)
    }

    fn touch(&mut self, key: u64) -> bool {
        match self.0.iter().position(|&tracked| tracked == key) {
            Some(at) => {
                self.0.remove(at);
                self.0.push_back(key);
                true
            }
            None => false,
        }
    }

    fn victims(&self) -> Vec<u64> {
        self.0.iter().copied().collect()
    }
}

// Generic over the trait so the host-facing surface is what gets checked.
fn apply<P: EvictionPolicy<u64>>(policy: &mut P, model: &mut Model, op: &Op) {
    match *op {
        Op::Insert(key) => {
            let result = policy.on_insert(&item(key));
            if model.contains(key) {
                assert_eq!(result, Err(PolicyError::AlreadyTracked));
            } else {
                assert_eq!(result, Ok(()));
                model.0.push_back(key);
            }
        }
        Op::Hit(key) | Op::Update(key) => {
            let result = match op {
                Op::Hit(_) => policy.on_cache_hit(&item(key)),
                _ => policy.on_update(&item(key)),
            };
            if model.touch(key) {
                assert_eq!(result, Ok(()));
            } else {
                assert_eq!(result, Err(PolicyError::NotTracked));
            }
        }
        Op::EvictVictim => {
            if let Some(victim) = model.0.pop_front() {
                assert_eq!(policy.on_evict(&victim), Ok(()));
            }
        }
        Op::EvictOther(key) => {
            let result = policy.on_evict(&key);
            match model.0.front() {
                Some(&victim) if victim == key => {
                    assert_eq!(result, Ok(()));
                    model.0.pop_front();
                }
                _ if model.contains(key) => assert_eq!(result, Err(PolicyError::NotVictim)),
                _ => assert_eq!(result, Err(PolicyError::NotTracked)),
            }
        }
    }
}

proptest! {
    #[test]
    fn victims_match_recency_order(ops in prop::collection::vec(op(), 0..200)) {
        let mut policy: LruPolicy<u64> = LruPolicy::new();
        let mut model = Model::default();
        for op in &ops {
            apply(&mut policy, &mut model, op);
            let victims: Vec<u64> = policy.victims().copied().collect();
            prop_assert_eq!(victims, model.victims());
        }
    }

    #[test]
    fn victims_and_tracked_keys_are_a_bijection(ops in prop::collection::vec(op(), 0..200)) {
        let mut policy: LruPolicy<u64> = LruPolicy::new();
        let mut model = Model::default();
        for op in &ops {
            apply(&mut policy, &mut model, op);
        }
        let victims: Vec<u64> = policy.victims().copied().collect();
        let unique: HashSet<u64> = victims.iter().copied().collect();
        prop_assert_eq!(unique.len(), victims.len());
        prop_assert_eq!(victims.len(), policy.len());
        let tracked: HashSet<u64> = model.0.iter().copied().collect();
        prop_assert_eq!(unique, tracked);
        prop_assert!(victims.iter().all(|key| policy.contains(key)));
    }
}

#[test]
fn insert_hit_evict_walkthrough() {
    let mut policy = LruPolicy::new();
    for key in ['A', 'B', 'C'] {
        policy.on_insert(&Item::new(key, (), 1)).unwrap();
    }
    let order = |policy: &LruPolicy<char>| policy.victims().copied().collect::<Vec<_>>();
    assert_eq!(order(&policy), ['A', 'B', 'C']);

    policy.on_cache_hit(&Item::new('B', (), 1)).unwrap();
    assert_eq!(order(&policy), ['A', 'C', 'B']);

    policy.on_evict(&'A').unwrap();
    assert_eq!(order(&policy), ['C', 'B']);
}
