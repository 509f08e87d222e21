use cache_policy::{Item, LruPolicy, OnUpdate, Result, TinyLfuPolicy};
use hashbrown::HashMap;
use rayon::prelude::*;
use tracing::debug;

use crate::config::PolicyKind;
use crate::{AccessRecord, Key};

pub struct SimulationResult {
    pub label: String,
    pub points: Vec<(f64, f64)>,
}

/// Byte-bounded cache driving an LRU eviction order, optionally behind a
/// TinyLFU admission filter.
pub struct SimCache {
    capacity: u64,
    size: u64,
    items: HashMap<Key, Item<Key, ()>>,
    eviction: LruPolicy<Key>,
    admission: Option<TinyLfuPolicy<Key>>,
}

impl SimCache {
    pub fn new(capacity: u64, on_update: OnUpdate, admission: Option<u32>) -> Self {
        Self {
            capacity,
            size: 0,
            items: HashMap::new(),
            eviction: LruPolicy::with_on_update(on_update),
            admission: admission.map(TinyLfuPolicy::new),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn contains(&self, key: Key) -> bool {
        self.items.contains_key(&key)
    }

    /// Returns whether `key` was cached.
    pub fn get(&mut self, key: Key) -> Result<bool> {
        match self.items.get(&key) {
            Some(item) => {
                self.eviction.on_cache_hit(item)?;
                if let Some(admission) = &mut self.admission {
                    admission.on_cache_hit(item);
                }
                Ok(true)
            }
            None => {
                if let Some(admission) = &mut self.admission {
                    admission.on_cache_miss(&key);
                }
                Ok(false)
            }
        }
    }

    /// Returns whether the entry is cached afterwards.
    pub fn put(&mut self, key: Key, size: u64) -> Result<bool> {
        if let Some(item) = self.items.get_mut(&key) {
            self.size = self.size - item.size + size;
            item.size = size;
            self.eviction.on_update(item)?;
            self.shrink()?;
            return Ok(self.contains(key));
        }

        if size > self.capacity {
            return Ok(false);
        }
        if let Some(admission) = &self.admission {
            if !admission.should_add(&key) {
                return Ok(false);
            }
        }

        let needed = (self.size + size).saturating_sub(self.capacity);
        let mut freed = 0;
        let mut victims = Vec::new();
        for victim in self.eviction.victims() {
            if freed >= needed {
                break;
            }
            if let Some(admission) = &self.admission {
                if !admission.should_replace(victim, &key) {
                    return Ok(false);
                }
            }
            freed += self.items.get(victim).map_or(0, |item| item.size);
            victims.push(*victim);
        }
        for victim in victims {
            self.evict(victim)?;
        }

        let item = Item::new(key, (), size);
        self.eviction.on_insert(&item)?;
        self.items.insert(key, item);
        self.size += size;
        Ok(true)
    }

    fn shrink(&mut self) -> Result<()> {
        while self.size > self.capacity {
            let Some(&victim) = self.eviction.victims().next() else {
                break;
            };
            self.evict(victim)?;
        }
        Ok(())
    }

    fn evict(&mut self, key: Key) -> Result<()> {
        self.eviction.on_evict(&key)?;
        if let Some(item) = self.items.remove(&key) {
            self.size -= item.size;
        }
        Ok(())
    }
}

/// Replays `records`, inserting on every miss, and returns the miss ratio.
pub fn simulate(
    records: &[AccessRecord],
    policy: PolicyKind,
    capacity: u64,
    cardinality: u32,
    on_update: OnUpdate,
) -> Result<f64> {
    let admission = match policy {
        PolicyKind::Lru => None,
        PolicyKind::TinyLfu => Some(cardinality),
    };
    let mut cache = SimCache::new(capacity, on_update, admission);
    let mut misses = 0usize;
    for record in records {
        if !cache.get(record.key)? {
            misses += 1;
            cache.put(record.key, u64::from(record.size.max(1)))?;
        }
    }
    debug!(
        entries = cache.len(),
        bytes = cache.size(),
        capacity,
        "replay finished"
    );
    if records.is_empty() {
        return Ok(0.0);
    }
    Ok(misses as f64 / records.len() as f64)
}

/// Miss ratio at `points` evenly spaced capacities up to `cache_size`.
pub fn miss_ratio_curve(
    records: &[AccessRecord],
    policy: PolicyKind,
    cache_size: u64,
    points: usize,
    cardinality: Option<u32>,
    on_update: OnUpdate,
) -> Result<SimulationResult> {
    let total: u64 = records.iter().map(|r| u64::from(r.size.max(1))).sum();
    let mean_size = (total / records.len().max(1) as u64).max(1);
    let points = points.max(1) as u64;
    let distinct_bound = u64::try_from(records.len()).unwrap_or(u64::MAX).max(1);

    let mut curve = (1..=points)
        .into_par_iter()
        .map(|i| {
            let scaled = u128::from(cache_size) * u128::from(i) / u128::from(points);
            let capacity = u64::try_from(scaled).unwrap_or(cache_size);
            // a trace never holds more distinct keys than records
            let cardinality = cardinality.unwrap_or_else(|| {
                let objects = (capacity / mean_size).min(distinct_bound);
                u32::try_from(objects).unwrap_or(u32::MAX)
            });
            let ratio = simulate(records, policy, capacity, cardinality.max(1), on_update)?;
            debug!(policy = policy.label(), capacity, ratio, "simulated");
            Ok((capacity as f64, ratio))
        })
        .collect::<Result<Vec<_>>>()?;
    curve.insert(0, (0.0, 1.0));

    Ok(SimulationResult {
        label: policy.label().to_string(),
        points: curve,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(key: Key) -> AccessRecord {
        AccessRecord {
            timestamp: 0,
            command: 0,
            key,
            size: 1,
            ttl: 0,
        }
    }

    #[test]
    fn lru_cache_evicts_least_recent() {
        let mut cache = SimCache::new(3, OnUpdate::Promote, None);
        for key in 1..=3 {
            assert!(cache.put(key, 1).unwrap());
        }
        assert!(cache.get(1).unwrap());
        assert!(cache.put(4, 1).unwrap());
        assert!(!cache.contains(2));
        assert!(cache.contains(1));
        assert_eq!(cache.len(), 3);
        assert_eq!(cache.size(), 3);
    }

    #[test]
    fn large_entries_evict_several_victims() {
        let mut cache = SimCache::new(10, OnUpdate::Promote, None);
        for key in 1..=5 {
            cache.put(key, 2).unwrap();
        }
        assert!(cache.put(6, 5).unwrap());
        assert_eq!(cache.len(), 3);
        assert!(cache.size() <= 10);
        assert!(!cache.put(7, 11).unwrap());
    }

    #[test]
    fn growing_update_shrinks_the_cache() {
        let mut cache = SimCache::new(4, OnUpdate::Retain, None);
        cache.put(1, 2).unwrap();
        cache.put(2, 2).unwrap();
        assert!(!cache.put(1, 3).unwrap());
        assert_eq!(cache.size(), 2);
        assert!(cache.contains(2));
    }

    #[test]
    fn admission_requires_a_second_miss() {
        let mut cache = SimCache::new(10, OnUpdate::Promote, Some(100));
        assert!(!cache.get(7).unwrap());
        assert!(!cache.put(7, 1).unwrap());
        assert!(!cache.get(7).unwrap());
        assert!(cache.put(7, 1).unwrap());
        assert!(cache.get(7).unwrap());
    }

    #[test]
    fn admission_protects_frequent_keys() {
        let mut cache = SimCache::new(2, OnUpdate::Promote, Some(100));
        for _ in 0..3 {
            for key in [1, 2] {
                if !cache.get(key).unwrap() {
                    cache.put(key, 1).unwrap();
                }
            }
        }
        assert!(cache.contains(1) && cache.contains(2));

        // seen twice, but less often than the residents
        cache.get(3).unwrap();
        cache.get(3).unwrap();
        assert!(!cache.put(3, 1).unwrap());
        assert!(cache.contains(1) && cache.contains(2));
    }

    #[test]
    fn tinylfu_resists_scans() {
        let mut records = Vec::new();
        let mut scan = 1_000;
        for _ in 0..50 {
            records.extend((0..5).map(record));
            records.extend((scan..scan + 10).map(record));
            scan += 10;
        }
        let lru = simulate(&records, PolicyKind::Lru, 10, 1000, OnUpdate::Promote).unwrap();
        let tinylfu = simulate(&records, PolicyKind::TinyLfu, 10, 1000, OnUpdate::Promote).unwrap();
        assert_eq!(lru, 1.0);
        assert!(tinylfu < 0.75, "tinylfu miss ratio {tinylfu}");
    }

    #[test]
    fn curve_starts_empty_and_covers_every_point() {
        let records: Vec<_> = (0..200).map(|i| record(i % 20)).collect();
        let result =
            miss_ratio_curve(&records, PolicyKind::Lru, 20, 4, None, OnUpdate::Promote).unwrap();
        assert_eq!(result.label, "LRU");
        assert_eq!(result.points.len(), 5);
        assert_eq!(result.points[0], (0.0, 1.0));
        // the whole working set fits at the largest size
        assert_eq!(result.points[4], (20.0, 0.1));
    }

    #[test]
    fn curve_handles_the_largest_cache_size() {
        let records: Vec<_> = (0..40).map(|i| record(i % 8)).collect();
        // admission refuses the first miss of every key
        for (policy, ratio) in [(PolicyKind::Lru, 0.2), (PolicyKind::TinyLfu, 0.4)] {
            let result =
                miss_ratio_curve(&records, policy, u64::MAX, 4, None, OnUpdate::Promote).unwrap();
            assert_eq!(result.points.len(), 5);
            assert_eq!(result.points[2].0, (u64::MAX / 2) as f64);
            assert_eq!(result.points[4], (u64::MAX as f64, ratio));
        }
    }
}
