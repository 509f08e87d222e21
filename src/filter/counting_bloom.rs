use std::hash::Hash;
use std::mem;

use super::{optimal_num_hashes, optimal_num_slots, FrequencyEstimator, SlotHasher};

/// Counting Bloom filter used as the admission frequency sketch.
///
/// Increments are conservative: only the counters currently holding the
/// minimum for a key are bumped, which keeps over-estimation from colliding
/// keys as low as the layout allows.
#[derive(Debug, Clone)]
pub struct CountingBloomFilter {
    counters: Vec<u32>,
    cardinality: u32,
    hasher: SlotHasher,
}

impl CountingBloomFilter {
    pub fn new(cardinality: u32) -> Self {
        let num_counters = optimal_num_slots(cardinality);
        let num_hashes = optimal_num_hashes(cardinality, num_counters);
        Self {
            counters: vec![0; num_counters],
            cardinality,
            hasher: SlotHasher::new(num_hashes),
        }
    }

    fn min_count<K: Hash + ?Sized>(&self, key: &K) -> u32 {
        self.hasher
            .slots(key, self.counters.len())
            .map(|slot| self.counters[slot])
            .min()
            .unwrap_or(0)
    }
}

impl<K: Hash + ?Sized> FrequencyEstimator<K> for CountingBloomFilter {
    fn with_cardinality(cardinality: u32) -> Self {
        Self::new(cardinality)
    }

    fn add(&mut self, key: &K) {
        let min = self.min_count(key);
        if min == u32::MAX {
            return;
        }
        for slot in self.hasher.slots(key, self.counters.len()) {
            if self.counters[slot] == min {
                self.counters[slot] = min + 1;
            }
        }
    }

    fn estimate(&self, key: &K) -> u32 {
        self.min_count(key)
    }

    fn cardinality(&self) -> u32 {
        self.cardinality
    }

    fn clear(&mut self) {
        self.counters.fill(0);
    }

    fn memory_used(&self) -> usize {
        self.counters.capacity() * mem::size_of::<u32>()
    }
}
