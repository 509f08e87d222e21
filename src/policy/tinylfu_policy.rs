use std::hash::Hash;
use std::marker::PhantomData;

use tracing::debug;

use super::InsertionPolicy;
use crate::filter::{BloomFilter, CountingBloomFilter, FrequencyEstimator, MembershipFilter};
use crate::Item;

/// TinyLFU admission policy.
///
/// A doorkeeper filter records first sightings; only keys seen again since
/// the last reset reach the frequency sketch. A key is admitted once it has
/// been seen at least twice, and replaces a victim only if it is estimated
/// to be strictly more frequent.
///
/// Hosts report a miss before asking whether to admit the missing key, so
/// the first miss of a key is recorded and then refused.
///
/// Whenever a key's estimate exceeds the configured cardinality, both
/// structures are cleared so that old popularity fades out.
#[derive(Debug, Clone)]
pub struct TinyLfuPolicy<K: ?Sized, M = BloomFilter, F = CountingBloomFilter> {
    gatekeeper: M,
    frequency_sketch: F,
    resets: u64,
    _key: PhantomData<fn(&K)>,
}

impl<K, M, F> TinyLfuPolicy<K, M, F>
where
    K: Hash + ?Sized,
    M: MembershipFilter<K>,
    F: FrequencyEstimator<K>,
{
    pub fn new(cardinality: u32) -> Self {
        Self {
            gatekeeper: M::with_cardinality(cardinality),
            frequency_sketch: F::with_cardinality(cardinality),
            resets: 0,
            _key: PhantomData,
        }
    }

    /// Reallocates both filters for `cardinality` keys, dropping all history.
    pub fn reserve(&mut self, cardinality: u32) {
        self.gatekeeper = M::with_cardinality(cardinality);
        self.frequency_sketch = F::with_cardinality(cardinality);
        self.resets = 0;
    }

    pub fn on_cache_miss(&mut self, key: &K) {
        self.touch(key);
    }

    /// True once `key` has been touched at least twice since the last reset.
    ///
    /// Assumes the host has already reported the current miss through
    /// [`on_cache_miss`](Self::on_cache_miss) before asking, so a key is refused
    /// on its first miss and admitted on its second. Asking before recording
    /// delays admission by one more miss.
    pub fn should_add(&self, key: &K) -> bool {
        self.gatekeeper.maybe_contains(key) && self.frequency_sketch.estimate(key) > 0
    }

    pub fn should_replace(&self, victim: &K, candidate: &K) -> bool {
        self.estimate(candidate) > self.estimate(victim)
    }

    /// Clears both filters.
    pub fn reset(&mut self) {
        self.gatekeeper.clear();
        self.frequency_sketch.clear();
    }

    pub fn memory_used(&self) -> usize {
        self.gatekeeper.memory_used() + self.frequency_sketch.memory_used()
    }

    pub fn cardinality(&self) -> u32 {
        self.frequency_sketch.cardinality()
    }

    /// Aging resets performed since the last `reserve`.
    pub fn resets(&self) -> u64 {
        self.resets
    }

    /// Sketch count plus one when the doorkeeper has seen the key.
    pub fn estimate(&self, key: &K) -> u32 {
        let sketch_estimate = self.frequency_sketch.estimate(key);
        sketch_estimate.saturating_add(u32::from(self.gatekeeper.maybe_contains(key)))
    }

    pub fn on_cache_hit<V>(&mut self, item: &Item<K, V>)
    where
        K: Sized,
    {
        self.touch(&item.key);
    }

    fn touch(&mut self, key: &K) {
        if !self.gatekeeper.maybe_contains(key) {
            self.gatekeeper.add(key);
            return;
        }
        self.frequency_sketch.add(key);
        if self.frequency_sketch.estimate(key) > self.frequency_sketch.cardinality() {
            self.reset();
            self.resets += 1;
            debug!(
                resets = self.resets,
                cardinality = self.frequency_sketch.cardinality(),
                "tinylfu aging reset"
            );
        }
    }
}

impl<K, M, F> InsertionPolicy<K> for TinyLfuPolicy<K, M, F>
where
    K: Hash,
    M: MembershipFilter<K>,
    F: FrequencyEstimator<K>,
{
    fn on_cache_hit<V>(&mut self, item: &Item<K, V>) {
        TinyLfuPolicy::on_cache_hit(self, item)
    }

    fn on_cache_miss(&mut self, key: &K) {
        TinyLfuPolicy::on_cache_miss(self, key)
    }

    fn should_add(&self, key: &K) -> bool {
        TinyLfuPolicy::should_add(self, key)
    }

    fn should_replace(&self, victim: &K, candidate: &K) -> bool {
        TinyLfuPolicy::should_replace(self, victim, candidate)
    }

    fn reserve(&mut self, cardinality: u32) {
        TinyLfuPolicy::reserve(self, cardinality)
    }

    fn memory_used(&self) -> usize {
        TinyLfuPolicy::memory_used(self)
    }
}
