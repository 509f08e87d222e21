//! Probabilistic collaborators of the admission policy.
//!
//! Both structures are sized once for an expected key cardinality and keep a
//! constant footprint afterwards, however many distinct keys they observe.

use std::hash::{BuildHasher, Hash};

use ahash::RandomState;

mod bloom;
mod counting_bloom;

pub use bloom::BloomFilter;
pub use counting_bloom::CountingBloomFilter;

/// Probabilistic set: "has this key possibly been seen since the last clear?"
pub trait MembershipFilter<K: ?Sized> {
    fn with_cardinality(cardinality: u32) -> Self
    where
        Self: Sized;

    fn add(&mut self, key: &K);

    /// Never returns `false` for a key added since the last [`clear`](Self::clear).
    fn maybe_contains(&self, key: &K) -> bool;

    fn clear(&mut self);

    /// Heap bytes held by the filter.
    fn memory_used(&self) -> usize;
}

/// Probabilistic bounded counter per key.
pub trait FrequencyEstimator<K: ?Sized> {
    fn with_cardinality(cardinality: u32) -> Self
    where
        Self: Sized;

    /// Saturating increment.
    fn add(&mut self, key: &K);

    /// Never lower than the number of `add` calls for `key` since the last clear.
    fn estimate(&self, key: &K) -> u32;

    /// The cardinality the estimator was sized for.
    fn cardinality(&self) -> u32;

    fn clear(&mut self);

    /// Heap bytes held by the estimator.
    fn memory_used(&self) -> usize;
}

const TARGET_FALSE_POSITIVE_RATE: f64 = 0.01;

// Fixed seeds keep simulations reproducible across runs.
const SEEDS: [u64; 4] = [
    0x243f_6a88_85a3_08d3,
    0x1319_8a2e_0370_7344,
    0xa409_3822_299f_31d0,
    0x082e_fa98_ec4e_6c89,
];

/// Derives `num_hashes` slot indices from a single 64-bit hash
/// (Kirsch-Mitzenmacher double hashing).
#[derive(Debug, Clone)]
pub(crate) struct SlotHasher {
    state: RandomState,
    num_hashes: u32,
}

impl SlotHasher {
    pub(crate) fn new(num_hashes: u32) -> Self {
        Self {
            state: RandomState::with_seeds(SEEDS[0], SEEDS[1], SEEDS[2], SEEDS[3]),
            num_hashes,
        }
    }

    pub(crate) fn num_hashes(&self) -> u32 {
        self.num_hashes
    }

    pub(crate) fn slots<K: Hash + ?Sized>(
        &self,
        key: &K,
        num_slots: usize,
    ) -> impl Iterator<Item = usize> {
        let hash = BuildHasher::hash_one(&self.state, key);
        let h1 = hash & 0xffff_ffff;
        let h2 = (hash >> 32) | 1;
        let modulus = num_slots as u64;
        (0..u64::from(self.num_hashes))
            .map(move |i| (h1.wrapping_add(i.wrapping_mul(h2)) % modulus) as usize)
    }
}

/// Number of slots for `cardinality` keys at the target false-positive rate.
pub(crate) fn optimal_num_slots(cardinality: u32) -> usize {
    let n = f64::from(cardinality.max(1));
    let m = -n * TARGET_FALSE_POSITIVE_RATE.ln() / 2.0_f64.ln().powi(2);
    (m.ceil() as usize).max(1)
}

pub(crate) fn optimal_num_hashes(cardinality: u32, num_slots: usize) -> u32 {
    let n = f64::from(cardinality.max(1));
    let k = (num_slots as f64 / n) * 2.0_f64.ln();
    k.ceil().max(1.0) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizing_never_degenerates() {
        let slots = optimal_num_slots(0);
        assert!(slots >= 1);
        assert!(optimal_num_hashes(0, slots) >= 1);
    }

    #[test]
    fn sizing_grows_with_cardinality() {
        assert!(optimal_num_slots(10_000) > optimal_num_slots(100));
        // ~9.6 slots per key at 1%
        let slots = optimal_num_slots(1000);
        assert!((9_000..10_000).contains(&slots));
        assert_eq!(optimal_num_hashes(1000, slots), 7);
    }

    #[test]
    fn slots_are_in_range_and_stable() {
        let hasher = SlotHasher::new(5);
        let first: Vec<_> = hasher.slots(&42u64, 97).collect();
        let second: Vec<_> = hasher.slots(&42u64, 97).collect();
        assert_eq!(first.len(), 5);
        assert_eq!(first, second);
        assert!(first.iter().all(|&slot| slot < 97));
    }
}
