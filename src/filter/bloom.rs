use std::hash::Hash;
use std::mem;

use super::{optimal_num_hashes, optimal_num_slots, MembershipFilter, SlotHasher};

/// Bit-array Bloom filter, used as the admission doorkeeper.
#[derive(Debug, Clone)]
pub struct BloomFilter {
    bits: Vec<u64>,
    num_bits: usize,
    hasher: SlotHasher,
}

impl BloomFilter {
    pub fn new(cardinality: u32) -> Self {
        let num_bits = optimal_num_slots(cardinality);
        let num_hashes = optimal_num_hashes(cardinality, num_bits);
        let num_words = (num_bits + 63) / 64;
        Self {
            bits: vec![0; num_words],
            num_bits,
            hasher: SlotHasher::new(num_hashes),
        }
    }

    pub fn num_bits(&self) -> usize {
        self.num_bits
    }

    pub fn num_hashes(&self) -> u32 {
        self.hasher.num_hashes()
    }
}

impl<K: Hash + ?Sized> MembershipFilter<K> for BloomFilter {
    fn with_cardinality(cardinality: u32) -> Self {
        Self::new(cardinality)
    }

    fn add(&mut self, key: &K) {
        for bit in self.hasher.slots(key, self.num_bits) {
            self.bits[bit / 64] |= 1u64 << (bit % 64);
        }
    }

    fn maybe_contains(&self, key: &K) -> bool {
        self.hasher
            .slots(key, self.num_bits)
            .all(|bit| self.bits[bit / 64] & (1u64 << (bit % 64)) != 0)
    }

    fn clear(&mut self) {
        self.bits.fill(0);
    }

    fn memory_used(&self) -> usize {
        self.bits.capacity() * mem::size_of::<u64>()
    }
}
