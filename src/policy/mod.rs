use crate::{Item, Result};

mod lru_policy;
mod tinylfu_policy;
pub use lru_policy::{LruPolicy, OnUpdate, Victims};
pub use tinylfu_policy::TinyLfuPolicy;

// Decides which tracked entry the host should sacrifice next.
pub trait EvictionPolicy<K> {
    type Victims<'a>: Iterator<Item = &'a K>
    where
        Self: 'a,
        K: 'a;

    fn on_insert<V>(&mut self, item: &Item<K, V>) -> Result<()>;
    fn on_update<V>(&mut self, item: &Item<K, V>) -> Result<()>;
    fn on_cache_hit<V>(&mut self, item: &Item<K, V>) -> Result<()>;
    fn on_evict(&mut self, key: &K) -> Result<()>;

    /// Tracked keys in the order they should be evicted. Does not mutate.
    fn victims(&self) -> Self::Victims<'_>;
}

// Decides whether a key is worth a slot in the host cache.
pub trait InsertionPolicy<K> {
    fn on_cache_hit<V>(&mut self, item: &Item<K, V>);
    fn on_cache_miss(&mut self, key: &K);
    fn should_add(&self, key: &K) -> bool;
    fn should_replace(&self, victim: &K, candidate: &K) -> bool;
    fn reserve(&mut self, cardinality: u32);
    fn memory_used(&self) -> usize;
}
