use std::fmt;
use std::hash::Hash;
use std::iter::{FusedIterator, Rev};

use lru::LruCache;
use serde::{Deserialize, Serialize};

use super::EvictionPolicy;
use crate::{Item, PolicyError, Result};

/// What an update event does to the recency order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnUpdate {
    /// Treat the update as a use and move the key to the most recent position.
    #[default]
    Promote,
    /// Leave the order untouched.
    Retain,
}

/// Least Recently Used eviction order.
///
/// Keys live in an unbounded `LruCache` with unit values; the cache never
/// evicts on its own; removal only happens through [`on_evict`](Self::on_evict)
/// and only at the least recently used end. Every event is O(1).
pub struct LruPolicy<K> {
    keys: LruCache<K, ()>,
    on_update: OnUpdate,
}

impl<K: Copy + Eq + Hash + fmt::Debug> fmt::Debug for LruPolicy<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LruPolicy")
            .field("len", &self.keys.len())
            .field("on_update", &self.on_update)
            .finish()
    }
}

impl<K: Copy + Eq + Hash> Default for LruPolicy<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Copy + Eq + Hash> LruPolicy<K> {
    pub fn new() -> Self {
        Self::with_on_update(OnUpdate::default())
    }

    pub fn with_on_update(on_update: OnUpdate) -> Self {
        Self {
            keys: LruCache::unbounded(),
            on_update,
        }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn contains(&self, key: &K) -> bool {
        self.keys.contains(key)
    }

    pub fn on_insert<V>(&mut self, item: &Item<K, V>) -> Result<()> {
        if self.keys.contains(&item.key) {
            return Err(PolicyError::AlreadyTracked.report());
        }
        self.keys.put(item.key, ());
        Ok(())
    }

    pub fn on_update<V>(&mut self, item: &Item<K, V>) -> Result<()> {
        self.ensure_tracked(&item.key)?;
        if self.on_update == OnUpdate::Promote {
            self.keys.promote(&item.key);
        }
        Ok(())
    }

    pub fn on_cache_hit<V>(&mut self, item: &Item<K, V>) -> Result<()> {
        self.ensure_tracked(&item.key)?;
        self.keys.promote(&item.key);
        Ok(())
    }

    /// Removes `key`, which must be the current eviction victim.
    pub fn on_evict(&mut self, key: &K) -> Result<()> {
        self.ensure_tracked(key)?;
        match self.keys.peek_lru() {
            Some((victim, _)) if victim == key => {
                self.keys.pop_lru();
                Ok(())
            }
            _ => Err(PolicyError::NotVictim.report()),
        }
    }

    /// Iterates tracked keys least recently used first.
    pub fn victims(&self) -> Victims<'_, K> {
        Victims {
            inner: self.keys.iter().rev(),
        }
    }

    fn ensure_tracked(&self, key: &K) -> Result<()> {
        if self.keys.contains(key) {
            Ok(())
        } else {
            Err(PolicyError::NotTracked.report())
        }
    }
}

/// Victim iterator returned by [`LruPolicy::victims`].
pub struct Victims<'a, K> {
    inner: Rev<lru::Iter<'a, K, ()>>,
}

impl<'a, K> Iterator for Victims<'a, K> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(key, _)| key)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K> ExactSizeIterator for Victims<'_, K> {}

impl<K> FusedIterator for Victims<'_, K> {}

impl<K: Copy + Eq + Hash> EvictionPolicy<K> for LruPolicy<K> {
    type Victims<'a> = Victims<'a, K> where K: 'a;

    fn on_insert<V>(&mut self, item: &Item<K, V>) -> Result<()> {
        LruPolicy::on_insert(self, item)
    }

    fn on_update<V>(&mut self, item: &Item<K, V>) -> Result<()> {
        LruPolicy::on_update(self, item)
    }

    fn on_cache_hit<V>(&mut self, item: &Item<K, V>) -> Result<()> {
        LruPolicy::on_cache_hit(self, item)
    }

    fn on_evict(&mut self, key: &K) -> Result<()> {
        LruPolicy::on_evict(self, key)
    }

    fn victims(&self) -> Self::Victims<'_> {
        LruPolicy::victims(self)
    }
}
