//! Eviction and admission policies for in-memory caches.
//!
//! The policies never own cache entries. The host cache forwards its
//! lifecycle events (insert, update, hit, miss, evict) and asks two
//! questions back: who should be evicted next ([`LruPolicy::victims`]) and
//! whether a key deserves a slot at all ([`TinyLfuPolicy::should_add`],
//! [`TinyLfuPolicy::should_replace`]).

pub mod error;
pub mod filter;
pub mod item;
pub mod policy;

pub use error::{PolicyError, Result};
pub use filter::{BloomFilter, CountingBloomFilter, FrequencyEstimator, MembershipFilter};
pub use item::Item;
pub use policy::{EvictionPolicy, InsertionPolicy, LruPolicy, OnUpdate, TinyLfuPolicy};
