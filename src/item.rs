/// An entry as stored by the host cache.
///
/// Policies only ever read `key`. Keys are expected to be cheap handles
/// (integers, arena indices) so that policies can keep copies of them
/// without owning any of the cached data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item<K, V> {
    pub key: K,
    pub value: V,
    /// Bytes accounted for this entry by the host.
    pub size: u64,
}

impl<K, V> Item<K, V> {
    pub fn new(key: K, value: V, size: u64) -> Self {
        Self { key, value, size }
    }
}
