use alloc::collections::btree_map::{self, BTreeMap};

/// An ordered map with an optional limit on its number of entries.
///
/// Inserting a new key into a map at its limit fails with `Full` and hands the value back.
/// Replacing the value of an existing key always succeeds.
#[derive(Clone, Debug)]
pub struct Map<K: Ord, V> {
    inner: BTreeMap<K, V>,
    limit: Option<usize>,
}

/// The map was at its limit, contains the rejected value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Full<V>(pub V);

impl<K: Ord, V> Map<K, V> {
    /// Create a map without a limit.
    pub fn new() -> Self {
        Map { inner: BTreeMap::new(), limit: None }
    }

    /// Create a map holding at most `limit` entries.
    pub fn with_limit(limit: usize) -> Self {
        Map { inner: BTreeMap::new(), limit: Some(limit) }
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Whether another new key would be rejected.
    pub fn is_full(&self) -> bool {
        match self.limit {
            Some(limit) => self.inner.len() >= limit,
            None => false,
        }
    }

    /// Insert or replace a value, returning the previous value of the key.
    pub fn insert(&mut self, key: K, value: V) -> Result<Option<V>, Full<V>> {
        if !self.inner.contains_key(&key) && self.is_full() {
            return Err(Full(value));
        }

        Ok(self.inner.insert(key, value))
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.inner.get(key)
    }

    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        self.inner.get_mut(key)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.inner.contains_key(key)
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.inner.remove(key)
    }

    /// Keep only the entries for which the predicate holds.
    pub fn retain<F>(&mut self, mut keep: F)
        where F: FnMut(&K, &V) -> bool,
    {
        self.inner.retain(|key, value| keep(key, value))
    }

    pub fn iter(&self) -> btree_map::Iter<K, V> {
        self.inner.iter()
    }
}

impl<K: Ord, V> Default for Map<K, V> {
    fn default() -> Self {
        Map::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_rejects_new_keys_only() {
        let mut map = Map::with_limit(2);
        assert_eq!(map.insert(1u8, 'a'), Ok(None));
        assert_eq!(map.insert(2u8, 'b'), Ok(None));
        assert!(map.is_full());
        assert_eq!(map.insert(3u8, 'c'), Err(Full('c')));
        assert_eq!(map.insert(1u8, 'd'), Ok(Some('a')));
        assert_eq!(map.get(&1), Some(&'d'));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn remove_and_retain() {
        let mut map = Map::new();
        for key in 0u16..10 {
            map.insert(key, key * 2).unwrap();
        }
        assert_eq!(map.remove(&3), Some(6));
        assert_eq!(map.remove(&3), None);
        map.retain(|key, _| key % 2 == 0);
        assert_eq!(map.iter().map(|(key, _)| *key).collect::<alloc::vec::Vec<_>>(), [0, 2, 4, 6, 8]);
        assert!(!map.is_full());
    }
}
