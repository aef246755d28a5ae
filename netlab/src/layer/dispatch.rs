//! Protocol number dispatch.
//!
//! Each layer that demultiplexes its payload keeps a [`Table`] from the protocol number found in
//! its header (ethertype, IP protocol, UDP port) to the handler of that payload. Registration is
//! append or overwrite; only UDP ports are ever unregistered at runtime.
//!
//! [`Table`]: struct.Table.html
use crate::managed::{Full, Map};
use super::{Error, Result};

/// A table mapping protocol numbers to their handlers.
#[derive(Clone, Debug)]
pub struct Table<K: Ord, H> {
    handlers: Map<K, H>,
}

impl<K: Ord + Copy, H> Table<K, H> {
    /// An empty table without a limit.
    pub fn new() -> Self {
        Table { handlers: Map::new() }
    }

    /// An empty table holding at most `capacity` handlers.
    pub fn with_capacity(capacity: usize) -> Self {
        Table { handlers: Map::with_limit(capacity) }
    }

    /// Register a handler, silently replacing a previous one for the same key.
    ///
    /// Fails with `Error::Exhausted` if the key is new and the table is full.
    pub fn register(&mut self, key: K, handler: H) -> Result<()> {
        match self.handlers.insert(key, handler) {
            Ok(_) => Ok(()),
            Err(Full(_)) => Err(Error::Exhausted),
        }
    }

    /// Remove and return the handler of a key.
    pub fn unregister(&mut self, key: K) -> Option<H> {
        self.handlers.remove(&key)
    }

    pub fn get(&self, key: K) -> Option<&H> {
        self.handlers.get(&key)
    }

    pub fn get_mut(&mut self, key: K) -> Option<&mut H> {
        self.handlers.get_mut(&key)
    }

    pub fn is_registered(&self, key: K) -> bool {
        self.handlers.contains_key(&key)
    }

    /// Iterate over all registered keys in ascending order.
    pub fn keys<'a>(&'a self) -> impl Iterator<Item=K> + 'a {
        self.handlers.iter().map(|(key, _)| *key)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl<K: Ord + Copy, H> Default for Table<K, H> {
    fn default() -> Self {
        Table::new()
    }
}
