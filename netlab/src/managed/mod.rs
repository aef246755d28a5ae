//! Containers backing the stack's tables.
//!
//! The tables of the stack (neighbor cache, pending queue, dispatch tables) all share the same
//! shape: a small ordered map with a fixed upper bound on its entries. Expiry is not part of the
//! container, the owner stores a deadline next to each value and checks it on lookup.
mod map;

pub use self::map::{Full, Map};
