//! The address resolution layer.
//!
//! As noted in RFC 826, arp assumes that at least the mapping and identities of the own host are
//! fully known to the resolver. Furthermore, we are expected to only keep a very small cache of
//! immediate communication hosts.
//!
//! Resolution state is implicit in the pair of the neighbor [`Cache`] and the pending [`Queue`]:
//! an address is resolved when the cache holds a live entry for it, and is being resolved while a
//! packet for it waits in the queue. At most one packet waits per address, see [`Outcome`].
//!
//! [`Cache`]: struct.NeighborCache.html
//! [`Queue`]: struct.PendingQueue.html
//! [`Outcome`]: enum.Outcome.html
mod endpoint;
mod neighbor;
mod pending;

pub use endpoint::{
    Endpoint,
    Sender,
};

pub use neighbor::{
    Cache as NeighborCache,
    Error as NeighborError,
    Neighbor,
};

pub use pending::{
    Pending,
    Queue as PendingQueue,
};

/// What happened to a packet handed to arp for sending.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// The destination was resolved and the frame transmitted.
    Sent,

    /// The packet is held until the destination answers the request that was sent for it.
    Queued,

    /// Another packet already waits for the same destination, this one was discarded.
    Dropped,
}
