use crate::managed::{Full, Map};
use crate::storage::Buffer;
use crate::time::{Duration, Expiration, Instant};
use crate::wire::Ipv4Address;

/// A packet waiting for its destination to be resolved.
#[derive(Debug, Clone)]
pub struct Pending {
    pub buffer: Buffer,

    /// Past this deadline the packet is discarded and a new request may be sent.
    pub expires_at: Expiration,
}

/// The queue of packets awaiting resolution, at most one per destination.
///
/// An entry lives for the minimum resend interval. While it lives, further packets to the same
/// destination are rejected and no new request is sent for it. A reply that arrives after the
/// entry expired no longer releases the packet.
#[derive(Debug, Clone)]
pub struct Queue {
    storage: Map<Ipv4Address, Pending>,
    interval: Duration,
}

impl Queue {
    /// Default minimum resend interval.
    pub const MIN_INTERVAL: Duration = Duration::from_secs(1);

    /// Create an empty queue for at most `capacity` destinations.
    pub fn new(capacity: usize, interval: Duration) -> Self {
        Queue {
            storage: Map::with_limit(capacity),
            interval,
        }
    }

    /// Check if a live packet is waiting for the address.
    pub fn is_pending(&self, protocol_addr: Ipv4Address, timestamp: Instant) -> bool {
        match self.storage.get(&protocol_addr) {
            Some(pending) => !pending.expires_at.has_passed(timestamp),
            None => false,
        }
    }

    /// Hold a packet for an address, replacing an expired entry.
    ///
    /// Expired entries of other addresses are purged when the queue is full. If that does not free
    /// any space the buffer is returned.
    pub fn insert(
        &mut self,
        protocol_addr: Ipv4Address,
        buffer: Buffer,
        timestamp: Instant,
    ) -> Result<(), Full<Buffer>> {
        let pending = Pending {
            buffer,
            expires_at: Expiration::after(timestamp, self.interval),
        };

        let pending = match self.storage.insert(protocol_addr, pending) {
            Ok(_) => return Ok(()),
            Err(Full(pending)) => pending,
        };

        self.purge(timestamp);
        self.storage.insert(protocol_addr, pending)
            .map(drop)
            .map_err(|Full(pending)| Full(pending.buffer))
    }

    /// Take the packet waiting for an address.
    ///
    /// An expired entry is removed but not returned.
    pub fn take(&mut self, protocol_addr: Ipv4Address, timestamp: Instant) -> Option<Buffer> {
        let pending = self.storage.remove(&protocol_addr)?;
        if pending.expires_at.has_passed(timestamp) {
            net_debug!("arp: discarding expired packet for {}", protocol_addr);
            return None;
        }

        Some(pending.buffer)
    }

    /// Remove all expired entries.
    pub fn purge(&mut self, timestamp: Instant) {
        self.storage.retain(|_, pending| !pending.expires_at.has_passed(timestamp))
    }

    /// Number of entries, including expired ones.
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const IP_1: Ipv4Address = Ipv4Address::new(10, 0, 0, 1);
    const IP_2: Ipv4Address = Ipv4Address::new(10, 0, 0, 2);

    fn queue(capacity: usize) -> Queue {
        Queue::new(capacity, Duration::from_millis(1_000))
    }

    #[test]
    fn hold_and_take() {
        let mut queue = queue(4);
        queue.insert(IP_1, Buffer::from_slice(&[1, 2]), Instant::from_millis(0)).unwrap();

        assert!(queue.is_pending(IP_1, Instant::from_millis(999)));
        assert!(!queue.is_pending(IP_2, Instant::from_millis(0)));
        let buffer = queue.take(IP_1, Instant::from_millis(500)).unwrap();
        assert_eq!(buffer.as_slice(), &[1, 2]);
        assert!(queue.is_empty());
    }

    #[test]
    fn expired_entry_is_not_released() {
        let mut queue = queue(4);
        queue.insert(IP_1, Buffer::from_slice(&[1]), Instant::from_millis(0)).unwrap();
        assert!(!queue.is_pending(IP_1, Instant::from_millis(1_000)));
        assert_eq!(queue.take(IP_1, Instant::from_millis(1_000)), None);
        assert_eq!(queue.len(), 0);
    }

    #[test]
    fn full_queue_purges_expired() {
        let mut queue = queue(1);
        queue.insert(IP_1, Buffer::from_slice(&[1]), Instant::from_millis(0)).unwrap();

        let rejected = queue.insert(IP_2, Buffer::from_slice(&[2]), Instant::from_millis(10));
        assert_eq!(rejected.map_err(|Full(buffer)| buffer.as_slice().to_vec()), Err(vec![2]));

        queue.insert(IP_2, Buffer::from_slice(&[3]), Instant::from_millis(2_000)).unwrap();
        assert!(queue.is_pending(IP_2, Instant::from_millis(2_000)));
        assert!(!queue.is_pending(IP_1, Instant::from_millis(0)));
    }
}
