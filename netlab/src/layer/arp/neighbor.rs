// Heads up! Before working on this file you should read, at least,
// the parts of RFC 1122 that discuss ARP.
use core::fmt;

use crate::managed::{Full, Map};
use crate::time::{Duration, Expiration, Instant};
use crate::wire::{EthernetAddress, Ipv4Address};

/// A cached neighbor.
///
/// A neighbor mapping translates from a protocol address to a hardware address, and contains the
/// timestamp past which the mapping should be considered invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Neighbor {
    pub hardware_addr: EthernetAddress,
    pub expires_at:    Expiration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// There as no space to add the entry.
    ///
    /// The cache has no capacity at all, or all other entries do never expire.
    NoSpace,
}

/// A neighbor cache backed by a map.
///
/// Expired entries are not swept, a lookup of an expired entry is a miss and the entry is
/// replaced by the next fill of any address while the cache is full.
#[derive(Debug, Clone)]
pub struct Cache {
    storage: Map<Ipv4Address, Neighbor>,
    lifetime: Duration,
}

impl Cache {
    /// Default neighbor entry lifetime.
    pub const ENTRY_LIFETIME: Duration = Duration::from_secs(5 * 60);

    /// Create an empty cache for at most `capacity` neighbors.
    pub fn new(capacity: usize, lifetime: Duration) -> Self {
        Cache {
            storage: Map::with_limit(capacity),
            lifetime,
        }
    }

    /// The lifetime of an entry since it was last filled.
    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    /// Add or refresh an entry containing a MAC address.
    ///
    /// Provide the current timestamp or `None` to disable expiration. Refreshing an existing
    /// entry replaces its address and restarts its lifetime. When the cache is full the entry
    /// that expires first is evicted, if it expires before the new one.
    pub fn fill(
        &mut self,
        protocol_addr: Ipv4Address,
        hardware_addr: EthernetAddress,
        timestamp: Option<Instant>,
    ) -> Result<(), Error> {
        let neighbor = Neighbor {
            hardware_addr,
            expires_at: timestamp.map(|ts| ts + self.lifetime).into(),
        };

        let neighbor = match self.storage.insert(protocol_addr, neighbor) {
            Ok(_) => return Ok(()),
            Err(Full(neighbor)) => neighbor,
        };

        let oldest = self.storage.iter()
            .min_by_key(|(_, entry)| entry.expires_at)
            .map(|(addr, entry)| (*addr, entry.expires_at));

        match oldest {
            Some((addr, expires_at)) if expires_at < neighbor.expires_at => {
                net_debug!("arp: evicting neighbor {} for {}", addr, protocol_addr);
                self.storage.remove(&addr);
                self.storage.insert(protocol_addr, neighbor)
                    .map(drop)
                    .map_err(|_| Error::NoSpace)
            },
            _ => Err(Error::NoSpace),
        }
    }

    /// Lookup the hardware address of a neighbor.
    ///
    /// The broadcast address always resolves. Expired entries are treated as missing.
    pub fn lookup(&self, protocol_addr: Ipv4Address, timestamp: Instant) -> Option<EthernetAddress> {
        if protocol_addr.is_broadcast() {
            return Some(EthernetAddress::BROADCAST);
        }

        match self.storage.get(&protocol_addr) {
            Some(neighbor) if !neighbor.expires_at.has_passed(timestamp) => Some(neighbor.hardware_addr),
            _ => None,
        }
    }

    /// Get the raw entry of a neighbor, regardless of its expiry.
    pub fn entry(&self, protocol_addr: Ipv4Address) -> Option<&Neighbor> {
        self.storage.get(&protocol_addr)
    }

    /// Remove all entries that have expired.
    pub fn purge(&mut self, timestamp: Instant) {
        self.storage.retain(|_, neighbor| !neighbor.expires_at.has_passed(timestamp))
    }

    /// Iterate over all entries in address order, including expired ones.
    pub fn iter(&self) -> impl Iterator<Item = (Ipv4Address, &Neighbor)> + '_ {
        self.storage.iter().map(|(addr, neighbor)| (*addr, neighbor))
    }

    /// Number of entries, including expired ones.
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }
}

/// Dumps the table, one `ip | mac | expiry` line per entry.
impl fmt::Display for Cache {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "===ARP TABLE BEGIN===")?;
        for (addr, neighbor) in self.iter() {
            writeln!(f, "{} | {} | {}", addr, neighbor.hardware_addr, neighbor.expires_at)?;
        }
        writeln!(f, "===ARP TABLE  END ===")
    }
}
