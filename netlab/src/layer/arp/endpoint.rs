use core::fmt;

use crate::layer::{eth, Error, Result};
use crate::managed::Full;
use crate::nic::Device;
use crate::storage::Buffer;
use crate::time::Instant;
use crate::wire::{arp_packet, ArpOperation, ArpRepr};
use crate::wire::{EthernetAddress, EthernetProtocol, Ipv4Address};
use crate::wire::ethernet::MIN_PAYLOAD_LEN;

use super::{NeighborCache, Outcome, PendingQueue};

/// An arp traffic handler.
///
/// Owns the neighbor cache and the queue of packets waiting for resolution.
#[derive(Debug)]
pub struct Endpoint {
    /// The protocol address we answer requests for.
    protocol_addr: Ipv4Address,

    neighbors: NeighborCache,

    pending: PendingQueue,
}

/// An arp endpoint borrowed for sending and receiving at one point in time.
pub struct Sender<'a, D> {
    endpoint: &'a mut Endpoint,

    eth: eth::Sender<'a, D>,

    now: Instant,
}

impl Endpoint {
    pub fn new(protocol_addr: Ipv4Address, neighbors: NeighborCache, pending: PendingQueue) -> Self {
        Endpoint {
            protocol_addr,
            neighbors,
            pending,
        }
    }

    pub fn protocol_addr(&self) -> Ipv4Address {
        self.protocol_addr
    }

    pub fn neighbors(&self) -> &NeighborCache {
        &self.neighbors
    }

    /// Access the cache, for example to add static entries.
    pub fn neighbors_mut(&mut self) -> &mut NeighborCache {
        &mut self.neighbors
    }

    pub fn pending(&self) -> &PendingQueue {
        &self.pending
    }

    /// Drop expired neighbors and the packets whose resolution timed out.
    pub fn purge(&mut self, now: Instant) {
        self.neighbors.purge(now);
        self.pending.purge(now);
    }

    /// Borrow the endpoint for processing at `now`, sending through an ethernet sender.
    pub fn sender<'a, D: Device>(&'a mut self, eth: eth::Sender<'a, D>, now: Instant) -> Sender<'a, D> {
        Sender {
            endpoint: self,
            eth,
            now,
        }
    }
}

/// Dumps the neighbor table.
impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(&self.neighbors, f)
    }
}

impl<D> fmt::Debug for Sender<'_, D> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Sender")
            .field("endpoint", &self.endpoint)
            .field("now", &self.now)
            .finish()
    }
}

impl<D: Device> Sender<'_, D> {
    /// The protocol address of this host.
    pub fn protocol_addr(&self) -> Ipv4Address {
        self.endpoint.protocol_addr
    }

    /// Send an IPv4 datagram to a neighbor, resolving its hardware address first if necessary.
    ///
    /// With a live cache entry the frame is transmitted directly. Otherwise the datagram is held
    /// and a request is broadcast, unless a datagram for the same address is already held. In
    /// that case the new one is discarded.
    pub fn resolve_and_send(&mut self, buffer: Buffer, target: Ipv4Address) -> Result<Outcome> {
        if let Some(hardware_addr) = self.endpoint.neighbors.lookup(target, self.now) {
            self.eth.frame_out(buffer, hardware_addr, EthernetProtocol::Ipv4)?;
            return Ok(Outcome::Sent);
        }

        if self.endpoint.pending.is_pending(target, self.now) {
            net_debug!("arp: {} is still being resolved, dropping {} bytes", target, buffer.len());
            return Ok(Outcome::Dropped);
        }

        if let Err(Full(_)) = self.endpoint.pending.insert(target, buffer, self.now) {
            net_debug!("arp: pending queue full, dropping packet for {}", target);
            return Err(Error::Exhausted);
        }

        self.request(target)?;
        Ok(Outcome::Queued)
    }

    /// Broadcast a request for the hardware address of `target`.
    pub fn request(&mut self, target: Ipv4Address) -> Result<()> {
        let repr = ArpRepr {
            operation: ArpOperation::Request,
            source_hardware_addr: self.eth.src_addr(),
            source_protocol_addr: self.endpoint.protocol_addr,
            target_hardware_addr: EthernetAddress([0; 6]),
            target_protocol_addr: target,
        };

        net_trace!("arp: who has {}", target);
        self.send(repr, EthernetAddress::BROADCAST)
    }

    /// Answer a request of `target` by unicast.
    pub fn reply(&mut self, target: Ipv4Address, target_hardware_addr: EthernetAddress) -> Result<()> {
        let repr = ArpRepr {
            operation: ArpOperation::Reply,
            source_hardware_addr: self.eth.src_addr(),
            source_protocol_addr: self.endpoint.protocol_addr,
            target_hardware_addr,
            target_protocol_addr: target,
        };

        net_trace!("arp: telling {} at {}", target, target_hardware_addr);
        self.send(repr, target_hardware_addr)
    }

    /// Request our own address, announcing it to the link.
    pub fn announce(&mut self) -> Result<()> {
        let own = self.endpoint.protocol_addr;
        self.request(own)
    }

    /// Process an inbound arp packet, the payload of a frame from `src_addr`.
    ///
    /// Malformed packets are dropped. Every valid packet refreshes the cache entry of its sender.
    /// A reply releases the datagram waiting for its sender, a request for our own address is
    /// answered. See [RFC826] for details.
    ///
    /// [RFC826]: https://tools.ietf.org/html/rfc826
    pub fn handle_inbound(&mut self, packet: &[u8], src_addr: EthernetAddress) -> Result<()> {
        let repr = match arp_packet::new_checked(packet).and_then(ArpRepr::parse) {
            Ok(repr) => repr,
            Err(err) => {
                net_trace!("arp: dropped packet from {}: {}", src_addr, err);
                return Ok(());
            },
        };

        net_trace!("arp: {}", repr);
        let sender_ip = repr.source_protocol_addr;
        let sender_mac = repr.source_hardware_addr;

        if self.endpoint.neighbors.fill(sender_ip, sender_mac, Some(self.now)).is_err() {
            net_debug!("arp: neighbor cache full, not caching {}", sender_ip);
        }

        match repr.operation {
            ArpOperation::Reply => {
                if let Some(buffer) = self.endpoint.pending.take(sender_ip, self.now) {
                    net_trace!("arp: releasing packet for {}", sender_ip);
                    self.eth.frame_out(buffer, sender_mac, EthernetProtocol::Ipv4)?;
                }
            },
            ArpOperation::Request if repr.target_protocol_addr == self.endpoint.protocol_addr => {
                self.reply(sender_ip, sender_mac)?;
            },
            _ => (),
        }

        Ok(())
    }

    fn send(&mut self, repr: ArpRepr, dst_addr: EthernetAddress) -> Result<()> {
        let mut buffer = Buffer::with_capacity(MIN_PAYLOAD_LEN);
        buffer.set_len(repr.buffer_len())?;
        repr.emit(arp_packet::new_unchecked_mut(buffer.as_mut_slice()));
        self.eth.frame_out(buffer, dst_addr, EthernetProtocol::Arp)
    }
}
