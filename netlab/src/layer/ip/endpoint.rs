use core::fmt;

use crate::layer::{arp, dispatch, Error, Result};
use crate::nic::Device;
use crate::storage::Buffer;
use crate::wire::{self, ipv4_packet, EthernetAddress, IpProtocol, Ipv4Address, Ipv4Repr};
use crate::wire::ipv4::HEADER_LEN;

use super::{Inbound, Upper};

/// The state of the IPv4 layer of one interface.
#[derive(Debug)]
pub struct Endpoint {
    /// The single address of this host.
    addr: Ipv4Address,

    /// The largest datagram, header included, that is sent unfragmented.
    mtu: usize,

    /// The time to live of emitted datagrams.
    hop_limit: u8,

    /// The identification of the next outbound datagram.
    next_ident: u16,

    /// Maps the protocol of incoming datagrams to the layer handling their payload.
    protocols: dispatch::Table<IpProtocol, Upper>,
}

/// An ip endpoint for sending, chaining onto an arp sender.
pub struct Sender<'a, D> {
    endpoint: &'a mut Endpoint,

    arp: arp::Sender<'a, D>,
}

impl Endpoint {
    pub fn new(addr: Ipv4Address, mtu: usize, hop_limit: u8) -> Self {
        Endpoint {
            addr,
            mtu,
            hop_limit,
            next_ident: 0,
            protocols: dispatch::Table::new(),
        }
    }

    pub fn addr(&self) -> Ipv4Address {
        self.addr
    }

    pub fn mtu(&self) -> usize {
        self.mtu
    }

    /// The identification the next outbound datagram will carry.
    pub fn next_ident(&self) -> u16 {
        self.next_ident
    }

    /// Dispatch the payload of datagrams with the given protocol to a layer.
    pub fn register(&mut self, protocol: IpProtocol, upper: Upper) -> Result<()> {
        self.protocols.register(protocol, upper)
    }

    pub fn unregister(&mut self, protocol: IpProtocol) -> Option<Upper> {
        self.protocols.unregister(protocol)
    }

    /// Validate an inbound datagram, the payload of a frame from `src_addr`.
    ///
    /// Returns an error for malformed datagrams, which are to be dropped silently. Link layer
    /// padding behind the declared total length is removed from the buffer.
    pub fn datagram_in(&self, buffer: &mut Buffer, src_addr: EthernetAddress)
        -> wire::Result<Inbound>
    {
        let packet = ipv4_packet::new_unchecked(buffer.as_slice());
        let repr = Ipv4Repr::parse(packet)?;
        let header_len = usize::from(packet.header_len());
        let total_len = usize::from(packet.total_len());

        if repr.dst_addr != self.addr {
            net_trace!("ip: ignoring datagram for {} from {}", repr.dst_addr, src_addr);
            return Ok(Inbound::Ignored);
        }

        buffer.truncate(total_len);

        let upper = match self.protocols.get(repr.protocol) {
            Some(upper) => *upper,
            None => return Ok(Inbound::Unreachable { repr }),
        };

        buffer.remove_header(header_len)
            .map_err(|_| wire::Error::Truncated)?;
        Ok(Inbound::Deliver { repr, header_len, upper })
    }

    /// Borrow the endpoint for sending datagrams through arp.
    pub fn sender<'a, D: Device>(&'a mut self, arp: arp::Sender<'a, D>) -> Sender<'a, D> {
        Sender {
            endpoint: self,
            arp,
        }
    }
}

impl<D> fmt::Debug for Sender<'_, D> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Sender")
            .field("endpoint", &self.endpoint)
            .field("arp", &self.arp)
            .finish()
    }
}

impl<D: Device> Sender<'_, D> {
    /// The source address of all sent datagrams.
    pub fn src_addr(&self) -> Ipv4Address {
        self.endpoint.addr
    }

    /// Prepend an IPv4 header to a single fragment and hand it to arp.
    ///
    /// `frag_offset` is the byte offset of the payload in the original datagram and must be a
    /// multiple of 8.
    pub fn fragment_out(
        &mut self,
        mut buffer: Buffer,
        dst_addr: Ipv4Address,
        protocol: IpProtocol,
        ident: u16,
        frag_offset: u16,
        more_frags: bool,
    ) -> Result<arp::Outcome> {
        if frag_offset % 8 != 0 {
            return Err(Error::Illegal);
        }

        if buffer.len() > usize::from(u16::max_value()) - HEADER_LEN {
            return Err(Error::BadSize);
        }

        let repr = Ipv4Repr {
            src_addr: self.endpoint.addr,
            dst_addr,
            protocol,
            payload_len: buffer.len(),
            hop_limit: self.endpoint.hop_limit,
            ident,
            more_frags,
            frag_offset,
        };

        let header = buffer.add_header(repr.buffer_len())?;
        repr.emit(ipv4_packet::new_unchecked_mut(header));
        net_trace!("ip: send {}", repr);

        self.arp.resolve_and_send(buffer, dst_addr)
    }

    /// Send a datagram, fragmenting it when it does not fit into the mtu.
    ///
    /// All fragments share a new identification. Each fragment is resolved on its own, so for an
    /// unresolved destination only the first fragment is held. Returns the outcome of the first
    /// fragment.
    pub fn datagram_out(
        &mut self,
        buffer: Buffer,
        dst_addr: Ipv4Address,
        protocol: IpProtocol,
    ) -> Result<arp::Outcome> {
        let max_payload = self.endpoint.mtu.saturating_sub(HEADER_LEN);
        if buffer.len() > usize::from(u16::max_value()) - HEADER_LEN {
            return Err(Error::BadSize);
        }

        let ident = self.endpoint.next_ident;
        self.endpoint.next_ident = ident.wrapping_add(1);

        if buffer.len() <= max_payload {
            return self.fragment_out(buffer, dst_addr, protocol, ident, 0, false);
        }

        // Offsets are counted in units of 8 bytes.
        let chunk = max_payload & !7;
        if chunk == 0 {
            return Err(Error::Illegal);
        }

        let payload = buffer.as_slice();
        let mut offset = 0;
        let mut first = None;
        while payload.len() - offset > chunk {
            let fragment = Buffer::from_slice(&payload[offset..offset + chunk]);
            let outcome = self.fragment_out(fragment, dst_addr, protocol, ident, offset as u16, true)?;
            first.get_or_insert(outcome);
            offset += chunk;
        }

        let fragment = Buffer::from_slice(&payload[offset..]);
        let last = self.fragment_out(fragment, dst_addr, protocol, ident, offset as u16, false)?;
        Ok(first.unwrap_or(last))
    }
}
