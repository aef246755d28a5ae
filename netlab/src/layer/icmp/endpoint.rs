use core::cmp;
use core::fmt;

use crate::layer::{arp, ip, Error, Result};
use crate::nic::Device;
use crate::storage::Buffer;
use crate::wire::{self, icmpv4_packet, ipv4_packet, IpProtocol, Icmpv4DstUnreachable, Icmpv4Repr};
use crate::wire::{Ipv4Address, Ipv4Repr};
use crate::wire::icmpv4::{HEADER_LEN, QUOTED_PAYLOAD_LEN};

use super::Inbound;

/// An icmp traffic handler.
#[derive(Debug, Default)]
pub struct Endpoint {
    /// Drops echo requests if enabled.
    deny_echo: bool,
}

/// An icmp sender, chaining onto an ip sender.
pub struct Sender<'a, D> {
    ip: ip::Sender<'a, D>,
}

impl Endpoint {
    /// Create an endpoint answering echo requests.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether echo requests are dropped instead of answered.
    pub fn silent(&mut self, silent: bool) {
        self.deny_echo = silent;
    }

    pub fn is_silent(&self) -> bool {
        self.deny_echo
    }

    /// Validate an inbound message whose ip header was already stripped.
    pub fn datagram_in(&self, buffer: &Buffer, ip_repr: &Ipv4Repr) -> wire::Result<Inbound> {
        let packet = icmpv4_packet::new_checked(buffer.as_slice())?;
        let repr = Icmpv4Repr::parse(packet)?;
        net_trace!("icmp: {} from {}", repr, ip_repr.src_addr);

        match repr {
            Icmpv4Repr::EchoRequest { .. } if !self.deny_echo => Ok(Inbound::EchoRequest { repr }),
            _ => Ok(Inbound::Ignored),
        }
    }
}

impl<'a, D: Device> Sender<'a, D> {
    pub fn new(ip: ip::Sender<'a, D>) -> Self {
        Sender { ip }
    }

    /// Report an undeliverable datagram to its sender.
    ///
    /// `original` is the complete datagram as it was received, starting with its ip header. Only
    /// the header and the first 8 bytes of its payload are quoted.
    pub fn unreachable(
        &mut self,
        original: &[u8],
        dst_addr: Ipv4Address,
        reason: Icmpv4DstUnreachable,
    ) -> Result<arp::Outcome> {
        let header_len = usize::from(ipv4_packet::new_checked(original)?.header_len());
        let quoted = cmp::min(original.len(), header_len + QUOTED_PAYLOAD_LEN);

        let repr = Icmpv4Repr::DstUnreachable {
            reason,
            payload: quoted,
        };

        let mut buffer = Buffer::from_slice(&original[..quoted]);
        buffer.add_header(HEADER_LEN)?;
        repr.emit(icmpv4_packet::new_unchecked_mut(buffer.as_mut_slice()));
        net_debug!("icmp: {} to {}", repr, dst_addr);

        self.ip.datagram_out(buffer, dst_addr, IpProtocol::Icmp)
    }

    /// Answer an echo request.
    ///
    /// The buffer holds the complete request message, its header is rewritten in place so that
    /// the reply carries the data of the request.
    pub fn echo_reply(
        &mut self,
        mut buffer: Buffer,
        dst_addr: Ipv4Address,
        request: Icmpv4Repr,
    ) -> Result<arp::Outcome> {
        let repr = request.echo_reply().ok_or(Error::Illegal)?;
        if buffer.len() != repr.buffer_len() {
            return Err(Error::BadSize);
        }

        repr.emit(icmpv4_packet::new_unchecked_mut(buffer.as_mut_slice()));
        net_trace!("icmp: {} to {}", repr, dst_addr);

        self.ip.datagram_out(buffer, dst_addr, IpProtocol::Icmp)
    }
}

impl<D> fmt::Debug for Sender<'_, D> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Sender")
            .field("ip", &self.ip)
            .finish()
    }
}
