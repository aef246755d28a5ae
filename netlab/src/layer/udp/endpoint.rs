use alloc::boxed::Box;
use core::fmt;

use crate::layer::{arp, dispatch, ip, Error, Result};
use crate::nic::Device;
use crate::storage::Buffer;
use crate::wire::{self, udp_packet, IpProtocol, Ipv4Address, Ipv4Repr, UdpRepr};
use crate::wire::udp::HEADER_LEN;

use super::{Inbound, Packet, Recv};

/// The port table of one interface.
pub struct Endpoint {
    ports: dispatch::Table<u16, Box<dyn Recv>>,
}

/// A UDP sender, chaining onto an ip sender.
pub struct Sender<'a, D> {
    ip: ip::Sender<'a, D>,
}

impl Endpoint {
    /// Create an endpoint with room for `capacity` open ports.
    pub fn new(capacity: usize) -> Self {
        Endpoint {
            ports: dispatch::Table::with_capacity(capacity),
        }
    }

    /// Register the handler of a port, replacing a previous one.
    pub fn open(&mut self, port: u16, handler: Box<dyn Recv>) -> Result<()> {
        if port == 0 {
            return Err(Error::Illegal);
        }

        self.ports.register(port, handler)
    }

    /// Remove the handler of a port, returns if one was registered.
    pub fn close(&mut self, port: u16) -> bool {
        self.ports.unregister(port).is_some()
    }

    pub fn is_open(&self, port: u16) -> bool {
        self.ports.is_registered(port)
    }

    /// Process an inbound datagram whose ip header was already stripped.
    ///
    /// The checksum is verified with the pseudo header of the ip datagram. `ip_header_len` is the
    /// length of that stripped header, it is restored when no handler is registered for the port.
    pub fn datagram_in(&mut self, buffer: &mut Buffer, ip_repr: &Ipv4Repr, ip_header_len: usize)
        -> wire::Result<Inbound>
    {
        let packet = udp_packet::new_unchecked(buffer.as_slice());
        let repr = UdpRepr::parse(packet, ip_repr.src_addr, ip_repr.dst_addr)?;

        let handler = match self.ports.get_mut(repr.dst_port) {
            Some(handler) => handler,
            None => {
                net_debug!("udp: port {} unreachable for {}", repr.dst_port, ip_repr.src_addr);
                buffer.add_header(ip_header_len)
                    .map_err(|_| wire::Error::Truncated)?;
                return Ok(Inbound::PortUnreachable { repr });
            },
        };

        buffer.truncate(usize::from(repr.length));
        buffer.remove_header(HEADER_LEN)
            .map_err(|_| wire::Error::Truncated)?;

        let mut answer = None;
        handler.receive(Packet {
            payload: buffer.as_slice(),
            src_addr: ip_repr.src_addr,
            src_port: repr.src_port,
            dst_port: repr.dst_port,
            answer: &mut answer,
        });

        Ok(Inbound::Delivered { repr, answer })
    }
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("ports", &self.ports.keys().collect::<alloc::vec::Vec<_>>())
            .finish()
    }
}

impl<'a, D: Device> Sender<'a, D> {
    pub fn new(ip: ip::Sender<'a, D>) -> Self {
        Sender { ip }
    }

    /// Prepend a UDP header to the payload in the buffer and send it.
    pub fn datagram_out(
        &mut self,
        mut buffer: Buffer,
        src_port: u16,
        dst_addr: Ipv4Address,
        dst_port: u16,
    ) -> Result<arp::Outcome> {
        let length = buffer.len() + HEADER_LEN;
        if length > usize::from(u16::max_value()) {
            return Err(Error::BadSize);
        }

        buffer.add_header(HEADER_LEN)?;
        let repr = UdpRepr {
            src_port,
            dst_port,
            length: length as u16,
        };
        repr.emit(udp_packet::new_unchecked_mut(buffer.as_mut_slice()), self.ip.src_addr(), dst_addr);
        net_trace!("udp: send {} to {}", repr, dst_addr);

        self.ip.datagram_out(buffer, dst_addr, IpProtocol::Udp)
    }
}

impl<D> fmt::Debug for Sender<'_, D> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Sender")
            .field("ip", &self.ip)
            .finish()
    }
}
