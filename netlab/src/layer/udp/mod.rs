//! The UDP layer.
//!
//! Datagrams are dispatched by destination port to a handler registered with the endpoint. A
//! datagram for a port without handler is reported back to the ip layer, which answers it with an
//! ICMP port unreachable message.
//!
//! Handlers see the payload together with the source of the datagram and may [`answer`] it. The
//! answer is sent back to the source once the handler returned, from the port the datagram was
//! addressed to.
//!
//! [`answer`]: struct.Packet.html#method.answer
use alloc::vec::Vec;

use crate::layer::FnHandler;
use crate::wire::{Ipv4Address, UdpRepr};

mod endpoint;
#[cfg(test)]
mod tests;

pub use endpoint::{
    Endpoint,
    Sender,
};

/// A UDP receiver.
///
/// Processes the payload of incoming datagrams for one port.
pub trait Recv {
    /// Inspect one incoming, valid datagram.
    fn receive(&mut self, packet: Packet);
}

/// An incoming datagram as presented to a handler.
#[derive(Debug)]
pub struct Packet<'a> {
    /// The payload, without the UDP header.
    pub payload: &'a [u8],

    pub src_addr: Ipv4Address,

    pub src_port: u16,

    pub dst_port: u16,

    answer: &'a mut Option<Vec<u8>>,
}

/// The result of processing an inbound datagram.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Inbound {
    /// The datagram was handed to the handler of its port.
    Delivered {
        repr: UdpRepr,

        /// The answer of the handler, if it gave one.
        answer: Option<Vec<u8>>,
    },

    /// No handler is registered for the destination port.
    ///
    /// The ip header was restored in the buffer so that it holds the complete original datagram.
    PortUnreachable {
        repr: UdpRepr,
    },
}

impl Packet<'_> {
    /// The length of the payload.
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    /// Queue an answer to the source of this datagram.
    ///
    /// Only one answer is sent, a later call replaces an earlier one.
    pub fn answer(&mut self, data: &[u8]) {
        *self.answer = Some(data.to_vec());
    }
}

impl<F> Recv for FnHandler<F>
    where F: FnMut(Packet),
{
    fn receive(&mut self, packet: Packet) {
        (self.0)(packet)
    }
}
