//! The IPv4 layer.
//!
//! The endpoint holds the single address of the interface and accepts only datagrams destined to
//! it. There is no routing: every outbound datagram goes to a neighbor on the link, resolved by
//! the arp layer.
//!
//! Outbound datagrams larger than the mtu are fragmented. Inbound fragments are *not*
//! reassembled, each one is handed upwards as if it were a complete datagram. Upper layers that
//! check their own payload (UDP and ICMP checksums) will drop the pieces of a fragmented datagram.
use crate::wire::Ipv4Repr;

mod endpoint;
#[cfg(test)]
mod tests;

pub use endpoint::{
    Endpoint,
    Sender,
};

/// The upper layer protocols an IP payload can be dispatched to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Upper {
    Udp,
    Icmp,
}

/// The result of processing an inbound datagram.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Inbound {
    /// A datagram for a registered protocol, its header was stripped from the buffer.
    Deliver {
        repr: Ipv4Repr,
        /// The length of the stripped header, including options.
        header_len: usize,
        upper: Upper,
    },

    /// A datagram for us but for an unknown protocol.
    ///
    /// The buffer still holds the complete datagram, to be quoted in a protocol unreachable
    /// message.
    Unreachable {
        repr: Ipv4Repr,
    },

    /// A valid datagram destined to another host.
    Ignored,
}
