//! The ICMP layer.
//!
//! Answers echo requests and reports undeliverable datagrams to their sender. Only the messages
//! the stack itself needs are understood; every other inbound message is dropped after its
//! checksum was verified.
//!
//! Destination unreachable messages quote the offending datagram: its IP header together with the
//! first 8 bytes of its payload, as required by [RFC792].
//!
//! [RFC792]: https://tools.ietf.org/html/rfc792
use crate::wire::Icmpv4Repr;

mod endpoint;

pub use endpoint::{
    Endpoint,
    Sender,
};

/// The result of processing an inbound ICMP message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Inbound {
    /// An echo request to be answered, the buffer holds the complete message.
    EchoRequest {
        repr: Icmpv4Repr,
    },

    /// A valid message that needs no further processing.
    Ignored,
}
