//! The ethernet layer.
//!
//! This is tasked with decoding the framed ethernet data that the physical device deals with, and
//! putting upper layer data into an ethernet framing. The state within the ethernet endpoint is
//! tiny compared to other layers: the hardware address of the interface and the table of
//! ethertypes it accepts.
//!
//! Frames are not filtered by destination address. The device is expected to hand over only
//! frames meant for this host, which a tap device does.
use crate::wire::EthernetRepr;

mod endpoint;

pub use endpoint::{
    Endpoint,
    Sender,
};

/// The upper layer protocols an ethernet payload can be dispatched to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Upper {
    Arp,
    Ipv4,
}

/// An incoming, valid frame whose header was stripped from the buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InPacket {
    /// The header of the frame.
    pub repr: EthernetRepr,
    /// The layer the payload was dispatched to.
    pub upper: Upper,
}
