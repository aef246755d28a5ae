//! Low-level packet access and construction.
//!
//! The `wire` module deals with the packet *representation*. It provides two levels of
//! functionality.
//!
//!  * First, it provides functions to extract fields from sequences of octets, and to insert
//!    fields into sequences of octets. This happens through the byte wrappers such as
//!    [`ethernet`] or [`ipv4`], which are dynamically sized views on a byte slice. They are
//!    constructed with `new_checked`, which validates that no accessor can go out of bounds.
//!  * Second, in cases where the space of valid field values is much smaller than the space of
//!    possible field values, it provides a compact, high-level representation of packet data
//!    that can be parsed from and emitted into a sequence of octets. This happens through the
//!    `Repr` family of structs and enums, e.g. [`ArpRepr`] or [`Ipv4Repr`].
//!
//! The functions in the `wire` module are designed for use together with `-Cpanic=abort`: parsing
//! never panics on malformed input but returns an [`Error`].
//!
//! [`ethernet`]: ethernet/struct.ethernet.html
//! [`ipv4`]: ipv4/struct.ipv4.html
//! [`ArpRepr`]: arp/struct.Repr.html
//! [`Ipv4Repr`]: ipv4/struct.Repr.html
//! [`Error`]: enum.Error.html

mod field {
    use core::ops;

    pub(crate) type Field = ops::Range<usize>;
    pub(crate) type Rest = ops::RangeFrom<usize>;
}

pub mod checksum;
mod error;

pub mod arp;
pub mod ethernet;
pub mod icmpv4;
pub mod ipv4;
pub mod udp;

pub use self::error::{Error, Result};

pub use self::ethernet::{
    ethernet as ethernet_frame,
    Address as EthernetAddress,
    EtherType as EthernetProtocol,
    Repr as EthernetRepr};

pub use self::arp::{
    arp as arp_packet,
    Hardware as ArpHardware,
    Operation as ArpOperation,
    Repr as ArpRepr};

pub use self::ipv4::{
    ipv4 as ipv4_packet,
    Address as Ipv4Address,
    Protocol as IpProtocol,
    Repr as Ipv4Repr};

pub use self::udp::{
    udp as udp_packet,
    Repr as UdpRepr};

pub use self::icmpv4::{
    icmpv4 as icmpv4_packet,
    DstUnreachable as Icmpv4DstUnreachable,
    Message as Icmpv4Message,
    Repr as Icmpv4Repr};
