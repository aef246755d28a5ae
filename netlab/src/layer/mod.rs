//! The process logic of protocol layers.
//!
//! ## Layering
//!
//! Each protocol layer is split into two parts; the packet logic contained in `wire` and the
//! processing part in this module. An endpoint represents the local state of a protocol: the
//! neighbor cache and pending queue of `arp`, the identification counter of `ip`, the port table
//! of `udp`. This state can be inspected and reconfigured by a user program while processing does
//! not take place, similar to reconfiguration on the OS level with utilities such as `arp`,
//! `ifconfig`, etc.
//!
//! ## Receiving
//!
//! An inbound frame is processed by handing the received buffer to the lowest endpoint. Each
//! layer validates its header, strips it, and reports which upper layer the payload belongs to
//! by looking up the protocol number in its [dispatch table]. Anything that fails validation is
//! dropped silently; the stack answers no malformed packet.
//!
//! ## Sending
//!
//! Every endpoint can be borrowed as a `Sender` that owns a sender of the layer below. A sender
//! consumes a buffer holding its payload, prepends its header in the buffer's headroom and passes
//! the buffer on. The chain ends in the ethernet sender that hands the finished frame to the
//! device. Only the arp layer may keep a buffer instead of passing it on, when the destination has
//! not been resolved yet.
//!
//! [dispatch table]: dispatch/struct.Table.html
use core::fmt;

pub mod arp;
pub mod dispatch;
pub mod eth;
pub mod icmp;
pub mod ip;
pub mod udp;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Error {
    /// The operation was not permitted.
    ///
    /// Returned when the device, endpoint, receiver or sender does not allow or implement an
    /// operation, or when the input to a send path could not be encoded.
    Illegal,

    /// Not enough space for the requested packet.
    ///
    /// Returned when a buffer has insufficient headroom or capacity for a structural operation. In
    /// contrast to `Illegal` this would signal that a smaller size may be possible.
    BadSize,

    /// Unable to find a route towards the destination address.
    Unreachable,

    /// The action could not be completed because there were not enough resources.
    ///
    /// The main difference towards `Illegal` is that implies that it would have been legal with
    /// more resources. Returned when a table is at its capacity.
    Exhausted,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Illegal     => write!(f, "illegal operation"),
            Error::BadSize     => write!(f, "insufficient buffer size"),
            Error::Unreachable => write!(f, "destination unreachable"),
            Error::Exhausted   => write!(f, "resources exhausted"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// A standard wrapper for a function implementing receive traits.
///
/// Keeps the type alias overhead low by providing a single wrapper type that implements the
/// receive traits for all layers, where applicable.
pub struct FnHandler<F>(pub F);

impl<F> fmt::Debug for FnHandler<F> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("FnHandler")
    }
}

/// Can convert from a wire error.
///
/// This indicates some layer tried to operate on a packet but failed.
impl From<crate::wire::Error> for Error {
    fn from(_: crate::wire::Error) -> Self {
        Error::Illegal
    }
}

/// Can convert from a storage error.
///
/// One common cause is failure to resize the buffer to the necessary size.
impl From<crate::storage::Error> for Error {
    fn from(err: crate::storage::Error) -> Self {
        use crate::storage::Error as StorageError;
        match err {
            StorageError::BadSize => Error::BadSize,
        }
    }
}
