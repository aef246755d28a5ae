//! Owned packet storage.
//!
//! Every packet of the stack lives in a [`Buffer`]: a fixed-capacity byte region with reserved
//! headroom so that each layer can prepend its header in place while the packet travels down, and
//! strip it again while a received frame travels up.
//!
//! [`Buffer`]: struct.Buffer.html
mod buffer;

pub use self::buffer::{Buffer, HEADROOM, TAILROOM};

/// A structural operation on a buffer did not fit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Error {
    /// The requested length is not available.
    ///
    /// Either the headroom is exhausted, the capacity is exceeded or more bytes were to be removed
    /// than the buffer holds.
    BadSize,
}
