//! Encapsulates a network interface card.
//!
//! Also permits software emulation or implementation of one as well, of course. The stack only
//! needs two operations of a device: transmit a finished frame, and receive at most one frame
//! into a buffer without blocking.
pub mod external;
#[cfg(feature = "std")]
pub mod sys;

use crate::layer::Result;
use crate::storage::Buffer;

pub use self::external::External;

/// A device sending and receiving ethernet frames.
pub trait Device {
    /// Transmit one complete frame.
    ///
    /// The frame starts with the ethernet header and is already padded to the minimum size.
    fn transmit(&mut self, frame: &[u8]) -> Result<()>;

    /// Receive at most one frame into the buffer.
    ///
    /// Returns the number of bytes received, `0` if no frame was available. On success the
    /// logical content of the buffer is exactly the received frame. Must not block.
    fn receive_into(&mut self, buffer: &mut Buffer) -> Result<usize>;
}

impl<D: Device + ?Sized> Device for &'_ mut D {
    fn transmit(&mut self, frame: &[u8]) -> Result<()> {
        (**self).transmit(frame)
    }

    fn receive_into(&mut self, buffer: &mut Buffer) -> Result<usize> {
        (**self).receive_into(buffer)
    }
}
