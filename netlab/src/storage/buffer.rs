use alloc::vec;
use alloc::vec::Vec;
use core::fmt;

use super::Error;

/// Bytes reserved in front of the data for headers prepended on the way down.
///
/// Enough for an Ethernet, IPv4 and UDP header in sequence.
pub const HEADROOM: usize = 64;

/// Bytes reserved behind copied data for padding.
pub const TAILROOM: usize = 64;

/// A contiguous byte region with headroom.
///
/// The logical content is the window `start..end` of the backing storage. Headers are added by
/// moving `start` towards the front and padding by moving `end` towards the back. Neither
/// operation may leave the backing storage, every operation checks its bounds and reports
/// `Error::BadSize` instead.
///
/// Removing a header does not clear it. Adding the same number of bytes back yields the old
/// content, which is what a layer relies on when it needs to quote a header it already consumed.
#[derive(Clone, PartialEq, Eq)]
pub struct Buffer {
    storage: Vec<u8>,
    start: usize,
    end: usize,
}

impl Buffer {
    /// Create an empty buffer that can hold `capacity` bytes behind the headroom.
    pub fn with_capacity(capacity: usize) -> Self {
        Buffer {
            storage: vec![0; HEADROOM + capacity],
            start: HEADROOM,
            end: HEADROOM,
        }
    }

    /// Create a buffer holding a copy of `data`.
    ///
    /// The buffer has the default headroom and tailroom, so the copy can be framed and padded
    /// without reallocation.
    pub fn from_slice(data: &[u8]) -> Self {
        let mut buffer = Buffer::with_capacity(data.len() + TAILROOM);
        buffer.storage[HEADROOM..HEADROOM + data.len()].copy_from_slice(data);
        buffer.end = HEADROOM + data.len();
        buffer
    }

    /// The number of bytes the buffer can hold behind the headroom.
    pub fn capacity(&self) -> usize {
        self.storage.len() - HEADROOM
    }

    /// The logical length of the content.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// The bytes that are still available in front of the content.
    pub fn headroom(&self) -> usize {
        self.start
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.storage[self.start..self.end]
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.storage[self.start..self.end]
    }

    /// Reset the buffer and hand out its full area for a device to write into.
    ///
    /// The buffer is logically empty afterwards. Call [`set_len`] with the number of bytes
    /// written.
    ///
    /// [`set_len`]: #method.set_len
    pub fn receive_area(&mut self) -> &mut [u8] {
        self.start = HEADROOM;
        self.end = HEADROOM;
        &mut self.storage[HEADROOM..]
    }

    /// Set the logical length, counted from the current start of the content.
    pub fn set_len(&mut self, len: usize) -> Result<(), Error> {
        if self.start + len > self.storage.len() {
            return Err(Error::BadSize);
        }

        self.end = self.start + len;
        Ok(())
    }

    /// Shorten the content to `len` bytes, has no effect if it is already shorter.
    pub fn truncate(&mut self, len: usize) {
        if len < self.len() {
            self.end = self.start + len;
        }
    }

    /// Prepend `len` bytes and return them for the caller to fill.
    ///
    /// The returned bytes are not cleared.
    pub fn add_header(&mut self, len: usize) -> Result<&mut [u8], Error> {
        if len > self.start {
            return Err(Error::BadSize);
        }

        self.start -= len;
        Ok(&mut self.storage[self.start..self.start + len])
    }

    /// Consume `len` bytes from the front of the content.
    pub fn remove_header(&mut self, len: usize) -> Result<(), Error> {
        if len > self.len() {
            return Err(Error::BadSize);
        }

        self.start += len;
        Ok(())
    }

    /// Append `len` zero bytes.
    pub fn add_padding(&mut self, len: usize) -> Result<&mut [u8], Error> {
        if self.end + len > self.storage.len() {
            return Err(Error::BadSize);
        }

        let padding = &mut self.storage[self.end..self.end + len];
        for byte in padding.iter_mut() {
            *byte = 0;
        }
        self.end += len;
        Ok(padding)
    }

    /// Remove `len` bytes from the back of the content.
    pub fn remove_padding(&mut self, len: usize) -> Result<(), Error> {
        if len > self.len() {
            return Err(Error::BadSize);
        }

        self.end -= len;
        Ok(())
    }
}

impl fmt::Debug for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Buffer")
            .field("len", &self.len())
            .field("headroom", &self.headroom())
            .field("capacity", &self.capacity())
            .finish()
    }
}

impl AsRef<[u8]> for Buffer {
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}

impl AsMut<[u8]> for Buffer {
    fn as_mut(&mut self) -> &mut [u8] {
        self.as_mut_slice()
    }
}
