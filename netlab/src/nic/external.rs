//! A stub nic whose frames come from an external source.
//!
//! Frames queued with [`push_rx`] are handed out one per receive call, transmitted frames are
//! recorded and can be inspected or taken afterwards. This is the device all layer tests run
//! against.
//!
//! [`push_rx`]: struct.External.html#method.push_rx
use alloc::collections::VecDeque;
use alloc::vec::Vec;

use crate::layer::{Error, Result};
use crate::storage::Buffer;
use super::Device;

#[derive(Clone, Debug, Default)]
pub struct External {
    /// Frames still to be received, in order.
    rx: VecDeque<Vec<u8>>,

    /// All frames transmitted so far.
    tx: Vec<Vec<u8>>,

    /// Number of received frames.
    received: usize,
}

impl External {
    /// A new external nic without any frames.
    pub fn new() -> Self {
        External::default()
    }

    /// Queue a frame to be received.
    pub fn push_rx<T: Into<Vec<u8>>>(&mut self, frame: T) {
        self.rx.push_back(frame.into())
    }

    /// Remaining number of frames to receive.
    pub fn to_recv(&self) -> usize {
        self.rx.len()
    }

    /// Number of frames received so far.
    pub fn received(&self) -> usize {
        self.received
    }

    /// The frames transmitted so far.
    pub fn sent(&self) -> &[Vec<u8>] {
        &self.tx
    }

    /// Take all transmitted frames, resetting the record.
    pub fn take_sent(&mut self) -> Vec<Vec<u8>> {
        core::mem::replace(&mut self.tx, Vec::new())
    }
}

impl Device for External {
    fn transmit(&mut self, frame: &[u8]) -> Result<()> {
        self.tx.push(frame.to_vec());
        Ok(())
    }

    fn receive_into(&mut self, buffer: &mut Buffer) -> Result<usize> {
        let frame = match self.rx.pop_front() {
            Some(frame) => frame,
            None => return Ok(0),
        };

        self.received += 1;
        let area = buffer.receive_area();
        if frame.len() > area.len() {
            return Err(Error::BadSize);
        }

        area[..frame.len()].copy_from_slice(&frame);
        buffer.set_len(frame.len())?;
        Ok(frame.len())
    }
}
