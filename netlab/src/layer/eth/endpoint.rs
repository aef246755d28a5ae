use core::fmt;

use crate::layer::{dispatch, Result};
use crate::nic::Device;
use crate::storage::Buffer;
use crate::wire::{ethernet_frame, EthernetAddress, EthernetProtocol, EthernetRepr};
use crate::wire::ethernet::{HEADER_LEN, MIN_PAYLOAD_LEN};

use super::{InPacket, Upper};

/// Handles the framing of one interface.
#[derive(Debug)]
pub struct Endpoint {
    /// Our own address.
    addr: EthernetAddress,

    /// Maps the ethertype of incoming frames to the layer handling their payload.
    protocols: dispatch::Table<EthernetProtocol, Upper>,
}

/// An ethernet endpoint for sending, borrowing the device.
pub struct Sender<'a, D> {
    endpoint: &'a Endpoint,
    nic: &'a mut D,
}

impl Endpoint {
    /// Create a new endpoint with an empty dispatch table.
    pub fn new(addr: EthernetAddress) -> Self {
        Endpoint {
            addr,
            protocols: dispatch::Table::new(),
        }
    }

    pub fn addr(&self) -> EthernetAddress {
        self.addr
    }

    pub fn set_addr(&mut self, addr: EthernetAddress) {
        self.addr = addr;
    }

    /// Dispatch the payload of frames with the given ethertype to a layer.
    pub fn register(&mut self, ethertype: EthernetProtocol, upper: Upper) -> Result<()> {
        self.protocols.register(ethertype, upper)
    }

    pub fn unregister(&mut self, ethertype: EthernetProtocol) -> Option<Upper> {
        self.protocols.unregister(ethertype)
    }

    /// Strip the ethernet header of a received frame.
    ///
    /// Returns the header and the layer the remaining payload belongs to. The frame is dropped,
    /// that is `None` is returned, if it is too short to hold a header or its ethertype has no
    /// registered layer.
    pub fn frame_in(&self, buffer: &mut Buffer) -> Option<InPacket> {
        let repr = match ethernet_frame::new_checked(buffer.as_slice()).and_then(EthernetRepr::parse) {
            Ok(repr) => repr,
            Err(err) => {
                net_trace!("eth: dropped frame: {}", err);
                return None;
            },
        };

        let upper = match self.protocols.get(repr.ethertype) {
            Some(upper) => *upper,
            None => {
                net_trace!("eth: no handler for {}", repr.ethertype);
                return None;
            },
        };

        // Can not fail, the length was checked while parsing.
        buffer.remove_header(HEADER_LEN).ok()?;
        Some(InPacket { repr, upper })
    }

    /// Borrow the endpoint for sending frames on a device.
    pub fn sender<'a, D: Device>(&'a self, nic: &'a mut D) -> Sender<'a, D> {
        Sender {
            endpoint: self,
            nic,
        }
    }
}

impl<D> fmt::Debug for Sender<'_, D> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Sender")
            .field("endpoint", self.endpoint)
            .finish()
    }
}

impl<D: Device> Sender<'_, D> {
    /// The hardware address used as the source of all frames.
    pub fn src_addr(&self) -> EthernetAddress {
        self.endpoint.addr
    }

    /// Frame a payload and transmit it.
    ///
    /// Payloads shorter than the minimum frame payload are padded with zeroes.
    pub fn frame_out(
        &mut self,
        mut buffer: Buffer,
        dst_addr: EthernetAddress,
        ethertype: EthernetProtocol,
    ) -> Result<()> {
        if buffer.len() < MIN_PAYLOAD_LEN {
            buffer.add_padding(MIN_PAYLOAD_LEN - buffer.len())?;
        }

        let header = buffer.add_header(HEADER_LEN)?;
        EthernetRepr {
            src_addr: self.endpoint.addr,
            dst_addr,
            ethertype,
        }.emit(ethernet_frame::new_unchecked_mut(header));

        net_trace!("eth: send {} bytes to {} ({})", buffer.len(), dst_addr, ethertype);
        self.nic.transmit(buffer.as_slice())
    }
}
