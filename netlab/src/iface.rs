//! The interface, tying all layers to one device.
//!
//! An [`Interface`] owns the device, the receive buffer and the state of every layer. Nothing is
//! shared between two interfaces, so several of them can run side by side, for example in tests.
//!
//! Processing is driven by calling [`poll`] with the current time. Each call receives at most one
//! frame and runs it through the layers to completion, including any answer it triggers.
//!
//! [`Interface`]: struct.Interface.html
//! [`poll`]: struct.Interface.html#method.poll
use alloc::boxed::Box;
use core::fmt;

use crate::config::Config;
use crate::layer::{arp, eth, icmp, ip, udp, Result};
use crate::nic::Device;
use crate::storage::Buffer;
use crate::time::Instant;
use crate::wire::{EthernetAddress, EthernetProtocol, Icmpv4DstUnreachable, IpProtocol};
use crate::wire::{Ipv4Address, Ipv4Repr};
use crate::wire::ethernet::HEADER_LEN;

/// A network interface with a single IPv4 address.
pub struct Interface<D> {
    config: Config,

    nic: D,

    /// Holds the frame currently being processed.
    rx: Buffer,

    layers: Layers,
}

/// The endpoints of all layers.
#[derive(Debug)]
struct Layers {
    eth: eth::Endpoint,
    arp: arp::Endpoint,
    ip: ip::Endpoint,
    udp: udp::Endpoint,
    icmp: icmp::Endpoint,
}

impl<D: Device> Interface<D> {
    /// Set up all layers and announce our address to the link.
    pub fn new(config: Config, nic: D, now: Instant) -> Result<Self> {
        let mut eth = eth::Endpoint::new(config.hardware_addr);
        eth.register(EthernetProtocol::Arp, eth::Upper::Arp)?;
        eth.register(EthernetProtocol::Ipv4, eth::Upper::Ipv4)?;

        let arp = arp::Endpoint::new(
            config.ip_addr,
            arp::NeighborCache::new(config.neighbor_capacity, config.arp_timeout),
            arp::PendingQueue::new(config.pending_capacity, config.arp_min_interval));

        let mut ip = ip::Endpoint::new(config.ip_addr, config.mtu, config.hop_limit);
        ip.register(IpProtocol::Udp, ip::Upper::Udp)?;
        ip.register(IpProtocol::Icmp, ip::Upper::Icmp)?;

        let mut iface = Interface {
            config,
            nic,
            rx: Buffer::with_capacity(config.mtu + HEADER_LEN),
            layers: Layers {
                eth,
                arp,
                ip,
                udp: udp::Endpoint::new(config.port_capacity),
                icmp: icmp::Endpoint::new(),
            },
        };

        let Interface { nic, layers, .. } = &mut iface;
        layers.arp_sender(nic, now).announce()?;
        Ok(iface)
    }

    /// Receive and process at most one frame.
    ///
    /// Returns `Ok(false)` if the device had no frame available. Errors of the device are
    /// returned, while a frame that can not be processed is dropped and still counts as handled.
    pub fn poll(&mut self, now: Instant) -> Result<bool> {
        let Interface { nic, rx, layers, .. } = self;

        if nic.receive_into(rx)? == 0 {
            layers.arp.purge(now);
            return Ok(false);
        }

        if let Err(err) = layers.frame_in(nic, rx, now) {
            net_debug!("iface: failed to process frame: {}", err);
        }

        Ok(true)
    }

    /// Register the handler of a UDP port.
    pub fn udp_open<H>(&mut self, port: u16, handler: H) -> Result<()>
        where H: udp::Recv + 'static,
    {
        self.layers.udp.open(port, Box::new(handler))
    }

    /// Remove the handler of a UDP port, returns if one was registered.
    pub fn udp_close(&mut self, port: u16) -> bool {
        self.layers.udp.close(port)
    }

    /// Send a UDP datagram.
    pub fn udp_send(
        &mut self,
        data: &[u8],
        src_port: u16,
        dst_addr: Ipv4Address,
        dst_port: u16,
        now: Instant,
    ) -> Result<arp::Outcome> {
        let Interface { nic, layers, .. } = self;
        udp::Sender::new(layers.ip_sender(nic, now))
            .datagram_out(Buffer::from_slice(data), src_port, dst_addr, dst_port)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn nic(&self) -> &D {
        &self.nic
    }

    pub fn nic_mut(&mut self) -> &mut D {
        &mut self.nic
    }

    /// The address resolution state.
    pub fn arp(&self) -> &arp::Endpoint {
        &self.layers.arp
    }

    /// Modify the address resolution state, for example to add static neighbors.
    pub fn arp_mut(&mut self) -> &mut arp::Endpoint {
        &mut self.layers.arp
    }

    pub fn ip(&self) -> &ip::Endpoint {
        &self.layers.ip
    }

    pub fn udp(&self) -> &udp::Endpoint {
        &self.layers.udp
    }

    pub fn icmp_mut(&mut self) -> &mut icmp::Endpoint {
        &mut self.layers.icmp
    }
}

impl<D> fmt::Debug for Interface<D> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Interface")
            .field("config", &self.config)
            .field("layers", &self.layers)
            .finish()
    }
}

impl Layers {
    fn arp_sender<'a, D: Device>(&'a mut self, nic: &'a mut D, now: Instant) -> arp::Sender<'a, D> {
        let Layers { eth, arp, .. } = self;
        arp.sender(eth.sender(nic), now)
    }

    fn ip_sender<'a, D: Device>(&'a mut self, nic: &'a mut D, now: Instant) -> ip::Sender<'a, D> {
        let Layers { eth, arp, ip, .. } = self;
        ip.sender(arp.sender(eth.sender(nic), now))
    }

    fn frame_in<D: Device>(&mut self, nic: &mut D, buffer: &mut Buffer, now: Instant) -> Result<()> {
        let packet = match self.eth.frame_in(buffer) {
            Some(packet) => packet,
            None => return Ok(()),
        };

        let src_addr = packet.repr.src_addr;
        match packet.upper {
            eth::Upper::Arp => self.arp_sender(nic, now).handle_inbound(buffer.as_slice(), src_addr),
            eth::Upper::Ipv4 => self.ipv4_in(nic, buffer, src_addr, now),
        }
    }

    fn ipv4_in<D: Device>(
        &mut self,
        nic: &mut D,
        buffer: &mut Buffer,
        src_addr: EthernetAddress,
        now: Instant,
    ) -> Result<()> {
        let (repr, header_len, upper) = match self.ip.datagram_in(buffer, src_addr) {
            Ok(ip::Inbound::Deliver { repr, header_len, upper }) => (repr, header_len, upper),
            Ok(ip::Inbound::Unreachable { repr }) => {
                net_debug!("ip: protocol {} unreachable for {}", repr.protocol, repr.src_addr);
                icmp::Sender::new(self.ip_sender(nic, now))
                    .unreachable(buffer.as_slice(), repr.src_addr, Icmpv4DstUnreachable::ProtoUnreachable)?;
                return Ok(());
            },
            Ok(ip::Inbound::Ignored) => return Ok(()),
            Err(err) => {
                net_trace!("ip: dropped datagram from {}: {}", src_addr, err);
                return Ok(());
            },
        };

        match upper {
            ip::Upper::Udp => self.udp_in(nic, buffer, &repr, header_len, now),
            ip::Upper::Icmp => self.icmp_in(nic, buffer, &repr, now),
        }
    }

    fn udp_in<D: Device>(
        &mut self,
        nic: &mut D,
        buffer: &mut Buffer,
        ip_repr: &Ipv4Repr,
        header_len: usize,
        now: Instant,
    ) -> Result<()> {
        match self.udp.datagram_in(buffer, ip_repr, header_len) {
            Ok(udp::Inbound::Delivered { repr, answer: Some(answer) }) => {
                if repr.src_port == 0 {
                    net_debug!("udp: can not answer {} without source port", ip_repr.src_addr);
                    return Ok(());
                }

                udp::Sender::new(self.ip_sender(nic, now))
                    .datagram_out(Buffer::from_slice(&answer), repr.dst_port, ip_repr.src_addr, repr.src_port)?;
            },
            Ok(udp::Inbound::Delivered { answer: None, .. }) => (),
            Ok(udp::Inbound::PortUnreachable { .. }) => {
                icmp::Sender::new(self.ip_sender(nic, now))
                    .unreachable(buffer.as_slice(), ip_repr.src_addr, Icmpv4DstUnreachable::PortUnreachable)?;
            },
            Err(err) => net_trace!("udp: dropped datagram from {}: {}", ip_repr.src_addr, err),
        }

        Ok(())
    }

    fn icmp_in<D: Device>(
        &mut self,
        nic: &mut D,
        buffer: &mut Buffer,
        ip_repr: &Ipv4Repr,
        now: Instant,
    ) -> Result<()> {
        match self.icmp.datagram_in(buffer, ip_repr) {
            Ok(icmp::Inbound::EchoRequest { repr }) => {
                icmp::Sender::new(self.ip_sender(nic, now))
                    .echo_reply(Buffer::from_slice(buffer.as_slice()), ip_repr.src_addr, repr)?;
            },
            Ok(icmp::Inbound::Ignored) => (),
            Err(err) => net_trace!("icmp: dropped message from {}: {}", ip_repr.src_addr, err),
        }

        Ok(())
    }
}
