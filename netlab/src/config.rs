//! Interface identity and tunables.
use crate::time::Duration;
use crate::wire::{EthernetAddress, Ipv4Address};

/// The configuration of one [`Interface`].
///
/// [`Interface`]: ../iface/struct.Interface.html
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    /// The hardware address of the interface.
    pub hardware_addr: EthernetAddress,

    /// The single IPv4 address of the interface.
    pub ip_addr: Ipv4Address,

    /// The link mtu, the largest IP datagram (header included) put into one frame.
    pub mtu: usize,

    /// Time to live of emitted datagrams.
    pub hop_limit: u8,

    /// How long a neighbor mapping stays valid after it was last refreshed.
    pub arp_timeout: Duration,

    /// How long a packet waits for its destination to be resolved.
    ///
    /// Also the minimum interval between two requests for the same address.
    pub arp_min_interval: Duration,

    pub neighbor_capacity: usize,

    pub pending_capacity: usize,

    pub port_capacity: usize,
}

impl Config {
    pub const DEFAULT_HARDWARE_ADDR: EthernetAddress =
        EthernetAddress([0x11, 0x22, 0x33, 0x44, 0x55, 0x66]);
    pub const DEFAULT_IP_ADDR: Ipv4Address = Ipv4Address::new(192, 168, 163, 103);

    /// Configure an interface identity with default tunables.
    pub fn new(hardware_addr: EthernetAddress, ip_addr: Ipv4Address) -> Self {
        Config {
            hardware_addr,
            ip_addr,
            mtu: 1500,
            hop_limit: 64,
            arp_timeout: Duration::from_secs(5 * 60),
            arp_min_interval: Duration::from_secs(1),
            neighbor_capacity: 64,
            pending_capacity: 16,
            port_capacity: 64,
        }
    }

    /// The largest IP payload that fits into a single datagram.
    pub fn max_payload(&self) -> usize {
        self.mtu.saturating_sub(crate::wire::ipv4::HEADER_LEN)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config::new(Self::DEFAULT_HARDWARE_ADDR, Self::DEFAULT_IP_ADDR)
    }
}
