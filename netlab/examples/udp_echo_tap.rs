//! Echoes UDP datagrams on a tap interface.
//!
//! # Usage
//!
//! The example opens a tap as a network device, answers arp requests and pings to its address and
//! sends every datagram to its port back to where it came from.
//!
//! The following steps are necessary to set the example up (likely requires root or sudo):
//!
//! 1. Setup the tap interface, named `tap0` here:
//!
//!   > $ ip tuntap add mode tap name tap0
//! 2. Assign an address on the host system
//!
//!   > $ ip addr add 10.0.0.2/24 dev tap0
//! 3. Bring up the interface on the host
//!
//!   > $ ip link set up dev tap0
//! 4. Start the example, it will answer as 10.0.0.1.
//!
//!   > $ cargo run --example udp_echo_tap -- tap0 10.0.0.1 ab:ff:ff:ff:ff:ff 7
//! 5. Send it some datagrams.
//!
//!   > $ nc -u 10.0.0.1 7
use std::io::{stdout, Write};
use std::os::unix::io::AsRawFd;
use std::time::Duration;
use structopt::StructOpt;

use netlab::{Config, Interface};
use netlab::layer::{udp, FnHandler};
use netlab::nic::sys::{self, TapInterface};
use netlab::time::Instant;
use netlab::wire::{EthernetAddress, Ipv4Address};

fn main() {
    let Options {
        name,
        host,
        hostmac,
        port,
        mtu,
    } = Options::from_args();

    let mut tap = TapInterface::new(&name)
        .expect("Couldn't initialize interface");

    let mut config = Config::new(hostmac, host);
    config.mtu = match mtu {
        Some(mtu) => mtu,
        None => tap.interface_mtu().expect("Couldn't query interface mtu"),
    };

    let mut iface = Interface::new(config, tap, Instant::now())
        .expect("Couldn't announce the interface");

    iface.udp_open(port, FnHandler(|mut packet: udp::Packet<'_>| {
        let data = packet.payload.to_vec();
        packet.answer(&data);
    })).expect("Couldn't open the port");

    let out = stdout();
    let mut out = out.lock();

    writeln!(out, "Echoing on {}:{}", host, port).unwrap();

    loop {
        match iface.poll(Instant::now()) {
            Ok(true) => {
                out.write_all(b".").unwrap();
                out.flush().unwrap();
            },
            Ok(false) => {
                let fd = iface.nic().as_raw_fd();
                sys::wait(fd, Some(Duration::from_millis(100)))
                    .unwrap_or_else(|err| panic!("Error while waiting {}", err));
            },
            Err(err) => {
                panic!("Error during receive {:?} {:?}", err, iface.nic_mut().last_err());
            },
        }
    }
}

#[derive(StructOpt)]
struct Options {
    name: String,
    host: Ipv4Address,
    hostmac: EthernetAddress,
    port: u16,

    /// Use this mtu instead of the one of the interface.
    #[structopt(long = "mtu")]
    mtu: Option<usize>,
}
