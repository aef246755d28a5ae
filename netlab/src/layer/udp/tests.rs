use std::cell::RefCell;
use std::rc::Rc;

use crate::layer::{arp, eth, ip, udp, Error, FnHandler};
use crate::nic::external::External;
use crate::storage::Buffer;
use crate::time::{Duration, Instant};
use crate::wire::{self, ethernet, ipv4, udp as udp_wire};

const MAC_ADDR_HOST: ethernet::Address = ethernet::Address([0, 1, 2, 3, 4, 5]);
const IP_ADDR_HOST: ipv4::Address = ipv4::Address::new(127, 0, 0, 1);
const MAC_ADDR_OTHER: ethernet::Address = ethernet::Address([6, 5, 4, 3, 2, 1]);
const IP_ADDR_OTHER: ipv4::Address = ipv4::Address::new(127, 0, 0, 2);

static PAYLOAD_BYTES: [u8; 13] =
    [0xaa, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
     0x00, 0x00, 0x00, 0x00, 0xff];

type Seen = Rc<RefCell<Vec<(Vec<u8>, ipv4::Address, u16)>>>;

/// A handler recording what it saw and echoing the payload.
fn echo(seen: &Seen) -> Box<dyn udp::Recv> {
    let seen = seen.clone();
    Box::new(FnHandler(move |mut packet: udp::Packet| {
        seen.borrow_mut().push((packet.payload.to_vec(), packet.src_addr, packet.src_port));
        let data = packet.payload.to_vec();
        packet.answer(&data);
    }))
}

/// A received udp datagram with its ip header already stripped.
fn inbound(dst_port: u16, payload: &[u8], checksum: bool) -> (Buffer, ipv4::Repr) {
    let udp_repr = udp_wire::Repr {
        src_port: 4000,
        dst_port,
        length: (udp_wire::HEADER_LEN + payload.len()) as u16,
    };
    let ip_repr = ipv4::Repr {
        src_addr: IP_ADDR_OTHER,
        dst_addr: IP_ADDR_HOST,
        protocol: wire::IpProtocol::Udp,
        payload_len: usize::from(udp_repr.length),
        hop_limit: 64,
        ident: 1,
        more_frags: false,
        frag_offset: 0,
    };

    let mut bytes = vec![0; ipv4::HEADER_LEN + usize::from(udp_repr.length)];
    bytes[ipv4::HEADER_LEN + udp_wire::HEADER_LEN..].copy_from_slice(payload);
    {
        let packet = udp_wire::udp::new_unchecked_mut(&mut bytes[ipv4::HEADER_LEN..]);
        udp_repr.emit(packet, IP_ADDR_OTHER, IP_ADDR_HOST);
        if !checksum {
            packet.set_checksum(0);
        }
    }
    ip_repr.emit(ipv4::ipv4::new_unchecked_mut(&mut bytes[..ipv4::HEADER_LEN]));

    let mut buffer = Buffer::from_slice(&bytes);
    buffer.remove_header(ipv4::HEADER_LEN).unwrap();
    (buffer, ip_repr)
}

#[test]
fn delivers_to_handler() {
    let seen = Seen::default();
    let mut udp = udp::Endpoint::new(4);
    udp.open(80, echo(&seen)).unwrap();

    let (mut buffer, ip_repr) = inbound(80, &PAYLOAD_BYTES, true);
    let result = udp.datagram_in(&mut buffer, &ip_repr, ipv4::HEADER_LEN).unwrap();

    match result {
        udp::Inbound::Delivered { repr, answer } => {
            assert_eq!(repr.src_port, 4000);
            assert_eq!(repr.dst_port, 80);
            assert_eq!(answer.as_ref().map(Vec::as_slice), Some(&PAYLOAD_BYTES[..]));
        },
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(*seen.borrow(), [(PAYLOAD_BYTES.to_vec(), IP_ADDR_OTHER, 4000)]);
}

#[test]
fn drops_zero_checksum() {
    let seen = Seen::default();
    let mut udp = udp::Endpoint::new(4);
    udp.open(80, echo(&seen)).unwrap();

    let (mut buffer, ip_repr) = inbound(80, &PAYLOAD_BYTES, false);
    assert_eq!(udp.datagram_in(&mut buffer, &ip_repr, ipv4::HEADER_LEN),
        Err(wire::Error::WrongChecksum));
    assert!(seen.borrow().is_empty());
}

#[test]
fn port_zero_is_unreachable() {
    let seen = Seen::default();
    let mut udp = udp::Endpoint::new(4);
    udp.open(80, echo(&seen)).unwrap();

    let (mut buffer, ip_repr) = inbound(0, &PAYLOAD_BYTES, true);
    match udp.datagram_in(&mut buffer, &ip_repr, ipv4::HEADER_LEN) {
        Ok(udp::Inbound::PortUnreachable { repr }) => assert_eq!(repr.dst_port, 0),
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(buffer.len(), ipv4::HEADER_LEN + udp_wire::HEADER_LEN + PAYLOAD_BYTES.len());
    assert!(seen.borrow().is_empty());
}

#[test]
fn drops_bad_checksum() {
    let seen = Seen::default();
    let mut udp = udp::Endpoint::new(4);
    udp.open(80, echo(&seen)).unwrap();

    let (mut buffer, ip_repr) = inbound(80, &PAYLOAD_BYTES, true);
    buffer.as_mut_slice()[9] ^= 0x01;
    assert_eq!(udp.datagram_in(&mut buffer, &ip_repr, ipv4::HEADER_LEN),
        Err(wire::Error::WrongChecksum));

    let mut buffer = Buffer::from_slice(&[0; 7]);
    assert_eq!(udp.datagram_in(&mut buffer, &ip_repr, ipv4::HEADER_LEN),
        Err(wire::Error::Truncated));
    assert!(seen.borrow().is_empty());
}

#[test]
fn unreachable_restores_datagram() {
    let seen = Seen::default();
    let mut udp = udp::Endpoint::new(4);
    udp.open(80, echo(&seen)).unwrap();
    assert!(udp.close(80));
    assert!(!udp.close(80));

    let (mut buffer, ip_repr) = inbound(80, &PAYLOAD_BYTES, true);
    let result = udp.datagram_in(&mut buffer, &ip_repr, ipv4::HEADER_LEN).unwrap();
    match result {
        udp::Inbound::PortUnreachable { repr } => assert_eq!(repr.dst_port, 80),
        other => panic!("unexpected {:?}", other),
    }

    let packet = ipv4::ipv4::new_checked(buffer.as_slice()).unwrap();
    assert_eq!(ipv4::Repr::parse(packet), Ok(ip_repr));
    assert!(seen.borrow().is_empty());
}

#[test]
fn port_table() {
    let seen = Seen::default();
    let mut udp = udp::Endpoint::new(1);
    assert_eq!(udp.open(0, echo(&seen)), Err(Error::Illegal));
    udp.open(53, echo(&seen)).unwrap();
    // Reopening overwrites silently.
    udp.open(53, echo(&seen)).unwrap();
    assert_eq!(udp.open(54, echo(&seen)), Err(Error::Exhausted));
    assert!(udp.is_open(53));
    assert!(!udp.is_open(54));
}

#[test]
fn sends_with_checksum() {
    let mut nic = External::new();
    let eth = eth::Endpoint::new(MAC_ADDR_HOST);
    let mut arp = arp::Endpoint::new(
        IP_ADDR_HOST,
        arp::NeighborCache::new(1, Duration::from_secs(300)),
        arp::PendingQueue::new(1, Duration::from_secs(1)));
    arp.neighbors_mut().fill(IP_ADDR_OTHER, MAC_ADDR_OTHER, None).unwrap();
    let mut ip = ip::Endpoint::new(IP_ADDR_HOST, 1500, 64);

    let now = Instant::from_secs(0);
    let outcome = udp::Sender::new(ip.sender(arp.sender(eth.sender(&mut nic), now)))
        .datagram_out(Buffer::from_slice(&PAYLOAD_BYTES), 80, IP_ADDR_OTHER, 8080)
        .unwrap();
    assert_eq!(outcome, arp::Outcome::Sent);

    let sent = nic.take_sent();
    assert_eq!(sent.len(), 1);
    let frame = ethernet::ethernet::new_checked(&sent[0]).unwrap();
    let packet = ipv4::ipv4::new_checked(frame.payload_slice()).unwrap();
    let ip_repr = ipv4::Repr::parse(packet).unwrap();
    assert_eq!(ip_repr.protocol, wire::IpProtocol::Udp);
    assert_eq!(ip_repr.payload_len, udp_wire::HEADER_LEN + PAYLOAD_BYTES.len());

    let datagram = udp_wire::udp::new_checked(packet.payload_slice()).unwrap();
    assert_eq!(udp_wire::Repr::parse(datagram, IP_ADDR_HOST, IP_ADDR_OTHER), Ok(udp_wire::Repr {
        src_port: 80,
        dst_port: 8080,
        length: 21,
    }));
    assert!(datagram.verify_checksum(IP_ADDR_HOST, IP_ADDR_OTHER));
    assert_ne!(datagram.checksum(), 0);
    assert_eq!(datagram.payload_slice(), &PAYLOAD_BYTES[..]);
}
