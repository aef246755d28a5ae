use crate::layer::{arp, eth, ip, Error};
use crate::nic::external::External;
use crate::storage::Buffer;
use crate::time::{Duration, Instant};
use crate::wire::{self, ethernet, ipv4, IpProtocol};

const MAC_ADDR_HOST: ethernet::Address = ethernet::Address([0, 1, 2, 3, 4, 5]);
const IP_ADDR_HOST: ipv4::Address = ipv4::Address::new(10, 0, 0, 1);
const MAC_ADDR_OTHER: ethernet::Address = ethernet::Address([6, 5, 4, 3, 2, 1]);
const IP_ADDR_OTHER: ipv4::Address = ipv4::Address::new(10, 0, 0, 2);

struct Stack {
    nic: External,
    eth: eth::Endpoint,
    arp: arp::Endpoint,
    ip: ip::Endpoint,
}

impl Stack {
    fn new(mtu: usize) -> Self {
        let mut arp = arp::Endpoint::new(
            IP_ADDR_HOST,
            arp::NeighborCache::new(4, Duration::from_secs(300)),
            arp::PendingQueue::new(4, Duration::from_secs(1)));
        arp.neighbors_mut().fill(IP_ADDR_OTHER, MAC_ADDR_OTHER, None).unwrap();

        let mut ip = ip::Endpoint::new(IP_ADDR_HOST, mtu, 64);
        ip.register(IpProtocol::Udp, ip::Upper::Udp).unwrap();
        ip.register(IpProtocol::Icmp, ip::Upper::Icmp).unwrap();

        Stack {
            nic: External::new(),
            eth: eth::Endpoint::new(MAC_ADDR_HOST),
            arp,
            ip,
        }
    }

    fn send(&mut self, payload: &[u8], dst_addr: ipv4::Address) -> crate::layer::Result<arp::Outcome> {
        let now = Instant::from_secs(0);
        self.ip.sender(self.arp.sender(self.eth.sender(&mut self.nic), now))
            .datagram_out(Buffer::from_slice(payload), dst_addr, IpProtocol::Udp)
    }
}

fn datagram(protocol: IpProtocol, dst_addr: ipv4::Address, payload: &[u8]) -> Vec<u8> {
    let repr = ipv4::Repr {
        src_addr: IP_ADDR_OTHER,
        dst_addr,
        protocol,
        payload_len: payload.len(),
        hop_limit: 64,
        ident: 0x1234,
        more_frags: false,
        frag_offset: 0,
    };
    let mut bytes = vec![0; repr.buffer_len() + payload.len()];
    let packet = ipv4::ipv4::new_unchecked_mut(&mut bytes);
    packet.as_bytes_mut()[ipv4::HEADER_LEN..].copy_from_slice(payload);
    repr.emit(packet);
    bytes
}

/// Sent ip datagrams, with their ethernet header checked and removed.
fn sent_datagrams(nic: &mut External) -> Vec<Vec<u8>> {
    nic.take_sent()
        .into_iter()
        .map(|frame| {
            let frame = ethernet::ethernet::new_checked(&frame).unwrap();
            assert_eq!(frame.dst_addr(), MAC_ADDR_OTHER);
            assert_eq!(frame.ethertype(), ethernet::EtherType::Ipv4);
            let packet = ipv4::ipv4::new_checked(frame.payload_slice()).unwrap();
            packet.as_bytes()[..usize::from(packet.total_len())].to_vec()
        })
        .collect()
}

#[test]
fn delivers_and_strips_padding() {
    let stack = Stack::new(1500);
    let mut bytes = datagram(IpProtocol::Udp, IP_ADDR_HOST, &[1, 2, 3, 4]);
    bytes.extend_from_slice(&[0; 22]);
    let mut buffer = Buffer::from_slice(&bytes);

    let inbound = stack.ip.datagram_in(&mut buffer, MAC_ADDR_OTHER).unwrap();
    match inbound {
        ip::Inbound::Deliver { repr, header_len, upper } => {
            assert_eq!(repr.src_addr, IP_ADDR_OTHER);
            assert_eq!(repr.payload_len, 4);
            assert_eq!(header_len, 20);
            assert_eq!(upper, ip::Upper::Udp);
        },
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(buffer.as_slice(), &[1, 2, 3, 4]);
}

#[test]
fn drops_bad_checksum() {
    let stack = Stack::new(1500);
    let mut bytes = datagram(IpProtocol::Udp, IP_ADDR_HOST, &[1, 2, 3, 4]);
    bytes[10] ^= 0xff;

    let mut buffer = Buffer::from_slice(&bytes);
    assert_eq!(stack.ip.datagram_in(&mut buffer, MAC_ADDR_OTHER), Err(wire::Error::WrongChecksum));
}

#[test]
fn drops_malformed() {
    let stack = Stack::new(1500);

    let mut buffer = Buffer::from_slice(&[0x45; 19]);
    assert_eq!(stack.ip.datagram_in(&mut buffer, MAC_ADDR_OTHER), Err(wire::Error::Truncated));

    let mut bytes = datagram(IpProtocol::Udp, IP_ADDR_HOST, &[1, 2, 3, 4]);
    bytes[0] = 0x65;
    let mut buffer = Buffer::from_slice(&bytes);
    assert_eq!(stack.ip.datagram_in(&mut buffer, MAC_ADDR_OTHER), Err(wire::Error::Unrecognized));

    let bytes = datagram(IpProtocol::Udp, IP_ADDR_HOST, &[1, 2, 3, 4]);
    let mut buffer = Buffer::from_slice(&bytes[..22]);
    assert_eq!(stack.ip.datagram_in(&mut buffer, MAC_ADDR_OTHER), Err(wire::Error::Truncated));
}

#[test]
fn ignores_foreign_destination() {
    let stack = Stack::new(1500);
    let bytes = datagram(IpProtocol::Udp, ipv4::Address::new(10, 0, 0, 3), &[1, 2, 3, 4]);
    let mut buffer = Buffer::from_slice(&bytes);
    assert_eq!(stack.ip.datagram_in(&mut buffer, MAC_ADDR_OTHER), Ok(ip::Inbound::Ignored));
}

#[test]
fn unknown_protocol_keeps_datagram() {
    let stack = Stack::new(1500);
    let bytes = datagram(IpProtocol::Tcp, IP_ADDR_HOST, &[1, 2, 3, 4]);
    let mut buffer = Buffer::from_slice(&bytes);

    match stack.ip.datagram_in(&mut buffer, MAC_ADDR_OTHER) {
        Ok(ip::Inbound::Unreachable { repr }) => assert_eq!(repr.protocol, IpProtocol::Tcp),
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(buffer.as_slice(), &bytes[..]);
}

#[test]
fn single_datagram() {
    let mut stack = Stack::new(1500);
    assert_eq!(stack.send(&[0xaa; 100], IP_ADDR_OTHER), Ok(arp::Outcome::Sent));

    let sent = sent_datagrams(&mut stack.nic);
    assert_eq!(sent.len(), 1);
    let packet = ipv4::ipv4::new_checked(&sent[0]).unwrap();
    let repr = ipv4::Repr::parse(packet).unwrap();
    assert_eq!(repr.src_addr, IP_ADDR_HOST);
    assert_eq!(repr.dst_addr, IP_ADDR_OTHER);
    assert_eq!(repr.protocol, IpProtocol::Udp);
    assert_eq!(repr.hop_limit, 64);
    assert!(!repr.more_frags);
    assert!(!packet.dont_frag());
    assert_eq!(repr.frag_offset, 0);
    assert_eq!(packet.payload_slice(), &[0xaa; 100][..]);
}

#[test]
fn fragments_large_datagram() {
    let mut stack = Stack::new(1500);
    let payload: Vec<u8> = (0..1608u32).map(|i| i as u8).collect();
    assert_eq!(stack.send(&payload, IP_ADDR_OTHER), Ok(arp::Outcome::Sent));

    let sent = sent_datagrams(&mut stack.nic);
    assert_eq!(sent.len(), 2);

    let first = ipv4::Repr::parse(ipv4::ipv4::new_checked(&sent[0]).unwrap()).unwrap();
    let second = ipv4::Repr::parse(ipv4::ipv4::new_checked(&sent[1]).unwrap()).unwrap();
    assert!(first.more_frags);
    assert_eq!(first.frag_offset, 0);
    assert_eq!(first.payload_len, 1480);
    assert!(!second.more_frags);
    assert_eq!(second.frag_offset, 1480);
    assert_eq!(second.payload_len, 128);
    assert_eq!(first.ident, second.ident);

    let mut reassembled = vec![0; 1608];
    for datagram in &sent {
        let packet = ipv4::ipv4::new_checked(datagram).unwrap();
        let offset = usize::from(packet.frag_offset());
        let data = packet.payload_slice();
        reassembled[offset..offset + data.len()].copy_from_slice(data);
    }
    assert_eq!(reassembled, payload);
}

#[test]
fn fragment_boundaries() {
    let mut stack = Stack::new(1500);

    stack.send(&[1; 1480], IP_ADDR_OTHER).unwrap();
    assert_eq!(sent_datagrams(&mut stack.nic).len(), 1);

    stack.send(&[2; 1481], IP_ADDR_OTHER).unwrap();
    let sent = sent_datagrams(&mut stack.nic);
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[1].len(), 20 + 1);

    stack.send(&[3; 2960], IP_ADDR_OTHER).unwrap();
    let sent = sent_datagrams(&mut stack.nic);
    assert_eq!(sent.len(), 2);
    assert!(sent.iter().all(|datagram| datagram.len() == 1500));
}

#[test]
fn fragments_align_to_eight() {
    let mut stack = Stack::new(1001);
    let payload = vec![7; 2000];
    stack.send(&payload, IP_ADDR_OTHER).unwrap();

    let sent = sent_datagrams(&mut stack.nic);
    let offsets: Vec<u16> = sent.iter()
        .map(|datagram| ipv4::ipv4::new_checked(datagram).unwrap().frag_offset())
        .collect();
    assert_eq!(offsets, [0, 976, 1952]);
    assert!(sent.iter().all(|datagram| datagram.len() <= 1001));
}

#[test]
fn ident_advances_per_datagram() {
    let mut stack = Stack::new(1500);
    assert_eq!(stack.ip.next_ident(), 0);
    stack.send(&[0; 3000], IP_ADDR_OTHER).unwrap();
    stack.send(&[0; 10], IP_ADDR_OTHER).unwrap();
    assert_eq!(stack.ip.next_ident(), 2);

    let idents: Vec<u16> = sent_datagrams(&mut stack.nic).iter()
        .map(|datagram| ipv4::ipv4::new_checked(datagram).unwrap().ident())
        .collect();
    assert_eq!(idents, [0, 0, 0, 1]);
}

#[test]
fn unresolved_fragments_follow_pending_policy() {
    let mut stack = Stack::new(1500);
    let unresolved = ipv4::Address::new(10, 0, 0, 7);

    assert_eq!(stack.send(&[0; 2000], unresolved), Ok(arp::Outcome::Queued));
    // Only the arp request left, the second fragment was discarded.
    assert_eq!(stack.nic.take_sent().len(), 1);
    assert_eq!(stack.arp.pending().len(), 1);
}

#[test]
fn rejects_unaligned_offset() {
    let mut stack = Stack::new(1500);
    let now = Instant::from_secs(0);
    let result = stack.ip.sender(stack.arp.sender(stack.eth.sender(&mut stack.nic), now))
        .fragment_out(Buffer::from_slice(&[0; 8]), IP_ADDR_OTHER, IpProtocol::Udp, 0, 4, true);
    assert_eq!(result, Err(Error::Illegal));
}
