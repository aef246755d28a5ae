use core::{fmt, str::FromStr};
use byteorder::{ByteOrder, NetworkEndian};

use super::{Error, Result};
use super::checksum;
use super::field::Field;

enum_with_unknown! {
    /// The protocol number carried in the ip header.
    ///
    /// Icmp and udp have handlers. Tcp is named only so that logs read well; it has no handler
    /// and is answered with protocol unreachable like any other number.
    pub enum Protocol(u8) {
        Icmp = 1,
        Tcp  = 6,
        Udp  = 17,
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Protocol::Icmp => f.write_str("icmp"),
            Protocol::Tcp => f.write_str("tcp"),
            Protocol::Udp => f.write_str("udp"),
            Protocol::Unknown(id) => write!(f, "proto {}", id),
        }
    }
}

/// A four-octet IPv4 address.
#[derive(Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Default)]
pub struct Address(pub [u8; 4]);

impl Address {
    /// The limited broadcast address, 255.255.255.255.
    pub const BROADCAST: Address = Address([0xff; 4]);

    pub const fn new(a0: u8, a1: u8, a2: u8, a3: u8) -> Address {
        Address([a0, a1, a2, a3])
    }

    /// Read an address from network order octets.
    ///
    /// # Panics
    /// When `data` is not exactly four octets long.
    pub fn from_bytes(data: &[u8]) -> Address {
        let mut bytes = [0; 4];
        bytes.copy_from_slice(data);
        Address(bytes)
    }

    /// The octets in network order.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn is_broadcast(&self) -> bool {
        *self == Self::BROADCAST
    }
}

#[cfg(feature = "std")]
impl From<::std::net::Ipv4Addr> for Address {
    fn from(x: ::std::net::Ipv4Addr) -> Address {
        Address(x.octets())
    }
}

#[cfg(feature = "std")]
impl From<Address> for ::std::net::Ipv4Addr {
    fn from(Address(x): Address) -> ::std::net::Ipv4Addr {
        x.into()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let [a, b, c, d] = self.0;
        write!(f, "{}.{}.{}.{}", a, b, c, d)
    }
}

/// The address did not consist of four decimal octets separated by dots.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParseAddressError;

impl fmt::Display for ParseAddressError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("invalid IPv4 address, expected four dot-separated octets")
    }
}

impl FromStr for Address {
    type Err = ParseAddressError;

    fn from_str(src: &str) -> core::result::Result<Self, ParseAddressError> {
        let mut parsed = [0; 4];
        let mut components = src.split('.');
        for c in parsed.iter_mut() {
            let part = components.next().ok_or(ParseAddressError)?;
            *c = part.parse().map_err(|_| ParseAddressError)?;
        }

        match components.next() {
            Some(_) => Err(ParseAddressError),
            None => Ok(Address(parsed)),
        }
    }
}

byte_wrapper! {
    /// An IPv4 datagram, header options included.
    #[derive(Debug, PartialEq, Eq)]
    pub struct ipv4([u8]);
}

mod field {
    use crate::wire::field::Field;

    pub(crate) const VER_IHL:  usize = 0;
    pub(crate) const DSCP_ECN: usize = 1;
    pub(crate) const LENGTH:   Field = 2..4;
    pub(crate) const IDENT:    Field = 4..6;
    pub(crate) const FLG_OFF:  Field = 6..8;
    pub(crate) const TTL:      usize = 8;
    pub(crate) const PROTOCOL: usize = 9;
    pub(crate) const CHECKSUM: Field = 10..12;
    pub(crate) const SRC_ADDR: Field = 12..16;
    pub(crate) const DST_ADDR: Field = 16..20;

    /// Flag bits of the `FLG_OFF` word.
    pub(crate) const DONT_FRAG:  u16 = 0x4000;
    pub(crate) const MORE_FRAGS: u16 = 0x2000;
    pub(crate) const OFFSET:     u16 = 0x1fff;
}

/// The length of the fixed IPv4 header, without options.
pub const HEADER_LEN: usize = field::DST_ADDR.end;

impl ipv4 {
    /// Imbue a raw octet buffer with IPv4 packet structure.
    pub fn new_unchecked(buffer: &[u8]) -> &ipv4 {
        Self::__from_macro_new_unchecked(buffer)
    }

    /// Imbue a mutable octet buffer with IPv4 packet structure.
    pub fn new_unchecked_mut(buffer: &mut [u8]) -> &mut ipv4 {
        Self::__from_macro_new_unchecked_mut(buffer)
    }

    /// Shorthand for a combination of [new_unchecked] and [check_len].
    ///
    /// [new_unchecked]: #method.new_unchecked
    /// [check_len]: #method.check_len
    pub fn new_checked(data: &[u8]) -> Result<&ipv4> {
        let packet = Self::new_unchecked(data);
        packet.check_len()?;
        Ok(packet)
    }

    /// View the packet as a raw byte slice.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// View the packet as a mutable raw byte slice.
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.0
    }

    /// Ensure that no accessor method will panic if called.
    /// Returns `Err(Error::Truncated)` if the buffer is too short for the fixed header, the
    /// declared header or the declared total length.
    /// Returns `Err(Error::Malformed)` if the header length is smaller than the fixed header or
    /// greater than total length.
    ///
    /// The result of this check is invalidated by calling [set_header_len]
    /// and [set_total_len].
    ///
    /// [set_header_len]: #method.set_header_len
    /// [set_total_len]: #method.set_total_len
    pub fn check_len(&self) -> Result<()> {
        let len = self.0.len();
        if len < field::DST_ADDR.end {
            Err(Error::Truncated)
        } else if usize::from(self.header_len()) < field::DST_ADDR.end {
            Err(Error::Malformed)
        } else if len < usize::from(self.header_len()) {
            Err(Error::Truncated)
        } else if u16::from(self.header_len()) > self.total_len() {
            Err(Error::Malformed)
        } else if len < usize::from(self.total_len()) {
            Err(Error::Truncated)
        } else {
            Ok(())
        }
    }

    #[inline]
    pub fn version(&self) -> u8 {
        self.0[field::VER_IHL] >> 4
    }

    /// The header length in octets, from the IHL nibble.
    #[inline]
    pub fn header_len(&self) -> u8 {
        (self.0[field::VER_IHL] & 0x0f) * 4
    }

    /// The length of header and payload together.
    #[inline]
    pub fn total_len(&self) -> u16 {
        NetworkEndian::read_u16(&self.0[field::LENGTH])
    }

    #[inline]
    pub fn ident(&self) -> u16 {
        NetworkEndian::read_u16(&self.0[field::IDENT])
    }

    #[inline]
    pub fn dont_frag(&self) -> bool {
        self.flags_and_offset() & field::DONT_FRAG != 0
    }

    #[inline]
    pub fn more_frags(&self) -> bool {
        self.flags_and_offset() & field::MORE_FRAGS != 0
    }

    /// The fragment offset, converted from 8-octet units to octets.
    #[inline]
    pub fn frag_offset(&self) -> u16 {
        (self.flags_and_offset() & field::OFFSET) << 3
    }

    #[inline]
    pub fn hop_limit(&self) -> u8 {
        self.0[field::TTL]
    }

    #[inline]
    pub fn protocol(&self) -> Protocol {
        Protocol::from(self.0[field::PROTOCOL])
    }

    #[inline]
    pub fn checksum(&self) -> u16 {
        NetworkEndian::read_u16(&self.0[field::CHECKSUM])
    }

    #[inline]
    pub fn src_addr(&self) -> Address {
        Address::from_bytes(&self.0[field::SRC_ADDR])
    }

    #[inline]
    pub fn dst_addr(&self) -> Address {
        Address::from_bytes(&self.0[field::DST_ADDR])
    }

    /// Check the header checksum, options included.
    pub fn verify_checksum(&self) -> bool {
        checksum::data(&self.0[..usize::from(self.header_len())]) == !0
    }

    fn flags_and_offset(&self) -> u16 {
        NetworkEndian::read_u16(&self.0[field::FLG_OFF])
    }

    #[inline]
    pub fn set_version(&mut self, value: u8) {
        self.0[field::VER_IHL] = (self.0[field::VER_IHL] & 0x0f) | (value << 4);
    }

    /// Set the header length in octets. Only multiples of 4 are representable.
    #[inline]
    pub fn set_header_len(&mut self, value: u8) {
        self.0[field::VER_IHL] = (self.0[field::VER_IHL] & 0xf0) | ((value / 4) & 0x0f);
    }

    #[inline]
    pub fn set_total_len(&mut self, value: u16) {
        NetworkEndian::write_u16(&mut self.0[field::LENGTH], value)
    }

    #[inline]
    pub fn set_ident(&mut self, value: u16) {
        NetworkEndian::write_u16(&mut self.0[field::IDENT], value)
    }

    /// Overwrite the whole flags and offset word.
    ///
    /// The "don't fragment" and reserved bits end up cleared. `offset` is in octets and must be a
    /// multiple of 8.
    #[inline]
    pub fn set_fragment(&mut self, more_frags: bool, offset: u16) {
        let mut raw = (offset >> 3) & field::OFFSET;
        if more_frags {
            raw |= field::MORE_FRAGS;
        }
        NetworkEndian::write_u16(&mut self.0[field::FLG_OFF], raw);
    }

    #[inline]
    pub fn set_hop_limit(&mut self, value: u8) {
        self.0[field::TTL] = value
    }

    #[inline]
    pub fn set_protocol(&mut self, value: Protocol) {
        self.0[field::PROTOCOL] = value.into()
    }

    #[inline]
    pub fn set_checksum(&mut self, value: u16) {
        NetworkEndian::write_u16(&mut self.0[field::CHECKSUM], value)
    }

    #[inline]
    pub fn set_src_addr(&mut self, value: Address) {
        self.0[field::SRC_ADDR].copy_from_slice(value.as_bytes())
    }

    #[inline]
    pub fn set_dst_addr(&mut self, value: Address) {
        self.0[field::DST_ADDR].copy_from_slice(value.as_bytes())
    }

    /// Recompute the header checksum over the current header length.
    pub fn fill_checksum(&mut self) {
        self.set_checksum(0);
        let checksum = !checksum::data(&self.0[..usize::from(self.header_len())]);
        self.set_checksum(checksum)
    }

    /// Compute the range of the payload without accessing it.
    pub fn payload_range(&self) -> Field {
        let header_end = usize::from(self.header_len());
        let total_len = usize::from(self.total_len());
        header_end..total_len
    }

    /// Return the payload as a byte slice.
    pub fn payload_slice(&self) -> &[u8] {
        let range = self.payload_range();
        &self.0[range]
    }

    /// Return the payload as a mutable byte slice.
    pub fn payload_mut_slice(&mut self) -> &mut [u8] {
        let range = self.payload_range();
        &mut self.0[range]
    }
}

impl AsRef<[u8]> for ipv4 {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl AsMut<[u8]> for ipv4 {
    fn as_mut(&mut self) -> &mut [u8] {
        &mut self.0
    }
}

/// A high-level representation of an Internet Protocol version 4 packet header.
///
/// Fragmentation fields are part of the representation. Incoming fragments are not reassembled,
/// each one is handed upwards as if it were a complete datagram.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Repr {
    /// The source of the packet.
    pub src_addr:    Address,
    /// The destination of the packet.
    pub dst_addr:    Address,
    /// The encapsulated protocol identifier.
    pub protocol:    Protocol,
    /// The length of the payload.
    pub payload_len: usize,
    /// The remaining hop limit of the packet.
    pub hop_limit:   u8,
    /// The identification shared by all fragments of one datagram.
    pub ident:       u16,
    /// Whether further fragments follow this one.
    pub more_frags:  bool,
    /// The offset of this fragment's payload within the datagram, a multiple of 8.
    pub frag_offset: u16,
}

impl Repr {
    /// Parse an Internet Protocol version 4 packet and return a high-level representation.
    ///
    /// The checksum is always verified. Checks happen in the order: fixed header length,
    /// version, declared lengths, checksum.
    pub fn parse(packet: &ipv4) -> Result<Repr> {
        if packet.as_bytes().len() < field::DST_ADDR.end { return Err(Error::Truncated) }
        // Version 4 is expected.
        if packet.version() != 4 { return Err(Error::Unrecognized) }
        packet.check_len()?;
        // Valid checksum is expected.
        if !packet.verify_checksum() { return Err(Error::WrongChecksum) }

        let payload_len = packet.total_len() as usize - packet.header_len() as usize;

        // All TOS values are acceptable, since they are of no concern to receiving endpoint.
        // All TTL values are acceptable, since we do not perform routing.
        Ok(Repr {
            src_addr:    packet.src_addr(),
            dst_addr:    packet.dst_addr(),
            protocol:    packet.protocol(),
            payload_len,
            hop_limit:   packet.hop_limit(),
            ident:       packet.ident(),
            more_frags:  packet.more_frags(),
            frag_offset: packet.frag_offset(),
        })
    }

    /// Return the length of a header that will be emitted from this high-level representation.
    pub fn buffer_len(&self) -> usize {
        // We never emit any options.
        field::DST_ADDR.end
    }

    /// Emit a high-level representation into an Internet Protocol version 4 packet.
    ///
    /// The "don't fragment" flag is never set. The checksum is filled last.
    pub fn emit(&self, packet: &mut ipv4) {
        packet.set_version(4);
        packet.set_header_len(field::DST_ADDR.end as u8);
        packet.0[field::DSCP_ECN] = 0;
        let total_len = packet.header_len() as u16 + self.payload_len as u16;
        packet.set_total_len(total_len);
        packet.set_ident(self.ident);
        packet.set_fragment(self.more_frags, self.frag_offset);
        packet.set_hop_limit(self.hop_limit);
        packet.set_protocol(self.protocol);
        packet.set_src_addr(self.src_addr);
        packet.set_dst_addr(self.dst_addr);
        packet.fill_checksum();
    }
}

impl fmt::Display for Repr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "IPv4 src={} dst={} proto={} len={}",
               self.src_addr, self.dst_addr, self.protocol, self.payload_len)?;
        if self.more_frags || self.frag_offset != 0 {
            write!(f, " id={} off={}", self.ident, self.frag_offset)?;
            if self.more_frags {
                write!(f, " mf")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    static PACKET_BYTES: [u8; 30] =
        [0x45, 0x00, 0x00, 0x1e,
         0x01, 0x02, 0x22, 0x03,
         0x1a, 0x01, 0x15, 0x6f,
         0x11, 0x12, 0x13, 0x14,
         0x21, 0x22, 0x23, 0x24,
         0xaa, 0x00, 0x00, 0x00,
         0x00, 0x00, 0x00, 0x00,
         0x00, 0xff];

    static PAYLOAD_BYTES: [u8; 10] =
        [0xaa, 0x00, 0x00, 0x00,
         0x00, 0x00, 0x00, 0x00,
         0x00, 0xff];

    #[test]
    fn test_deconstruct() {
        let packet = ipv4::new_unchecked(&PACKET_BYTES[..]);
        assert_eq!(packet.version(), 4);
        assert_eq!(packet.header_len(), 20);
        assert_eq!(packet.total_len(), 30);
        assert_eq!(packet.ident(), 0x102);
        assert_eq!(packet.more_frags(), true);
        assert_eq!(packet.dont_frag(), false);
        assert_eq!(packet.frag_offset(), 0x203 * 8);
        assert_eq!(packet.hop_limit(), 0x1a);
        assert_eq!(packet.protocol(), Protocol::Icmp);
        assert_eq!(packet.checksum(), 0x156f);
        assert_eq!(packet.src_addr(), Address([0x11, 0x12, 0x13, 0x14]));
        assert_eq!(packet.dst_addr(), Address([0x21, 0x22, 0x23, 0x24]));
        assert_eq!(packet.verify_checksum(), true);
        assert_eq!(packet.payload_slice(), &PAYLOAD_BYTES[..]);
    }

    #[test]
    fn test_construct() {
        let mut bytes = vec![0xa5; 30];
        let packet = ipv4::new_unchecked_mut(&mut bytes);
        packet.set_version(4);
        packet.set_header_len(20);
        packet.as_bytes_mut()[1] = 0;
        packet.set_total_len(30);
        packet.set_ident(0x102);
        packet.set_fragment(true, 0x203 * 8);
        packet.set_hop_limit(0x1a);
        packet.set_protocol(Protocol::Icmp);
        packet.set_src_addr(Address([0x11, 0x12, 0x13, 0x14]));
        packet.set_dst_addr(Address([0x21, 0x22, 0x23, 0x24]));
        packet.fill_checksum();
        packet.payload_mut_slice().copy_from_slice(&PAYLOAD_BYTES[..]);
        assert_eq!(packet.as_bytes(), &PACKET_BYTES[..]);
    }

    #[test]
    fn test_overlong() {
        let mut bytes = vec![];
        bytes.extend(&PACKET_BYTES[..]);
        bytes.push(0);

        assert_eq!(ipv4::new_unchecked(&bytes).payload_slice().len(),
                   PAYLOAD_BYTES.len());
    }

    #[test]
    fn test_total_len_overflow() {
        let mut bytes = vec![];
        bytes.extend(&PACKET_BYTES[..]);
        ipv4::new_unchecked_mut(&mut bytes).set_total_len(128);

        assert_eq!(ipv4::new_checked(&bytes), Err(Error::Truncated));
    }

    static REPR_PACKET_BYTES: [u8; 24] =
        [0x45, 0x00, 0x00, 0x18,
         0x00, 0x00, 0x00, 0x00,
         0x40, 0x01, 0x12, 0x7a,
         0x11, 0x12, 0x13, 0x14,
         0x21, 0x22, 0x23, 0x24,
         0xaa, 0x00, 0x00, 0xff];

    static REPR_PAYLOAD_BYTES: [u8; 4] =
        [0xaa, 0x00, 0x00, 0xff];

    fn packet_repr() -> Repr {
        Repr {
            src_addr:    Address([0x11, 0x12, 0x13, 0x14]),
            dst_addr:    Address([0x21, 0x22, 0x23, 0x24]),
            protocol:    Protocol::Icmp,
            payload_len: 4,
            hop_limit:   64,
            ident:       0,
            more_frags:  false,
            frag_offset: 0,
        }
    }

    #[test]
    fn test_parse() {
        let packet = ipv4::new_unchecked(&REPR_PACKET_BYTES[..]);
        let repr = Repr::parse(&packet).unwrap();
        assert_eq!(repr, packet_repr());
    }

    #[test]
    fn test_parse_bad_version() {
        let mut bytes = vec![0; 24];
        bytes.copy_from_slice(&REPR_PACKET_BYTES[..]);
        let packet = ipv4::new_unchecked_mut(&mut bytes);
        packet.set_version(6);
        packet.fill_checksum();
        assert_eq!(Repr::parse(packet), Err(Error::Unrecognized));
    }

    #[test]
    fn test_parse_bad_checksum() {
        let mut bytes = vec![0; 24];
        bytes.copy_from_slice(&REPR_PACKET_BYTES[..]);
        bytes[11] ^= 0x01;
        assert_eq!(Repr::parse(ipv4::new_unchecked(&bytes)), Err(Error::WrongChecksum));
    }

    #[test]
    fn test_parse_header_len_exceeds_buffer() {
        let mut bytes = vec![0; 24];
        bytes.copy_from_slice(&REPR_PACKET_BYTES[..]);
        // Claims a 60 byte header.
        bytes[0] = 0x4f;
        assert_eq!(Repr::parse(ipv4::new_unchecked(&bytes)), Err(Error::Truncated));
    }

    #[test]
    fn test_parse_total_len_less_than_header_len() {
        let mut bytes = vec![0; 40];
        bytes[0] = 0x45;
        assert_eq!(ipv4::new_checked(&bytes), Err(Error::Malformed));
    }

    #[test]
    fn test_emit() {
        let repr = packet_repr();
        let mut bytes = vec![0xa5; repr.buffer_len() + REPR_PAYLOAD_BYTES.len()];
        let packet = ipv4::new_unchecked_mut(&mut bytes);
        repr.emit(packet);
        packet.payload_mut_slice().copy_from_slice(&REPR_PAYLOAD_BYTES);
        assert_eq!(packet.as_bytes(), &REPR_PACKET_BYTES[..]);
    }

    #[test]
    fn test_emit_fragment() {
        let repr = Repr {
            ident: 0x1234,
            more_frags: true,
            frag_offset: 1480,
            ..packet_repr()
        };
        let mut bytes = vec![0; repr.buffer_len() + 4];
        let packet = ipv4::new_unchecked_mut(&mut bytes);
        repr.emit(packet);
        assert_eq!(&packet.as_bytes()[4..8], &[0x12, 0x34, 0x20, 0xb9]);
        assert!(packet.verify_checksum());
        assert_eq!(Repr::parse(packet), Ok(repr));
    }

    #[test]
    fn test_emit_clears_dont_frag() {
        let repr = packet_repr();
        let mut bytes = vec![0xff; repr.buffer_len() + 4];
        let packet = ipv4::new_unchecked_mut(&mut bytes);
        assert!(packet.dont_frag());
        repr.emit(packet);
        assert!(!packet.dont_frag());
        assert!(!packet.more_frags());
        assert_eq!(packet.frag_offset(), 0);
        assert_eq!(Repr::parse(packet), Ok(repr));
    }

    #[test]
    fn test_checksum_recompute_is_stable() {
        let mut bytes = vec![0; 24];
        bytes.copy_from_slice(&REPR_PACKET_BYTES[..]);
        let packet = ipv4::new_unchecked_mut(&mut bytes);
        let stored = packet.checksum();
        packet.fill_checksum();
        assert_eq!(packet.checksum(), stored);
    }

    #[test]
    fn test_broadcast() {
        assert!(Address::BROADCAST.is_broadcast());
        assert!(!Address::new(10, 255, 255, 255).is_broadcast());
        assert_eq!(Address::BROADCAST.to_string(), "255.255.255.255");
    }

    #[test]
    fn test_parse_address() {
        assert_eq!("10.0.0.5".parse::<Address>(), Ok(Address::new(10, 0, 0, 5)));
        assert_eq!("10.0.0".parse::<Address>(), Err(ParseAddressError));
        assert_eq!("10.0.0.256".parse::<Address>(), Err(ParseAddressError));
        assert_eq!("10.0.0.1.2".parse::<Address>(), Err(ParseAddressError));
    }
}
