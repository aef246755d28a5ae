use core::{fmt, str::FromStr};
use byteorder::{ByteOrder, NetworkEndian};

use super::{Error, Result};

enum_with_unknown! {
    /// The payload type of an Ethernet II frame.
    pub enum EtherType(u16) {
        Ipv4 = 0x0800,
        Arp  = 0x0806,
    }
}

impl fmt::Display for EtherType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            EtherType::Ipv4 => f.write_str("ipv4"),
            EtherType::Arp => f.write_str("arp"),
            EtherType::Unknown(id) => write!(f, "type {:#06x}", id),
        }
    }
}

/// A 48-bit hardware address.
#[derive(Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Default)]
pub struct Address(pub [u8; 6]);

impl Address {
    pub const BROADCAST: Address = Address([0xff; 6]);

    /// Read an address from six octets in transmission order.
    ///
    /// # Panics
    /// When `data` is not exactly six octets long.
    pub fn from_bytes(data: &[u8]) -> Address {
        let mut bytes = [0; 6];
        bytes.copy_from_slice(data);
        Address(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn is_broadcast(&self) -> bool {
        *self == Self::BROADCAST
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}", a, b, c, d, e, g)
    }
}

/// The address was not six colon-separated hex octets.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParseAddressError;

impl fmt::Display for ParseAddressError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("invalid hardware address, expected six colon-separated hex octets")
    }
}

impl FromStr for Address {
    type Err = ParseAddressError;

    fn from_str(src: &str) -> core::result::Result<Self, ParseAddressError> {
        let mut parsed = [0; 6];
        let mut components = src.split(':');
        for c in parsed.iter_mut() {
            let part = components.next().ok_or(ParseAddressError)?;
            *c = u8::from_str_radix(part, 16).map_err(|_| ParseAddressError)?;
        }

        match components.next() {
            Some(_) => Err(ParseAddressError),
            None => Ok(Address(parsed)),
        }
    }
}

byte_wrapper! {
    /// An Ethernet II frame, without the trailing frame check sequence.
    #[derive(Debug, PartialEq, Eq)]
    pub struct ethernet([u8]);
}

mod field {
    use crate::wire::field::*;

    pub(crate) const DESTINATION: Field =  0..6;
    pub(crate) const SOURCE:      Field =  6..12;
    pub(crate) const ETHERTYPE:   Field = 12..14;
    pub(crate) const PAYLOAD:     Rest  = 14..;
}

/// The length of an Ethernet II header.
pub const HEADER_LEN: usize = field::PAYLOAD.start;

/// The minimum payload of a frame.
///
/// Shorter payloads are padded with zeroes before sending.
pub const MIN_PAYLOAD_LEN: usize = 46;

impl ethernet {
    /// Imbue a raw octet buffer with Ethernet frame structure.
    pub fn new_unchecked(data: &[u8]) -> &Self {
        Self::__from_macro_new_unchecked(data)
    }

    /// Imbue a mutable octet buffer with Ethernet frame structure.
    pub fn new_unchecked_mut(data: &mut [u8]) -> &mut Self {
        Self::__from_macro_new_unchecked_mut(data)
    }

    /// Wrap `data` after checking that it holds at least a header.
    pub fn new_checked(data: &[u8]) -> Result<&Self> {
        let frame = Self::new_unchecked(data);
        frame.check_len()?;
        Ok(frame)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Returns `Err(Error::Truncated)` if the buffer cannot hold the 14 byte header.
    pub fn check_len(&self) -> Result<()> {
        if self.0.len() < HEADER_LEN {
            Err(Error::Truncated)
        } else {
            Ok(())
        }
    }

    pub fn dst_addr(&self) -> Address {
        Address::from_bytes(&self.0[field::DESTINATION])
    }

    pub fn src_addr(&self) -> Address {
        Address::from_bytes(&self.0[field::SOURCE])
    }

    /// The type field. 802.1Q tags are not recognized and read as an unknown type.
    pub fn ethertype(&self) -> EtherType {
        EtherType::from(NetworkEndian::read_u16(&self.0[field::ETHERTYPE]))
    }

    pub fn set_dst_addr(&mut self, value: Address) {
        self.0[field::DESTINATION].copy_from_slice(value.as_bytes())
    }

    pub fn set_src_addr(&mut self, value: Address) {
        self.0[field::SOURCE].copy_from_slice(value.as_bytes())
    }

    pub fn set_ethertype(&mut self, value: EtherType) {
        NetworkEndian::write_u16(&mut self.0[field::ETHERTYPE], value.into())
    }

    /// Everything after the header, including any padding.
    pub fn payload_slice(&self) -> &[u8] {
        &self.0[field::PAYLOAD]
    }

    pub fn payload_mut_slice(&mut self) -> &mut [u8] {
        &mut self.0[field::PAYLOAD]
    }
}

impl AsRef<[u8]> for ethernet {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// The addressing of a frame.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Repr {
    pub src_addr:    Address,
    pub dst_addr:    Address,
    pub ethertype:   EtherType,
}

impl Repr {
    pub fn parse(frame: &ethernet) -> Result<Repr> {
        frame.check_len()?;
        Ok(Repr {
            src_addr: frame.src_addr(),
            dst_addr: frame.dst_addr(),
            ethertype: frame.ethertype(),
        })
    }

    /// Write the header. The payload is left untouched.
    pub fn emit(&self, frame: &mut ethernet) {
        frame.set_dst_addr(self.dst_addr);
        frame.set_src_addr(self.src_addr);
        frame.set_ethertype(self.ethertype);
    }
}

impl fmt::Display for Repr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "eth {} -> {} ({})", self.src_addr, self.dst_addr, self.ethertype)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    static FRAME_BYTES: [u8; 64] =
        [0x01, 0x02, 0x03, 0x04, 0x05, 0x06,
         0x11, 0x12, 0x13, 0x14, 0x15, 0x16,
         0x08, 0x00,
         0xaa, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
         0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
         0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
         0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
         0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xff];

    #[test]
    fn test_broadcast() {
        assert!(Address::BROADCAST.is_broadcast());
        assert!(!Address([0xff, 0xff, 0xff, 0xff, 0xff, 0xfe]).is_broadcast());
        assert_eq!(EtherType::Unknown(0x86dd).to_string(), "type 0x86dd");
    }

    #[test]
    fn test_deconstruct() {
        let frame = ethernet::new_checked(&FRAME_BYTES[..]).unwrap();
        assert_eq!(frame.dst_addr(), Address([0x01, 0x02, 0x03, 0x04, 0x05, 0x06]));
        assert_eq!(frame.src_addr(), Address([0x11, 0x12, 0x13, 0x14, 0x15, 0x16]));
        assert_eq!(frame.ethertype(), EtherType::Ipv4);
        assert_eq!(frame.payload_slice().len(), 50);
        assert_eq!(frame.payload_slice()[0], 0xaa);
    }

    #[test]
    fn test_construct() {
        let mut bytes = vec![0xa5; 64];
        let frame = ethernet::new_unchecked_mut(&mut bytes);
        Repr {
            src_addr: Address([0x11, 0x12, 0x13, 0x14, 0x15, 0x16]),
            dst_addr: Address([0x01, 0x02, 0x03, 0x04, 0x05, 0x06]),
            ethertype: EtherType::Ipv4,
        }.emit(frame);
        frame.payload_mut_slice().copy_from_slice(&FRAME_BYTES[14..]);
        assert_eq!(frame.as_bytes(), &FRAME_BYTES[..]);
    }

    #[test]
    fn test_truncated() {
        assert_eq!(ethernet::new_checked(&FRAME_BYTES[..13]), Err(Error::Truncated));
        assert!(ethernet::new_checked(&FRAME_BYTES[..14]).is_ok());
    }

    #[test]
    fn parse_address() {
        let addr: Address = "aa:bb:cc:dd:ee:ff".parse().unwrap();
        assert_eq!(addr, Address([0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff]));
        assert_eq!(addr.to_string(), "aa:bb:cc:dd:ee:ff");
        assert_eq!("aa:bb:cc:dd:ee".parse::<Address>(), Err(ParseAddressError));
        assert_eq!("aa:bb:cc:dd:ee:ff:00".parse::<Address>(), Err(ParseAddressError));
        assert_eq!("aa:bb:cc:dd:ee:zz".parse::<Address>(), Err(ParseAddressError));
    }
}
