use core::fmt;
use byteorder::{ByteOrder, NetworkEndian};

use super::{Error, Result};
use super::checksum;

enum_with_unknown! {
    /// The ICMPv4 message types handled by the stack.
    ///
    /// Any other type, such as redirects or time exceeded, is `Unknown` and dropped on parse.
    pub enum Message(u8) {
        EchoReply      = 0,
        DstUnreachable = 3,
        EchoRequest    = 8,
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Message::EchoReply => write!(f, "echo reply"),
            Message::DstUnreachable => write!(f, "unreachable"),
            Message::EchoRequest => write!(f, "echo request"),
            Message::Unknown(id) => write!(f, "type {}", id),
        }
    }
}

enum_with_unknown! {
    /// The reason code of a destination unreachable message.
    ///
    /// Only the codes this host generates are named.
    pub enum DstUnreachable(u8) {
        /// No handler for the ip protocol number.
        ProtoUnreachable = 2,
        /// No udp handler bound to the port.
        PortUnreachable  = 3,
    }
}

impl fmt::Display for DstUnreachable {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DstUnreachable::ProtoUnreachable => write!(f, "protocol"),
            DstUnreachable::PortUnreachable => write!(f, "port"),
            DstUnreachable::Unknown(code) => write!(f, "code {}", code),
        }
    }
}

byte_wrapper! {
    /// A byte sequence representing an ICMPv4 packet.
    #[derive(Debug, PartialEq, Eq)]
    pub struct icmpv4([u8]);
}

mod field {
    use crate::wire::field::Field;

    pub const TYPE:       usize = 0;
    pub const CODE:       usize = 1;
    pub const CHECKSUM:   Field = 2..4;

    pub const UNUSED:     Field = 4..8;

    pub const ECHO_IDENT: Field = 4..6;
    pub const ECHO_SEQNO: Field = 6..8;

    pub const HEADER_END: usize = 8;
}

/// The length of the ICMPv4 header, including the rest-of-header word.
pub const HEADER_LEN: usize = field::HEADER_END;

/// The number of payload bytes of the original datagram quoted in error messages.
///
/// RFC 792 requires exactly eight bytes after the original IP header.
pub const QUOTED_PAYLOAD_LEN: usize = 8;

impl icmpv4 {
    pub fn new_unchecked(buffer: &[u8]) -> &icmpv4 {
        Self::__from_macro_new_unchecked(buffer)
    }

    pub fn new_unchecked_mut(buffer: &mut [u8]) -> &mut icmpv4 {
        Self::__from_macro_new_unchecked_mut(buffer)
    }

    /// Wrap `data` after checking that it holds the 8 byte header.
    pub fn new_checked(data: &[u8]) -> Result<&icmpv4> {
        let packet = Self::new_unchecked(data);
        packet.check_len()?;
        Ok(packet)
    }

    /// The whole message, header and body.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn check_len(&self) -> Result<()> {
        match self.0.len() {
            len if len < HEADER_LEN => Err(Error::Truncated),
            _ => Ok(()),
        }
    }

    #[inline]
    pub fn msg_type(&self) -> Message {
        self.0[field::TYPE].into()
    }

    #[inline]
    pub fn msg_code(&self) -> u8 {
        self.0[field::CODE]
    }

    #[inline]
    pub fn checksum(&self) -> u16 {
        NetworkEndian::read_u16(&self.0[field::CHECKSUM])
    }

    /// Echo identifier. Only meaningful for echo messages.
    #[inline]
    pub fn echo_ident(&self) -> u16 {
        NetworkEndian::read_u16(&self.0[field::ECHO_IDENT])
    }

    /// Echo sequence number. Only meaningful for echo messages.
    #[inline]
    pub fn echo_seq_no(&self) -> u16 {
        NetworkEndian::read_u16(&self.0[field::ECHO_SEQNO])
    }

    /// The checksum covers the complete message, there is no pseudo header.
    pub fn verify_checksum(&self) -> bool {
        checksum::data(&self.0) == !0
    }

    #[inline]
    pub fn set_msg_type(&mut self, value: Message) {
        self.0[field::TYPE] = value.into()
    }

    #[inline]
    pub fn set_msg_code(&mut self, value: u8) {
        self.0[field::CODE] = value
    }

    #[inline]
    pub fn set_checksum(&mut self, value: u16) {
        NetworkEndian::write_u16(&mut self.0[field::CHECKSUM], value)
    }

    #[inline]
    pub fn set_echo_ident(&mut self, value: u16) {
        NetworkEndian::write_u16(&mut self.0[field::ECHO_IDENT], value)
    }

    #[inline]
    pub fn set_echo_seq_no(&mut self, value: u16) {
        NetworkEndian::write_u16(&mut self.0[field::ECHO_SEQNO], value)
    }

    /// Zero the unused rest-of-header word of error messages.
    pub fn clear_unused(&mut self) {
        self.0[field::UNUSED].iter_mut().for_each(|byte| *byte = 0);
    }

    /// Recompute the checksum, body included.
    pub fn fill_checksum(&mut self) {
        self.set_checksum(0);
        let checksum = !checksum::data(&self.0);
        self.set_checksum(checksum)
    }

    pub fn payload_slice(&self) -> &[u8] {
        &self.0[HEADER_LEN..]
    }

    pub fn payload_mut_slice(&mut self) -> &mut [u8] {
        &mut self.0[HEADER_LEN..]
    }
}

impl AsRef<[u8]> for icmpv4 {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// The ICMPv4 messages this stack understands.
///
/// `payload` is the number of bytes following the 8 byte header. For a destination unreachable
/// message these are the quoted original IP header and the start of its payload.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Repr {
    EchoRequest {
        ident:  u16,
        seq_no: u16,
        payload: usize,
    },
    EchoReply {
        ident:  u16,
        seq_no: u16,
        payload: usize,
    },
    DstUnreachable {
        reason: DstUnreachable,
        payload: usize,
    },
}

impl Repr {
    /// The reply answering this message, if it is an echo request.
    pub fn echo_reply(self) -> Option<Repr> {
        match self {
            Repr::EchoRequest { ident, seq_no, payload, } =>
                Some(Repr::EchoReply { ident, seq_no, payload, }),
            _ => None,
        }
    }

    /// Parse a message after verifying its checksum.
    ///
    /// Types outside [`Message`] are `Unrecognized`. Echo messages with a nonzero code are
    /// `Unsupported`.
    pub fn parse(packet: &icmpv4) -> Result<Repr> {
        packet.check_len()?;
        if !packet.verify_checksum() {
            return Err(Error::WrongChecksum)
        }

        let payload = packet.payload_slice().len();
        match (packet.msg_type(), packet.msg_code()) {
            (Message::EchoRequest, 0) => Ok(Repr::EchoRequest {
                ident:  packet.echo_ident(),
                seq_no: packet.echo_seq_no(),
                payload,
            }),

            (Message::EchoReply, 0) => Ok(Repr::EchoReply {
                ident:  packet.echo_ident(),
                seq_no: packet.echo_seq_no(),
                payload,
            }),

            (Message::DstUnreachable, code) => Ok(Repr::DstUnreachable {
                reason: DstUnreachable::from(code),
                payload,
            }),

            (Message::Unknown(_), _) => Err(Error::Unrecognized),
            _ => Err(Error::Unsupported),
        }
    }

    /// Header plus body length.
    pub fn buffer_len(&self) -> usize {
        match self {
            Repr::EchoRequest { payload, .. }
            | Repr::EchoReply { payload, .. }
            | Repr::DstUnreachable { payload, .. } => field::HEADER_END + payload,
        }
    }

    /// Write the header and checksum.
    ///
    /// The body must already be in place since the checksum covers it.
    pub fn emit(&self, packet: &mut icmpv4) {
        match *self {
            Repr::EchoRequest { ident, seq_no, payload: _ } => {
                packet.set_msg_type(Message::EchoRequest);
                packet.set_msg_code(0);
                packet.set_echo_ident(ident);
                packet.set_echo_seq_no(seq_no);
            },

            Repr::EchoReply { ident, seq_no, payload: _ } => {
                packet.set_msg_type(Message::EchoReply);
                packet.set_msg_code(0);
                packet.set_echo_ident(ident);
                packet.set_echo_seq_no(seq_no);
            },

            Repr::DstUnreachable { reason, payload: _ } => {
                packet.set_msg_type(Message::DstUnreachable);
                packet.set_msg_code(reason.into());
                packet.clear_unused();
            },
        }

        packet.fill_checksum()
    }
}

impl fmt::Display for Repr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Repr::EchoRequest { ident, seq_no, payload } =>
                write!(f, "ICMPv4 echo request id={} seq={} len={}",
                       ident, seq_no, payload),
            Repr::EchoReply { ident, seq_no, payload } =>
                write!(f, "ICMPv4 echo reply id={} seq={} len={}",
                       ident, seq_no, payload),
            Repr::DstUnreachable { reason, payload } =>
                write!(f, "ICMPv4 {} unreachable len={}", reason, payload),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    static ECHO_PACKET_BYTES: [u8; 12] =
        [0x08, 0x00, 0x8e, 0xfe,
         0x12, 0x34, 0xab, 0xcd,
         0xaa, 0x00, 0x00, 0xff];

    static ECHO_DATA_BYTES: [u8; 4] =
        [0xaa, 0x00, 0x00, 0xff];

    #[test]
    fn test_echo_deconstruct() {
        let packet = icmpv4::new_checked(&ECHO_PACKET_BYTES[..]).unwrap();
        assert_eq!(packet.msg_type(), Message::EchoRequest);
        assert_eq!(packet.msg_code(), 0);
        assert_eq!(packet.checksum(), 0x8efe);
        assert_eq!(packet.echo_ident(), 0x1234);
        assert_eq!(packet.echo_seq_no(), 0xabcd);
        assert_eq!(packet.payload_slice(), &ECHO_DATA_BYTES[..]);
        assert!(packet.verify_checksum());
    }

    #[test]
    fn test_echo_emit() {
        let repr = Repr::EchoRequest { ident: 0x1234, seq_no: 0xabcd, payload: 4 };
        let mut bytes = vec![0xa5; repr.buffer_len()];
        let packet = icmpv4::new_unchecked_mut(&mut bytes);
        packet.payload_mut_slice().copy_from_slice(&ECHO_DATA_BYTES[..]);
        repr.emit(packet);
        assert_eq!(packet.as_bytes(), &ECHO_PACKET_BYTES[..]);
    }

    #[test]
    fn test_echo_parse() {
        let packet = icmpv4::new_unchecked(&ECHO_PACKET_BYTES[..]);
        let repr = Repr::parse(packet).unwrap();
        assert_eq!(repr, Repr::EchoRequest { ident: 0x1234, seq_no: 0xabcd, payload: 4 });
        assert_eq!(repr.echo_reply(), Some(Repr::EchoReply { ident: 0x1234, seq_no: 0xabcd, payload: 4 }));
    }

    #[test]
    fn test_bad_checksum() {
        let mut bytes = ECHO_PACKET_BYTES;
        bytes[9] = 0x01;
        assert_eq!(Repr::parse(icmpv4::new_unchecked(&bytes)), Err(Error::WrongChecksum));
    }

    #[test]
    fn test_unreachable_emit() {
        let repr = Repr::DstUnreachable { reason: DstUnreachable::PortUnreachable, payload: 28 };
        let mut bytes = vec![0xa5; repr.buffer_len()];
        let packet = icmpv4::new_unchecked_mut(&mut bytes);
        repr.emit(packet);
        assert_eq!(packet.msg_type(), Message::DstUnreachable);
        assert_eq!(packet.msg_code(), 3);
        assert_eq!(&packet.as_bytes()[4..8], &[0, 0, 0, 0]);
        assert!(packet.verify_checksum());
        assert_eq!(Repr::parse(packet), Ok(repr));
    }

    #[test]
    fn test_unhandled_types() {
        // Time exceeded in transit, quoting nothing.
        let mut bytes = [11, 0, 0, 0, 0, 0, 0, 0];
        icmpv4::new_unchecked_mut(&mut bytes).fill_checksum();
        let packet = icmpv4::new_unchecked(&bytes);
        assert_eq!(packet.msg_type(), Message::Unknown(11));
        assert_eq!(Repr::parse(packet), Err(Error::Unrecognized));

        // Host unreachable is still a destination unreachable message.
        let mut bytes = [3, 1, 0, 0, 0, 0, 0, 0];
        icmpv4::new_unchecked_mut(&mut bytes).fill_checksum();
        assert_eq!(Repr::parse(icmpv4::new_unchecked(&bytes)), Ok(Repr::DstUnreachable {
            reason: DstUnreachable::Unknown(1),
            payload: 0,
        }));
    }
}
