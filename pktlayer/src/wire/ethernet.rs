use core::fmt;
use core::str::FromStr;
use byteorder::{ByteOrder, NetworkEndian};

use super::{Error, Result, tail};

named_number! {
    /// Ethernet protocol type.
    ///
    /// See the [IANA registry](https://www.iana.org/assignments/ieee-802-numbers).
    pub struct EtherType(u16) {
        IPV4 = 0x0800 => "IPv4",
        ARP = 0x0806 => "ARP",
        RARP = 0x8035 => "RARP",
        APPLETALK = 0x809b => "Appletalk",
        IPV6 = 0x86dd => "IPv6",
        PPP = 0x880b => "PPP",
        MPLS = 0x8847 => "MPLS",
        PPPOE_DISCOVERY_STAGE = 0x8863 => "PPPoE Discovery Stage",
        PPPOE_SESSION_STAGE = 0x8864 => "PPPoE Session Stage",
        JUMBO_FRAME = 0x8870 => "Jumbo Frame",
    }

    kinds {
        Arp => ARP,
        Ipv4 => IPV4,
    }
}

/// The smallest frame, without frame check sequence, an Ethernet II link transmits.
///
/// Shorter frames are padded with trailing octets after the payload.
pub const MIN_FRAME_LEN: usize = 60;

/// A six-octet Ethernet II address.
#[derive(Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Default)]
pub struct Address(pub [u8; 6]);

impl Address {
    /// The broadcast address.
    pub const BROADCAST: Address = Address([0xff; 6]);

    /// Construct an Ethernet address from a sequence of octets, in big-endian.
    ///
    /// # Panics
    /// The function panics if `data` is not six octets long.
    pub fn from_bytes(data: &[u8]) -> Address {
        let mut bytes = [0; 6];
        bytes.copy_from_slice(data);
        Address(bytes)
    }

    /// Return an Ethernet address as a sequence of octets, in big-endian.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let bytes = self.0;
        write!(f, "{:02x}-{:02x}-{:02x}-{:02x}-{:02x}-{:02x}",
               bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5])
    }
}

/// The error of parsing an Ethernet address from text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid Ethernet address, expected six hexadecimal octets")]
pub struct ParseAddressError;

impl FromStr for Address {
    type Err = ParseAddressError;

    /// Parse six hexadecimal octets separated by `-` or `:`.
    fn from_str(src: &str) -> core::result::Result<Self, ParseAddressError> {
        let mut bytes = [0; 6];
        let mut parts = src.split(&['-', ':'][..]);
        for byte in bytes.iter_mut() {
            let part = parts.next().ok_or(ParseAddressError)?;
            if part.len() != 2 {
                return Err(ParseAddressError);
            }
            *byte = u8::from_str_radix(part, 16).map_err(|_| ParseAddressError)?;
        }
        match parts.next() {
            None => Ok(Address(bytes)),
            Some(_) => Err(ParseAddressError),
        }
    }
}

byte_wrapper! {
    /// A byte sequence representing an Ethernet II frame.
    #[derive(Debug, PartialEq, Eq)]
    pub struct ethernet([u8]);
}

mod field {
    use crate::wire::field::*;

    pub const DESTINATION: Field =  0..6;
    pub const SOURCE:      Field =  6..12;
    pub const ETHERTYPE:   Field = 12..14;
    pub const PAYLOAD:     Rest  = 14..;
}

impl ethernet {
    /// Imbue a raw octet buffer with Ethernet frame structure.
    pub fn new_unchecked(data: &[u8]) -> &Self {
        Self::__from_macro_new_unchecked(data)
    }

    /// Imbue a mutable octet buffer with Ethernet frame structure.
    pub fn new_unchecked_mut(data: &mut [u8]) -> &mut Self {
        Self::__from_macro_new_unchecked_mut(data)
    }

    /// Shorthand for a combination of [new_unchecked] and [check_len].
    ///
    /// [new_unchecked]: #method.new_unchecked
    /// [check_len]: #method.check_len
    pub fn new_checked(data: &[u8]) -> Result<&Self> {
        Self::new_unchecked(data).check_len()?;
        Ok(Self::new_unchecked(data))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.0
    }

    /// Ensure that no accessor method will panic if called.
    /// Returns `Err(Error::Truncated)` if the buffer is too short.
    pub fn check_len(&self) -> Result<()> {
        let len = self.0.len();
        if len < field::PAYLOAD.start {
            Err(Error::Truncated)
        } else {
            Ok(())
        }
    }

    /// Return the length of a frame header.
    pub fn header_len() -> usize {
        field::PAYLOAD.start
    }

    /// Return the destination address field.
    pub fn dst_addr(&self) -> Address {
        Address::from_bytes(&self.0[field::DESTINATION])
    }

    /// Return the source address field.
    pub fn src_addr(&self) -> Address {
        Address::from_bytes(&self.0[field::SOURCE])
    }

    /// Return the EtherType field, without checking for 802.1Q.
    pub fn ethertype(&self) -> EtherType {
        let raw = NetworkEndian::read_u16(&self.0[field::ETHERTYPE]);
        EtherType::from(raw)
    }

    /// Set the destination address field.
    pub fn set_dst_addr(&mut self, value: Address) {
        self.0[field::DESTINATION].copy_from_slice(value.as_bytes())
    }

    /// Set the source address field.
    pub fn set_src_addr(&mut self, value: Address) {
        self.0[field::SOURCE].copy_from_slice(value.as_bytes())
    }

    /// Set the EtherType field.
    pub fn set_ethertype(&mut self, value: EtherType) {
        NetworkEndian::write_u16(&mut self.0[field::ETHERTYPE], value.into())
    }

    /// Return the payload as a byte slice.
    pub fn payload_slice(&self) -> &[u8] {
        &self.0[field::PAYLOAD]
    }

    /// Return the payload as a mutable byte slice.
    pub fn payload_mut_slice(&mut self) -> &mut [u8] {
        &mut self.0[field::PAYLOAD]
    }
}

/// A high-level representation of an Ethernet II frame header.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Repr {
    pub dst_addr:    Address,
    pub src_addr:    Address,
    pub ethertype:   EtherType,
}

impl Repr {
    /// Parse an Ethernet II frame and return a high-level representation.
    pub fn parse(frame: &ethernet) -> Result<Repr> {
        frame.check_len()?;
        Ok(Repr {
            dst_addr: frame.dst_addr(),
            src_addr: frame.src_addr(),
            ethertype: frame.ethertype(),
        })
    }

    /// Decode the frame header at `offset`, returning it with the number of header octets.
    pub fn decode(bytes: &[u8], offset: usize) -> Result<(Repr, usize)> {
        let frame = ethernet::new_checked(tail(bytes, offset)?)?;
        Ok((Repr::parse(frame)?, ethernet::header_len()))
    }

    /// Return the length of a header that will be emitted from this high-level representation.
    pub fn header_len(&self) -> usize {
        field::PAYLOAD.start
    }

    /// Emit a high-level representation into an Ethernet II frame.
    pub fn emit(&self, frame: &mut ethernet) {
        frame.set_dst_addr(self.dst_addr);
        frame.set_src_addr(self.src_addr);
        frame.set_ethertype(self.ethertype);
    }
}

impl fmt::Display for Repr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "EthernetII src={} dst={} type={}",
               self.src_addr, self.dst_addr, self.ethertype)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    static FRAME_BYTES: [u8; 64] =
        [0x01, 0x02, 0x03, 0x04, 0x05, 0x06,
         0x11, 0x12, 0x13, 0x14, 0x15, 0x16,
         0x08, 0x00,
         0xaa, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
         0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
         0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
         0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
         0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
         0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
         0x00, 0xff];

    static PAYLOAD_BYTES: [u8; 50] =
        [0xaa, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
         0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
         0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
         0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
         0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
         0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
         0x00, 0xff];

    #[test]
    fn test_deconstruct() {
        let frame = ethernet::new_unchecked(&FRAME_BYTES[..]);
        assert_eq!(frame.dst_addr(), Address([0x01, 0x02, 0x03, 0x04, 0x05, 0x06]));
        assert_eq!(frame.src_addr(), Address([0x11, 0x12, 0x13, 0x14, 0x15, 0x16]));
        assert_eq!(frame.ethertype(), EtherType::IPV4);
        assert_eq!(frame.payload_slice(), &PAYLOAD_BYTES[..]);
    }

    #[test]
    fn test_construct() {
        let mut bytes = vec![0xa5; 64];
        let frame = ethernet::new_unchecked_mut(&mut bytes);
        frame.set_dst_addr(Address([0x01, 0x02, 0x03, 0x04, 0x05, 0x06]));
        frame.set_src_addr(Address([0x11, 0x12, 0x13, 0x14, 0x15, 0x16]));
        frame.set_ethertype(EtherType::IPV4);
        frame.payload_mut_slice().copy_from_slice(&PAYLOAD_BYTES[..]);
        assert_eq!(frame.as_bytes(), &FRAME_BYTES[..]);
    }

    #[test]
    fn test_decode() {
        let (repr, consumed) = Repr::decode(&FRAME_BYTES, 0).unwrap();
        assert_eq!(consumed, 14);
        assert_eq!(repr.ethertype, EtherType::IPV4);
        assert_eq!(repr.src_addr, Address([0x11, 0x12, 0x13, 0x14, 0x15, 0x16]));

        let mut bytes = vec![0; repr.header_len()];
        repr.emit(ethernet::new_unchecked_mut(&mut bytes));
        assert_eq!(&bytes[..], &FRAME_BYTES[..14]);
    }

    #[test]
    fn test_decode_offset() {
        let mut bytes = vec![0xee, 0xee];
        bytes.extend_from_slice(&FRAME_BYTES[..14]);
        let (repr, _) = Repr::decode(&bytes, 2).unwrap();
        assert_eq!(repr.dst_addr, Address([0x01, 0x02, 0x03, 0x04, 0x05, 0x06]));
        assert_eq!(Repr::decode(&bytes, 3), Err(Error::Truncated));
        assert_eq!(Repr::decode(&bytes, 100), Err(Error::Truncated));
    }

    #[test]
    fn test_truncated() {
        assert_eq!(Repr::decode(&FRAME_BYTES[..13], 0), Err(Error::Truncated));
        assert!(Repr::decode(&FRAME_BYTES[..14], 0).is_ok());
    }

    #[test]
    fn test_unknown_ethertype() {
        let mut bytes = FRAME_BYTES;
        bytes[12..14].copy_from_slice(&[0xff, 0xfe]);
        let (repr, _) = Repr::decode(&bytes, 0).unwrap();
        assert_eq!(repr.ethertype.code(), 0xfffe);
        assert_eq!(repr.ethertype.name(), "unknown");
    }

    #[test]
    fn test_address_from_str() {
        assert_eq!("01-02-03-04-05-06".parse(), Ok(Address([1, 2, 3, 4, 5, 6])));
        assert_eq!("ab:cd:ef:00:11:22".parse(), Ok(Address([0xab, 0xcd, 0xef, 0x00, 0x11, 0x22])));
        assert_eq!("01-02-03-04-05".parse::<Address>(), Err(ParseAddressError));
        assert_eq!("01-02-03-04-05-06-07".parse::<Address>(), Err(ParseAddressError));
        assert_eq!("01-02-03-04-05-zz".parse::<Address>(), Err(ParseAddressError));
    }
}
