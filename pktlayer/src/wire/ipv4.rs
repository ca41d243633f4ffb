use core::fmt;
use core::str::FromStr;
use byteorder::{ByteOrder, NetworkEndian};

use super::{Error, Result, tail};
use super::checksum;
use super::field::Field;
use super::ip::Version;

pub use super::IpProtocol as Protocol;

/// The length of a header without options.
pub const MIN_HEADER_LEN: usize = field::DST_ADDR.end;

/// The length of a header with the largest header length field.
pub const MAX_HEADER_LEN: usize = 0x0f * 4;

/// The "don't fragment" bit of the three bit flags field.
pub const FLAG_DONT_FRAG: u8 = 0b010;

/// The "more fragments" bit of the three bit flags field.
pub const FLAG_MORE_FRAGS: u8 = 0b001;

/// The time to live given to freshly created packets.
pub const DEFAULT_HOP_LIMIT: u8 = 64;

/// A four-octet IPv4 address.
#[derive(Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Default)]
pub struct Address(pub [u8; 4]);

impl Address {
    /// An unspecified address.
    pub const UNSPECIFIED: Address = Address([0x00; 4]);

    /// The broadcast address.
    pub const BROADCAST:   Address = Address([0xff; 4]);

    /// Construct an IPv4 address from parts.
    pub const fn new(a0: u8, a1: u8, a2: u8, a3: u8) -> Address {
        Address([a0, a1, a2, a3])
    }

    /// Construct an IPv4 address from a sequence of octets, in big-endian.
    ///
    /// # Panics
    /// The function panics if `data` is not four octets long.
    pub fn from_bytes(data: &[u8]) -> Address {
        let mut bytes = [0; 4];
        bytes.copy_from_slice(data);
        Address(bytes)
    }

    /// Return an IPv4 address as a sequence of octets, in big-endian.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl From<::std::net::Ipv4Addr> for Address {
    fn from(x: ::std::net::Ipv4Addr) -> Address {
        Address(x.octets())
    }
}

impl From<Address> for ::std::net::Ipv4Addr {
    fn from(Address(x): Address) -> ::std::net::Ipv4Addr {
        x.into()
    }
}

impl FromStr for Address {
    type Err = ::std::net::AddrParseError;

    fn from_str(src: &str) -> core::result::Result<Self, Self::Err> {
        src.parse::<::std::net::Ipv4Addr>().map(Address::from)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let bytes = self.0;
        write!(f, "{}.{}.{}.{}", bytes[0], bytes[1], bytes[2], bytes[3])
    }
}

byte_wrapper! {
    /// A byte sequence representing an IPv4 packet.
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
}

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
    /// Returns `Err(Error::Truncated)` if the buffer is too short.
    /// Returns `Err(Error::Malformed)` if the header length is below the minimum of 20 octets or
    /// greater than the total length.
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
        } else if len < self.header_len() as usize {
            Err(Error::Truncated)
        } else if self.header_len() as u16 > self.total_len() {
            Err(Error::Malformed)
        } else if len < self.total_len() as usize {
            Err(Error::Truncated)
        } else {
            Ok(())
        }
    }

    /// Return the version field.
    #[inline]
    pub fn version(&self) -> u8 {
        self.0[field::VER_IHL] >> 4
    }

    /// Return the header length, in octets.
    #[inline]
    pub fn header_len(&self) -> u8 {
        (self.0[field::VER_IHL] & 0x0f) * 4
    }

    /// Return the Differential Services Code Point field.
    pub fn dscp(&self) -> u8 {
        self.0[field::DSCP_ECN] >> 2
    }

    /// Return the Explicit Congestion Notification field.
    pub fn ecn(&self) -> u8 {
        self.0[field::DSCP_ECN] & 0x03
    }

    /// Return the total length field.
    #[inline]
    pub fn total_len(&self) -> u16 {
        NetworkEndian::read_u16(&self.0[field::LENGTH])
    }

    /// Return the fragment identification field.
    #[inline]
    pub fn ident(&self) -> u16 {
        NetworkEndian::read_u16(&self.0[field::IDENT])
    }

    /// Return the three bit flags field.
    #[inline]
    pub fn flags(&self) -> u8 {
        (NetworkEndian::read_u16(&self.0[field::FLG_OFF]) >> 13) as u8
    }

    /// Return the fragment offset, in octets.
    #[inline]
    pub fn frag_offset(&self) -> u16 {
        NetworkEndian::read_u16(&self.0[field::FLG_OFF]) << 3
    }

    /// Return the time to live field.
    #[inline]
    pub fn hop_limit(&self) -> u8 {
        self.0[field::TTL]
    }

    /// Return the protocol field.
    #[inline]
    pub fn protocol(&self) -> Protocol {
        Protocol::from(self.0[field::PROTOCOL])
    }

    /// Return the header checksum field.
    #[inline]
    pub fn checksum(&self) -> u16 {
        NetworkEndian::read_u16(&self.0[field::CHECKSUM])
    }

    /// Return the source address field.
    #[inline]
    pub fn src_addr(&self) -> Address {
        Address::from_bytes(&self.0[field::SRC_ADDR])
    }

    /// Return the destination address field.
    #[inline]
    pub fn dst_addr(&self) -> Address {
        Address::from_bytes(&self.0[field::DST_ADDR])
    }

    /// Return the options, all header octets following the destination address.
    pub fn options(&self) -> &[u8] {
        &self.0[field::DST_ADDR.end..usize::from(self.header_len())]
    }

    /// Validate the header checksum.
    ///
    /// # Fuzzing
    /// This function always returns `true` when fuzzing.
    pub fn verify_checksum(&self) -> bool {
        let len = usize::from(self.header_len());
        let mut header = [0; MAX_HEADER_LEN];
        header[..len].copy_from_slice(&self.0[..len]);
        header[field::CHECKSUM].copy_from_slice(&[0, 0]);
        checksum::validate(&header[..len], None, self.checksum(), checksum::ZeroPolicy::Checked)
    }

    /// Set the version field.
    #[inline]
    pub fn set_version(&mut self, value: u8) {
        self.0[field::VER_IHL] = (self.0[field::VER_IHL] & !0xf0) | (value << 4);
    }

    /// Set the header length, in octets.
    #[inline]
    pub fn set_header_len(&mut self, value: u8) {
        self.0[field::VER_IHL] = (self.0[field::VER_IHL] & !0x0f) | ((value / 4) & 0x0f);
    }

    /// Set the Differential Services Code Point field.
    pub fn set_dscp(&mut self, value: u8) {
        self.0[field::DSCP_ECN] = (self.0[field::DSCP_ECN] & !0xfc) | (value << 2)
    }

    /// Set the Explicit Congestion Notification field.
    pub fn set_ecn(&mut self, value: u8) {
        self.0[field::DSCP_ECN] = (self.0[field::DSCP_ECN] & !0x03) | (value & 0x03)
    }

    /// Set the total length field.
    #[inline]
    pub fn set_total_len(&mut self, value: u16) {
        NetworkEndian::write_u16(&mut self.0[field::LENGTH], value)
    }

    /// Set the fragment identification field.
    #[inline]
    pub fn set_ident(&mut self, value: u16) {
        NetworkEndian::write_u16(&mut self.0[field::IDENT], value)
    }

    /// Set the three bit flags field.
    #[inline]
    pub fn set_flags(&mut self, value: u8) {
        let raw = NetworkEndian::read_u16(&self.0[field::FLG_OFF]);
        let raw = (raw & !0xe000) | (u16::from(value & 0b111) << 13);
        NetworkEndian::write_u16(&mut self.0[field::FLG_OFF], raw);
    }

    /// Set the fragment offset, in octets.
    #[inline]
    pub fn set_frag_offset(&mut self, value: u16) {
        let raw = NetworkEndian::read_u16(&self.0[field::FLG_OFF]);
        let raw = (raw & 0xe000) | (value >> 3);
        NetworkEndian::write_u16(&mut self.0[field::FLG_OFF], raw);
    }

    /// Set the time to live field.
    #[inline]
    pub fn set_hop_limit(&mut self, value: u8) {
        self.0[field::TTL] = value
    }

    /// Set the protocol field.
    #[inline]
    pub fn set_protocol(&mut self, value: Protocol) {
        self.0[field::PROTOCOL] = value.into()
    }

    /// Set the header checksum field.
    #[inline]
    pub fn set_checksum(&mut self, value: u16) {
        NetworkEndian::write_u16(&mut self.0[field::CHECKSUM], value)
    }

    /// Set the source address field.
    #[inline]
    pub fn set_src_addr(&mut self, value: Address) {
        self.0[field::SRC_ADDR].copy_from_slice(value.as_bytes())
    }

    /// Set the destination address field.
    #[inline]
    pub fn set_dst_addr(&mut self, value: Address) {
        self.0[field::DST_ADDR].copy_from_slice(value.as_bytes())
    }

    /// Set the options.
    ///
    /// # Panics
    /// This function panics if `value` does not fill the header exactly, as declared by the
    /// header length.
    pub fn set_options(&mut self, value: &[u8]) {
        let end = usize::from(self.header_len());
        self.0[field::DST_ADDR.end..end].copy_from_slice(value)
    }

    /// Compute and fill in the header checksum.
    pub fn fill_checksum(&mut self) {
        self.set_checksum(0);
        let checksum = checksum::compute(&self.0[..self.header_len() as usize], None);
        self.set_checksum(checksum)
    }

    /// Compute the range of the payload without accessing it.
    ///
    /// Contrary to `payload_slice`, this only requires the packet to have a valid header but need
    /// not have a consistent length for the payload itself.
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

/// A high-level representation of an Internet Protocol version 4 packet header.
///
/// All fields are kept as found on the wire, including the header length, total length and
/// checksum. Nothing is validated beyond the structural consistency of the lengths, so a
/// decoded header always emits the octets it was decoded from.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Repr {
    /// The header length in 32-bit words.
    pub ihl:         u8,
    /// The Differential Services Code Point.
    pub dscp:        u8,
    /// The Explicit Congestion Notification.
    pub ecn:         u8,
    /// The length of header and payload in octets.
    pub total_len:   u16,
    /// The fragment identification.
    pub ident:       u16,
    /// The three bit flags field, see `FLAG_DONT_FRAG` and `FLAG_MORE_FRAGS`.
    pub flags:       u8,
    /// The fragment offset in octets, always a multiple of 8.
    pub frag_offset: u16,
    /// The remaining hop limit of the packet.
    pub hop_limit:   u8,
    /// The encapsulated protocol identifier.
    pub protocol:    Protocol,
    /// The header checksum.
    pub checksum:    u16,
    /// The source of the packet.
    pub src_addr:    Address,
    /// The destination of the packet.
    pub dst_addr:    Address,
    /// Option octets, verbatim.
    pub options:     Vec<u8>,
}

impl Repr {
    /// Create the header of an unfragmented packet without options.
    ///
    /// The checksum is left zeroed, see [`ipv4::fill_checksum`](struct.ipv4.html#method.fill_checksum).
    pub fn new(src_addr: Address, dst_addr: Address, protocol: Protocol, payload_len: usize)
        -> Self
    {
        Repr {
            ihl: (MIN_HEADER_LEN / 4) as u8,
            dscp: 0,
            ecn: 0,
            total_len: (MIN_HEADER_LEN + payload_len) as u16,
            ident: 0,
            flags: FLAG_DONT_FRAG,
            frag_offset: 0,
            hop_limit: DEFAULT_HOP_LIMIT,
            protocol,
            checksum: 0,
            src_addr,
            dst_addr,
            options: Vec::new(),
        }
    }

    /// Parse an Internet Protocol version 4 packet and return a high-level representation.
    pub fn parse(packet: &ipv4) -> Result<Repr> {
        packet.check_len()?;
        // Version 4 is expected.
        if Version::of_packet(packet.as_bytes()) != Ok(Version::Ipv4) {
            return Err(Error::Malformed);
        }

        // All DSCP values are acceptable, since they are of no concern to receiving endpoint.
        // All ECN values are acceptable, since ECN requires opt-in from both endpoints.
        // All TTL values are acceptable, since we do not perform routing.
        Ok(Repr {
            ihl:         packet.header_len() / 4,
            dscp:        packet.dscp(),
            ecn:         packet.ecn(),
            total_len:   packet.total_len(),
            ident:       packet.ident(),
            flags:       packet.flags(),
            frag_offset: packet.frag_offset(),
            hop_limit:   packet.hop_limit(),
            protocol:    packet.protocol(),
            checksum:    packet.checksum(),
            src_addr:    packet.src_addr(),
            dst_addr:    packet.dst_addr(),
            options:     packet.options().to_vec(),
        })
    }

    /// Decode the header at `offset`, returning it with the number of header octets.
    ///
    /// The payload occupies [`payload_range`](#method.payload_range) relative to `offset`.
    pub fn decode(bytes: &[u8], offset: usize) -> Result<(Repr, usize)> {
        let packet = ipv4::new_checked(tail(bytes, offset)?)?;
        let repr = Repr::parse(packet)?;
        let header_len = repr.header_len();
        Ok((repr, header_len))
    }

    /// Return the length of a header that will be emitted from this high-level representation.
    pub fn header_len(&self) -> usize {
        usize::from(self.ihl) * 4
    }

    /// The octets of the payload, relative to the start of the header.
    pub fn payload_range(&self) -> Field {
        self.header_len()..usize::from(self.total_len)
    }

    /// Query the "don't fragment" flag.
    pub fn dont_frag(&self) -> bool {
        self.flags & FLAG_DONT_FRAG != 0
    }

    /// Query the "more fragments" flag.
    pub fn more_frags(&self) -> bool {
        self.flags & FLAG_MORE_FRAGS != 0
    }

    /// Query whether the payload is only a part of the original datagram.
    pub fn is_fragment(&self) -> bool {
        self.more_frags() || self.frag_offset != 0
    }

    /// Emit a high-level representation into an Internet Protocol version 4 packet.
    ///
    /// Every field is written as is, including the checksum.
    ///
    /// # Panics
    /// This function panics if the options do not fill the declared header length.
    pub fn emit(&self, packet: &mut ipv4) {
        packet.set_version(4);
        packet.set_header_len(self.ihl * 4);
        packet.set_dscp(self.dscp);
        packet.set_ecn(self.ecn);
        packet.set_total_len(self.total_len);
        packet.set_ident(self.ident);
        packet.set_flags(self.flags);
        packet.set_frag_offset(self.frag_offset);
        packet.set_hop_limit(self.hop_limit);
        packet.set_protocol(self.protocol);
        packet.set_checksum(self.checksum);
        packet.set_src_addr(self.src_addr);
        packet.set_dst_addr(self.dst_addr);
        packet.set_options(&self.options);
    }

    fn header_bytes(&self) -> Vec<u8> {
        let mut header = vec![0; self.header_len()];
        self.emit(ipv4::new_unchecked_mut(&mut header));
        header
    }

    /// Compute the checksum of this header, ignoring the current `checksum` field.
    pub fn compute_checksum(&self) -> u16 {
        let mut header = self.header_bytes();
        let packet = ipv4::new_unchecked_mut(&mut header);
        packet.fill_checksum();
        packet.checksum()
    }

    /// Validate the `checksum` field against the other fields.
    pub fn verify_checksum(&self) -> bool {
        ipv4::new_unchecked(&self.header_bytes()).verify_checksum()
    }
}

impl fmt::Display for Repr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "IPv4 src={} dst={} proto={} hop_limit={}",
               self.src_addr, self.dst_addr, self.protocol, self.hop_limit)?;
        if self.ihl != 5 {
            write!(f, " hlen={}", self.header_len())?;
        }
        if self.dscp != 0 {
            write!(f, " dscp={}", self.dscp)?;
        }
        if self.ecn != 0 {
            write!(f, " ecn={}", self.ecn)?;
        }
        write!(f, " tlen={}", self.total_len)?;
        if self.dont_frag() {
            write!(f, " df")?;
        }
        if self.more_frags() {
            write!(f, " mf")?;
        }
        if self.frag_offset != 0 {
            write!(f, " off={}", self.frag_offset)?;
        }
        if self.is_fragment() {
            write!(f, " id={}", self.ident)?;
        }
        Ok(())
    }
}
