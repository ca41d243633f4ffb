use core::fmt;
use byteorder::{ByteOrder, NetworkEndian};

use super::{Error, IpProtocol, Ipv4Address, Result, tail};
use super::checksum::{self, PseudoHeader, ZeroPolicy};
use super::field::Field;

byte_wrapper! {
    /// A byte sequence representing a UDP packet.
    #[derive(Debug, PartialEq, Eq)]
    pub struct udp([u8]);
}

mod field {
    #![allow(non_snake_case)]

    use crate::wire::field::Field;

    pub const SRC_PORT: Field = 0..2;
    pub const DST_PORT: Field = 2..4;
    pub const LENGTH:   Field = 4..6;
    pub const CHECKSUM: Field = 6..8;

    pub fn PAYLOAD(length: u16) -> Field {
        CHECKSUM.end..(length as usize)
    }
}

/// The length of the UDP header.
pub const HEADER_LEN: usize = field::CHECKSUM.end;

impl udp {
    pub fn new_unchecked(data: &[u8]) -> &Self {
        Self::__from_macro_new_unchecked(data)
    }

    pub fn new_unchecked_mut(data: &mut [u8]) -> &mut Self {
        Self::__from_macro_new_unchecked_mut(data)
    }

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
    /// Returns `Err(Error::Malformed)` if the length field has a value smaller
    /// than the header length.
    ///
    /// The result of this check is invalidated by calling [set_len].
    ///
    /// [set_len]: #method.set_len
    pub fn check_len(&self) -> Result<()> {
        let buffer_len = self.0.len();
        if buffer_len < field::CHECKSUM.end {
            Err(Error::Truncated)
        } else {
            let field_len = self.len() as usize;
            if field_len < field::CHECKSUM.end {
                Err(Error::Malformed)
            } else if buffer_len < field_len {
                Err(Error::Truncated)
            } else {
                Ok(())
            }
        }
    }

    /// Return the source port field.
    #[inline]
    pub fn src_port(&self) -> u16 {
        NetworkEndian::read_u16(&self.0[field::SRC_PORT])
    }

    /// Return the destination port field.
    #[inline]
    pub fn dst_port(&self) -> u16 {
        NetworkEndian::read_u16(&self.0[field::DST_PORT])
    }

    /// Return the length field.
    #[inline]
    pub fn len(&self) -> u16 {
        NetworkEndian::read_u16(&self.0[field::LENGTH])
    }

    /// Return the checksum field.
    #[inline]
    pub fn checksum(&self) -> u16 {
        NetworkEndian::read_u16(&self.0[field::CHECKSUM])
    }

    /// Set the source port field.
    #[inline]
    pub fn set_src_port(&mut self, value: u16) {
        NetworkEndian::write_u16(&mut self.0[field::SRC_PORT], value)
    }

    /// Set the destination port field.
    #[inline]
    pub fn set_dst_port(&mut self, value: u16) {
        NetworkEndian::write_u16(&mut self.0[field::DST_PORT], value)
    }

    /// Set the length field.
    #[inline]
    pub fn set_len(&mut self, value: u16) {
        NetworkEndian::write_u16(&mut self.0[field::LENGTH], value)
    }

    /// Set the checksum field.
    #[inline]
    pub fn set_checksum(&mut self, value: u16) {
        NetworkEndian::write_u16(&mut self.0[field::CHECKSUM], value)
    }

    fn pseudo_header(&self, src_addr: Ipv4Address, dst_addr: Ipv4Address) -> PseudoHeader {
        PseudoHeader::ipv4(src_addr, dst_addr, IpProtocol::UDP, self.len())
    }

    /// Compute and fill in the checksum, covering the pseudo-header of an enclosing IPv4 packet.
    pub fn fill_checksum(&mut self, src_addr: Ipv4Address, dst_addr: Ipv4Address) {
        self.set_checksum(0);
        let pseudo = self.pseudo_header(src_addr, dst_addr);
        let checksum = checksum::compute(&self.0[..self.len() as usize], Some(&pseudo));
        // UDP checksum value of 0 means no checksum; if the checksum really is zero,
        // use all-ones, which indicates that the remote end must verify the checksum.
        // Arithmetically, RFC 1071 checksums of all-zeroes and all-ones behave identically,
        // so no action is necessary on the remote end.
        self.set_checksum(if checksum == 0 { 0xffff } else { checksum })
    }

    /// Validate the packet checksum.
    ///
    /// A checksum field of zero means the sender did not compute one, which always validates.
    ///
    /// # Fuzzing
    /// This function always returns `true` when fuzzing.
    pub fn verify_checksum(&self, src_addr: Ipv4Address, dst_addr: Ipv4Address) -> bool {
        let pseudo = self.pseudo_header(src_addr, dst_addr);
        let mut bytes = self.0[..usize::from(self.len())].to_vec();
        bytes[field::CHECKSUM].copy_from_slice(&[0, 0]);
        checksum::validate(&bytes, Some(&pseudo), self.checksum(), ZeroPolicy::Absent)
    }

    pub fn payload_slice(&self) -> &[u8] {
        let len = self.len();
        &self.0[field::PAYLOAD(len)]
    }

    pub fn payload_mut_slice(&mut self) -> &mut [u8] {
        let len = self.len();
        &mut self.0[field::PAYLOAD(len)]
    }
}

/// A high-level representation of an User Datagram Protocol packet.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Repr {
    pub src_port: u16,
    pub dst_port: u16,
    pub length: u16,
    pub checksum: u16,
}

impl Repr {
    /// Parse an User Datagram Protocol packet and return a high-level representation.
    ///
    /// Zero ports are kept as found, the packet may have been captured from a faulty sender.
    pub fn parse(packet: &udp) -> Result<Repr> {
        packet.check_len()?;

        Ok(Repr {
            src_port: packet.src_port(),
            dst_port: packet.dst_port(),
            length: packet.len(),
            checksum: packet.checksum(),
        })
    }

    /// Decode the header at `offset`, returning it with the number of header octets.
    ///
    /// The payload occupies [`payload_range`](#method.payload_range) relative to `offset`.
    pub fn decode(bytes: &[u8], offset: usize) -> Result<(Repr, usize)> {
        let packet = udp::new_checked(tail(bytes, offset)?)?;
        Ok((Repr::parse(packet)?, HEADER_LEN))
    }

    /// Return the length of the header.
    pub fn header_len(&self) -> usize {
        HEADER_LEN
    }

    /// The octets of the payload, relative to the start of the header.
    pub fn payload_range(&self) -> Field {
        field::PAYLOAD(self.length)
    }

    /// Emit a high-level representation into an User Datagram Protocol packet.
    ///
    /// Every field is written as is, including the checksum.
    pub fn emit(&self, packet: &mut udp) {
        packet.set_src_port(self.src_port);
        packet.set_dst_port(self.dst_port);
        packet.set_len(self.length);
        packet.set_checksum(self.checksum);
    }

    /// Validate the `checksum` field for the given payload and enclosing addresses.
    pub fn verify_checksum(&self, src_addr: Ipv4Address, dst_addr: Ipv4Address, payload: &[u8])
        -> bool
    {
        if self.checksum == 0 {
            return true;
        }
        let mut bytes = vec![0; HEADER_LEN + payload.len()];
        let packet = udp::new_unchecked_mut(&mut bytes);
        self.emit(packet);
        packet.as_bytes_mut()[HEADER_LEN..].copy_from_slice(payload);
        // The covered region is defined by the length field, not by what was handed to us.
        if usize::from(self.length) != bytes.len() {
            return false;
        }
        udp::new_unchecked(&bytes).verify_checksum(src_addr, dst_addr)
    }
}

impl fmt::Display for Repr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let payload_len = usize::from(self.length)
            .checked_sub(field::CHECKSUM.end);
        if let Some(payload_len) = payload_len {
            write!(f, "UDP src={} dst={} len={}",
                self.src_port, self.dst_port, payload_len)
        } else {
            write!(f, "UDP src={} dst={} len=??",
                self.src_port, self.dst_port)
        }
    }
}
