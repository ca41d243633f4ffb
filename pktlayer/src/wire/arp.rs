use byteorder::{ByteOrder, NetworkEndian};
use core::fmt;

use super::{Error, Result, tail};

pub use super::EtherType as Protocol;
pub use super::EthernetAddress as Address;
pub use super::Ipv4Address as IpAddress;

named_number! {
    /// ARP hardware type.
    ///
    /// See the [IANA registry](https://www.iana.org/assignments/arp-parameters).
    pub struct Hardware(u16) {
        ETHERNET = 1 => "Ethernet (10Mb)",
        EXPERIMENTAL_ETHERNET = 2 => "Experimental Ethernet (3Mb)",
        AMATEUR_RADIO_AX25 = 3 => "Amateur Radio AX.25",
        IEEE802 = 6 => "IEEE 802 Networks",
        ARCNET = 7 => "ARCNET",
        FRAME_RELAY = 15 => "Frame Relay",
        ATM = 16 => "Asynchronous Transmission Mode (ATM)",
        HDLC = 17 => "HDLC",
        FIBRE_CHANNEL = 18 => "Fibre Channel",
        IEEE1394 = 24 => "IEEE 1394.1995",
        INFINIBAND = 32 => "InfiniBand",
    }
}

named_number! {
    /// ARP operation type.
    pub struct Operation(u16) {
        REQUEST = 1 => "REQUEST",
        REPLY = 2 => "REPLY",
        REQUEST_REVERSE = 3 => "request Reverse",
        REPLY_REVERSE = 4 => "reply Reverse",
        DRARP_REQUEST = 5 => "DRARP-Request",
        DRARP_REPLY = 6 => "DRARP-Reply",
        DRARP_ERROR = 7 => "DRARP-Error",
        INARP_REQUEST = 8 => "InARP-Request",
        INARP_REPLY = 9 => "InARP-Reply",
    }
}

byte_wrapper!{
    /// A byte sequence representing an ARP packet.
    #[derive(Debug, PartialEq, Eq)]
    pub struct arp([u8]);
}

mod field {
    #![allow(non_snake_case)]

    use crate::wire::field::*;

    pub const HTYPE: Field = 0..2;
    pub const PTYPE: Field = 2..4;
    pub const HLEN: usize = 4;
    pub const PLEN: usize = 5;
    pub const OPER: Field = 6..8;

    #[inline]
    pub fn SHA(hardware_len: u8, _protocol_len: u8) -> Field {
        let start = OPER.end;
        start..(start + hardware_len as usize)
    }

    #[inline]
    pub fn SPA(hardware_len: u8, protocol_len: u8) -> Field {
        let start = SHA(hardware_len, protocol_len).end;
        start..(start + protocol_len as usize)
    }

    #[inline]
    pub fn THA(hardware_len: u8, protocol_len: u8) -> Field {
        let start = SPA(hardware_len, protocol_len).end;
        start..(start + hardware_len as usize)
    }

    #[inline]
    pub fn TPA(hardware_len: u8, protocol_len: u8) -> Field {
        let start = THA(hardware_len, protocol_len).end;
        start..(start + protocol_len as usize)
    }
}

/// The hardware address length of the Ethernet form of the packet.
const ETHERNET_LEN: u8 = 6;

/// The protocol address length of the IPv4 form of the packet.
const IPV4_LEN: u8 = 4;

impl arp {
    /// Imbue a raw octet buffer with ARP packet structure.
    pub fn new_unchecked(buffer: &[u8]) -> &arp {
        Self::__from_macro_new_unchecked(buffer)
    }

    /// Imbue a mutable octet buffer with ARP packet structure.
    pub fn new_unchecked_mut(buffer: &mut [u8]) -> &mut arp {
        Self::__from_macro_new_unchecked_mut(buffer)
    }

    /// Shorthand for a combination of [new_unchecked] and [check_len].
    ///
    /// [new_unchecked]: #method.new_unchecked
    /// [check_len]: #method.check_len
    pub fn new_checked(data: &[u8]) -> Result<&arp> {
        let packet = Self::new_unchecked(data);
        packet.check_len()?;
        Ok(packet)
    }

    /// Unwrap the packet as a raw byte slice.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Unwrap the packet as a mutable raw byte slice.
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.0
    }

    /// Ensure that no accessor method will panic if called.
    /// Returns `Err(Error::Truncated)` if the buffer is too short.
    ///
    /// The result of this check is invalidated by calling [set_hardware_len] or
    /// [set_protocol_len].
    ///
    /// [set_hardware_len]: #method.set_hardware_len
    /// [set_protocol_len]: #method.set_protocol_len
    pub fn check_len(&self) -> Result<()> {
        let len = self.0.len();
        if len < field::OPER.end {
            Err(Error::Truncated)
        } else if len < self.header_len() {
            Err(Error::Truncated)
        } else {
            Ok(())
        }
    }

    /// Return the length of the packet as declared by its address length fields.
    pub fn header_len(&self) -> usize {
        field::TPA(self.hardware_len(), self.protocol_len()).end
    }

    /// Return the hardware type field.
    #[inline]
    pub fn hardware_type(&self) -> Hardware {
        let raw = NetworkEndian::read_u16(&self.0[field::HTYPE]);
        Hardware::from(raw)
    }

    /// Return the protocol type field.
    #[inline]
    pub fn protocol_type(&self) -> Protocol {
        let raw = NetworkEndian::read_u16(&self.0[field::PTYPE]);
        Protocol::from(raw)
    }

    /// Return the hardware length field.
    #[inline]
    pub fn hardware_len(&self) -> u8 {
        self.0[field::HLEN]
    }

    /// Return the protocol length field.
    #[inline]
    pub fn protocol_len(&self) -> u8 {
        self.0[field::PLEN]
    }

    /// Return the operation field.
    #[inline]
    pub fn operation(&self) -> Operation {
        let raw = NetworkEndian::read_u16(&self.0[field::OPER]);
        Operation::from(raw)
    }

    /// Return the source hardware address field.
    pub fn source_hardware_addr(&self) -> &[u8] {
        &self.0[field::SHA(self.hardware_len(), self.protocol_len())]
    }

    /// Return the source protocol address field.
    pub fn source_protocol_addr(&self) -> &[u8] {
        &self.0[field::SPA(self.hardware_len(), self.protocol_len())]
    }

    /// Return the target hardware address field.
    pub fn target_hardware_addr(&self) -> &[u8] {
        &self.0[field::THA(self.hardware_len(), self.protocol_len())]
    }

    /// Return the target protocol address field.
    pub fn target_protocol_addr(&self) -> &[u8] {
        &self.0[field::TPA(self.hardware_len(), self.protocol_len())]
    }

    /// Set the hardware type field.
    #[inline]
    pub fn set_hardware_type(&mut self, value: Hardware) {
        NetworkEndian::write_u16(&mut self.0[field::HTYPE], value.into())
    }

    /// Set the protocol type field.
    #[inline]
    pub fn set_protocol_type(&mut self, value: Protocol) {
        NetworkEndian::write_u16(&mut self.0[field::PTYPE], value.into())
    }

    /// Set the hardware length field.
    #[inline]
    pub fn set_hardware_len(&mut self, value: u8) {
        self.0[field::HLEN] = value
    }

    /// Set the protocol length field.
    #[inline]
    pub fn set_protocol_len(&mut self, value: u8) {
        self.0[field::PLEN] = value
    }

    /// Set the operation field.
    #[inline]
    pub fn set_operation(&mut self, value: Operation) {
        NetworkEndian::write_u16(&mut self.0[field::OPER], value.into())
    }

    /// Set the source hardware address field.
    ///
    /// # Panics
    /// The function panics if `value` is not `self.hardware_len()` long.
    pub fn set_source_hardware_addr(&mut self, value: &[u8]) {
        let (hardware_len, protocol_len) = (self.hardware_len(), self.protocol_len());
        self.0[field::SHA(hardware_len, protocol_len)].copy_from_slice(value)
    }

    /// Set the source protocol address field.
    ///
    /// # Panics
    /// The function panics if `value` is not `self.protocol_len()` long.
    pub fn set_source_protocol_addr(&mut self, value: &[u8]) {
        let (hardware_len, protocol_len) = (self.hardware_len(), self.protocol_len());
        self.0[field::SPA(hardware_len, protocol_len)].copy_from_slice(value)
    }

    /// Set the target hardware address field.
    ///
    /// # Panics
    /// The function panics if `value` is not `self.hardware_len()` long.
    pub fn set_target_hardware_addr(&mut self, value: &[u8]) {
        let (hardware_len, protocol_len) = (self.hardware_len(), self.protocol_len());
        self.0[field::THA(hardware_len, protocol_len)].copy_from_slice(value)
    }

    /// Set the target protocol address field.
    ///
    /// # Panics
    /// The function panics if `value` is not `self.protocol_len()` long.
    pub fn set_target_protocol_addr(&mut self, value: &[u8]) {
        let (hardware_len, protocol_len) = (self.hardware_len(), self.protocol_len());
        self.0[field::TPA(hardware_len, protocol_len)].copy_from_slice(value)
    }
}

/// A high-level representation of an Address Resolution Protocol packet.
///
/// Only packets with six octet hardware addresses and four octet protocol addresses are
/// represented, which is the layout used for resolving IPv4 on Ethernet. The type fields are
/// kept as found so that packets for other protocols of the same layout survive a round-trip.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Repr {
    pub hardware_type: Hardware,
    pub protocol_type: Protocol,
    pub operation: Operation,
    pub source_hardware_addr: Address,
    pub source_protocol_addr: IpAddress,
    pub target_hardware_addr: Address,
    pub target_protocol_addr: IpAddress,
}

impl Repr {
    /// Create the representation of an Ethernet and IPv4 packet.
    pub fn ethernet_ipv4(
        operation: Operation,
        source_hardware_addr: Address,
        source_protocol_addr: IpAddress,
        target_hardware_addr: Address,
        target_protocol_addr: IpAddress,
    ) -> Self {
        Repr {
            hardware_type: Hardware::ETHERNET,
            protocol_type: Protocol::IPV4,
            operation,
            source_hardware_addr,
            source_protocol_addr,
            target_hardware_addr,
            target_protocol_addr,
        }
    }

    /// Parse an Address Resolution Protocol packet and return a high-level representation,
    /// or return `Err(Error::Unrecognized)` if the address lengths are not supported.
    pub fn parse(packet: &arp) -> Result<Repr> {
        packet.check_len()?;
        match (packet.hardware_len(), packet.protocol_len()) {
            (ETHERNET_LEN, IPV4_LEN) => Ok(Repr {
                hardware_type: packet.hardware_type(),
                protocol_type: packet.protocol_type(),
                operation: packet.operation(),
                source_hardware_addr: Address::from_bytes(packet.source_hardware_addr()),
                source_protocol_addr: IpAddress::from_bytes(packet.source_protocol_addr()),
                target_hardware_addr: Address::from_bytes(packet.target_hardware_addr()),
                target_protocol_addr: IpAddress::from_bytes(packet.target_protocol_addr()),
            }),
            _ => Err(Error::Unrecognized),
        }
    }

    /// Decode the packet at `offset`, returning it with the number of octets it occupies.
    pub fn decode(bytes: &[u8], offset: usize) -> Result<(Repr, usize)> {
        let packet = arp::new_checked(tail(bytes, offset)?)?;
        let repr = Repr::parse(packet)?;
        Ok((repr, repr.header_len()))
    }

    /// Return the length of a packet that will be emitted from this high-level representation.
    pub fn header_len(&self) -> usize {
        field::TPA(ETHERNET_LEN, IPV4_LEN).end
    }

    /// Emit a high-level representation into an Address Resolution Protocol packet.
    pub fn emit(&self, packet: &mut arp) {
        packet.set_hardware_type(self.hardware_type);
        packet.set_protocol_type(self.protocol_type);
        packet.set_hardware_len(ETHERNET_LEN);
        packet.set_protocol_len(IPV4_LEN);
        packet.set_operation(self.operation);
        packet.set_source_hardware_addr(self.source_hardware_addr.as_bytes());
        packet.set_source_protocol_addr(self.source_protocol_addr.as_bytes());
        packet.set_target_hardware_addr(self.target_hardware_addr.as_bytes());
        packet.set_target_protocol_addr(self.target_protocol_addr.as_bytes());
    }
}

impl fmt::Display for Repr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "ARP htype={} ptype={} src={}/{} tgt={}/{} op={}",
            self.hardware_type,
            self.protocol_type,
            self.source_hardware_addr,
            self.source_protocol_addr,
            self.target_hardware_addr,
            self.target_protocol_addr,
            self.operation,
        )
    }
}
