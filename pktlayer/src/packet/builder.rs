//! Staging of packets for serialization.
//!
//! Every protocol has a builder with one setter per header field. Fields that can be derived
//! from the enclosed layers are a [`Field`], `Auto` until set explicitly, and are only resolved
//! when `build` is called. The outermost builder owns the builders of all enclosed layers and
//! resolves them first, so that lengths and checksums cover the final octets.
//!
//! ```
//! use pktlayer::packet::{Builder, EthernetBuilder, Ipv4Builder, UdpBuilder};
//! use pktlayer::wire::{EthernetAddress, Ipv4Address};
//!
//! let mut udp = UdpBuilder::new();
//! udp.src_port(4096).dst_port(53).payload(Builder::Raw(b"query".to_vec()));
//!
//! let mut ip = Ipv4Builder::new();
//! ip.src_addr(Ipv4Address::new(10, 0, 0, 1))
//!     .dst_addr(Ipv4Address::new(10, 0, 0, 2))
//!     .payload(udp);
//!
//! let mut frame = EthernetBuilder::new();
//! frame.src_addr(EthernetAddress([0x02, 0, 0, 0, 0, 1]))
//!     .dst_addr(EthernetAddress::BROADCAST)
//!     .payload(ip);
//!
//! let packet = Builder::from(frame).build_packet().unwrap();
//! assert!(packet.checksums_valid());
//! // Padded to the minimum frame size.
//! assert_eq!(packet.len(), 60);
//! ```
//!
//! [`Field`]: enum.Field.html

// Setters are named after the header field they set.
#![allow(missing_docs)]

use core::convert::TryFrom;

use crate::wire::{ethernet, ipv4, udp};
use crate::wire::{ArpHardware, ArpOperation, ArpRepr, EtherType, EthernetAddress, EthernetRepr};
use crate::wire::{IpProtocol, Ipv4Address, Ipv4Repr, UdpRepr};
use crate::wire::{Error, Kind, Result};

use super::{Header, Packet, Payload};

/// A header field that is either set explicitly or computed during `build`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field<T> {
    /// Compute the value from the enclosing and enclosed layers.
    Auto,
    /// Use this value as is.
    Explicit(T),
}

impl<T> Field<T> {
    /// The explicit value, if any.
    pub fn explicit(&self) -> Option<&T> {
        match self {
            Field::Auto => None,
            Field::Explicit(value) => Some(value),
        }
    }

    /// Query whether the value is computed.
    pub fn is_auto(&self) -> bool {
        match self {
            Field::Auto => true,
            Field::Explicit(_) => false,
        }
    }

    fn resolve(&self, compute: impl FnOnce() -> Result<T>) -> Result<T> where T: Clone {
        match self {
            Field::Auto => compute(),
            Field::Explicit(value) => Ok(value.clone()),
        }
    }
}

impl<T> Default for Field<T> {
    fn default() -> Self {
        Field::Auto
    }
}

impl<T> From<T> for Field<T> {
    fn from(value: T) -> Self {
        Field::Explicit(value)
    }
}

/// Fields of enclosing layers that an enclosed layer depends on.
#[derive(Debug, Clone, Copy, Default)]
struct Outer {
    ipv4: Option<(Ipv4Address, Ipv4Address)>,
}

fn required<T: Clone>(value: &Option<T>, name: &'static str) -> Result<T> {
    value.clone().ok_or(Error::Incomplete(name))
}

/// Builder of an Ethernet II frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EthernetBuilder {
    dst_addr: Option<EthernetAddress>,
    src_addr: Option<EthernetAddress>,
    ethertype: Field<EtherType>,
    payload: Option<Box<Builder>>,
    trailer: Field<Vec<u8>>,
}

impl EthernetBuilder {
    pub fn new() -> Self {
        EthernetBuilder::default()
    }

    pub fn dst_addr(&mut self, addr: EthernetAddress) -> &mut Self {
        self.dst_addr = Some(addr);
        self
    }

    pub fn src_addr(&mut self, addr: EthernetAddress) -> &mut Self {
        self.src_addr = Some(addr);
        self
    }

    pub fn ethertype(&mut self, ethertype: EtherType) -> &mut Self {
        self.ethertype = Field::Explicit(ethertype);
        self
    }

    /// Derive the EtherType from the kind of the payload.
    pub fn auto_ethertype(&mut self) -> &mut Self {
        self.ethertype = Field::Auto;
        self
    }

    pub fn payload(&mut self, payload: impl Into<Builder>) -> &mut Self {
        self.payload = Some(Box::new(payload.into()));
        self
    }

    /// Octets following the payload, such as padding or a frame check sequence.
    pub fn trailer(&mut self, trailer: Vec<u8>) -> &mut Self {
        self.trailer = Field::Explicit(trailer);
        self
    }

    /// Pad the frame with zeroes up to the minimum frame length.
    pub fn auto_trailer(&mut self) -> &mut Self {
        self.trailer = Field::Auto;
        self
    }

    fn build_in(&self, _: Outer) -> Result<Packet> {
        let payload = build_payload(&self.payload, Outer::default())?;
        let ethertype = self.ethertype.resolve(|| {
            payload.kind()
                .and_then(EtherType::lookup_by_kind)
                .ok_or(Error::Incomplete("ethertype"))
        })?;
        let repr = EthernetRepr {
            dst_addr: required(&self.dst_addr, "dst_addr")?,
            src_addr: required(&self.src_addr, "src_addr")?,
            ethertype,
        };
        let trailer = self.trailer.resolve(|| {
            let len = repr.header_len() + payload.len();
            Ok(vec![0; ethernet::MIN_FRAME_LEN.saturating_sub(len)])
        })?;
        Ok(Packet::new(Header::Ethernet(repr), payload, trailer))
    }

    fn recompute_all(&mut self) {
        self.ethertype = Field::Auto;
        self.trailer = Field::Auto;
        if let Some(payload) = &mut self.payload {
            payload.recompute_all();
        }
    }
}

/// Builder of an ARP packet for IPv4 over Ethernet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArpBuilder {
    hardware_type: ArpHardware,
    protocol_type: EtherType,
    operation: Option<ArpOperation>,
    source_hardware_addr: Option<EthernetAddress>,
    source_protocol_addr: Option<Ipv4Address>,
    target_hardware_addr: Option<EthernetAddress>,
    target_protocol_addr: Option<Ipv4Address>,
}

impl ArpBuilder {
    pub fn new() -> Self {
        ArpBuilder {
            hardware_type: ArpHardware::ETHERNET,
            protocol_type: EtherType::IPV4,
            operation: None,
            source_hardware_addr: None,
            source_protocol_addr: None,
            target_hardware_addr: None,
            target_protocol_addr: None,
        }
    }

    pub fn hardware_type(&mut self, hardware_type: ArpHardware) -> &mut Self {
        self.hardware_type = hardware_type;
        self
    }

    pub fn protocol_type(&mut self, protocol_type: EtherType) -> &mut Self {
        self.protocol_type = protocol_type;
        self
    }

    pub fn operation(&mut self, operation: ArpOperation) -> &mut Self {
        self.operation = Some(operation);
        self
    }

    pub fn source_hardware_addr(&mut self, addr: EthernetAddress) -> &mut Self {
        self.source_hardware_addr = Some(addr);
        self
    }

    pub fn source_protocol_addr(&mut self, addr: Ipv4Address) -> &mut Self {
        self.source_protocol_addr = Some(addr);
        self
    }

    pub fn target_hardware_addr(&mut self, addr: EthernetAddress) -> &mut Self {
        self.target_hardware_addr = Some(addr);
        self
    }

    pub fn target_protocol_addr(&mut self, addr: Ipv4Address) -> &mut Self {
        self.target_protocol_addr = Some(addr);
        self
    }

    fn build_in(&self, _: Outer) -> Result<Packet> {
        let repr = ArpRepr {
            hardware_type: self.hardware_type,
            protocol_type: self.protocol_type,
            operation: required(&self.operation, "operation")?,
            source_hardware_addr: required(&self.source_hardware_addr, "source_hardware_addr")?,
            source_protocol_addr: required(&self.source_protocol_addr, "source_protocol_addr")?,
            target_hardware_addr: required(&self.target_hardware_addr, "target_hardware_addr")?,
            target_protocol_addr: required(&self.target_protocol_addr, "target_protocol_addr")?,
        };
        Ok(Packet::new(Header::Arp(repr), Payload::Empty, Vec::new()))
    }
}

impl Default for ArpBuilder {
    fn default() -> Self {
        ArpBuilder::new()
    }
}

/// Builder of an IPv4 packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ipv4Builder {
    ihl: Field<u8>,
    dscp: u8,
    ecn: u8,
    total_len: Field<u16>,
    ident: u16,
    flags: u8,
    frag_offset: u16,
    hop_limit: u8,
    protocol: Field<IpProtocol>,
    checksum: Field<u16>,
    src_addr: Option<Ipv4Address>,
    dst_addr: Option<Ipv4Address>,
    options: Vec<u8>,
    payload: Option<Box<Builder>>,
    trailer: Vec<u8>,
}

impl Ipv4Builder {
    /// A builder of an unfragmented packet with the "don't fragment" flag and a hop limit of 64.
    pub fn new() -> Self {
        Ipv4Builder {
            ihl: Field::Auto,
            dscp: 0,
            ecn: 0,
            total_len: Field::Auto,
            ident: 0,
            flags: ipv4::FLAG_DONT_FRAG,
            frag_offset: 0,
            hop_limit: ipv4::DEFAULT_HOP_LIMIT,
            protocol: Field::Auto,
            checksum: Field::Auto,
            src_addr: None,
            dst_addr: None,
            options: Vec::new(),
            payload: None,
            trailer: Vec::new(),
        }
    }

    /// Set the header length in 32-bit words.
    pub fn ihl(&mut self, ihl: u8) -> &mut Self {
        self.ihl = Field::Explicit(ihl);
        self
    }

    /// Derive the header length from the options, which are padded to a multiple of four.
    pub fn auto_ihl(&mut self) -> &mut Self {
        self.ihl = Field::Auto;
        self
    }

    pub fn dscp(&mut self, dscp: u8) -> &mut Self {
        self.dscp = dscp;
        self
    }

    pub fn ecn(&mut self, ecn: u8) -> &mut Self {
        self.ecn = ecn;
        self
    }

    pub fn total_len(&mut self, total_len: u16) -> &mut Self {
        self.total_len = Field::Explicit(total_len);
        self
    }

    pub fn auto_total_len(&mut self) -> &mut Self {
        self.total_len = Field::Auto;
        self
    }

    pub fn ident(&mut self, ident: u16) -> &mut Self {
        self.ident = ident;
        self
    }

    /// Set the three bit flags field.
    pub fn flags(&mut self, flags: u8) -> &mut Self {
        self.flags = flags;
        self
    }

    /// Set the fragment offset in octets.
    pub fn frag_offset(&mut self, frag_offset: u16) -> &mut Self {
        self.frag_offset = frag_offset;
        self
    }

    pub fn hop_limit(&mut self, hop_limit: u8) -> &mut Self {
        self.hop_limit = hop_limit;
        self
    }

    pub fn protocol(&mut self, protocol: IpProtocol) -> &mut Self {
        self.protocol = Field::Explicit(protocol);
        self
    }

    /// Derive the protocol from the kind of the payload.
    pub fn auto_protocol(&mut self) -> &mut Self {
        self.protocol = Field::Auto;
        self
    }

    pub fn checksum(&mut self, checksum: u16) -> &mut Self {
        self.checksum = Field::Explicit(checksum);
        self
    }

    pub fn auto_checksum(&mut self) -> &mut Self {
        self.checksum = Field::Auto;
        self
    }

    pub fn src_addr(&mut self, addr: Ipv4Address) -> &mut Self {
        self.src_addr = Some(addr);
        self
    }

    pub fn dst_addr(&mut self, addr: Ipv4Address) -> &mut Self {
        self.dst_addr = Some(addr);
        self
    }

    pub fn options(&mut self, options: Vec<u8>) -> &mut Self {
        self.options = options;
        self
    }

    pub fn payload(&mut self, payload: impl Into<Builder>) -> &mut Self {
        self.payload = Some(Box::new(payload.into()));
        self
    }

    /// Octets within the total length following the payload.
    pub fn trailer(&mut self, trailer: Vec<u8>) -> &mut Self {
        self.trailer = trailer;
        self
    }

    fn build_in(&self, _: Outer) -> Result<Packet> {
        let src_addr = required(&self.src_addr, "src_addr")?;
        let dst_addr = required(&self.dst_addr, "dst_addr")?;
        let inner = Outer { ipv4: Some((src_addr, dst_addr)) };
        let payload = build_payload(&self.payload, inner)?;

        let protocol = self.protocol.resolve(|| {
            payload.kind()
                .and_then(IpProtocol::lookup_by_kind)
                .ok_or(Error::Incomplete("protocol"))
        })?;

        let mut options = self.options.clone();
        let ihl = self.ihl.resolve(|| {
            let padded = (options.len() + 3) / 4 * 4;
            options.resize(padded, 0);
            Ok(((ipv4::MIN_HEADER_LEN + padded) / 4) as u8)
        })?;
        // An explicit header length must agree with the options to be emitted.
        if usize::from(ihl) * 4 != ipv4::MIN_HEADER_LEN + options.len() {
            return Err(Error::Malformed);
        }
        // The four bit field holds at most 40 octets of options.
        if usize::from(ihl) * 4 > ipv4::MAX_HEADER_LEN {
            return Err(Error::Malformed);
        }

        let total_len = self.total_len.resolve(|| {
            let len = usize::from(ihl) * 4 + payload.len() + self.trailer.len();
            u16::try_from(len).map_err(|_| Error::Malformed)
        })?;

        let mut repr = Ipv4Repr {
            ihl,
            dscp: self.dscp,
            ecn: self.ecn,
            total_len,
            ident: self.ident,
            flags: self.flags,
            frag_offset: self.frag_offset,
            hop_limit: self.hop_limit,
            protocol,
            checksum: 0,
            src_addr,
            dst_addr,
            options,
        };
        repr.checksum = self.checksum.resolve(|| Ok(repr.compute_checksum()))?;

        Ok(Packet::new(Header::Ipv4(repr), payload, self.trailer.clone()))
    }

    fn recompute_all(&mut self) {
        self.ihl = Field::Auto;
        self.total_len = Field::Auto;
        self.protocol = Field::Auto;
        self.checksum = Field::Auto;
        if let Some(payload) = &mut self.payload {
            payload.recompute_all();
        }
    }
}

impl Default for Ipv4Builder {
    fn default() -> Self {
        Ipv4Builder::new()
    }
}

/// Builder of a UDP packet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UdpBuilder {
    src_port: Option<u16>,
    dst_port: Option<u16>,
    length: Field<u16>,
    checksum: Field<u16>,
    payload: Option<Box<Builder>>,
}

impl UdpBuilder {
    pub fn new() -> Self {
        UdpBuilder::default()
    }

    pub fn src_port(&mut self, port: u16) -> &mut Self {
        self.src_port = Some(port);
        self
    }

    pub fn dst_port(&mut self, port: u16) -> &mut Self {
        self.dst_port = Some(port);
        self
    }

    pub fn length(&mut self, length: u16) -> &mut Self {
        self.length = Field::Explicit(length);
        self
    }

    pub fn auto_length(&mut self) -> &mut Self {
        self.length = Field::Auto;
        self
    }

    pub fn checksum(&mut self, checksum: u16) -> &mut Self {
        self.checksum = Field::Explicit(checksum);
        self
    }

    /// Compute the checksum over the pseudo-header of the enclosing IPv4 builder.
    ///
    /// Without an enclosing IPv4 builder the checksum is left zero, meaning absent.
    pub fn auto_checksum(&mut self) -> &mut Self {
        self.checksum = Field::Auto;
        self
    }

    pub fn payload(&mut self, payload: impl Into<Builder>) -> &mut Self {
        self.payload = Some(Box::new(payload.into()));
        self
    }

    fn build_in(&self, outer: Outer) -> Result<Packet> {
        let payload = build_payload(&self.payload, Outer::default())?;
        let length = self.length.resolve(|| {
            u16::try_from(udp::HEADER_LEN + payload.len()).map_err(|_| Error::Malformed)
        })?;
        let mut repr = UdpRepr {
            src_port: required(&self.src_port, "src_port")?,
            dst_port: required(&self.dst_port, "dst_port")?,
            length,
            checksum: 0,
        };
        repr.checksum = self.checksum.resolve(|| {
            let (src_addr, dst_addr) = match outer.ipv4 {
                Some(addrs) => addrs,
                None => return Ok(0),
            };
            let mut bytes = vec![0; udp::HEADER_LEN];
            repr.emit(udp::udp::new_unchecked_mut(&mut bytes));
            payload.write_to(&mut bytes);
            // An explicit length may not cover what we hold.
            bytes.resize(usize::from(length).max(udp::HEADER_LEN), 0);
            let packet = udp::udp::new_unchecked_mut(&mut bytes);
            packet.fill_checksum(src_addr, dst_addr);
            Ok(packet.checksum())
        })?;
        Ok(Packet::new(Header::Udp(repr), payload, Vec::new()))
    }

    fn recompute_all(&mut self) {
        self.length = Field::Auto;
        self.checksum = Field::Auto;
        if let Some(payload) = &mut self.payload {
            payload.recompute_all();
        }
    }
}

/// A builder of any layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Builder {
    Ethernet(EthernetBuilder),
    Arp(ArpBuilder),
    Ipv4(Ipv4Builder),
    Udp(UdpBuilder),
    /// Octets emitted as is.
    Raw(Vec<u8>),
}

impl Builder {
    /// The kind of the packet being built, `None` for raw octets.
    pub fn kind(&self) -> Option<Kind> {
        match self {
            Builder::Ethernet(_) => Some(Kind::Ethernet),
            Builder::Arp(_) => Some(Kind::Arp),
            Builder::Ipv4(_) => Some(Kind::Ipv4),
            Builder::Udp(_) => Some(Kind::Udp),
            Builder::Raw(_) => None,
        }
    }

    /// Serialize all layers.
    ///
    /// Fails with `Error::Incomplete` if a required field was never set, and with
    /// `Error::Malformed` if a header cannot describe what it encloses, such as a computed length
    /// that does not fit its field or an explicit header length that disagrees with the options.
    pub fn build(&self) -> Result<Vec<u8>> {
        match self {
            Builder::Raw(bytes) => Ok(bytes.clone()),
            _ => Ok(self.build_packet()?.to_bytes()),
        }
    }

    /// Resolve all layers into the packet they serialize to.
    ///
    /// Raw octets have no header, so `Builder::Raw` fails with `Error::Unrecognized`.
    pub fn build_packet(&self) -> Result<Packet> {
        match self.build_payload(Outer::default())? {
            Payload::Packet(packet) => Ok(*packet),
            _ => Err(Error::Unrecognized),
        }
    }

    /// Switch every computable field of all layers back to `Auto`.
    pub fn recompute_all(&mut self) -> &mut Self {
        match self {
            Builder::Ethernet(builder) => builder.recompute_all(),
            Builder::Ipv4(builder) => builder.recompute_all(),
            Builder::Udp(builder) => builder.recompute_all(),
            Builder::Arp(_) | Builder::Raw(_) => (),
        }
        self
    }

    fn build_payload(&self, outer: Outer) -> Result<Payload> {
        let packet = match self {
            Builder::Ethernet(builder) => builder.build_in(outer)?,
            Builder::Arp(builder) => builder.build_in(outer)?,
            Builder::Ipv4(builder) => builder.build_in(outer)?,
            Builder::Udp(builder) => builder.build_in(outer)?,
            Builder::Raw(bytes) => return Ok(Payload::raw(bytes)),
        };
        Ok(Payload::Packet(Box::new(packet)))
    }

    pub(crate) fn from_packet(packet: &Packet) -> Builder {
        let payload = match packet.payload() {
            Payload::Empty => None,
            Payload::Raw(bytes) => Some(Box::new(Builder::Raw(bytes.clone()))),
            Payload::Packet(inner) => Some(Box::new(Builder::from_packet(inner))),
        };

        match packet.header() {
            Header::Ethernet(repr) => Builder::Ethernet(EthernetBuilder {
                dst_addr: Some(repr.dst_addr),
                src_addr: Some(repr.src_addr),
                ethertype: Field::Explicit(repr.ethertype),
                payload,
                trailer: Field::Explicit(packet.trailer().to_vec()),
            }),
            Header::Arp(repr) => Builder::Arp(ArpBuilder {
                hardware_type: repr.hardware_type,
                protocol_type: repr.protocol_type,
                operation: Some(repr.operation),
                source_hardware_addr: Some(repr.source_hardware_addr),
                source_protocol_addr: Some(repr.source_protocol_addr),
                target_hardware_addr: Some(repr.target_hardware_addr),
                target_protocol_addr: Some(repr.target_protocol_addr),
            }),
            Header::Ipv4(repr) => Builder::Ipv4(Ipv4Builder {
                ihl: Field::Explicit(repr.ihl),
                dscp: repr.dscp,
                ecn: repr.ecn,
                total_len: Field::Explicit(repr.total_len),
                ident: repr.ident,
                flags: repr.flags,
                frag_offset: repr.frag_offset,
                hop_limit: repr.hop_limit,
                protocol: Field::Explicit(repr.protocol),
                checksum: Field::Explicit(repr.checksum),
                src_addr: Some(repr.src_addr),
                dst_addr: Some(repr.dst_addr),
                options: repr.options.clone(),
                payload,
                trailer: packet.trailer().to_vec(),
            }),
            Header::Udp(repr) => Builder::Udp(UdpBuilder {
                src_port: Some(repr.src_port),
                dst_port: Some(repr.dst_port),
                length: Field::Explicit(repr.length),
                checksum: Field::Explicit(repr.checksum),
                payload,
            }),
        }
    }
}

impl From<EthernetBuilder> for Builder {
    fn from(builder: EthernetBuilder) -> Self {
        Builder::Ethernet(builder)
    }
}

impl From<ArpBuilder> for Builder {
    fn from(builder: ArpBuilder) -> Self {
        Builder::Arp(builder)
    }
}

impl From<Ipv4Builder> for Builder {
    fn from(builder: Ipv4Builder) -> Self {
        Builder::Ipv4(builder)
    }
}

impl From<UdpBuilder> for Builder {
    fn from(builder: UdpBuilder) -> Self {
        Builder::Udp(builder)
    }
}

impl From<Vec<u8>> for Builder {
    fn from(bytes: Vec<u8>) -> Self {
        Builder::Raw(bytes)
    }
}

impl<'a> From<&'a mut EthernetBuilder> for Builder {
    fn from(builder: &'a mut EthernetBuilder) -> Self {
        Builder::Ethernet(builder.clone())
    }
}

impl<'a> From<&'a mut ArpBuilder> for Builder {
    fn from(builder: &'a mut ArpBuilder) -> Self {
        Builder::Arp(builder.clone())
    }
}

impl<'a> From<&'a mut Ipv4Builder> for Builder {
    fn from(builder: &'a mut Ipv4Builder) -> Self {
        Builder::Ipv4(builder.clone())
    }
}

impl<'a> From<&'a mut UdpBuilder> for Builder {
    fn from(builder: &'a mut UdpBuilder) -> Self {
        Builder::Udp(builder.clone())
    }
}

fn build_payload(payload: &Option<Box<Builder>>, outer: Outer) -> Result<Payload> {
    match payload {
        None => Ok(Payload::Empty),
        Some(builder) => builder.build_payload(outer),
    }
}
