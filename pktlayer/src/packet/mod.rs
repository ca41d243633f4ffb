//! Layered packets, decoded from and serialized to exact octet sequences.
//!
//! A [`Packet`] is the owned result of decoding one layer: its header, the payload it encloses
//! (another packet, undecoded octets or nothing) and the trailing octets of its region that no
//! enclosed layer claimed, such as Ethernet padding. Concatenating the three reproduces the
//! decoded region exactly.
//!
//! Decoding is driven by a [`Dispatcher`] which maps the type field of a header to the decoder of
//! the next layer. Serialization goes through a [`Builder`], which can compute length, type and
//! checksum fields from the layers it encloses.
//!
//! [`Packet`]: struct.Packet.html
//! [`Dispatcher`]: struct.Dispatcher.html
//! [`Builder`]: enum.Builder.html
use core::fmt;

use crate::wire::{ArpRepr, EthernetRepr, Ipv4Repr, Kind, UdpRepr};
use crate::wire::{arp_packet, ethernet_frame, ipv4_packet, udp_packet};

mod builder;
mod dispatch;
#[cfg(test)]
mod tests;

pub use self::builder::{
    ArpBuilder,
    Builder,
    EthernetBuilder,
    Field,
    Ipv4Builder,
    UdpBuilder};

pub use self::dispatch::{
    decode_arp,
    decode_ethernet,
    decode_ipv4,
    decode_udp,
    Context,
    DecodeConfig,
    Decoder,
    Dispatcher,
    Selector};

/// The decoded header of one layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Header {
    /// An Ethernet II frame header.
    Ethernet(EthernetRepr),
    /// An ARP packet, which has no payload.
    Arp(ArpRepr),
    /// An IPv4 header.
    Ipv4(Ipv4Repr),
    /// A UDP header.
    Udp(UdpRepr),
}

/// The content enclosed by a header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// The layer encloses no octets at all.
    Empty,
    /// Octets that were not decoded any further.
    Raw(Vec<u8>),
    /// A decoded packet of the next layer.
    Packet(Box<Packet>),
}

/// A decoded layer together with everything it encloses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    header: Header,
    payload: Payload,
    trailer: Vec<u8>,
}

/// Iterator over a packet and its enclosed packets, outermost first.
///
/// Returned by [`Packet::layers`](struct.Packet.html#method.layers).
#[derive(Clone, Debug)]
pub struct Layers<'a> {
    next: Option<&'a Packet>,
}

impl Header {
    /// The structural kind of this header.
    pub fn kind(&self) -> Kind {
        match self {
            Header::Ethernet(_) => Kind::Ethernet,
            Header::Arp(_) => Kind::Arp,
            Header::Ipv4(_) => Kind::Ipv4,
            Header::Udp(_) => Kind::Udp,
        }
    }

    /// The number of octets emitted for this header.
    pub fn header_len(&self) -> usize {
        match self {
            Header::Ethernet(repr) => repr.header_len(),
            Header::Arp(repr) => repr.header_len(),
            Header::Ipv4(repr) => repr.header_len(),
            Header::Udp(repr) => repr.header_len(),
        }
    }

    /// Emit the header into a buffer of exactly `header_len` octets.
    ///
    /// # Panics
    /// This function panics if the buffer is shorter than the header.
    pub fn emit(&self, buffer: &mut [u8]) {
        match self {
            Header::Ethernet(repr) => repr.emit(ethernet_frame::new_unchecked_mut(buffer)),
            Header::Arp(repr) => repr.emit(arp_packet::new_unchecked_mut(buffer)),
            Header::Ipv4(repr) => repr.emit(ipv4_packet::new_unchecked_mut(buffer)),
            Header::Udp(repr) => repr.emit(udp_packet::new_unchecked_mut(buffer)),
        }
    }

    /// The octets of this header.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = vec![0; self.header_len()];
        self.emit(&mut bytes);
        bytes
    }
}

impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Header::Ethernet(repr) => write!(f, "{}", repr),
            Header::Arp(repr) => write!(f, "{}", repr),
            Header::Ipv4(repr) => write!(f, "{}", repr),
            Header::Udp(repr) => write!(f, "{}", repr),
        }
    }
}

impl Payload {
    /// Wrap undecoded octets, using `Empty` when there are none.
    pub fn raw(bytes: &[u8]) -> Self {
        if bytes.is_empty() {
            Payload::Empty
        } else {
            Payload::Raw(bytes.to_vec())
        }
    }

    /// The number of octets of the payload.
    pub fn len(&self) -> usize {
        match self {
            Payload::Empty => 0,
            Payload::Raw(bytes) => bytes.len(),
            Payload::Packet(packet) => packet.len(),
        }
    }

    /// Query whether the payload holds no octets.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The kind of the enclosed packet, if it was decoded.
    pub fn kind(&self) -> Option<Kind> {
        self.packet().map(Packet::kind)
    }

    /// The enclosed packet, if it was decoded.
    pub fn packet(&self) -> Option<&Packet> {
        match self {
            Payload::Packet(packet) => Some(&**packet),
            _ => None,
        }
    }

    /// Append the octets of the payload.
    pub fn write_to(&self, out: &mut Vec<u8>) {
        match self {
            Payload::Empty => (),
            Payload::Raw(bytes) => out.extend_from_slice(bytes),
            Payload::Packet(packet) => packet.write_to(out),
        }
    }

    /// The octets of the payload.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.len());
        self.write_to(&mut bytes);
        bytes
    }
}

impl Packet {
    /// Assemble a packet from its parts.
    ///
    /// This is meant for custom [`Decoder`]s, which must keep the parts consistent with the
    /// octets they decoded: the header describes the start of the region, the payload follows it
    /// and the trailer holds the rest of the region. A header that encloses nothing, like ARP,
    /// takes `Payload::Empty` and no trailer. Nothing here checks these rules. A packet that
    /// breaks them still serializes its parts in order, but no longer round-trips and its
    /// checksums are not meaningful.
    ///
    /// Packets meant for sending are better assembled with a [`Builder`].
    ///
    /// [`Decoder`]: type.Decoder.html
    /// [`Builder`]: enum.Builder.html
    pub fn new(header: Header, payload: Payload, trailer: Vec<u8>) -> Self {
        Packet { header, payload, trailer }
    }

    /// Decode an Ethernet frame with the standard lenient dispatcher.
    ///
    /// ```
    /// use pktlayer::packet::Packet;
    /// use pktlayer::wire::Kind;
    ///
    /// let frame = [
    ///     0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
    ///     0x02, 0x00, 0x00, 0x00, 0x00, 0x01,
    ///     0x12, 0x34, // not a registered type
    ///     0xde, 0xad,
    /// ];
    /// let packet = Packet::decode(&frame).unwrap();
    /// assert_eq!(packet.kind(), Kind::Ethernet);
    /// assert_eq!(packet.payload().to_bytes(), [0xde, 0xad]);
    /// assert_eq!(packet.to_bytes(), frame);
    /// ```
    pub fn decode(bytes: &[u8]) -> crate::wire::Result<Packet> {
        Dispatcher::shared().decode_frame(bytes)
    }

    /// The header of this layer.
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// The content enclosed by the header.
    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Octets of this layer's region following the payload.
    pub fn trailer(&self) -> &[u8] {
        &self.trailer
    }

    /// The structural kind of this layer.
    pub fn kind(&self) -> Kind {
        self.header.kind()
    }

    /// The packet of the next layer, if it was decoded.
    pub fn inner(&self) -> Option<&Packet> {
        self.payload.packet()
    }

    /// Iterate over this packet and all enclosed packets, outermost first.
    pub fn layers(&self) -> Layers {
        Layers { next: Some(self) }
    }

    /// Find the outermost layer of a kind.
    pub fn find(&self, kind: Kind) -> Option<&Packet> {
        self.layers().find(|layer| layer.kind() == kind)
    }

    /// The number of octets of this packet, including payload and trailer.
    pub fn len(&self) -> usize {
        self.header.header_len() + self.payload.len() + self.trailer.len()
    }

    /// Query whether the packet serializes to no octets, which never happens.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append the octets of this packet.
    pub fn write_to(&self, out: &mut Vec<u8>) {
        let start = out.len();
        out.resize(start + self.header.header_len(), 0);
        self.header.emit(&mut out[start..]);
        self.payload.write_to(out);
        out.extend_from_slice(&self.trailer);
    }

    /// Serialize the packet.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.len());
        self.write_to(&mut bytes);
        bytes
    }

    /// Create a builder reproducing this packet, with every field set explicitly.
    pub fn builder(&self) -> Builder {
        Builder::from_packet(self)
    }

    /// Validate the checksum of this layer.
    ///
    /// Returns `None` for layers without a checksum, and for a UDP layer without the enclosing
    /// IPv4 header its checksum covers.
    pub fn checksum_valid(&self, enclosing: Option<&Ipv4Repr>) -> Option<bool> {
        match &self.header {
            Header::Ipv4(repr) => Some(repr.verify_checksum()),
            Header::Udp(repr) => {
                let ip = enclosing?;
                Some(repr.verify_checksum(ip.src_addr, ip.dst_addr, &self.payload.to_bytes()))
            },
            Header::Ethernet(_) | Header::Arp(_) => None,
        }
    }

    /// Query whether all checksums of this packet and its enclosed layers are correct.
    pub fn checksums_valid(&self) -> bool {
        let mut enclosing = None;
        for layer in self.layers() {
            if layer.checksum_valid(enclosing) == Some(false) {
                return false;
            }
            if let Header::Ipv4(repr) = &layer.header {
                enclosing = Some(repr);
            }
        }
        true
    }
}

impl<'a> Iterator for Layers<'a> {
    type Item = &'a Packet;

    fn next(&mut self) -> Option<&'a Packet> {
        let current = self.next?;
        self.next = current.inner();
        Some(current)
    }
}

/// Indentation of one line of the layered display.
struct Indent(usize);

impl fmt::Display for Indent {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.0 == 0 {
            Ok(())
        } else {
            write!(f, "\n{:1$}\\ ", "", self.0 - 1)
        }
    }
}

fn format_checksum(f: &mut fmt::Formatter, correct: Option<bool>) -> fmt::Result {
    match correct {
        Some(false) => write!(f, " (checksum incorrect)"),
        _ => Ok(()),
    }
}

impl fmt::Display for Packet {
    /// One line per layer, each enclosed layer indented one step further.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut enclosing = None;
        let mut level = 0;
        for layer in self.layers() {
            write!(f, "{}{}", Indent(level), layer.header)?;
            format_checksum(f, layer.checksum_valid(enclosing))?;
            if let Header::Ipv4(repr) = &layer.header {
                enclosing = Some(repr);
            }
            level += 1;
            if let Payload::Raw(bytes) = &layer.payload {
                write!(f, "{}({} octets undecoded)", Indent(level), bytes.len())?;
            }
        }
        // Trailers are listed innermost first, closest to where they appear on the wire.
        let layers: Vec<_> = self.layers().collect();
        for (depth, layer) in layers.iter().enumerate().rev() {
            if !layer.trailer.is_empty() {
                write!(f, "{}({} octets trailer of {})",
                    Indent(depth + 1), layer.trailer.len(), layer.kind())?;
            }
        }
        Ok(())
    }
}
