//! Selection of the decoder for the next layer.
use core::fmt;
use std::collections::HashMap;

use crate::wire::{ArpRepr, EtherType, EthernetRepr, IpProtocol, Ipv4Repr, UdpRepr};
use crate::wire::{Error, Result};

use super::{Header, Packet, Payload};

/// The type field value that announces the next layer.
///
/// Each variant is a separate namespace, the same code has unrelated meanings in each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Selector {
    /// The type field of an Ethernet frame.
    EtherType(EtherType),
    /// The protocol field of an IP packet.
    IpProtocol(IpProtocol),
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Selector::EtherType(ty) => write!(f, "EtherType {}", ty),
            Selector::IpProtocol(proto) => write!(f, "IP protocol {}", proto),
        }
    }
}

/// Decodes one layer at the start of its input.
///
/// The returned packet covers the region the layer claims, which may be shorter than the
/// input. The remainder becomes the trailer of the enclosing layer. A packet longer than its
/// input is treated as a malformed header.
pub type Decoder = fn(&Dispatcher, &[u8], Context) -> Result<Packet>;

/// The position of a decoder within the layer chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Context {
    depth: usize,
}

impl Context {
    /// The context of the outermost layer.
    pub fn root() -> Self {
        Context::default()
    }

    /// The number of layers enclosing the one being decoded.
    pub fn depth(self) -> usize {
        self.depth
    }

    /// The context of a layer enclosed by this one.
    pub fn enter(self) -> Self {
        Context { depth: self.depth + 1 }
    }
}

/// Configuration of a [`Dispatcher`](struct.Dispatcher.html).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeConfig {
    /// Fail the whole decode when an enclosed header is malformed.
    ///
    /// By default such a header and everything after it is kept as raw payload.
    pub strict: bool,

    /// The number of enclosing layers beyond which payloads are no longer decoded.
    pub max_depth: usize,
}

impl DecodeConfig {
    /// The lenient configuration.
    pub fn new() -> Self {
        DecodeConfig {
            strict: false,
            max_depth: 16,
        }
    }

    /// Choose whether enclosed malformed headers fail the decode.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Choose the maximum nesting depth.
    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

impl Default for DecodeConfig {
    fn default() -> Self {
        DecodeConfig::new()
    }
}

/// An explicit mapping from type field values to decoders.
///
/// ```
/// use pktlayer::packet::{DecodeConfig, Dispatcher, Payload, Selector};
/// use pktlayer::wire::EtherType;
///
/// let strict = Dispatcher::standard().with_config(DecodeConfig::new().strict(true));
/// // A single octet is no IPv4 header.
/// assert!(strict.decode_next(Selector::EtherType(EtherType::IPV4), &[0x45]).is_err());
///
/// let lenient = Dispatcher::standard();
/// assert_eq!(
///     lenient.decode_next(Selector::EtherType(EtherType::IPV4), &[0x45]).unwrap(),
///     Payload::Raw(vec![0x45]));
/// ```
#[derive(Clone)]
pub struct Dispatcher {
    decoders: HashMap<Selector, Decoder>,
    config: DecodeConfig,
}

impl Dispatcher {
    /// A dispatcher that decodes no payload at all.
    pub fn new() -> Self {
        Dispatcher {
            decoders: HashMap::new(),
            config: DecodeConfig::default(),
        }
    }

    /// A dispatcher for the protocols of this crate.
    ///
    /// Ethernet frames enclose ARP and IPv4, IPv4 encloses UDP and, as a tunnel, IPv4 again.
    pub fn standard() -> Self {
        let mut dispatcher = Dispatcher::new();
        dispatcher.register(Selector::EtherType(EtherType::ARP), decode_arp);
        dispatcher.register(Selector::EtherType(EtherType::IPV4), decode_ipv4);
        dispatcher.register(Selector::IpProtocol(IpProtocol::IPV4), decode_ipv4);
        dispatcher.register(Selector::IpProtocol(IpProtocol::UDP), decode_udp);
        dispatcher
    }

    /// The shared lenient standard dispatcher.
    pub fn shared() -> &'static Dispatcher {
        lazy_static::lazy_static! {
            static ref STANDARD: Dispatcher = Dispatcher::standard();
        }
        &STANDARD
    }

    /// Replace the configuration.
    pub fn with_config(mut self, config: DecodeConfig) -> Self {
        self.config = config;
        self
    }

    /// The current configuration.
    pub fn config(&self) -> DecodeConfig {
        self.config
    }

    /// Register a decoder, returning the one it replaces.
    pub fn register(&mut self, selector: Selector, decoder: Decoder) -> Option<Decoder> {
        net_trace!("dispatcher: registered {}", selector);
        self.decoders.insert(selector, decoder)
    }

    /// Query whether a decoder is registered.
    pub fn contains(&self, selector: Selector) -> bool {
        self.decoders.contains_key(&selector)
    }

    /// Decode a complete Ethernet frame.
    ///
    /// The frame header itself must be valid, a failure to decode it is always returned. The
    /// handling of enclosed layers depends on the configuration.
    pub fn decode_frame(&self, bytes: &[u8]) -> Result<Packet> {
        decode_ethernet(self, bytes, Context::root())
    }

    /// Decode the payload of an outermost layer announced by `selector`.
    pub fn decode_next(&self, selector: Selector, bytes: &[u8]) -> Result<Payload> {
        self.decode_nested(selector, bytes, Context::root())
    }

    /// Decode the payload of a layer at `context`, announced by `selector`.
    ///
    /// * Empty input is `Payload::Empty`.
    /// * Input without a registered decoder is `Payload::Raw`.
    /// * Input whose header is malformed is `Payload::Raw` unless the dispatcher is strict, in
    ///   which case the error is returned.
    pub fn decode_nested(&self, selector: Selector, bytes: &[u8], context: Context)
        -> Result<Payload>
    {
        if bytes.is_empty() {
            return Ok(Payload::Empty);
        }

        let decoder = match self.decoders.get(&selector) {
            Some(decoder) => *decoder,
            None => return Ok(Payload::Raw(bytes.to_vec())),
        };

        if context.depth() >= self.config.max_depth {
            net_debug!("dispatcher: {} nested too deep, kept raw", selector);
            return Ok(Payload::Raw(bytes.to_vec()));
        }

        let decoded = decoder(self, bytes, context.enter())
            .and_then(|packet| if packet.len() > bytes.len() {
                Err(Error::Malformed)
            } else {
                Ok(packet)
            });

        match decoded {
            Ok(packet) => Ok(Payload::Packet(Box::new(packet))),
            Err(err) if !self.config.strict && err.is_malformed_header() => {
                net_debug!("dispatcher: {} payload kept raw: {}", selector, err);
                Ok(Payload::Raw(bytes.to_vec()))
            },
            Err(err) => Err(err),
        }
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Dispatcher::standard()
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut selectors: Vec<_> = self.decoders.keys().collect();
        selectors.sort_by_key(|selector| match selector {
            Selector::EtherType(ty) => (0, u32::from(ty.code())),
            Selector::IpProtocol(proto) => (1, u32::from(proto.code())),
        });
        f.debug_struct("Dispatcher")
            .field("selectors", &selectors)
            .field("config", &self.config)
            .finish()
    }
}

/// Decode an Ethernet frame, the octets after its payload are its trailer.
pub fn decode_ethernet(dispatcher: &Dispatcher, bytes: &[u8], context: Context)
    -> Result<Packet>
{
    let (repr, header_len) = EthernetRepr::decode(bytes, 0)?;
    let rest = &bytes[header_len..];
    let payload = dispatcher.decode_nested(Selector::EtherType(repr.ethertype), rest, context)?;
    let trailer = rest.get(payload.len()..).ok_or(Error::Malformed)?.to_vec();
    Ok(Packet::new(Header::Ethernet(repr), payload, trailer))
}

/// Decode an ARP packet, which encloses nothing.
pub fn decode_arp(_: &Dispatcher, bytes: &[u8], _: Context) -> Result<Packet> {
    let (repr, _) = ArpRepr::decode(bytes, 0)?;
    Ok(Packet::new(Header::Arp(repr), Payload::Empty, Vec::new()))
}

/// Decode an IPv4 packet within its total length.
///
/// Fragments are not reassembled, their payload stays raw.
pub fn decode_ipv4(dispatcher: &Dispatcher, bytes: &[u8], context: Context) -> Result<Packet> {
    let (repr, _) = Ipv4Repr::decode(bytes, 0)?;
    let inner = &bytes[repr.payload_range()];
    let payload = if repr.is_fragment() {
        net_trace!("dispatcher: IPv4 fragment id={} kept raw", repr.ident);
        Payload::raw(inner)
    } else {
        dispatcher.decode_nested(Selector::IpProtocol(repr.protocol), inner, context)?
    };
    let trailer = inner.get(payload.len()..).ok_or(Error::Malformed)?.to_vec();
    Ok(Packet::new(Header::Ipv4(repr), payload, trailer))
}

/// Decode a UDP packet within its length, its payload stays raw.
pub fn decode_udp(_: &Dispatcher, bytes: &[u8], _: Context) -> Result<Packet> {
    let (repr, _) = UdpRepr::decode(bytes, 0)?;
    let payload = Payload::raw(&bytes[repr.payload_range()]);
    Ok(Packet::new(Header::Udp(repr), payload, Vec::new()))
}
