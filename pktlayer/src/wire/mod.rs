/*! Low-level packet access and construction.

# An overview over packet representations

The `wire` module deals with the packet *representation*. It provides two levels of
functionality.

 * First, it provides functions to extract fields from sequences of octets, and to insert fields
   into sequences of octets. This happens in the lowercase structures e.g. [`ethernet_frame`] or
   [`ipv4_packet`]. They are unsized wrappers around a byte slice, created with `new_checked`
   which validates the length once so that no accessor panics afterwards.
 * Second, it provides a high-level representation of header data that can be decoded from
   and emitted into a sequence of octets. This happens through the `Repr` family of structs, e.g.
   [`ArpRepr`] or [`Ipv4Repr`]. A `Repr` keeps every field of the header as it was found, including
   length and checksum fields, so that emitting a decoded `Repr` reproduces the original octets.

[`ethernet_frame`]: struct.ethernet_frame.html
[`ipv4_packet`]: struct.ipv4_packet.html
[`ArpRepr`]: struct.ArpRepr.html
[`Ipv4Repr`]: struct.Ipv4Repr.html

Every `Repr` has a `decode(bytes, offset)` constructor returning the representation together
with the number of header octets consumed at `offset`. It fails with [`Error::Truncated`] if the
buffer is shorter than the minimum header length and with [`Error::Malformed`] if a length field
contradicts the header layout. The payload is never copied, the caller slices it from the
buffer with the returned length (or the `payload_range` of headers with a length field).

Protocol numbers (EtherType, IP protocol, ARP operation and hardware type) are registered named
values, see the [`registry`] module.

[`Error::Truncated`]: enum.Error.html#variant.Truncated
[`Error::Malformed`]: enum.Error.html#variant.Malformed
[`registry`]: ../registry/index.html

# Examples

To emit an IP packet header into an octet buffer, and then parse it back:

```rust
use pktlayer::wire::*;

let mut repr = Ipv4Repr::new(
    Ipv4Address::new(10, 0, 0, 1),
    Ipv4Address::new(10, 0, 0, 2),
    IpProtocol::UDP,
    10);
let mut buffer = vec![0; repr.header_len() + 10];
{ // emission
    let packet = ipv4_packet::new_unchecked_mut(&mut buffer);
    repr.emit(packet);
    packet.fill_checksum();
    repr.checksum = packet.checksum();
}
{ // parsing
    let (parsed, header_len) = Ipv4Repr::decode(&buffer, 0)
        .expect("malformed packet");
    assert_eq!(header_len, 20);
    assert_eq!(repr, parsed);
}
```
*/
// Copyright (C) 2016 whitequark@whitequark.org
// Copyright (C) 2019 Andreas Molzer <andreas.molzer@tum.de>
//
// in large parts from `smoltcp` originally distributed under 0-clause BSD
//
// Applies to files in this folder unless otherwise noted. These are:
// * `arp.rs`
// * `checksum.rs`
// * `error.rs`
// * `ethernet.rs`
// * `ip.rs`
// * `ipv4.rs`
// * `mod.rs` (this file)
// * `udp.rs`

// Most fields should be self-explanatory with the general guide above.
#![allow(missing_docs)]

mod field {
    pub(crate) type Field = ::core::ops::Range<usize>;
    pub(crate) type Rest  = ::core::ops::RangeFrom<usize>;
}

pub mod checksum;
pub mod ethernet;
pub mod arp;
pub mod ip;
pub mod ipv4;
pub mod udp;
mod error;

/// The structural kind of a decoded header.
///
/// Registries map kinds to the protocol number an enclosing header uses to announce them, which
/// lets builders fill type fields on their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Kind {
    /// An Ethernet II frame.
    Ethernet,
    /// An Address Resolution Protocol packet.
    Arp,
    /// An Internet Protocol version 4 packet.
    Ipv4,
    /// A User Datagram Protocol packet.
    Udp,
}

impl core::fmt::Display for Kind {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match self {
            Kind::Ethernet => write!(f, "EthernetII"),
            Kind::Arp => write!(f, "ARP"),
            Kind::Ipv4 => write!(f, "IPv4"),
            Kind::Udp => write!(f, "UDP"),
        }
    }
}

/// Slice off everything before `offset`, failing like a short buffer if out of bounds.
pub(crate) fn tail(bytes: &[u8], offset: usize) -> Result<&[u8]> {
    bytes.get(offset..).ok_or(Error::Truncated)
}

pub use self::error::{
    Error,
    Result};

pub use self::checksum::{
    PseudoHeader,
    ZeroPolicy};

pub use self::ethernet::{
    ethernet as ethernet_frame,
    EtherType,
    Address as EthernetAddress,
    Repr as EthernetRepr};

pub use self::arp::{
    arp as arp_packet,
    Hardware as ArpHardware,
    Operation as ArpOperation,
    Repr as ArpRepr};

pub use self::ip::Protocol as IpProtocol;

pub use self::ipv4::{
    ipv4 as ipv4_packet,
    Address as Ipv4Address,
    Repr as Ipv4Repr};

pub use self::udp::{
    udp as udp_packet,
    Repr as UdpRepr};
