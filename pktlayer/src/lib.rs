//! Layered decoding and byte-exact re-encoding of network packets.
//!
//! ## Table of contents
//!
//! This is also a recommended reading order but feel free to skip ahead, each chapter tries to be
//! somewhat self-contained.
//!
//! 1. [Design](#design-and-relevant-core-concepts)
//! 2. [Protocol numbers](registry/index.html)
//! 3. [The wire module](wire/index.html)
//!    1. [Overview of packet representations](wire/index.html#an-overview-over-packet-representations)
//!    1. [Checksums](wire/checksum/index.html)
//!    1. [Ethernet](wire/ethernet/index.html)
//!    1. [Arp](wire/arp/index.html)
//!    1. [Ip V4](wire/ipv4/index.html)
//!    1. [Udp](wire/udp/index.html)
//! 4. [Layered packets](packet/index.html)
//!    1. [Dispatching to the next layer](packet/struct.Dispatcher.html)
//!    1. [Building packets](packet/enum.Builder.html)
//! 5. [Captured frames](capture/index.html)
//!
//! ## Design and relevant core concepts
//!
//! A captured frame is decoded into a [`Packet`]: a header, the payload it encloses and the
//! octets of its region that were not claimed by the payload. The payload is again a packet when
//! its type field names a protocol the [`Dispatcher`] has a decoder for, and otherwise stays
//! undecoded. Any packet serializes to exactly the octets it was decoded from, including padding,
//! wrong checksums and unknown type fields.
//!
//! Going the other way, a [`Builder`] stages the fields of each layer. Lengths, type fields and
//! checksums are computed from the enclosed layers unless set explicitly.
//!
//! ```
//! use pktlayer::packet::Packet;
//! use pktlayer::wire::{ArpOperation, Kind};
//!
//! let frame = [
//!     0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0x02, 0x00, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06,
//!     0x00, 0x01, 0x08, 0x00, 0x06, 0x04, 0x00, 0x01,
//!     0x02, 0x00, 0x00, 0x00, 0x00, 0x01, 192, 168, 1, 1,
//!     0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 192, 168, 1, 2,
//! ];
//!
//! let packet = Packet::decode(&frame).unwrap();
//! let arp = packet.find(Kind::Arp).unwrap();
//! match arp.header() {
//!     pktlayer::packet::Header::Arp(repr) => assert_eq!(repr.operation, ArpOperation::REQUEST),
//!     _ => unreachable!(),
//! }
//! assert_eq!(packet.to_bytes(), &frame[..]);
//! ```
//!
//! Protocol numbers are plain values with a code and a name, registered per namespace in a
//! process-wide table. Codes without a registration are kept and named `"unknown"`.
//!
//! [`Packet`]: packet/struct.Packet.html
//! [`Dispatcher`]: packet/struct.Dispatcher.html
//! [`Builder`]: packet/enum.Builder.html
#![warn(missing_docs)]

#[macro_use] mod macros;
pub mod capture;
pub mod packet;
pub mod registry;
pub mod wire;

pub use self::packet::{Builder, Dispatcher, Packet};

#[doc(hidden)]
pub mod __private {
    pub use lazy_static::lazy_static;
}
