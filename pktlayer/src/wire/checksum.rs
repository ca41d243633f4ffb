//! The RFC 1071 Internet checksum.
//!
//! The checksum is the one's complement of the one's complement sum of all 16-bit big-endian
//! words in a region. A region of odd length is summed as if padded with a single zero octet.
//! Transport protocols additionally cover a pseudo-header made from fields of the enclosing IP
//! header, which is summed before the region itself.
use byteorder::{ByteOrder, NetworkEndian};

use super::{IpProtocol, Ipv4Address};

fn propagate_carries(word: u32) -> u16 {
    let sum = (word >> 16) + (word & 0xffff);
    ((sum >> 16) as u16) + (sum as u16)
}

/// Compute an RFC 1071 compliant checksum (without the final complement).
pub fn data(mut data: &[u8]) -> u16 {
    let mut accum = 0;

    // For each 32-byte chunk...
    const CHUNK_SIZE: usize = 32;
    while data.len() >= CHUNK_SIZE {
        let mut d = &data[..CHUNK_SIZE];
        // ... take by 2 bytes and sum them.
        while d.len() >= 2 {
            accum += NetworkEndian::read_u16(d) as u32;
            d = &d[2..];
        }

        data = &data[CHUNK_SIZE..];
    }

    // Sum the rest that does not fit the last 32-byte chunk,
    // taking by 2 bytes.
    while data.len() >= 2 {
        accum += NetworkEndian::read_u16(data) as u32;
        data = &data[2..];
    }

    // Add the last remaining odd byte, if any.
    if let Some(&value) = data.first() {
        accum += (value as u32) << 8;
    }

    propagate_carries(accum)
}

/// Combine several RFC 1071 compliant checksums.
pub fn combine(checksums: &[u16]) -> u16 {
    let mut accum: u32 = 0;
    for &word in checksums {
        accum += word as u32;
    }
    propagate_carries(accum)
}

/// Fields of an enclosing IPv4 header covered by a transport checksum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PseudoHeader {
    pub src_addr: Ipv4Address,
    pub dst_addr: Ipv4Address,
    pub protocol: IpProtocol,
    /// The length of the transport header and its payload.
    pub length: u16,
}

impl PseudoHeader {
    /// Assemble the pseudo-header of an IPv4 transport packet.
    pub fn ipv4(src_addr: Ipv4Address, dst_addr: Ipv4Address, protocol: IpProtocol, length: u16)
        -> Self
    {
        PseudoHeader { src_addr, dst_addr, protocol, length }
    }

    /// The 12 octets of the pseudo-header as summed by the checksum.
    pub fn to_bytes(&self) -> [u8; 12] {
        let mut bytes = [0; 12];
        bytes[0..4].copy_from_slice(self.src_addr.as_bytes());
        bytes[4..8].copy_from_slice(self.dst_addr.as_bytes());
        bytes[9] = self.protocol.code();
        NetworkEndian::write_u16(&mut bytes[10..12], self.length);
        bytes
    }

    /// The sum of the pseudo-header (without the final complement).
    pub fn sum(&self) -> u16 {
        data(&self.to_bytes())
    }
}

/// How a checksum field containing zero is treated during validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ZeroPolicy {
    /// Zero is an ordinary checksum value.
    Checked,

    /// Zero means the sender did not compute a checksum; it always validates.
    ///
    /// This is the rule of UDP over IPv4. A computed checksum of zero is transmitted as all-ones
    /// instead, which is arithmetically identical.
    Absent,
}

/// Compute the checksum of a region, optionally preceded by a pseudo-header.
///
/// The checksum field inside `bytes`, if any, must be zeroed.
pub fn compute(bytes: &[u8], pseudo: Option<&PseudoHeader>) -> u16 {
    let sum = match pseudo {
        Some(pseudo) => combine(&[pseudo.sum(), data(bytes)]),
        None => data(bytes),
    };
    !sum
}

/// Validate `claimed` as the checksum of a region, optionally preceded by a pseudo-header.
///
/// As for `compute`, the checksum field inside `bytes` must be zeroed. The claimed value is
/// valid if it complements the recomputed sum, which accepts both representations of zero. With
/// `ZeroPolicy::Absent` a `claimed` value of zero is accepted without looking at the data.
///
/// # Fuzzing
/// This function always returns `true` when fuzzing.
pub fn validate(bytes: &[u8], pseudo: Option<&PseudoHeader>, claimed: u16, policy: ZeroPolicy)
    -> bool
{
    if cfg!(fuzzing) { return true }

    if claimed == 0 && policy == ZeroPolicy::Absent {
        return true;
    }

    let sum = match pseudo {
        Some(pseudo) => combine(&[pseudo.sum(), data(bytes)]),
        None => data(bytes),
    };
    combine(&[sum, claimed]) == !0
}
