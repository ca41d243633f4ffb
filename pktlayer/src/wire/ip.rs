use core::fmt;

use crate::wire::{Error, Result};

/// Internet protocol version.
#[derive(Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Clone, Copy)]
pub enum Version {
    Ipv4,
    Ipv6,
}

impl Version {
    /// Return the version of an IP packet stored in the provided buffer.
    ///
    /// Returns `Err(Error::Truncated)` for an empty buffer and `Err(Error::Unrecognized)` for any
    /// version nibble other than 4 or 6.
    pub fn of_packet(data: &[u8]) -> Result<Version> {
        match data.first().map(|byte| byte >> 4) {
            None => Err(Error::Truncated),
            Some(4) => Ok(Version::Ipv4),
            Some(6) => Ok(Version::Ipv6),
            Some(_) => Err(Error::Unrecognized),
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Version::Ipv4 => write!(f, "IPv4"),
            Version::Ipv6 => write!(f, "IPv6"),
        }
    }
}

named_number! {
    /// IP datagram encapsulated protocol.
    ///
    /// See the [IANA registry](https://www.iana.org/assignments/protocol-numbers).
    pub struct Protocol(u8) {
        HOPOPT = 0x00 => "IPv6 Hop-by-Hop Option",
        ICMPV4 = 0x01 => "ICMPv4",
        IGMP = 0x02 => "IGMP",
        IPV4 = 0x04 => "IPv4 encapsulation",
        TCP = 0x06 => "TCP",
        UDP = 0x11 => "UDP",
        IPV6 = 0x29 => "IPv6",
        IPV6_ROUTE = 0x2b => "Routing Header for IPv6",
        IPV6_FRAG = 0x2c => "Fragment Header for IPv6",
        GRE = 0x2f => "GRE",
        ICMPV6 = 0x3a => "ICMPv6",
        IPV6_NONXT = 0x3b => "No Next Header for IPv6",
        IPV6_OPTS = 0x3c => "Destination Options for IPv6",
        SCTP = 0x84 => "SCTP",
    }
    kinds {
        Ipv4 => IPV4,
        Udp => UDP,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn version_of_packet() {
        assert_eq!(Version::of_packet(&[0x45]), Ok(Version::Ipv4));
        assert_eq!(Version::of_packet(&[0x60, 0x00]), Ok(Version::Ipv6));
        assert_eq!(Version::of_packet(&[0x15]), Err(Error::Unrecognized));
        assert_eq!(Version::of_packet(&[]), Err(Error::Truncated));
    }

    #[test]
    fn protocol_names() {
        assert_eq!(Protocol::from(17), Protocol::UDP);
        assert_eq!(Protocol::UDP.to_string(), "UDP");
        assert_eq!(Protocol::from(0xfe).to_string(), "0xfe (unknown)");
        assert_eq!(format!("{:x}", Protocol::TCP), "6");
        assert_eq!(Protocol::TCP.code_string(), "0x06");
    }
}
