//! The boundary to a capture facility.
//!
//! Opening devices and receiving frames is left to the caller. What a capture hands over is
//! modelled as a [`Frame`], which can be decoded into a timestamped [`Packet`].
//!
//! [`Frame`]: struct.Frame.html
//! [`Packet`]: ../packet/struct.Packet.html
use core::time::Duration;

use crate::packet::{Dispatcher, Packet};
use crate::wire::Result;

/// A link layer frame as delivered by a capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Time of capture, relative to an epoch chosen by the capture.
    pub timestamp: Duration,
    /// The length of the frame on the wire.
    ///
    /// Exceeds the length of `data` when the capture only kept a prefix of the frame.
    pub original_len: u32,
    /// The captured octets.
    pub data: Vec<u8>,
}

/// A decoded frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    /// Time of capture.
    pub timestamp: Duration,
    /// The length of the frame on the wire.
    pub original_len: u32,
    /// The decoded layers of the captured octets.
    pub packet: Packet,
}

impl Frame {
    /// A completely captured frame.
    pub fn new(timestamp: Duration, data: Vec<u8>) -> Self {
        Frame {
            timestamp,
            original_len: data.len() as u32,
            data,
        }
    }

    /// Query whether the capture kept less than the whole frame.
    pub fn is_truncated(&self) -> bool {
        (self.data.len() as u64) < u64::from(self.original_len)
    }

    /// Decode the captured octets with the shared standard dispatcher.
    pub fn decode(&self) -> Result<Decoded> {
        self.decode_with(Dispatcher::shared())
    }

    /// Decode the captured octets with a chosen dispatcher.
    ///
    /// Only the octets are decoded, the capture metadata is carried over as is.
    pub fn decode_with(&self, dispatcher: &Dispatcher) -> Result<Decoded> {
        if self.is_truncated() {
            net_trace!("capture: frame of {} octets truncated to {}",
                self.original_len, self.data.len());
        }
        let packet = dispatcher.decode_frame(&self.data)?;
        Ok(Decoded {
            timestamp: self.timestamp,
            original_len: self.original_len,
            packet,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::packet::DecodeConfig;
    use crate::wire::{Error, Kind};

    static ARP_FRAME: [u8; 42] =
        [0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
         0x02, 0x00, 0x00, 0x00, 0x00, 0x01,
         0x08, 0x06,
         0x00, 0x01, 0x08, 0x00, 0x06, 0x04, 0x00, 0x01,
         0x02, 0x00, 0x00, 0x00, 0x00, 0x01,
         192, 168, 1, 1,
         0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
         192, 168, 1, 2];

    #[test]
    fn decode_complete() {
        let frame = Frame::new(Duration::from_millis(1500), ARP_FRAME.to_vec());
        assert!(!frame.is_truncated());
        let decoded = frame.decode().unwrap();
        assert_eq!(decoded.timestamp, Duration::from_millis(1500));
        assert_eq!(decoded.original_len, 42);
        assert_eq!(decoded.packet.inner().map(|p| p.kind()), Some(Kind::Arp));
    }

    #[test]
    fn decode_snapped() {
        let frame = Frame {
            timestamp: Duration::from_secs(3),
            original_len: 42,
            data: ARP_FRAME[..30].to_vec(),
        };
        assert!(frame.is_truncated());

        let decoded = frame.decode().unwrap();
        assert_eq!(decoded.packet.payload().len(), 16);
        assert_eq!(decoded.packet.inner(), None);

        let strict = Dispatcher::standard().with_config(DecodeConfig::new().strict(true));
        assert_eq!(frame.decode_with(&strict), Err(Error::Truncated));
    }

    #[test]
    fn decode_runt() {
        let frame = Frame::new(Duration::from_secs(0), ARP_FRAME[..10].to_vec());
        assert_eq!(frame.decode(), Err(Error::Truncated));
    }
}
