/// The error type for decoding and building packets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A header could not be decoded because the buffer was shorter than assumed.
    ///
    /// The buffer may be shorter than the minimum header length, or a length field may claim
    /// more octets than the buffer holds. For variable length headers, this may be because some
    /// of its fields were out of bounds of the received data.
    #[error("truncated packet")]
    Truncated,

    /// A header was recognized but was self-contradictory.
    ///
    /// Examples: an IPv4 header length below the fixed 20 octets; a UDP packet claiming to
    /// contain less than 8 bytes of data.
    #[error("malformed packet")]
    Malformed,

    /// A header had a shape this implementation can not represent.
    ///
    /// E.g. an ARP packet whose hardware addresses are not six octets long. This is not fatal,
    /// the dispatcher keeps such a layer as undecoded bytes.
    #[error("unrecognized packet")]
    Unrecognized,

    /// A builder was asked to serialize but a required field was never set.
    ///
    /// Only raised when the field also has no value that could be computed from the enclosed
    /// layers, such as a destination address.
    #[error("field `{0}` was never set and can not be computed")]
    Incomplete(&'static str),
}

/// The result type for decoding and building packets.
pub type Result<T> = core::result::Result<T, Error>;

impl Error {
    /// Query whether this error is a malformed header.
    ///
    /// These are errors of the input data that a dispatcher can contain by keeping the
    /// offending bytes undecoded.
    pub fn is_malformed_header(&self) -> bool {
        match self {
            Error::Truncated | Error::Malformed | Error::Unrecognized => true,
            Error::Incomplete(_) => false,
        }
    }
}
