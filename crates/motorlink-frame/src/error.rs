/// Errors that can occur during frame encoding/decoding.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    /// The buffer ends before the frame it announces.
    #[error("frame truncated ({len} bytes, need {needed})")]
    Truncated { len: usize, needed: usize },

    /// The frame does not start with the protocol marker.
    #[error("invalid start marker {0:02X?} (expected [FE, CA])")]
    BadMarker([u8; 2]),

    /// The frame kind byte belongs to another framing scheme.
    #[error("unknown frame kind {0} (expected {expected})", expected = crate::codec::FRAME_KIND)]
    UnknownKind(u8),

    /// The payload exceeds what a single frame can carry.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// The trailer does not match the CRC computed over the frame.
    #[error("checksum mismatch (expected {expected:#06x}, received {received:#06x})")]
    ChecksumMismatch { expected: u16, received: u16 },
}

pub type Result<T> = std::result::Result<T, FrameError>;
