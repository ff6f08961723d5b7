//! Checksummed single-datagram framing for motor-controller devices.
//!
//! Every datagram carries exactly one frame:
//! - A 2-byte start marker (`0xCAFE`, little-endian on the wire)
//! - A 1-byte frame kind identifying this protocol variant
//! - A 1-byte payload length
//! - Up to 255 payload bytes
//! - A 2-byte little-endian CRC-16/CCITT-FALSE over everything before it
//!
//! Host requests are either a status query or a command, see [`Request`].

pub mod codec;
pub mod crc;
pub mod error;
pub mod request;

pub use codec::{
    decode_frame, decode_request, encode_frame, encode_request, ChecksumPolicy, Frame,
    FrameConfig, CRC_SIZE, FRAME_KIND, HEADER_SIZE, MAX_DATAGRAM_SIZE, MAX_PAYLOAD,
    MAX_REQUEST_PAYLOAD, START_MARKER,
};
pub use crc::crc16;
pub use error::{FrameError, Result};
pub use request::{Request, QUERY_TAG};
