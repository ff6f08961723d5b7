use bytes::{BufMut, Bytes, BytesMut};
use tracing::{trace, warn};

use crate::crc::crc16;
use crate::error::{FrameError, Result};
use crate::request::{Request, QUERY_TAG};

/// Start-of-frame marker. Sent little-endian: `FE CA`.
pub const START_MARKER: u16 = 0xCAFE;

/// Frame kind byte for this protocol variant.
pub const FRAME_KIND: u8 = 4;

/// Frame header: marker (2) + kind (1) + payload length (1) = 4 bytes.
pub const HEADER_SIZE: usize = 4;

/// CRC trailer size.
pub const CRC_SIZE: usize = 2;

/// Largest payload the length byte can announce.
pub const MAX_PAYLOAD: usize = u8::MAX as usize;

/// Largest command payload a host may send. One below [`MAX_PAYLOAD`]: the
/// device reserves the last slot of its receive buffer for the trailer.
pub const MAX_REQUEST_PAYLOAD: usize = MAX_PAYLOAD - 1;

/// Largest datagram either side sends or accepts (4 + 255 + 2).
pub const MAX_DATAGRAM_SIZE: usize = HEADER_SIZE + MAX_PAYLOAD + CRC_SIZE;

const MARKER_BYTES: [u8; 2] = START_MARKER.to_le_bytes();
const QUERY_FRAME_SIZE: usize = HEADER_SIZE + QUERY_TAG.len() + CRC_SIZE;

/// How a decoder treats a checksum that does not match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChecksumPolicy {
    /// Reject the frame with [`FrameError::ChecksumMismatch`].
    #[default]
    Enforce,
    /// Log the mismatch and accept the frame. Some firmware revisions send
    /// replies without a valid trailer.
    Ignore,
}

/// Configuration for the frame codec.
#[derive(Debug, Clone, Default)]
pub struct FrameConfig {
    /// Checksum verification policy. Default: enforce.
    pub checksum: ChecksumPolicy,
}

impl FrameConfig {
    /// Configuration that accepts frames with a bad or missing trailer.
    pub fn lenient() -> Self {
        Self {
            checksum: ChecksumPolicy::Ignore,
        }
    }
}

/// A decoded frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Frame kind byte (always [`FRAME_KIND`] after a successful decode).
    pub kind: u8,
    /// The frame payload.
    pub payload: Bytes,
    /// The trailer as received, if the datagram carried one.
    pub checksum: Option<u16>,
}

/// Encode a payload into the wire format.
///
/// Wire format:
/// ```text
/// ┌──────────────┬──────┬─────────┬──────────────────┬───────────┐
/// │ Marker (2B)  │ Kind │ Length  │ Payload          │ CRC (2B)  │
/// │ 0xFE 0xCA    │ 0x04 │ (1B)    │ (Length bytes)   │ LE        │
/// └──────────────┴──────┴─────────┴──────────────────┴───────────┘
/// ```
///
/// The CRC covers marker, kind, length and payload.
pub fn encode_frame(payload: &[u8], dst: &mut BytesMut) -> Result<()> {
    if payload.len() > MAX_PAYLOAD {
        return Err(FrameError::PayloadTooLarge {
            size: payload.len(),
            max: MAX_PAYLOAD,
        });
    }
    let start = dst.len();
    dst.reserve(HEADER_SIZE + payload.len() + CRC_SIZE);
    put_header(dst, payload.len() as u8);
    dst.put_slice(payload);
    put_crc(dst, start);
    Ok(())
}

/// Encode a host request.
///
/// A [`Request::Query`] is a zero-length header followed by [`QUERY_TAG`] and
/// a CRC over header + tag. A [`Request::Command`] is a regular frame whose
/// payload must be shorter than [`MAX_PAYLOAD`].
pub fn encode_request(request: &Request, dst: &mut BytesMut) -> Result<()> {
    match request {
        Request::Query => {
            let start = dst.len();
            dst.reserve(QUERY_FRAME_SIZE);
            put_header(dst, 0);
            dst.put_slice(&QUERY_TAG);
            put_crc(dst, start);
            Ok(())
        }
        Request::Command(payload) => {
            if payload.len() > MAX_REQUEST_PAYLOAD {
                return Err(FrameError::PayloadTooLarge {
                    size: payload.len(),
                    max: MAX_REQUEST_PAYLOAD,
                });
            }
            encode_frame(payload, dst)
        }
    }
}

/// Decode one frame from a received datagram.
///
/// Bytes after the trailer are ignored. Checksum handling follows
/// `config.checksum`.
pub fn decode_frame(raw: &[u8], config: &FrameConfig) -> Result<Frame> {
    let payload_len = check_header(raw)?;
    let body_end = HEADER_SIZE + payload_len;
    if raw.len() < body_end {
        return Err(FrameError::Truncated {
            len: raw.len(),
            needed: body_end + CRC_SIZE,
        });
    }

    let checksum = verify_checksum(raw, body_end, config.checksum)?;
    if raw.len() > body_end + CRC_SIZE {
        trace!(
            extra = raw.len() - body_end - CRC_SIZE,
            "ignoring bytes after frame trailer"
        );
    }

    Ok(Frame {
        kind: raw[2],
        payload: Bytes::copy_from_slice(&raw[HEADER_SIZE..body_end]),
        checksum,
    })
}

/// Decode a host request (device side).
pub fn decode_request(raw: &[u8], config: &FrameConfig) -> Result<Request> {
    let payload_len = check_header(raw)?;
    let is_query = payload_len == 0
        && raw.len() >= HEADER_SIZE + QUERY_TAG.len()
        && raw[HEADER_SIZE..HEADER_SIZE + QUERY_TAG.len()] == QUERY_TAG;

    if is_query {
        verify_checksum(raw, HEADER_SIZE + QUERY_TAG.len(), config.checksum)?;
        return Ok(Request::Query);
    }

    let frame = decode_frame(raw, config)?;
    Ok(Request::Command(frame.payload))
}

fn put_header(dst: &mut BytesMut, payload_len: u8) {
    dst.put_u16_le(START_MARKER);
    dst.put_u8(FRAME_KIND);
    dst.put_u8(payload_len);
}

fn put_crc(dst: &mut BytesMut, start: usize) {
    let crc = crc16(&dst[start..]);
    dst.put_u16_le(crc);
}

/// Validate marker and kind; returns the announced payload length.
fn check_header(raw: &[u8]) -> Result<usize> {
    if raw.len() < HEADER_SIZE {
        return Err(FrameError::Truncated {
            len: raw.len(),
            needed: HEADER_SIZE,
        });
    }

    let marker = [raw[0], raw[1]];
    if marker != MARKER_BYTES {
        return Err(FrameError::BadMarker(marker));
    }

    if raw[2] != FRAME_KIND {
        return Err(FrameError::UnknownKind(raw[2]));
    }

    Ok(raw[3] as usize)
}

/// Check the trailer that follows `raw[..body_end]`.
fn verify_checksum(raw: &[u8], body_end: usize, policy: ChecksumPolicy) -> Result<Option<u16>> {
    let expected = crc16(&raw[..body_end]);
    let received = raw
        .get(body_end..body_end + CRC_SIZE)
        .map(|b| u16::from_le_bytes([b[0], b[1]]));

    match (received, policy) {
        (Some(received), _) if received == expected => {}
        (Some(received), ChecksumPolicy::Enforce) => {
            return Err(FrameError::ChecksumMismatch { expected, received });
        }
        (None, ChecksumPolicy::Enforce) => {
            return Err(FrameError::Truncated {
                len: raw.len(),
                needed: body_end + CRC_SIZE,
            });
        }
        (Some(received), ChecksumPolicy::Ignore) => {
            warn!(expected, received, "accepting frame with checksum mismatch");
        }
        (None, ChecksumPolicy::Ignore) => {
            warn!(len = raw.len(), "accepting frame without checksum trailer");
        }
    }

    Ok(received)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoded(payload: &[u8]) -> BytesMut {
        let mut buf = BytesMut::new();
        encode_frame(payload, &mut buf).unwrap();
        buf
    }

    #[test]
    fn test_encode_decode_roundtrip() {
        let payload = b"hello, motor!";
        let buf = encoded(payload);
        assert_eq!(buf.len(), HEADER_SIZE + payload.len() + CRC_SIZE);

        let frame = decode_frame(&buf, &FrameConfig::default()).unwrap();
        assert_eq!(frame.kind, FRAME_KIND);
        assert_eq!(frame.payload.as_ref(), payload);
        assert_eq!(frame.checksum, Some(crc16(&buf[..buf.len() - CRC_SIZE])));
    }

    #[test]
    fn test_command_roundtrip_every_length() {
        for len in 0..=MAX_REQUEST_PAYLOAD {
            let payload: Vec<u8> = (0..len).map(|i| (i * 7 + len) as u8).collect();
            let mut buf = BytesMut::new();
            encode_request(&Request::command(payload.clone()), &mut buf).unwrap();
            assert_eq!(buf.len(), HEADER_SIZE + len + CRC_SIZE);
            assert!(buf.len() <= MAX_DATAGRAM_SIZE);

            let frame = decode_frame(&buf, &FrameConfig::default()).unwrap();
            assert_eq!(frame.payload.as_ref(), payload.as_slice(), "len {len}");
        }
    }

    #[test]
    fn test_command_payload_too_large() {
        for len in [MAX_PAYLOAD, MAX_PAYLOAD + 1, 1024] {
            let mut buf = BytesMut::new();
            let err = encode_request(&Request::command(vec![0u8; len]), &mut buf).unwrap_err();
            assert_eq!(
                err,
                FrameError::PayloadTooLarge {
                    size: len,
                    max: MAX_REQUEST_PAYLOAD
                }
            );
            assert!(buf.is_empty());
        }
    }

    #[test]
    fn test_frame_payload_limit() {
        let full = encoded(&[0xAA; MAX_PAYLOAD]);
        assert_eq!(full.len(), MAX_DATAGRAM_SIZE);

        let mut buf = BytesMut::new();
        let err = encode_frame(&[0u8; MAX_PAYLOAD + 1], &mut buf).unwrap_err();
        assert!(matches!(err, FrameError::PayloadTooLarge { max: MAX_PAYLOAD, .. }));
    }

    #[test]
    fn test_golden_query_frame() {
        let mut buf = BytesMut::new();
        encode_request(&Request::Query, &mut buf).unwrap();
        assert_eq!(
            buf.as_ref(),
            &[0xFE, 0xCA, 0x04, 0x00, b'O', b'B', b'O', b'T', 0x64, 0xAF]
        );
    }

    #[test]
    fn test_golden_command_frames() {
        let mut buf = BytesMut::new();
        encode_request(&Request::command(&b"ok"[..]), &mut buf).unwrap();
        assert_eq!(buf.as_ref(), &[0xFE, 0xCA, 0x04, 0x02, b'o', b'k', 0x51, 0x08]);

        assert_eq!(encoded(b"").as_ref(), &[0xFE, 0xCA, 0x04, 0x00, 0x25, 0x94]);

        let zeros = encoded(&[0u8; 8]);
        assert_eq!(&zeros[..4], &[0xFE, 0xCA, 0x04, 0x08]);
        assert_eq!(&zeros[12..], &[0xF6, 0xF1]);
    }

    #[test]
    fn test_decode_truncated_header() {
        for len in 0..HEADER_SIZE {
            let raw = [0xFE, 0xCA, 0x04, 0x00];
            let err = decode_frame(&raw[..len], &FrameConfig::default()).unwrap_err();
            assert_eq!(
                err,
                FrameError::Truncated {
                    len,
                    needed: HEADER_SIZE
                }
            );
        }
    }

    #[test]
    fn test_decode_truncated_payload() {
        let buf = encoded(b"hello");
        let err = decode_frame(&buf[..HEADER_SIZE + 2], &FrameConfig::lenient()).unwrap_err();
        assert!(matches!(err, FrameError::Truncated { .. }));
    }

    #[test]
    fn test_decode_bad_marker() {
        let raw = [0xFF, 0xFF, 0x04, 0x00, 0x00, 0x00];
        let err = decode_frame(&raw, &FrameConfig::default()).unwrap_err();
        assert_eq!(err, FrameError::BadMarker([0xFF, 0xFF]));

        // big-endian marker is not accepted
        let raw = [0xCA, 0xFE, 0x04, 0x00, 0x00, 0x00];
        let err = decode_frame(&raw, &FrameConfig::default()).unwrap_err();
        assert_eq!(err, FrameError::BadMarker([0xCA, 0xFE]));
    }

    #[test]
    fn test_decode_unknown_kind() {
        let mut buf = encoded(b"x");
        buf[2] = 9;
        let err = decode_frame(&buf, &FrameConfig::default()).unwrap_err();
        assert_eq!(err, FrameError::UnknownKind(9));
    }

    #[test]
    fn test_checksum_mismatch_enforced() {
        let mut buf = encoded(b"status");
        buf[5] ^= 0x01;
        let err = decode_frame(&buf, &FrameConfig::default()).unwrap_err();
        assert!(matches!(err, FrameError::ChecksumMismatch { .. }));
    }

    #[test]
    fn test_checksum_mismatch_ignored() {
        let mut buf = encoded(b"status");
        let last = buf.len() - 1;
        buf[last] ^= 0xFF;
        let frame = decode_frame(&buf, &FrameConfig::lenient()).unwrap();
        assert_eq!(frame.payload.as_ref(), b"status");
        assert!(frame.checksum.is_some());
    }

    #[test]
    fn test_missing_trailer() {
        let buf = encoded(b"abc");
        let short = &buf[..buf.len() - CRC_SIZE];

        let err = decode_frame(short, &FrameConfig::default()).unwrap_err();
        assert_eq!(
            err,
            FrameError::Truncated {
                len: short.len(),
                needed: buf.len()
            }
        );

        let frame = decode_frame(short, &FrameConfig::lenient()).unwrap();
        assert_eq!(frame.payload.as_ref(), b"abc");
        assert_eq!(frame.checksum, None);
    }

    #[test]
    fn test_trailing_bytes_ignored() {
        let mut buf = encoded(b"abc");
        buf.put_slice(b"junk");
        let frame = decode_frame(&buf, &FrameConfig::default()).unwrap();
        assert_eq!(frame.payload.as_ref(), b"abc");
    }

    #[test]
    fn test_decode_request_query() {
        let mut buf = BytesMut::new();
        encode_request(&Request::Query, &mut buf).unwrap();
        assert_eq!(
            decode_request(&buf, &FrameConfig::default()).unwrap(),
            Request::Query
        );
    }

    #[test]
    fn test_decode_request_command() {
        let mut buf = BytesMut::new();
        encode_request(&Request::command(&b"name"[..]), &mut buf).unwrap();
        assert_eq!(
            decode_request(&buf, &FrameConfig::default()).unwrap(),
            Request::command(&b"name"[..])
        );

        // an empty command is not a query
        let buf = encoded(b"");
        assert_eq!(
            decode_request(&buf, &FrameConfig::default()).unwrap(),
            Request::Command(Bytes::new())
        );
    }

    #[test]
    fn test_decode_request_corrupt_query() {
        let mut buf = BytesMut::new();
        encode_request(&Request::Query, &mut buf).unwrap();
        buf[8] ^= 0x10;
        let err = decode_request(&buf, &FrameConfig::default()).unwrap_err();
        assert!(matches!(err, FrameError::ChecksumMismatch { .. }));
    }

    #[test]
    fn test_decoded_frame_keeps_trailer() {
        let raw = [0xFE, 0xCA, 0x04, 0x02, b'o', b'k', 0x51, 0x08];
        let frame = decode_frame(&raw, &FrameConfig::default()).unwrap();
        assert_eq!(frame.kind, FRAME_KIND);
        assert_eq!(frame.payload.as_ref(), b"ok");
        assert_eq!(frame.checksum, Some(0x0851));
        assert_eq!(raw.len(), HEADER_SIZE + frame.payload.len() + CRC_SIZE);
    }
}
