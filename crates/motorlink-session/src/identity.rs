//! Textual key/value identity queries.
//!
//! The device exposes its identity (name, firmware version, board details)
//! as NUL-terminated strings. A key is written as a command frame and the
//! value is collected with the following status query.

use std::time::Duration;

use motorlink_frame::MAX_PAYLOAD;
use motorlink_transport::{ByteChannel, Result};
use tracing::debug;

/// Keys read by [`DeviceSession::connect`](crate::DeviceSession::connect), in
/// query order.
pub const IDENTITY_KEYS: [&str; 8] = [
    "name",
    "version",
    "messages_version",
    "board_name",
    "board_rev",
    "board_num",
    "config",
    "serial",
];

/// A source of device identity strings.
pub trait IdentityQuery {
    /// Look up one identity value by key.
    fn get(&mut self, key: &str) -> Result<String>;

    /// Set how long each lookup waits for the device.
    fn set_timeout(&mut self, timeout: Duration);
}

impl<T: IdentityQuery + ?Sized> IdentityQuery for Box<T> {
    fn get(&mut self, key: &str) -> Result<String> {
        (**self).get(key)
    }

    fn set_timeout(&mut self, timeout: Duration) {
        (**self).set_timeout(timeout)
    }
}

/// [`IdentityQuery`] over any [`ByteChannel`], using the device's text
/// convention.
#[derive(Debug)]
pub struct TextQueryChannel<C> {
    channel: C,
}

impl<C: ByteChannel> TextQueryChannel<C> {
    pub fn new(channel: C) -> Self {
        Self { channel }
    }

    pub fn get_ref(&self) -> &C {
        &self.channel
    }

    pub fn into_inner(self) -> C {
        self.channel
    }
}

impl<C: ByteChannel> IdentityQuery for TextQueryChannel<C> {
    fn get(&mut self, key: &str) -> Result<String> {
        let mut buf = [0u8; MAX_PAYLOAD];
        let len = self.channel.write_read(key.as_bytes(), &mut buf)?;
        let value = text_value(&buf[..len.min(buf.len())]);
        debug!(key, value = %value, "identity query");
        Ok(value)
    }

    fn set_timeout(&mut self, timeout: Duration) {
        self.channel.set_timeout(timeout);
    }
}

/// Reply bytes up to the first NUL, lossily decoded, trailing whitespace
/// removed.
fn text_value(reply: &[u8]) -> String {
    let end = reply.iter().position(|b| *b == 0).unwrap_or(reply.len());
    String::from_utf8_lossy(&reply[..end]).trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::net::SocketAddr;

    use bytes::Bytes;
    use motorlink_transport::TransportError;

    use super::*;

    /// Replies to each read with the next scripted payload.
    #[derive(Default)]
    struct Replies {
        queue: VecDeque<Vec<u8>>,
        written: Vec<Vec<u8>>,
        timeout: Duration,
    }

    impl ByteChannel for Replies {
        fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
            let reply = self
                .queue
                .pop_front()
                .ok_or(TransportError::TimedOut(self.timeout))?;
            let n = reply.len().min(buf.len());
            buf[..n].copy_from_slice(&reply[..n]);
            Ok(reply.len())
        }

        fn write(&mut self, payload: &[u8]) -> Result<Bytes> {
            self.written.push(payload.to_vec());
            Ok(Bytes::new())
        }

        fn set_timeout(&mut self, timeout: Duration) {
            self.timeout = timeout;
        }

        fn timeout(&self) -> Duration {
            self.timeout
        }

        fn peer_addr(&self) -> Option<SocketAddr> {
            None
        }
    }

    fn channel(replies: &[&[u8]]) -> TextQueryChannel<Replies> {
        TextQueryChannel::new(Replies {
            queue: replies.iter().map(|r| r.to_vec()).collect(),
            ..Replies::default()
        })
    }

    #[test]
    fn value_stops_at_nul() {
        let mut q = channel(&[b"obot-motor\0garbage"]);
        assert_eq!(q.get("name").expect("query should succeed"), "obot-motor");
        assert_eq!(q.get_ref().written, vec![b"name".to_vec()]);
    }

    #[test]
    fn trailing_whitespace_trimmed() {
        let mut q = channel(&[b"1.4.2 \r\n"]);
        assert_eq!(q.get("version").expect("query should succeed"), "1.4.2");
    }

    #[test]
    fn invalid_utf8_is_replaced() {
        let mut q = channel(&[b"rev\xffA\0"]);
        assert_eq!(q.get("board_rev").expect("query should succeed"), "rev\u{fffd}A");
    }

    #[test]
    fn empty_reply_is_empty_string() {
        let mut q = channel(&[b""]);
        assert_eq!(q.get("serial").expect("query should succeed"), "");
    }

    #[test]
    fn missing_reply_propagates() {
        let mut q = channel(&[]);
        let err = q.get("name").expect_err("query should fail");
        assert!(err.is_timeout());
    }

    #[test]
    fn timeout_reaches_channel() {
        let mut q = channel(&[]);
        q.set_timeout(Duration::from_millis(42));
        assert_eq!(q.into_inner().timeout, Duration::from_millis(42));
    }
}
