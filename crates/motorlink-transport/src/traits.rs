use std::net::SocketAddr;
use std::time::Duration;

use bytes::Bytes;

use crate::error::Result;

/// A request/response byte channel to one device.
///
/// Every call is a complete round trip: `read` solicits the device with a
/// status query before receiving, `write` sends a command and returns the
/// device's acknowledgement. Methods take `&mut self`, so at most one request
/// is outstanding per channel.
pub trait ByteChannel {
    /// Query the device and copy the reply payload into `buf`.
    ///
    /// Returns the decoded payload length, which may differ from `buf.len()`;
    /// at most `buf.len()` bytes are copied.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Send a command payload and return the raw acknowledgement datagram.
    fn write(&mut self, payload: &[u8]) -> Result<Bytes>;

    /// `write` followed by `read`. Stops at the first failure.
    fn write_read(&mut self, payload: &[u8], buf: &mut [u8]) -> Result<usize> {
        self.write(payload)?;
        self.read(buf)
    }

    /// Set how long each call waits for a reply. Affects subsequent calls.
    fn set_timeout(&mut self, timeout: Duration);

    /// Current reply timeout.
    fn timeout(&self) -> Duration;

    /// The device address, when the channel has one.
    fn peer_addr(&self) -> Option<SocketAddr>;
}

impl<T: ByteChannel + ?Sized> ByteChannel for Box<T> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        (**self).read(buf)
    }

    fn write(&mut self, payload: &[u8]) -> Result<Bytes> {
        (**self).write(payload)
    }

    fn write_read(&mut self, payload: &[u8], buf: &mut [u8]) -> Result<usize> {
        (**self).write_read(payload, buf)
    }

    fn set_timeout(&mut self, timeout: Duration) {
        (**self).set_timeout(timeout)
    }

    fn timeout(&self) -> Duration {
        (**self).timeout()
    }

    fn peer_addr(&self) -> Option<SocketAddr> {
        (**self).peer_addr()
    }
}
