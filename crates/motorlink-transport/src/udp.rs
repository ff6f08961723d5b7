use std::io::ErrorKind;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4, UdpSocket};
use std::os::fd::AsRawFd;
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use motorlink_frame::{
    decode_frame, encode_request, FrameConfig, Request, MAX_DATAGRAM_SIZE, MAX_REQUEST_PAYLOAD,
};
use tracing::{debug, info, trace};

use crate::address::AddressSpec;
use crate::error::{Result, TransportError};
use crate::resolve::resolve;
use crate::traits::ByteChannel;

/// Consecutive receive errors after which `flush` gives up.
const MAX_FLUSH_ERRORS: usize = 16;

/// Default reply timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(10);

/// Configuration for a datagram transport.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// How long each request waits for its reply. Default: 10 ms.
    pub timeout: Duration,
    /// Codec settings applied to replies.
    pub frame: FrameConfig,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            frame: FrameConfig::default(),
        }
    }
}

/// UDP transport bound to a single device.
///
/// Owns a socket connected to one resolved IPv4 peer. The socket is closed
/// when the transport is dropped. Each [`ByteChannel`] call sends one frame
/// and waits for one reply datagram; datagrams queued before a request is
/// sent are discarded as stale.
pub struct DatagramTransport {
    socket: UdpSocket,
    peer: SocketAddrV4,
    peer_display: String,
    config: TransportConfig,
    tx: BytesMut,
}

impl DatagramTransport {
    /// Resolve `address` and open a transport to it.
    pub fn open(address: &AddressSpec, config: TransportConfig) -> Result<Self> {
        let peer = resolve(address)?;
        Self::connect(peer, config)
    }

    /// Open a transport to an already resolved peer.
    pub fn connect(peer: SocketAddrV4, config: TransportConfig) -> Result<Self> {
        let socket =
            UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).map_err(TransportError::Bind)?;
        socket
            .connect(peer)
            .map_err(|source| TransportError::Connect {
                peer: peer.into(),
                source,
            })?;

        info!(%peer, timeout = ?config.timeout, "opened datagram transport");

        let mut transport = Self {
            socket,
            peer,
            peer_display: peer.ip().to_string(),
            config,
            tx: BytesMut::with_capacity(MAX_DATAGRAM_SIZE),
        };
        transport.flush();
        Ok(transport)
    }

    /// Discard every datagram already queued on the socket.
    ///
    /// Best-effort: never fails. Returns the number of datagrams dropped.
    pub fn flush(&mut self) -> usize {
        if self.socket.set_nonblocking(true).is_err() {
            return 0;
        }

        let mut scratch = [0u8; MAX_DATAGRAM_SIZE];
        let mut dropped = 0usize;
        let mut errors = 0usize;
        loop {
            match self.socket.recv(&mut scratch) {
                Ok(len) => {
                    dropped += 1;
                    errors = 0;
                    trace!(len, "discarded stale datagram");
                }
                Err(err) if err.kind() == ErrorKind::WouldBlock => break,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                // Each recv consumes one pending socket error (e.g. ICMP
                // unreachable); datagrams may still be queued behind it.
                Err(err) => {
                    errors += 1;
                    trace!(error = %err, "discarded pending socket error");
                    if errors >= MAX_FLUSH_ERRORS {
                        break;
                    }
                }
            }
        }

        let _ = self.socket.set_nonblocking(false);
        if dropped > 0 {
            debug!(dropped, "flushed stale datagrams");
        }
        dropped
    }

    /// Wait up to `timeout` for an incoming datagram.
    ///
    /// Returns [`TransportError::TimedOut`] when nothing arrives and
    /// [`TransportError::Poll`] when the wait itself fails.
    pub fn poll(&self, timeout: Duration) -> Result<()> {
        let mut pfd = libc::pollfd {
            fd: self.socket.as_raw_fd(),
            events: libc::POLLIN,
            revents: 0,
        };

        // Round sub-millisecond timeouts up so they still wait.
        let mut millis = timeout.as_millis().min(libc::c_int::MAX as u128) as libc::c_int;
        if millis == 0 && !timeout.is_zero() {
            millis = 1;
        }

        // SAFETY: `pfd` is a valid, initialised pollfd for a descriptor owned by
        // `self.socket`, and nfds is 1.
        let rc = unsafe { libc::poll(&mut pfd, 1, millis) };
        match rc {
            0 => Err(TransportError::TimedOut(timeout)),
            n if n < 0 => Err(TransportError::Poll(std::io::Error::last_os_error())),
            _ => Ok(()),
        }
    }

    /// The resolved peer.
    pub fn peer(&self) -> SocketAddrV4 {
        self.peer
    }

    /// The resolved peer IP as text, for diagnostics.
    pub fn peer_display(&self) -> &str {
        &self.peer_display
    }

    /// Local socket address.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    /// Current transport configuration.
    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    fn send_request(&mut self, request: &Request) -> Result<()> {
        self.flush();

        self.tx.clear();
        encode_request(request, &mut self.tx)?;
        let sent = self.socket.send(&self.tx)?;
        debug!(request = request.name(), bytes = sent, peer = %self.peer, "sent request");
        Ok(())
    }

    fn recv_reply(&mut self) -> Result<Bytes> {
        self.poll(self.config.timeout)?;

        let mut buf = [0u8; MAX_DATAGRAM_SIZE];
        let len = loop {
            match self.socket.recv(&mut buf) {
                Ok(len) => break len,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(TransportError::Io(err)),
            }
        };
        debug!(bytes = len, "received reply");
        Ok(Bytes::copy_from_slice(&buf[..len]))
    }
}

impl ByteChannel for DatagramTransport {
    /// Send a status query, then decode the reply frame into `buf`.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.send_request(&Request::Query)?;
        let raw = self.recv_reply()?;
        let frame = decode_frame(&raw, &self.config.frame)?;

        let payload_len = frame.payload.len();
        let copied = payload_len.min(buf.len());
        buf[..copied].copy_from_slice(&frame.payload[..copied]);
        if payload_len != buf.len() {
            debug!(payload_len, expected = buf.len(), "reply size differs from buffer");
        }
        Ok(payload_len)
    }

    /// Send a command frame and return the device's acknowledgement datagram.
    fn write(&mut self, payload: &[u8]) -> Result<Bytes> {
        if payload.len() > MAX_REQUEST_PAYLOAD {
            return Err(TransportError::PayloadTooLarge {
                size: payload.len(),
                max: MAX_REQUEST_PAYLOAD,
            });
        }

        self.send_request(&Request::command(Bytes::copy_from_slice(payload)))?;
        self.recv_reply()
    }

    fn set_timeout(&mut self, timeout: Duration) {
        self.config.timeout = timeout;
    }

    fn timeout(&self) -> Duration {
        self.config.timeout
    }

    fn peer_addr(&self) -> Option<SocketAddr> {
        Some(SocketAddr::V4(self.peer))
    }
}

impl std::fmt::Debug for DatagramTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatagramTransport")
            .field("peer", &self.peer)
            .field("timeout", &self.config.timeout)
            .field("checksum", &self.config.frame.checksum)
            .finish()
    }
}
