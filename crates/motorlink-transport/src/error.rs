use std::net::SocketAddr;
use std::time::Duration;

use motorlink_frame::FrameError;

/// Errors raised while turning an address into a single IPv4 peer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolutionError {
    /// The platform resolver rejected the lookup.
    #[error("address lookup failed for {address}: {reason}")]
    LookupFailed { address: String, reason: String },

    /// The resolver returned a candidate that is not IPv4.
    #[error("{address} resolved to a non-IPv4 address")]
    NotIpv4 { address: String },

    /// The resolver returned zero or several candidates.
    #[error("{address} resolved to {count} addresses (expected exactly one)")]
    AmbiguousOrNoResult { address: String, count: usize },
}

/// Errors that can occur in transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Address resolution failed.
    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    /// Failed to bind the local datagram socket.
    #[error("failed to bind local socket: {0}")]
    Bind(std::io::Error),

    /// Failed to associate the socket with the peer.
    #[error("failed to connect to {peer}: {source}")]
    Connect {
        peer: SocketAddr,
        source: std::io::Error,
    },

    /// No reply arrived within the configured window.
    #[error("no reply within {0:?}")]
    TimedOut(Duration),

    /// Waiting for the socket failed for a reason other than a timeout.
    #[error("poll failed: {0}")]
    Poll(std::io::Error),

    /// A send or receive failed below the framing layer.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The reply could not be decoded.
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),

    /// The caller handed over a payload the wire format cannot carry.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },
}

impl TransportError {
    /// Returns true when the error is a reply timeout, the one condition
    /// callers commonly retry.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::TimedOut(_))
    }
}

pub type Result<T> = std::result::Result<T, TransportError>;
