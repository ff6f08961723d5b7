//! Blocking UDP request/response transport for motor-controller devices.
//!
//! Every exchange is a full round trip: the host sends one frame and waits a
//! bounded time for exactly one reply datagram. There is no listen-only mode;
//! the device only speaks when solicited.
//!
//! - [`AddressSpec`] parses `host[:port]` strings (default port 7770)
//! - [`ByteChannel`] is the capability set sessions depend on
//! - [`DatagramTransport`] implements it over a connected UDP socket

pub mod address;
pub mod error;
pub mod resolve;
pub mod traits;

#[cfg(unix)]
pub mod udp;

pub use address::{AddressParseError, AddressSpec, DEFAULT_PORT};
pub use error::{ResolutionError, Result, TransportError};
pub use resolve::{resolve, select_ipv4, Candidate};
pub use traits::ByteChannel;

#[cfg(unix)]
pub use udp::{DatagramTransport, TransportConfig, DEFAULT_TIMEOUT};
