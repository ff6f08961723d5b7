//! UDP framing transport for motor controllers.
//!
//! motorlink exchanges small checksummed frames with an embedded controller
//! over a connected UDP socket, one blocking request at a time.
//!
//! # Crate Structure
//!
//! - [`frame`]: Wire format: header, CRC-16 trailer, query/command requests
//! - [`transport`]: Address parsing, IPv4 resolution, the UDP request/response channel
//! - [`session`]: Device identity, fixed-size records, simulated devices (behind `session` feature)

/// Re-export frame types.
pub mod frame {
    pub use motorlink_frame::*;
}

/// Re-export transport types.
pub mod transport {
    pub use motorlink_transport::*;
}

/// Re-export session types (requires `session` feature).
#[cfg(feature = "session")]
pub mod session {
    pub use motorlink_session::*;
}
