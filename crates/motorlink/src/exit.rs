use std::fmt;
use std::io;

use motorlink_frame::FrameError;
use motorlink_session::SessionError;
use motorlink_transport::{AddressParseError, TransportError};

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        io::ErrorKind::ConnectionRefused => FAILURE,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn address_error(err: AddressParseError) -> CliError {
    CliError::new(USAGE, err.to_string())
}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    match err {
        TransportError::Bind(source)
        | TransportError::Connect { source, .. }
        | TransportError::Poll(source) => io_error(context, source),
        // ICMP port unreachable surfaces as a refused receive
        TransportError::Io(source) => match source.kind() {
            io::ErrorKind::ConnectionRefused => {
                CliError::new(TRANSPORT_ERROR, format!("{context}: {source}"))
            }
            _ => io_error(context, source),
        },
        TransportError::TimedOut(_) => CliError::new(TIMEOUT, format!("{context}: {err}")),
        TransportError::Frame(err) => frame_error(context, err),
        TransportError::PayloadTooLarge { .. } => {
            CliError::new(DATA_INVALID, format!("{context}: {err}"))
        }
        other => CliError::new(TRANSPORT_ERROR, format!("{context}: {other}")),
    }
}

pub fn frame_error(context: &str, err: FrameError) -> CliError {
    CliError::new(DATA_INVALID, format!("{context}: {err}"))
}

pub fn session_error(context: &str, err: SessionError) -> CliError {
    match err {
        SessionError::Transport(err) => transport_error(context, err),
        SessionError::Identity { key, source } => {
            transport_error(&format!("{context} (identity key '{key}')"), source)
        }
        SessionError::RecordSize { .. } | SessionError::Profile(_) => {
            CliError::new(DATA_INVALID, format!("{context}: {err}"))
        }
        SessionError::ProfileIo { .. } => CliError::new(USAGE, format!("{context}: {err}")),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use motorlink_transport::ResolutionError;

    use super::*;

    #[test]
    fn timeout_maps_to_124() {
        let err = transport_error("read failed", TransportError::TimedOut(Duration::from_millis(10)));
        assert_eq!(err.code, TIMEOUT);
        assert!(err.message.starts_with("read failed: "));
    }

    #[test]
    fn resolution_maps_to_transport_code() {
        let err = transport_error(
            "open failed",
            ResolutionError::NotIpv4 {
                address: "motor:7770".to_string(),
            }
            .into(),
        );
        assert_eq!(err.code, TRANSPORT_ERROR);
    }

    #[test]
    fn bad_frames_and_sizes_are_data_invalid() {
        let err = transport_error("read failed", FrameError::BadMarker([0, 0]).into());
        assert_eq!(err.code, DATA_INVALID);

        let err = session_error(
            "read failed",
            SessionError::RecordSize {
                expected: 8,
                actual: 3,
            },
        );
        assert_eq!(err.code, DATA_INVALID);
    }

    #[test]
    fn identity_error_names_key() {
        let err = session_error(
            "connect failed",
            SessionError::Identity {
                key: "serial".to_string(),
                source: TransportError::TimedOut(Duration::from_millis(10)),
            },
        );
        assert_eq!(err.code, TIMEOUT);
        assert!(err.message.contains("'serial'"));
    }

    #[test]
    fn unreadable_profile_is_usage_error() {
        let err = session_error(
            "failed loading sim.json",
            SessionError::ProfileIo {
                path: "sim.json".into(),
                source: io::Error::from(io::ErrorKind::NotFound),
            },
        );
        assert_eq!(err.code, USAGE);
        assert!(err.message.contains("sim.json"));
        assert!(!err.message.contains("transport"));
    }

    #[test]
    fn refused_receive_is_transport_error() {
        let err = transport_error(
            "read failed",
            TransportError::Io(io::Error::from(io::ErrorKind::ConnectionRefused)),
        );
        assert_eq!(err.code, TRANSPORT_ERROR);
    }
}
