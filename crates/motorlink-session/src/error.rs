use std::path::PathBuf;

use motorlink_transport::TransportError;

/// Errors that can occur in session operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// An identity query failed.
    #[error("identity query '{key}' failed: {source}")]
    Identity {
        key: String,
        #[source]
        source: TransportError,
    },

    /// The device answered with a record of the wrong size.
    #[error("record size mismatch (expected {expected} bytes, got {actual})")]
    RecordSize { expected: usize, actual: usize },

    /// A device profile file could not be read.
    #[error("failed to read device profile {}: {source}", path.display())]
    ProfileIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A device profile could not be parsed.
    #[error("invalid device profile: {0}")]
    Profile(#[from] serde_json::Error),
}

impl SessionError {
    /// Returns true when the underlying failure was a reply timeout.
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Transport(err) | Self::Identity { source: err, .. } => err.is_timeout(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, SessionError>;
