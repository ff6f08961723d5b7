//! Host request intents.
//!
//! The device answers only when solicited. A request either asks for the
//! current status record or delivers a command; the two are told apart on the
//! wire by the query form (zero payload length followed by [`QUERY_TAG`]).

use bytes::Bytes;

/// ASCII tag that follows the header of a status query.
pub const QUERY_TAG: [u8; 4] = *b"OBOT";

/// A host→device request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// Ask the device for its current status record.
    Query,
    /// Deliver an opaque command payload.
    Command(Bytes),
}

impl Request {
    /// Build a command request from a payload.
    pub fn command(payload: impl Into<Bytes>) -> Self {
        Self::Command(payload.into())
    }

    /// Short name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::Command(_) => "command",
        }
    }

    /// Returns true for a status query.
    pub fn is_query(&self) -> bool {
        matches!(self, Self::Query)
    }
}
