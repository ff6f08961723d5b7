use std::fmt;
use std::str::FromStr;

/// Port used when the address string does not name one.
pub const DEFAULT_PORT: u16 = 7770;

/// A `host[:port]` destination, parsed but not yet resolved.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AddressSpec {
    host: String,
    port: u16,
}

/// Strict parsing error, see [`AddressSpec::from_str`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressParseError {
    /// The host part is empty.
    #[error("address '{0}' has no host")]
    EmptyHost(String),

    /// The port part is not a number in 1..=65535.
    #[error("invalid port '{port}' in address '{address}'")]
    InvalidPort { address: String, port: String },
}

impl AddressSpec {
    /// Create a spec from parts.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Parse `host` or `host:port`.
    ///
    /// Splits on the first `:`. A missing or empty port yields
    /// [`DEFAULT_PORT`], as does port text that is not a valid port number.
    /// Never fails; host syntax is checked by resolution.
    pub fn parse(input: &str) -> Self {
        match input.split_once(':') {
            None => Self::new(input, DEFAULT_PORT),
            Some((host, "")) => Self::new(host, DEFAULT_PORT),
            Some((host, port)) => {
                let port = port.parse::<u16>().ok().filter(|p| *p != 0).unwrap_or_else(|| {
                    tracing::warn!(input, "unparseable port, using default {DEFAULT_PORT}");
                    DEFAULT_PORT
                });
                Self::new(host, port)
            }
        }
    }

    /// Host text as configured.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Destination port.
    pub fn port(&self) -> u16 {
        self.port
    }
}

impl FromStr for AddressSpec {
    type Err = AddressParseError;

    /// Strict variant of [`AddressSpec::parse`]: rejects an empty host and a
    /// port that is present but not a valid number.
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let (host, port) = match input.split_once(':') {
            None => (input, None),
            Some((host, "")) => (host, None),
            Some((host, port)) => (host, Some(port)),
        };

        if host.is_empty() {
            return Err(AddressParseError::EmptyHost(input.to_string()));
        }

        let port = match port {
            None => DEFAULT_PORT,
            Some(text) => text
                .parse::<u16>()
                .ok()
                .filter(|p| *p != 0)
                .ok_or_else(|| AddressParseError::InvalidPort {
                    address: input.to_string(),
                    port: text.to_string(),
                })?,
        };

        Ok(Self::new(host, port))
    }
}

impl fmt::Display for AddressSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}
