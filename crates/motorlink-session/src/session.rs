use std::net::SocketAddr;
use std::time::Duration;

use bytes::Bytes;
use motorlink_transport::ByteChannel;
#[cfg(unix)]
use motorlink_transport::{AddressSpec, DatagramTransport, TransportConfig};
use serde::Serialize;
use tracing::info;

use crate::error::{Result, SessionError};
use crate::identity::{IdentityQuery, IDENTITY_KEYS};
#[cfg(unix)]
use crate::identity::TextQueryChannel;
use crate::record::WireRecord;

/// Identity and addressing details recorded by [`DeviceSession::connect`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeviceInfo {
    /// Device name, or `ip:port` when the device reports none.
    pub name: String,
    pub version: String,
    pub messages_version: String,
    pub board_name: String,
    pub board_rev: String,
    pub board_num: String,
    pub config: String,
    pub serial_number: String,
    /// Resolved peer IP.
    pub dev_path: String,
    /// Host text as configured.
    pub base_path: String,
    /// Peer port.
    pub devnum: u16,
}

/// Session configuration.
#[cfg(unix)]
#[derive(Debug, Clone, Default)]
pub struct SessionConfig {
    /// Applied to both the realtime and identity transports.
    pub transport: TransportConfig,
}

/// A connection to one motor controller.
///
/// Steady-state traffic goes over the realtime channel; identity lookups go
/// through a separate [`IdentityQuery`] so a slow text query never shares a
/// socket with status polling.
pub struct DeviceSession<C, Q> {
    realtime: C,
    identity: Q,
    base_path: String,
    info: DeviceInfo,
}

#[cfg(unix)]
impl DeviceSession<DatagramTransport, TextQueryChannel<DatagramTransport>> {
    /// Open both transports to `address` and read the device identity.
    pub fn open(address: &AddressSpec, config: SessionConfig) -> Result<Self> {
        let realtime = DatagramTransport::open(address, config.transport.clone())?;
        let identity = DatagramTransport::connect(realtime.peer(), config.transport)?;

        let mut session = Self::new(realtime, TextQueryChannel::new(identity))
            .with_base_path(address.host());
        session.connect()?;
        Ok(session)
    }
}

impl<C: ByteChannel, Q: IdentityQuery> DeviceSession<C, Q> {
    /// Wrap existing channels. Call [`connect`](Self::connect) to fill
    /// [`DeviceInfo`].
    pub fn new(realtime: C, identity: Q) -> Self {
        Self {
            realtime,
            identity,
            base_path: String::new(),
            info: DeviceInfo::default(),
        }
    }

    /// Record the host text the session was opened with.
    pub fn with_base_path(mut self, base_path: impl Into<String>) -> Self {
        self.base_path = base_path.into();
        self
    }

    /// Query every identity key and rebuild [`DeviceInfo`].
    ///
    /// Stops at the first failing key.
    pub fn connect(&mut self) -> Result<&DeviceInfo> {
        let mut get = |key: &str| {
            self.identity
                .get(key)
                .map_err(|source| SessionError::Identity {
                    key: key.to_string(),
                    source,
                })
        };

        let mut values: [String; IDENTITY_KEYS.len()] = Default::default();
        for (slot, key) in values.iter_mut().zip(IDENTITY_KEYS) {
            *slot = get(key)?;
        }
        let [name, version, messages_version, board_name, board_rev, board_num, config, serial_number] =
            values;

        let mut info = DeviceInfo {
            name,
            version,
            messages_version,
            board_name,
            board_rev,
            board_num,
            config,
            serial_number,
            base_path: self.base_path.clone(),
            ..DeviceInfo::default()
        };

        if let Some(peer) = self.realtime.peer_addr() {
            info.dev_path = peer.ip().to_string();
            info.devnum = peer.port();
            if info.name.is_empty() {
                info.name = format!("{}:{}", peer.ip(), peer.port());
            }
        }

        info!(
            name = %info.name,
            version = %info.version,
            serial = %info.serial_number,
            "connected to device"
        );
        self.info = info;
        Ok(&self.info)
    }

    /// Set the reply timeout on both channels.
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.realtime.set_timeout(timeout);
        self.identity.set_timeout(timeout);
    }

    /// Current realtime timeout.
    pub fn timeout(&self) -> Duration {
        self.realtime.timeout()
    }

    /// Query the device for one status record.
    pub fn read<S: WireRecord>(&mut self) -> Result<S> {
        let mut buf = vec![0u8; S::SIZE];
        self.read_exact(&mut buf)?;
        Ok(S::decode(&buf))
    }

    /// Send one command record and return the acknowledgement.
    pub fn write<R: WireRecord>(&mut self, record: &R) -> Result<Bytes> {
        let mut buf = vec![0u8; R::SIZE];
        record.encode_into(&mut buf);
        self.write_bytes(&buf)
    }

    /// Query the device and require a reply of exactly `buf.len()` bytes.
    pub fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        read_exact(&mut self.realtime, buf)
    }

    /// Send raw command bytes and return the acknowledgement.
    pub fn write_bytes(&mut self, payload: &[u8]) -> Result<Bytes> {
        Ok(self.realtime.write(payload)?)
    }

    /// Look up a single identity key.
    pub fn query(&mut self, key: &str) -> Result<String> {
        self.identity
            .get(key)
            .map_err(|source| SessionError::Identity {
                key: key.to_string(),
                source,
            })
    }

    /// Details recorded by the last successful [`connect`](Self::connect).
    pub fn info(&self) -> &DeviceInfo {
        &self.info
    }

    /// Peer address of the realtime channel.
    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.realtime.peer_addr()
    }

    pub fn realtime_mut(&mut self) -> &mut C {
        &mut self.realtime
    }

    pub fn identity_mut(&mut self) -> &mut Q {
        &mut self.identity
    }
}

impl<C, Q> std::fmt::Debug for DeviceSession<C, Q> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceSession")
            .field("name", &self.info.name)
            .field("dev_path", &self.info.dev_path)
            .field("devnum", &self.info.devnum)
            .finish()
    }
}

/// Query `channel` and require a reply of exactly `buf.len()` bytes.
pub fn read_exact<C: ByteChannel + ?Sized>(channel: &mut C, buf: &mut [u8]) -> Result<()> {
    let actual = channel.read(buf)?;
    if actual != buf.len() {
        return Err(SessionError::RecordSize {
            expected: buf.len(),
            actual,
        });
    }
    Ok(())
}
