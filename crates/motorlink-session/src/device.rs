//! Loopback stand-in for a motor controller.
//!
//! Answers the same request shapes a real controller does, which is enough
//! for tests and for exercising the CLI without hardware.

use std::collections::{BTreeMap, VecDeque};
use std::io::ErrorKind;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use motorlink_frame::{decode_request, encode_frame, FrameConfig, Request, MAX_DATAGRAM_SIZE};
use motorlink_transport::TransportError;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{Result, SessionError};

/// How often the receive loop checks the stop flag.
const STOP_CHECK_INTERVAL: Duration = Duration::from_millis(20);

/// Sources that may hold an unanswered identity key at once; the oldest is
/// evicted first.
const PENDING_LIMIT: usize = 64;

/// Command payloads kept for inspection; older entries are dropped.
const COMMAND_LOG_LIMIT: usize = 1024;

/// What a simulated device reports.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceProfile {
    /// Identity values by key.
    pub identity: BTreeMap<String, String>,
    /// Payload returned to a status query.
    pub status: Vec<u8>,
}

impl DeviceProfile {
    /// Load a profile from JSON text.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Load a profile from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| SessionError::ProfileIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    /// Add or replace an identity value.
    pub fn with_identity(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.identity.insert(key.into(), value.into());
        self
    }

    /// Set the status payload.
    pub fn with_status(mut self, status: impl Into<Vec<u8>>) -> Self {
        self.status = status.into();
        self
    }
}

/// A UDP endpoint that behaves like a controller.
pub struct SimulatedDevice {
    socket: UdpSocket,
    profile: DeviceProfile,
    frame: FrameConfig,
    pending: VecDeque<(SocketAddr, String)>,
    commands: CommandLog,
}

/// Recent command payloads, shared between a device and its handle.
pub type CommandLog = Arc<Mutex<VecDeque<Bytes>>>;

impl SimulatedDevice {
    /// Bind a simulated device to `addr`.
    pub fn bind(addr: impl ToSocketAddrs, profile: DeviceProfile) -> Result<Self> {
        let socket = UdpSocket::bind(addr).map_err(TransportError::Bind)?;
        socket
            .set_read_timeout(Some(STOP_CHECK_INTERVAL))
            .map_err(TransportError::Io)?;
        Ok(Self {
            socket,
            profile,
            frame: FrameConfig::default(),
            pending: VecDeque::new(),
            commands: Arc::new(Mutex::new(VecDeque::new())),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr().map_err(TransportError::Io)?)
    }

    pub fn profile(&self) -> &DeviceProfile {
        &self.profile
    }

    /// Shared log of the most recent command payloads.
    pub fn commands(&self) -> CommandLog {
        Arc::clone(&self.commands)
    }

    /// Serve requests until `running` is cleared.
    pub fn run(&mut self, running: &AtomicBool) -> Result<()> {
        info!(addr = ?self.socket.local_addr().ok(), "simulated device listening");
        let mut buf = [0u8; MAX_DATAGRAM_SIZE];

        while running.load(Ordering::SeqCst) {
            let (len, from) = match self.socket.recv_from(&mut buf) {
                Ok(received) => received,
                Err(err)
                    if matches!(
                        err.kind(),
                        ErrorKind::WouldBlock | ErrorKind::TimedOut | ErrorKind::Interrupted
                    ) =>
                {
                    continue
                }
                Err(err) => return Err(TransportError::Io(err).into()),
            };

            let Some(reply) = self.handle(&buf[..len], from) else {
                continue;
            };
            if let Err(err) = self.socket.send_to(&reply, from) {
                warn!(%from, error = %err, "failed to send reply");
            }
        }

        info!("simulated device stopped");
        Ok(())
    }

    /// Run on a background thread.
    pub fn spawn(mut self) -> Result<DeviceHandle> {
        let addr = self.local_addr()?;
        let commands = self.commands();
        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);
        let thread = thread::spawn(move || {
            if let Err(err) = self.run(&flag) {
                warn!(error = %err, "simulated device failed");
            }
        });
        Ok(DeviceHandle {
            addr,
            running,
            commands,
            thread: Some(thread),
        })
    }

    fn handle(&mut self, raw: &[u8], from: SocketAddr) -> Option<BytesMut> {
        let request = match decode_request(raw, &self.frame) {
            Ok(request) => request,
            Err(err) => {
                debug!(%from, error = %err, "dropping malformed request");
                return None;
            }
        };

        let payload: Vec<u8> = match request {
            Request::Command(payload) => {
                let key = String::from_utf8_lossy(&payload).into_owned();
                self.log_command(payload);
                self.take_pending(from);
                if self.profile.identity.contains_key(&key) {
                    if self.pending.len() >= PENDING_LIMIT {
                        self.pending.pop_front();
                    }
                    self.pending.push_back((from, key));
                }
                Vec::new()
            }
            Request::Query => match self
                .take_pending(from)
                .and_then(|key| self.profile.identity.get(&key))
            {
                Some(value) => {
                    let mut text = value.as_bytes().to_vec();
                    text.push(0);
                    text
                }
                None => self.profile.status.clone(),
            },
        };

        let mut reply = BytesMut::with_capacity(MAX_DATAGRAM_SIZE);
        match encode_frame(&payload, &mut reply) {
            Ok(()) => Some(reply),
            Err(err) => {
                warn!(%from, error = %err, "reply does not fit in a frame");
                None
            }
        }
    }

    fn take_pending(&mut self, from: SocketAddr) -> Option<String> {
        let index = self.pending.iter().position(|(addr, _)| *addr == from)?;
        self.pending.remove(index).map(|(_, key)| key)
    }

    fn log_command(&self, payload: Bytes) {
        let mut log = self.commands.lock().unwrap_or_else(PoisonError::into_inner);
        if log.len() >= COMMAND_LOG_LIMIT {
            log.pop_front();
        }
        log.push_back(payload);
    }
}

/// A simulated device running on its own thread. Stops when dropped.
pub struct DeviceHandle {
    addr: SocketAddr,
    running: Arc<AtomicBool>,
    commands: CommandLog,
    thread: Option<JoinHandle<()>>,
}

impl DeviceHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Command payloads received so far.
    pub fn commands(&self) -> Vec<Bytes> {
        self.commands
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    /// Stop the device and wait for its thread.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for DeviceHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}
