//! Device sessions for motorlink controllers.
//!
//! A [`DeviceSession`] reads the controller's identity once at connect time,
//! then exchanges fixed-size status and command records with it.

pub mod device;
pub mod error;
pub mod identity;
pub mod record;
pub mod session;

pub use device::{DeviceHandle, DeviceProfile, SimulatedDevice};
pub use error::{Result, SessionError};
pub use identity::{IdentityQuery, TextQueryChannel, IDENTITY_KEYS};
pub use record::{RawRecord, WireRecord};
#[cfg(unix)]
pub use session::SessionConfig;
pub use session::{read_exact, DeviceInfo, DeviceSession};
