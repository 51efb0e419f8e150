//! Bluetooth control interface boundary.
//!
//! The crate never talks to the radio directly: every radio operation goes
//! through the [`BtController`] trait. Production code uses [`HciController`]
//! (BlueZ command line tools); tests script the trait.
//!
//! Feature payloads returned by the controller are opaque strings. They are
//! stored and forwarded verbatim, never decoded.

mod dos;
mod hci;
mod probe;

pub use dos::{DosLimits, classify};
pub use hci::HciController;
pub use probe::probe;

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

use crate::domain::TargetAddr;

/// Failure classes surfaced by the device layer.
#[derive(Debug, Error)]
pub enum DeviceError {
    /// An external control tool exited unsuccessfully
    #[error("{tool} failed: {message}")]
    Tool { tool: String, message: String },

    /// A bounded radio operation did not finish in time
    #[error("operation timed out after {0:?}")]
    Timeout(Duration),

    /// Spawning or talking to a control tool failed at the OS level
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Low-level Bluetooth control operations.
///
/// One implementor drives one physical adapter, which is an exclusive
/// resource: callers must not interleave operations from concurrent tasks.
#[async_trait]
pub trait BtController: Send + Sync {
    async fn power_on(&self) -> Result<(), DeviceError>;

    async fn power_off(&self) -> Result<(), DeviceError>;

    /// Scan for the target for at most `timeout`; true if it advertised.
    async fn scan(&self, timeout: Duration, target: &TargetAddr) -> Result<bool, DeviceError>;

    /// Attempt a baseband connection; true on success.
    async fn connect(&self, target: &TargetAddr) -> Result<bool, DeviceError>;

    /// Attempt pairing on the current connection. Returns whether pairing
    /// succeeded and the raw pairing feature exchange, if one was observed.
    async fn pair(&self) -> Result<(bool, Option<String>), DeviceError>;

    async fn disconnect(&self) -> Result<(), DeviceError>;

    /// Protocol version and vendor of the connected remote.
    async fn remote_version(&self) -> Result<(f32, String), DeviceError>;

    /// Raw feature mask of the connected remote.
    async fn remote_features(&self) -> Result<String, DeviceError>;
}

/// Reachability of the target, reduced from one probe cycle.
///
/// The numeric codes are part of the persisted surface (logs, operator
/// output) and must not be renumbered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceStatus {
    /// 0: not found, not connectable
    NotAvailable,
    /// 1: not found, connectable, not pairable
    ConnectableOnly,
    /// 2: not found, connectable, pairable
    Pairable,
    /// 3: found, not connectable
    AdvertisingOnly,
    /// 4: found, connectable, not pairable
    AdvertisingConnectable,
    /// 5: found, connectable, pairable
    AdvertisingPairable,
}

impl DeviceStatus {
    /// Total mapping from the three probe observations to a status code.
    /// When the connect attempt failed the pairing observation is moot.
    pub fn from_observation(found: bool, connectable: bool, pairable: bool) -> Self {
        match (found, connectable, pairable) {
            (false, false, _) => DeviceStatus::NotAvailable,
            (true, false, _) => DeviceStatus::AdvertisingOnly,
            (false, true, false) => DeviceStatus::ConnectableOnly,
            (true, true, false) => DeviceStatus::AdvertisingConnectable,
            (false, true, true) => DeviceStatus::Pairable,
            (true, true, true) => DeviceStatus::AdvertisingPairable,
        }
    }

    pub fn code(&self) -> u8 {
        match self {
            DeviceStatus::NotAvailable => 0,
            DeviceStatus::ConnectableOnly => 1,
            DeviceStatus::Pairable => 2,
            DeviceStatus::AdvertisingOnly => 3,
            DeviceStatus::AdvertisingConnectable => 4,
            DeviceStatus::AdvertisingPairable => 5,
        }
    }

    /// Codes 1, 2, 4, 5: a connection attempt would succeed right now.
    pub fn is_connectable(&self) -> bool {
        matches!(
            self,
            DeviceStatus::ConnectableOnly
                | DeviceStatus::Pairable
                | DeviceStatus::AdvertisingConnectable
                | DeviceStatus::AdvertisingPairable
        )
    }

    /// Codes 2 and 5: the device accepted pairing.
    pub fn is_pairable(&self) -> bool {
        matches!(
            self,
            DeviceStatus::Pairable | DeviceStatus::AdvertisingPairable
        )
    }

    pub fn describe(&self) -> &'static str {
        match self {
            DeviceStatus::NotAvailable => "Device not advertising and not connectable",
            DeviceStatus::ConnectableOnly => {
                "Device not advertising, connectable but not pairable"
            }
            DeviceStatus::Pairable => "Device not advertising, connectable and pairable",
            DeviceStatus::AdvertisingOnly => "Device advertising but not connectable",
            DeviceStatus::AdvertisingConnectable => {
                "Device advertising and connectable but not pairable"
            }
            DeviceStatus::AdvertisingPairable => "Device advertising, connectable and pairable",
        }
    }
}

impl std::fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
pub(crate) mod mock {
    //! Scripted controller for unit tests in this module tree.

    use super::*;
    use std::sync::Mutex;

    /// Replays a fixed sequence of (found, connectable, pairable)
    /// observations, one per scan cycle; the last one repeats once the
    /// script runs out.
    pub struct ScriptedController {
        script: Vec<(bool, bool, bool)>,
        cycle: Mutex<usize>,
        active: Mutex<usize>,
    }

    impl ScriptedController {
        pub fn new(script: Vec<(bool, bool, bool)>) -> Self {
            assert!(!script.is_empty());
            Self {
                script,
                cycle: Mutex::new(0),
                active: Mutex::new(0),
            }
        }

        pub fn always(found: bool, connectable: bool, pairable: bool) -> Self {
            Self::new(vec![(found, connectable, pairable)])
        }

        fn observation(&self) -> (bool, bool, bool) {
            self.script[*self.active.lock().unwrap()]
        }
    }

    #[async_trait]
    impl BtController for ScriptedController {
        async fn power_on(&self) -> Result<(), DeviceError> {
            Ok(())
        }

        async fn power_off(&self) -> Result<(), DeviceError> {
            Ok(())
        }

        async fn scan(
            &self,
            _timeout: Duration,
            _target: &TargetAddr,
        ) -> Result<bool, DeviceError> {
            // A scan opens a new observation cycle; connect and pair below
            // report from the same cycle.
            let mut cycle = self.cycle.lock().unwrap();
            let index = (*cycle).min(self.script.len() - 1);
            *self.active.lock().unwrap() = index;
            *cycle += 1;
            Ok(self.script[index].0)
        }

        async fn connect(&self, _target: &TargetAddr) -> Result<bool, DeviceError> {
            Ok(self.observation().1)
        }

        async fn pair(&self) -> Result<(bool, Option<String>), DeviceError> {
            let pairable = self.observation().2;
            Ok((pairable, pairable.then(|| "iocap=0x03".to_string())))
        }

        async fn disconnect(&self) -> Result<(), DeviceError> {
            Ok(())
        }

        async fn remote_version(&self) -> Result<(f32, String), DeviceError> {
            Ok((5.0, "Test Vendor".to_string()))
        }

        async fn remote_features(&self) -> Result<String, DeviceError> {
            Ok("0xbf 0xfe 0xcf 0xfe 0xdb 0xff 0x7b 0x87".to_string())
        }
    }
}
