//! Shared test doubles for engine and checkpoint integration tests

use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;

use bluesweep::device::{BtController, DeviceError};
use bluesweep::domain::{Exploit, ExploitKind, ResultCode, TargetAddr};
use bluesweep::engine::{Decision, GateDecision};
use bluesweep::exploit::ExploitUnit;

pub fn target() -> TargetAddr {
    "aa:bb:cc:dd:ee:ff".parse().expect("valid test MAC")
}

/// Catalog entry builder for tests.
pub fn entry(name: &str, hardware: &str, min: f32, max: f32, mass_testing: bool) -> Exploit {
    Exploit {
        name: name.to_string(),
        kind: ExploitKind::Dos,
        hardware: hardware.to_string(),
        bt_version_min: min,
        bt_version_max: max,
        mass_testing,
        command: vec!["true".to_string(), "{target}".to_string()],
    }
}

/// Controller that always reports the same observation.
pub struct FixedController {
    observation: (bool, bool, bool),
}

impl FixedController {
    pub fn new(found: bool, connectable: bool, pairable: bool) -> Self {
        Self {
            observation: (found, connectable, pairable),
        }
    }

    /// A target that is fully reachable: every gate passes immediately.
    pub fn reachable() -> Self {
        Self::new(true, true, true)
    }
}

#[async_trait]
impl BtController for FixedController {
    async fn power_on(&self) -> Result<(), DeviceError> {
        Ok(())
    }

    async fn power_off(&self) -> Result<(), DeviceError> {
        Ok(())
    }

    async fn scan(&self, _timeout: Duration, _target: &TargetAddr) -> Result<bool, DeviceError> {
        Ok(self.observation.0)
    }

    async fn connect(&self, _target: &TargetAddr) -> Result<bool, DeviceError> {
        Ok(self.observation.1)
    }

    async fn pair(&self) -> Result<(bool, Option<String>), DeviceError> {
        let pairable = self.observation.2;
        Ok((pairable, pairable.then(|| "iocap=0x03".to_string())))
    }

    async fn disconnect(&self) -> Result<(), DeviceError> {
        Ok(())
    }

    async fn remote_version(&self) -> Result<(f32, String), DeviceError> {
        Ok((4.5, "Test Vendor".to_string()))
    }

    async fn remote_features(&self) -> Result<String, DeviceError> {
        Ok("0xbf 0xfe 0xcf 0xfe".to_string())
    }
}

type Hook = Box<dyn Fn() + Send + Sync>;

/// Exploit unit with a canned verdict, optionally running a hook first.
pub struct StubUnit {
    name: String,
    verdict: Option<(ResultCode, String)>,
    hook: Option<Hook>,
}

impl StubUnit {
    pub fn new(name: &str, code: ResultCode, data: &str) -> Self {
        Self {
            name: name.to_string(),
            verdict: Some((code, data.to_string())),
            hook: None,
        }
    }

    /// A unit whose run fails outright.
    pub fn failing(name: &str) -> Self {
        Self {
            name: name.to_string(),
            verdict: None,
            hook: None,
        }
    }

    pub fn with_hook(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.hook = Some(Box::new(hook));
        self
    }
}

#[async_trait]
impl ExploitUnit for StubUnit {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(
        &self,
        _target: &TargetAddr,
        _parameters: &[String],
    ) -> anyhow::Result<(ResultCode, String)> {
        if let Some(hook) = &self.hook {
            hook();
        }
        match &self.verdict {
            Some(verdict) => Ok(verdict.clone()),
            None => anyhow::bail!("tool exploded"),
        }
    }
}

/// Decision callback that replays a fixed script, then keeps aborting.
pub struct CannedDecision {
    script: Mutex<Vec<Decision>>,
}

impl CannedDecision {
    pub fn new(script: Vec<Decision>) -> Self {
        let mut script = script;
        script.reverse();
        Self {
            script: Mutex::new(script),
        }
    }

    pub fn abort() -> Self {
        Self::new(vec![])
    }
}

#[async_trait]
impl GateDecision for CannedDecision {
    async fn decide(&self, _failed_attempts: u32) -> Decision {
        self.script
            .lock()
            .unwrap()
            .pop()
            .unwrap_or(Decision::Abort)
    }
}
