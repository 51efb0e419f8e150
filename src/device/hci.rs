//! BlueZ-backed controller implementation.
//!
//! Drives the adapter through the stock command line tools (`hciconfig`,
//! `hcitool`, `bluetoothctl`) instead of raw HCI sockets, so the crate works
//! on any box with BlueZ installed and stays out of the radio business.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

use super::{BtController, DeviceError};
use crate::domain::TargetAddr;

static LMP_VERSION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"LMP Version:\s*([0-9]+(?:\.[0-9]+)?)").unwrap());
static MANUFACTURER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Manufacturer:\s*(.+?)\s*\(\d+\)").unwrap());
static FEATURES_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Features(?: page 0)?:\s*(.+)").unwrap());

/// Production [`BtController`] shelling out to the BlueZ tools.
///
/// Remembers the last target it connected to because `hcitool dc` and the
/// pairing flow address the peer again even though the trait models them as
/// operations on the current link.
pub struct HciController {
    device: String,
    last_target: std::sync::Mutex<Option<TargetAddr>>,
}

impl HciController {
    pub fn new(device: impl Into<String>) -> Self {
        Self {
            device: device.into(),
            last_target: std::sync::Mutex::new(None),
        }
    }

    /// True when the adapter shows up in `hciconfig`.
    pub fn adapter_present(device: &str) -> bool {
        std::process::Command::new("hciconfig")
            .arg(device)
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    /// Run one control tool to completion, capturing combined output.
    async fn run_tool(&self, tool: &str, args: &[&str]) -> Result<(bool, String), DeviceError> {
        debug!(tool, ?args, "running control tool");
        let output = Command::new(tool)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await?;

        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&output.stderr));
        Ok((output.status.success(), text))
    }

    /// Same as [`run_tool`](Self::run_tool) but bounded; an elapsed timeout
    /// reports as unsuccessful rather than an error, since the bound is part
    /// of the operation's contract.
    async fn run_tool_bounded(
        &self,
        tool: &str,
        args: &[&str],
        timeout: Duration,
    ) -> Result<(bool, String), DeviceError> {
        match tokio::time::timeout(timeout, self.run_tool(tool, args)).await {
            Ok(result) => result,
            Err(_) => {
                debug!(tool, ?timeout, "control tool hit the time bound");
                Ok((false, String::new()))
            }
        }
    }

    fn current_target(&self) -> Result<TargetAddr, DeviceError> {
        self.last_target
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| DeviceError::Tool {
                tool: "hcitool".to_string(),
                message: "no active connection".to_string(),
            })
    }

    async fn info(&self, target: &TargetAddr) -> Result<String, DeviceError> {
        let (ok, output) = self
            .run_tool("hcitool", &["-i", &self.device, "info", target.as_str()])
            .await?;
        if !ok {
            return Err(DeviceError::Tool {
                tool: "hcitool info".to_string(),
                message: output.trim().to_string(),
            });
        }
        Ok(output)
    }
}

#[async_trait]
impl BtController for HciController {
    async fn power_on(&self) -> Result<(), DeviceError> {
        let (ok, output) = self.run_tool("hciconfig", &[&self.device, "up"]).await?;
        if !ok {
            return Err(DeviceError::Tool {
                tool: "hciconfig up".to_string(),
                message: output.trim().to_string(),
            });
        }
        Ok(())
    }

    async fn power_off(&self) -> Result<(), DeviceError> {
        let (ok, output) = self.run_tool("hciconfig", &[&self.device, "down"]).await?;
        if !ok {
            // Powering down is cleanup; a refusal is worth a log line, not
            // a failed probe.
            warn!("hciconfig down refused: {}", output.trim());
        }
        Ok(())
    }

    async fn scan(&self, timeout: Duration, target: &TargetAddr) -> Result<bool, DeviceError> {
        let (_, output) = self
            .run_tool_bounded(
                "hcitool",
                &["-i", &self.device, "scan", "--flush"],
                timeout,
            )
            .await?;
        Ok(output.to_ascii_lowercase().contains(target.as_str()))
    }

    async fn connect(&self, target: &TargetAddr) -> Result<bool, DeviceError> {
        let (ok, _) = self
            .run_tool("hcitool", &["-i", &self.device, "cc", target.as_str()])
            .await?;
        if ok {
            *self.last_target.lock().unwrap() = Some(target.clone());
        }
        Ok(ok)
    }

    async fn pair(&self) -> Result<(bool, Option<String>), DeviceError> {
        let target = self.current_target()?;
        let (_, output) = self
            .run_tool("bluetoothctl", &["--timeout", "15", "pair", target.as_str()])
            .await?;
        let paired = output.contains("Pairing successful");
        // The raw exchange is kept opaque; recon stores it verbatim.
        let features = if output.trim().is_empty() {
            None
        } else {
            Some(output.trim().to_string())
        };
        Ok((paired, features))
    }

    async fn disconnect(&self) -> Result<(), DeviceError> {
        let target = self.current_target()?;
        let (ok, output) = self
            .run_tool("hcitool", &["-i", &self.device, "dc", target.as_str()])
            .await?;
        if !ok {
            warn!("hcitool dc refused: {}", output.trim());
        }
        *self.last_target.lock().unwrap() = None;
        Ok(())
    }

    async fn remote_version(&self) -> Result<(f32, String), DeviceError> {
        let target = self.current_target()?;
        let info = self.info(&target).await?;

        let version = LMP_VERSION_RE
            .captures(&info)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse::<f32>().ok())
            .ok_or_else(|| DeviceError::Tool {
                tool: "hcitool info".to_string(),
                message: "no LMP version in output".to_string(),
            })?;

        let vendor = MANUFACTURER_RE
            .captures(&info)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
            .unwrap_or_else(|| "unknown".to_string());

        Ok((version, vendor))
    }

    async fn remote_features(&self) -> Result<String, DeviceError> {
        let target = self.current_target()?;
        let info = self.info(&target).await?;

        FEATURES_RE
            .captures(&info)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().trim().to_string())
            .ok_or_else(|| DeviceError::Tool {
                tool: "hcitool info".to_string(),
                message: "no feature mask in output".to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_regex() {
        let info = "\tLMP Version: 4.2 (0x8) LMP Subversion: 0x6119\n";
        let caps = LMP_VERSION_RE.captures(info).unwrap();
        assert_eq!(&caps[1], "4.2");
    }

    #[test]
    fn test_manufacturer_regex() {
        let info = "\tManufacturer: Qualcomm (29)\n";
        let caps = MANUFACTURER_RE.captures(info).unwrap();
        assert_eq!(&caps[1], "Qualcomm");
    }

    #[test]
    fn test_features_regex_both_spellings() {
        let paged = "\tFeatures page 0: 0xbf 0xfe 0xcf 0xfe\n";
        let plain = "\tFeatures: 0xbf 0xfe 0xcf 0xfe\n";
        assert_eq!(&FEATURES_RE.captures(paged).unwrap()[1], "0xbf 0xfe 0xcf 0xfe");
        assert_eq!(&FEATURES_RE.captures(plain).unwrap()[1], "0xbf 0xfe 0xcf 0xfe");
    }
}
