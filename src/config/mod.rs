//! Operator configuration.
//!
//! Campaign tuning lives in `~/.bluesweep/config.toml`, auto-created on
//! first run. Nothing here is required on the command line: the defaults
//! match a stock BlueZ box with one adapter.

mod io;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::device::DosLimits;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Root directory for per-target output (recon, results, checkpoints)
    #[serde(default = "default_output_root")]
    pub output_root: PathBuf,

    /// HCI adapter the controller drives
    #[serde(default = "default_hci_device")]
    pub hci_device: String,

    /// Bound for a single scan inside a probe cycle, in seconds
    #[serde(default = "default_scan_timeout_secs")]
    pub scan_timeout_secs: u64,

    /// Wall-clock bound for a full recon acquisition, in seconds
    #[serde(default = "default_recon_timeout_secs")]
    pub recon_timeout_secs: u64,

    /// Probe attempts per connectivity gate before asking the operator
    #[serde(default = "default_gate_attempts")]
    pub gate_attempts: u32,

    /// Consecutive unavailable observations tolerated by the DoS classifier
    #[serde(default = "default_dos_failure_threshold")]
    pub dos_failure_threshold: u32,

    /// Total probe attempts before the DoS classifier declares a verdict
    #[serde(default = "default_dos_attempt_ceiling")]
    pub dos_attempt_ceiling: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_root: default_output_root(),
            hci_device: default_hci_device(),
            scan_timeout_secs: default_scan_timeout_secs(),
            recon_timeout_secs: default_recon_timeout_secs(),
            gate_attempts: default_gate_attempts(),
            dos_failure_threshold: default_dos_failure_threshold(),
            dos_attempt_ceiling: default_dos_attempt_ceiling(),
        }
    }
}

impl Config {
    pub fn scan_timeout(&self) -> Duration {
        Duration::from_secs(self.scan_timeout_secs)
    }

    pub fn recon_timeout(&self) -> Duration {
        Duration::from_secs(self.recon_timeout_secs)
    }

    pub fn dos_limits(&self) -> DosLimits {
        DosLimits {
            failure_threshold: self.dos_failure_threshold,
            attempt_ceiling: self.dos_attempt_ceiling,
            scan_timeout: self.scan_timeout(),
        }
    }
}

fn default_output_root() -> PathBuf {
    Config::global_config_dir().join("targets")
}

fn default_hci_device() -> String {
    "hci0".to_string()
}

fn default_scan_timeout_secs() -> u64 {
    5
}

fn default_recon_timeout_secs() -> u64 {
    20
}

fn default_gate_attempts() -> u32 {
    10
}

fn default_dos_failure_threshold() -> u32 {
    5
}

fn default_dos_attempt_ceiling() -> u32 {
    10
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_missing_fields() {
        let config: Config = toml::from_str("hci_device = \"hci1\"").unwrap();
        assert_eq!(config.hci_device, "hci1");
        assert_eq!(config.gate_attempts, 10);
        assert_eq!(config.recon_timeout_secs, 20);
    }

    #[test]
    fn test_default_roundtrips_through_toml() {
        let config = Config::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let back: Config = toml::from_str(&text).unwrap();
        assert_eq!(back.scan_timeout_secs, config.scan_timeout_secs);
        assert_eq!(back.output_root, config.output_root);
    }
}
