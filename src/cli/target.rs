//! Check-target command implementation

use anyhow::Result;

use bluesweep::config::Config;
use bluesweep::device::{HciController, probe};
use bluesweep::domain::TargetAddr;

/// Probe the target once and describe what came back.
pub async fn check_target_command(config: &Config, target: &str) -> Result<()> {
    let target: TargetAddr = target.parse().map_err(anyhow::Error::msg)?;
    let controller = HciController::new(&config.hci_device);

    let status = probe(&controller, &target, config.scan_timeout()).await?;
    println!("{}", status.describe());
    Ok(())
}
