//! Recon command implementation

use anyhow::Result;

use bluesweep::config::Config;
use bluesweep::device::HciController;
use bluesweep::domain::TargetAddr;
use bluesweep::recon;
use bluesweep::storage;

/// Run a fresh acquisition cycle plus the raw info dumps.
pub async fn recon_command(config: &Config, target: &str) -> Result<()> {
    let target: TargetAddr = target.parse().map_err(anyhow::Error::msg)?;
    let controller = HciController::new(&config.hci_device);

    let record = recon::acquire(
        &controller,
        &target,
        &config.output_root,
        config.scan_timeout(),
        config.recon_timeout(),
    )
    .await?;

    recon::run_commands(&target, &config.output_root).await?;

    println!(
        "Recon complete: vendor {}, Bluetooth {}, pairable: {}",
        record.vendor, record.version, record.pairable
    );
    println!(
        "Record written to {}",
        storage::recon_path(&config.output_root, &target).display()
    );
    Ok(())
}
