//! Target reconnaissance.
//!
//! One acquisition cycle establishes the baseline the filter needs: protocol
//! version, vendor, feature sets and pairability. The record is cached per
//! target and becomes stale only by an explicit re-probe; there is no TTL.

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::device::BtController;
use crate::domain::TargetAddr;
use crate::storage;

/// Cached per-target observation, persisted as pretty-printed JSON.
///
/// Feature payloads are opaque: stored exactly as the controller reported
/// them, never decoded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconRecord {
    /// Probe mode; only classic is implemented
    #[serde(rename = "type")]
    pub mode: String,

    pub classic_advertising: bool,
    pub classic_connectable: bool,

    pub version: f32,
    pub vendor: String,

    /// Raw LMP feature mask
    pub lmp_features: String,

    pub pairable: bool,

    /// Raw pairing feature exchange, when one was observed
    pub pairing_features: Option<String>,
}

/// Load the cached record for a target, if one exists.
///
/// A miss returns `None`; callers decide whether to trigger a fresh
/// acquisition. Corrupted records are reported as errors, not recovered.
pub fn load(root: &Path, target: &TargetAddr) -> Result<Option<ReconRecord>> {
    let path = storage::recon_path(root, target);
    if !path.exists() {
        debug!(target = %target, "no recon record at {}", path.display());
        return Ok(None);
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read recon record: {}", path.display()))?;
    let record = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse recon record: {}", path.display()))?;
    Ok(Some(record))
}

/// Run one full acquisition cycle and persist the record on success.
///
/// Loops scan → connect → version/vendor → features → pair → disconnect
/// until every field is populated, bounded by `timeout` wall-clock. Nothing
/// is persisted on timeout: a partial record would let the filter make
/// decisions on fields that were never observed.
pub async fn acquire(
    dev: &dyn BtController,
    target: &TargetAddr,
    root: &Path,
    scan_timeout: Duration,
    timeout: Duration,
) -> Result<ReconRecord> {
    info!(target = %target, "starting recon acquisition");
    dev.power_on().await?;

    let deadline = Instant::now() + timeout;
    let record = loop {
        match acquisition_pass(dev, target, scan_timeout).await {
            Ok(Some(record)) => break record,
            Ok(None) => debug!(target = %target, "incomplete pass, retrying"),
            Err(e) => debug!(target = %target, "acquisition pass failed: {e}"),
        }

        if Instant::now() >= deadline {
            dev.power_off().await.ok();
            bail!(
                "recon unobtainable for {target}: device unreachable or protocol unsupported"
            );
        }
    };

    dev.power_off().await?;

    // The record is still good even if the cache write fails; the next run
    // simply re-acquires.
    if let Err(e) = save(root, target, &record) {
        warn!("Failed to persist recon record: {e:#}");
    }
    info!(target = %target, version = record.version, vendor = %record.vendor, "recon complete");
    Ok(record)
}

/// One pass of the acquisition loop; `None` when a field stayed unpopulated.
async fn acquisition_pass(
    dev: &dyn BtController,
    target: &TargetAddr,
    scan_timeout: Duration,
) -> Result<Option<ReconRecord>> {
    let advertising = dev.scan(scan_timeout, target).await?;

    if !dev.connect(target).await? {
        return Ok(None);
    }
    debug!(target = %target, "device connected");

    let (version, vendor) = dev.remote_version().await?;
    let lmp_features = dev.remote_features().await?;
    let (pairable, pairing_features) = dev.pair().await?;
    dev.disconnect().await?;

    // Pairing feature exchange is only observable when the device actually
    // paired; treat its absence on a pairable device as an incomplete pass.
    if pairable && pairing_features.is_none() {
        return Ok(None);
    }

    Ok(Some(ReconRecord {
        mode: "classic".to_string(),
        classic_advertising: advertising,
        classic_connectable: true,
        version,
        vendor,
        lmp_features,
        pairable,
        pairing_features,
    }))
}

fn save(root: &Path, target: &TargetAddr, record: &ReconRecord) -> Result<()> {
    let dir = storage::recon_dir(root, target);
    storage::ensure_dir(&dir)?;

    let path = storage::recon_path(root, target);
    let content = serde_json::to_string_pretty(record).context("Failed to serialize recon")?;
    std::fs::write(&path, content)
        .with_context(|| format!("Failed to write recon record: {}", path.display()))?;
    Ok(())
}

/// Vendor-specific info dumps captured alongside the structured record.
///
/// The raw text is stored for the operator, never parsed. Individual
/// command failures are tolerated: a missing tool loses one dump, not the
/// recon.
pub async fn run_commands(target: &TargetAddr, root: &Path) -> Result<()> {
    let commands: &[(&str, &[&str])] = &[
        ("hcitool_info", &["hcitool", "info", target.as_str()]),
        ("sdptool_browse", &["sdptool", "browse", target.as_str()]),
        ("sdptool_records", &["sdptool", "records", target.as_str()]),
    ];

    let dir = storage::recon_dir(root, target);
    storage::ensure_dir(&dir)?;

    for (name, argv) in commands {
        info!("Running command -> {}", argv.join(" "));
        let output = tokio::process::Command::new(argv[0])
            .args(&argv[1..])
            .kill_on_drop(true)
            .output()
            .await;

        match output {
            Ok(output) if output.status.success() => {
                let path = dir.join(format!("{name}.txt"));
                if let Err(e) = std::fs::write(&path, &output.stdout) {
                    warn!("Failed to write {}: {e}", path.display());
                }
            }
            Ok(_) | Err(_) => {
                // Errors are handled at the recon level; one missing dump
                // is not a failed recon.
                debug!("command {name} produced no usable output");
            }
        }
    }

    Ok(())
}
