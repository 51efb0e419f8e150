//! Deterministic per-target paths under the output root.
//!
//! Layout: `<root>/<target>/<exploit>/result.json`, with `recon/` holding
//! the recon record and raw tool dumps, and `checkpoint.json` at the target
//! level. Directory names double as the done-exploit index, so the `recon`
//! subdirectory is skipped when listing completed exploits.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::domain::TargetAddr;

/// Subdirectories under a target dir that are not exploit results.
pub const SKIP_DIRECTORIES: &[&str] = &["recon"];

pub fn target_dir(root: &Path, target: &TargetAddr) -> PathBuf {
    root.join(target.as_str())
}

pub fn exploit_dir(root: &Path, target: &TargetAddr, exploit: &str) -> PathBuf {
    target_dir(root, target).join(exploit)
}

pub fn recon_dir(root: &Path, target: &TargetAddr) -> PathBuf {
    target_dir(root, target).join("recon")
}

pub fn recon_path(root: &Path, target: &TargetAddr) -> PathBuf {
    recon_dir(root, target).join("recon.json")
}

pub fn result_path(root: &Path, target: &TargetAddr, exploit: &str) -> PathBuf {
    exploit_dir(root, target, exploit).join("result.json")
}

pub fn checkpoint_path(root: &Path, target: &TargetAddr) -> PathBuf {
    target_dir(root, target).join("checkpoint.json")
}

pub fn machine_report_path(root: &Path, target: &TargetAddr) -> PathBuf {
    target_dir(root, target).join("report.json")
}

/// Create a directory (and parents) on demand.
pub fn ensure_dir(path: &Path) -> Result<()> {
    std::fs::create_dir_all(path)
        .with_context(|| format!("Failed to create directory: {}", path.display()))
}
