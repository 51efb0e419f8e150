//! Campaign checkpoints.
//!
//! A checkpoint snapshots everything needed to resume an interrupted run:
//! the remaining pool (by catalog name), the done list with verdicts, the
//! target, the extra parameters and the operator's include/exclude
//! selections. One checkpoint per target, overwritten on every save and
//! consumed by resume.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use tracing::{info, warn};

use crate::domain::{ExecutionResult, Exploit, Session, TargetAddr};
use crate::exploit::{Catalog, apply_filter};
use crate::storage;

/// Persisted snapshot of one interrupted campaign.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckpointState {
    pub target: TargetAddr,

    /// Names of exploits that had not run yet. Informational: resume
    /// recomputes the pool from the catalog and the done list rather than
    /// trusting this snapshot, since catalog or hardware may have changed.
    pub remaining: Vec<String>,

    pub done: Vec<ExecutionResult>,
    pub parameters: Vec<String>,
    pub include: Vec<String>,
    pub exclude: Vec<String>,

    pub created_at: DateTime<Utc>,
}

impl CheckpointState {
    pub fn from_session(session: &Session) -> Self {
        Self {
            target: session.target.clone(),
            remaining: session.pool.iter().map(|e| e.name.clone()).collect(),
            done: session.done.clone(),
            parameters: session.parameters.clone(),
            include: session.include.clone(),
            exclude: session.exclude.clone(),
            created_at: Utc::now(),
        }
    }
}

/// Whether a checkpoint exists for this target.
pub fn exists(root: &Path, target: &TargetAddr) -> bool {
    storage::checkpoint_path(root, target).exists()
}

/// Write the checkpoint, overwriting any prior one for the target.
///
/// Idempotent and atomic (temp file + rename), because the caller may be a
/// signal handler firing while an exploit is mid-call. Campaign state
/// matters more than this write succeeding: callers log failures and move
/// on rather than aborting the run.
pub fn save(root: &Path, state: &CheckpointState) -> Result<()> {
    let path = storage::checkpoint_path(root, &state.target);
    storage::ensure_dir(path.parent().expect("checkpoint path has a parent"))?;

    let content =
        serde_json::to_string_pretty(state).context("Failed to serialize checkpoint")?;

    let temp_path = path.with_extension("json.tmp");
    let mut temp_file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&temp_path)
        .with_context(|| format!("Failed to create temp file: {}", temp_path.display()))?;

    temp_file
        .write_all(content.as_bytes())
        .context("Failed to write checkpoint")?;
    temp_file.sync_all().context("Failed to sync checkpoint")?;

    std::fs::rename(&temp_path, &path)
        .with_context(|| format!("Failed to rename checkpoint: {}", path.display()))?;

    info!(target = %state.target, done = state.done.len(), "checkpoint written");
    Ok(())
}

/// Best-effort save used from interruption paths.
pub fn save_or_warn(root: &Path, session: &Session) {
    let state = CheckpointState::from_session(session);
    if let Err(e) = save(root, &state) {
        warn!("Failed to write checkpoint: {e:#}");
    }
}

/// Load the checkpoint for a target.
pub fn load(root: &Path, target: &TargetAddr) -> Result<CheckpointState> {
    let path = storage::checkpoint_path(root, target);
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read checkpoint: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse checkpoint: {}", path.display()))
}

/// Recompute the pool for a resumed run.
///
/// The pool is always catalog minus done, re-filtered against the current
/// recon version and hardware availability: a resumed run never executes an
/// exploit whose hardware went away while the campaign was parked. Exploits
/// that were still pending at checkpoint time but fail the re-filter are
/// logged by name before being dropped.
pub fn resume_pool(
    catalog: &Catalog,
    state: &CheckpointState,
    version: f32,
    hardware_ok: &HashMap<String, bool>,
) -> Vec<Exploit> {
    let done = state
        .done
        .iter()
        .map(|r| r.exploit.clone())
        .collect::<Vec<_>>();
    let candidates = catalog.minus(&done);

    let pool = apply_filter(
        candidates,
        &state.include,
        &state.exclude,
        version,
        hardware_ok,
    );

    for name in &state.remaining {
        if !pool.iter().any(|e| &e.name == name) {
            warn!("exploit {name} was pending at checkpoint time but is no longer eligible");
        }
    }

    pool
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ResultCode;
    use tempfile::TempDir;

    fn target() -> TargetAddr {
        "aa:bb:cc:dd:ee:ff".parse().unwrap()
    }

    fn state() -> CheckpointState {
        CheckpointState {
            target: target(),
            remaining: vec!["knob".to_string()],
            done: vec![ExecutionResult::new(
                "invalid_max_slot",
                ResultCode::NotVulnerable,
                "0",
            )],
            parameters: vec!["--fast".to_string()],
            include: vec![],
            exclude: vec!["nino_mitm".to_string()],
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_save_overwrites_prior_checkpoint() {
        let dir = TempDir::new().unwrap();
        let mut first = state();
        save(dir.path(), &first).unwrap();

        first.done.push(ExecutionResult::new(
            "knob",
            ResultCode::Vulnerable,
            "entropy 1",
        ));
        save(dir.path(), &first).unwrap();

        let loaded = load(dir.path(), &target()).unwrap();
        assert_eq!(loaded.done.len(), 2);
    }

    #[test]
    fn test_roundtrip_preserves_fields() {
        let dir = TempDir::new().unwrap();
        let state = state();
        save(dir.path(), &state).unwrap();

        let loaded = load(dir.path(), &target()).unwrap();
        assert_eq!(loaded.target, state.target);
        assert_eq!(loaded.parameters, state.parameters);
        assert_eq!(loaded.include, state.include);
        assert_eq!(loaded.exclude, state.exclude);
        assert_eq!(loaded.done.len(), 1);
        assert_eq!(loaded.done[0].exploit, "invalid_max_slot");
        assert_eq!(loaded.done[0].code, ResultCode::NotVulnerable);
    }

    #[test]
    fn test_exists() {
        let dir = TempDir::new().unwrap();
        assert!(!exists(dir.path(), &target()));
        save(dir.path(), &state()).unwrap();
        assert!(exists(dir.path(), &target()));
    }
}
