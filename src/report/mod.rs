//! Result persistence and report rendering.
//!
//! Each completed exploit gets its own `{code, data}` record, written the
//! moment the exploit finishes so a crash loses at most the in-flight one.
//! Reports are rebuilt from those records plus the catalog: the directory
//! tree is the source of truth, not the in-memory done list.

use anyhow::{Context, Result};
use comfy_table::{Cell, Color, Table};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::domain::{ExecutionResult, ResultCode, TargetAddr};
use crate::exploit::Catalog;
use crate::storage;

/// Longest data excerpt shown in the human table.
const MAX_DATA_CHARS: usize = 80;

/// Code used for untested exploits in the machine report only.
const CODE_NOT_TESTED: u8 = 6;

#[derive(Debug, Serialize, Deserialize)]
struct ResultRecord {
    code: ResultCode,
    data: String,
}

/// Persist one exploit outcome, flushed immediately.
pub fn save_result(root: &Path, target: &TargetAddr, result: &ExecutionResult) -> Result<()> {
    let dir = storage::exploit_dir(root, target, &result.exploit);
    storage::ensure_dir(&dir)?;

    let record = ResultRecord {
        code: result.code,
        data: result.data.clone(),
    };
    let path = storage::result_path(root, target, &result.exploit);
    let content = serde_json::to_string_pretty(&record).context("Failed to serialize result")?;
    std::fs::write(&path, content)
        .with_context(|| format!("Failed to write result: {}", path.display()))?;

    debug!(exploit = %result.exploit, code = %result.code, "result persisted");
    Ok(())
}

/// Read one exploit's persisted outcome, if present and readable.
pub fn read_result(root: &Path, target: &TargetAddr, exploit: &str) -> Option<(ResultCode, String)> {
    let path = storage::result_path(root, target, exploit);
    let content = std::fs::read_to_string(&path).ok()?;
    let record: ResultRecord = serde_json::from_str(&content).ok()?;
    Some((record.code, record.data))
}

/// Names of exploits with a result directory for this target.
pub fn done_exploits(root: &Path, target: &TargetAddr) -> Vec<String> {
    let dir = storage::target_dir(root, target);
    let Ok(entries) = std::fs::read_dir(&dir) else {
        return Vec::new();
    };

    let mut done: Vec<String> = entries
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_dir())
        .filter_map(|e| e.file_name().into_string().ok())
        .filter(|name| !storage::SKIP_DIRECTORIES.contains(&name.as_str()))
        .collect();
    done.sort();
    done
}

fn code_color(code: ResultCode) -> Color {
    match code {
        ResultCode::Vulnerable => Color::Red,
        ResultCode::NotVulnerable => Color::Green,
        ResultCode::Error => Color::Cyan,
        ResultCode::Undefined | ResultCode::NoneOfFourStates => Color::White,
    }
}

fn truncate(data: &str) -> String {
    let mut excerpt: String = data.chars().take(MAX_DATA_CHARS).collect();
    if data.chars().count() > MAX_DATA_CHARS {
        excerpt.push('…');
    }
    excerpt
}

/// Render the human-readable report table for a target.
pub fn render_table(root: &Path, target: &TargetAddr, catalog: &Catalog) -> Table {
    let done = done_exploits(root, target);
    let skipped: Vec<&str> = catalog
        .entries()
        .iter()
        .map(|e| e.name.as_str())
        .filter(|name| !done.iter().any(|d| d == name))
        .collect();

    let mut table = Table::new();
    table.set_header(vec!["Index", "Exploit", "Result", "Data"]);

    let mut index = 1;
    for exploit in &done {
        // A directory without a readable record is a toolkit problem, not
        // a missing test; surface it in the table instead of hiding it.
        let (code, data) = read_result(root, target, exploit).unwrap_or((
            ResultCode::NoneOfFourStates,
            "Error during loading the report".to_string(),
        ));
        let color = code_color(code);
        table.add_row(vec![
            Cell::new(index),
            Cell::new(exploit).fg(color),
            Cell::new(code.as_str()).fg(color),
            Cell::new(truncate(&data)),
        ]);
        index += 1;
    }

    for exploit in skipped {
        table.add_row(vec![
            Cell::new(index),
            Cell::new(exploit),
            Cell::new("Not tested"),
            Cell::new(""),
        ]);
        index += 1;
    }

    table
}

/// Write the machine-readable report and return its path.
///
/// Untested exploits carry code 6, which exists only in this document.
pub fn write_machine_report(root: &Path, target: &TargetAddr, catalog: &Catalog) -> Result<PathBuf> {
    let done = done_exploits(root, target);
    let skipped: Vec<&str> = catalog
        .entries()
        .iter()
        .map(|e| e.name.as_str())
        .filter(|name| !done.iter().any(|d| d == name))
        .collect();

    let mut index = 1;
    let mut done_json = Vec::new();
    for exploit in &done {
        let (code, data) = read_result(root, target, exploit).unwrap_or((
            ResultCode::NoneOfFourStates,
            "Error during loading the report".to_string(),
        ));
        done_json.push(json!({
            "index": index,
            "name": exploit,
            "code": code.code(),
            "data": data,
        }));
        index += 1;
    }

    let mut skipped_json = Vec::new();
    for exploit in skipped {
        skipped_json.push(json!({
            "index": index,
            "name": exploit,
            "code": CODE_NOT_TESTED,
            "data": "Not tested",
        }));
        index += 1;
    }

    let recon = crate::recon::load(root, target).unwrap_or_else(|e| {
        warn!("recon record unreadable while reporting: {e:#}");
        None
    });

    let report = json!({
        "mac_address": target.as_str(),
        "bt_version": recon.as_ref().map(|r| r.version),
        "manufacturer": recon.as_ref().map(|r| r.vendor.clone()),
        "done_exploits": done_json,
        "skipped_exploits": skipped_json,
    });

    let path = storage::machine_report_path(root, target);
    storage::ensure_dir(path.parent().expect("report path has a parent"))?;
    std::fs::write(&path, serde_json::to_string_pretty(&report)?)
        .with_context(|| format!("Failed to write report: {}", path.display()))?;

    info!("Report created at {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn target() -> TargetAddr {
        "aa:bb:cc:dd:ee:ff".parse().unwrap()
    }

    #[test]
    fn test_result_roundtrip() {
        let dir = TempDir::new().unwrap();
        let result = ExecutionResult::new("knob", ResultCode::Vulnerable, "entropy 1");
        save_result(dir.path(), &target(), &result).unwrap();

        let (code, data) = read_result(dir.path(), &target(), "knob").unwrap();
        assert_eq!(code, ResultCode::Vulnerable);
        assert_eq!(data, "entropy 1");
    }

    #[test]
    fn test_done_exploits_skips_recon_dir() {
        let dir = TempDir::new().unwrap();
        let result = ExecutionResult::new("knob", ResultCode::NotVulnerable, "0");
        save_result(dir.path(), &target(), &result).unwrap();
        storage::ensure_dir(&storage::recon_dir(dir.path(), &target())).unwrap();

        assert_eq!(done_exploits(dir.path(), &target()), vec!["knob"]);
    }

    #[test]
    fn test_missing_result_reads_none() {
        let dir = TempDir::new().unwrap();
        assert!(read_result(dir.path(), &target(), "knob").is_none());
    }

    #[test]
    fn test_machine_report_marks_untested() {
        let dir = TempDir::new().unwrap();
        let result = ExecutionResult::new("knob", ResultCode::Vulnerable, "entropy 1");
        save_result(dir.path(), &target(), &result).unwrap();

        let path = write_machine_report(dir.path(), &target(), Catalog::builtin()).unwrap();
        let report: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();

        assert_eq!(report["mac_address"], "aa:bb:cc:dd:ee:ff");
        assert_eq!(report["done_exploits"][0]["name"], "knob");
        assert_eq!(report["done_exploits"][0]["code"], 0);

        let skipped = report["skipped_exploits"].as_array().unwrap();
        assert_eq!(skipped.len(), Catalog::builtin().len() - 1);
        assert!(skipped.iter().all(|e| e["code"] == 6));
    }

    #[test]
    fn test_truncate_long_data() {
        let long = "x".repeat(200);
        let excerpt = truncate(&long);
        assert_eq!(excerpt.chars().count(), MAX_DATA_CHARS + 1);
    }
}
