//! Exploit applicability filter.

use std::collections::HashMap;
use tracing::info;

use crate::domain::Exploit;

/// Narrow a pool to the exploits applicable to one target.
///
/// Applied in order:
/// 1. hardware availability — an exploit whose profile is unavailable is out
/// 2. include list, when non-empty — restricts to the named exploits and
///    makes the exclude list irrelevant (include always wins)
/// 3. exclude list, otherwise
/// 4. `mass_testing` — a full unattended sweep never auto-runs a
///    manual-only exploit
/// 5. version range — the observed version must fall inside
///    `[bt_version_min, bt_version_max]`, inclusive at both ends
///
/// Output preserves the input (catalog) order; display re-sorting is a
/// presentation concern and lives with the callers that render tables.
pub fn apply_filter(
    exploits: Vec<Exploit>,
    include: &[String],
    exclude: &[String],
    version: f32,
    hardware_ok: &HashMap<String, bool>,
) -> Vec<Exploit> {
    let mut pool: Vec<Exploit> = exploits
        .into_iter()
        .filter(|e| hardware_ok.get(&e.hardware).copied().unwrap_or(false))
        .collect();

    if !include.is_empty() {
        pool.retain(|e| include.iter().any(|n| n == &e.name));
    } else if !exclude.is_empty() {
        pool.retain(|e| !exclude.iter().any(|n| n == &e.name));
    }

    pool.retain(|e| e.mass_testing);

    pool.retain(|e| e.bt_version_min <= version && version <= e.bt_version_max);
    info!("{} exploits applicable at version {}", pool.len(), version);

    pool
}
