//! Checkpoint round-trip and resume re-filtering.

mod common;

use std::collections::HashMap;
use tempfile::TempDir;

use bluesweep::checkpoint::{self, CheckpointState};
use bluesweep::domain::{ExecutionResult, ResultCode, Session};
use bluesweep::exploit::Catalog;

use common::{entry, target};

const TWO_ENTRY_CATALOG: &str = r#"
[[exploit]]
name = "a"
kind = "dos"
hardware = "x"
bt_version_min = 4.0
bt_version_max = 5.0
mass_testing = true
command = ["a", "{target}"]

[[exploit]]
name = "b"
kind = "auth-bypass"
hardware = "y"
bt_version_min = 4.0
bt_version_max = 5.0
mass_testing = true
command = ["b", "{target}"]
"#;

fn availability(x: bool, y: bool) -> HashMap<String, bool> {
    HashMap::from([("x".to_string(), x), ("y".to_string(), y)])
}

#[test]
fn test_roundtrip_reproduces_session_fields() {
    let dir = TempDir::new().unwrap();

    let mut session = Session::new(
        target(),
        vec!["--fast".to_string()],
        vec![entry("b", "y", 4.0, 5.0, true)],
    );
    session.done = vec![ExecutionResult::new("a", ResultCode::Vulnerable, "data")];
    session.include = vec![];
    session.exclude = vec!["nino_mitm".to_string()];

    checkpoint::save(dir.path(), &CheckpointState::from_session(&session)).unwrap();
    let state = checkpoint::load(dir.path(), &target()).unwrap();

    assert_eq!(state.target, session.target);
    assert_eq!(state.parameters, session.parameters);
    assert_eq!(state.include, session.include);
    assert_eq!(state.exclude, session.exclude);
    assert_eq!(state.done.len(), 1);
    assert_eq!(state.done[0].exploit, "a");
    assert_eq!(state.done[0].code, ResultCode::Vulnerable);
    assert_eq!(state.remaining, vec!["b"]);
}

#[test]
fn test_resume_pool_is_catalog_minus_done_refiltered() {
    let catalog = Catalog::parse(TWO_ENTRY_CATALOG).unwrap();

    let mut session = Session::new(target(), vec![], catalog.minus(&["a".to_string()]));
    session.done = vec![ExecutionResult::new("a", ResultCode::NotVulnerable, "0")];
    let state = CheckpointState::from_session(&session);

    let pool = checkpoint::resume_pool(&catalog, &state, 4.5, &availability(true, true));
    let names: Vec<_> = pool.iter().map(|e| e.name.as_str()).collect();

    // "a" already ran and must not come back; "b" still passes the filter.
    assert_eq!(names, vec!["b"]);
}

#[test]
fn test_resume_drops_exploit_whose_hardware_went_away() {
    let catalog = Catalog::parse(TWO_ENTRY_CATALOG).unwrap();

    let session = Session::new(target(), vec![], catalog.minus(&[]));
    let state = CheckpointState::from_session(&session);

    // Hardware "y" was unplugged between checkpoint and resume.
    let pool = checkpoint::resume_pool(&catalog, &state, 4.5, &availability(true, false));
    let names: Vec<_> = pool.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["a"]);
}

#[test]
fn test_resume_reapplies_version_filter() {
    let catalog = Catalog::parse(TWO_ENTRY_CATALOG).unwrap();

    let session = Session::new(target(), vec![], catalog.minus(&[]));
    let state = CheckpointState::from_session(&session);

    // A re-probed version outside every range empties the pool.
    let pool = checkpoint::resume_pool(&catalog, &state, 3.0, &availability(true, true));
    assert!(pool.is_empty());
}

#[test]
fn test_resume_honors_saved_include_selection() {
    let catalog = Catalog::parse(TWO_ENTRY_CATALOG).unwrap();

    let mut session = Session::new(target(), vec![], catalog.minus(&[]));
    session.include = vec!["b".to_string()];
    session.exclude = vec!["b".to_string()];
    let state = CheckpointState::from_session(&session);

    // Include still dominates exclude after a resume.
    let pool = checkpoint::resume_pool(&catalog, &state, 4.5, &availability(true, true));
    let names: Vec<_> = pool.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["b"]);
}
