//! bluesweep - Bluetooth exploit campaign orchestrator
//!
//! bluesweep runs a battery of known Bluetooth exploits against one target
//! device. It tracks device reachability before every probe, narrows the
//! exploit catalog to what is actually applicable (hardware, protocol
//! version, operator selection), executes the survivors strictly
//! sequentially, and checkpoints the campaign so an interrupted run resumes
//! where it stopped instead of starting over.
//!
//! Exploit payloads themselves are external tools; this crate only
//! orchestrates them.

pub mod checkpoint;
pub mod config;
pub mod device;
pub mod domain;
pub mod engine;
pub mod exploit;
pub mod recon;
pub mod report;
pub mod storage;

pub use domain::*;
