//! Sequential run scheduler.
//!
//! One engine instance drives one campaign: verify the target is reachable,
//! run the next exploit, record the outcome, repeat. Execution is strictly
//! sequential because every exploit claims the one physical radio. The only
//! asynchronous entry is interruption, which the engine observes as a
//! cancellation flag at the top of each iteration; the signal task writes
//! its own checkpoint for the mid-exploit case.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use crate::checkpoint;
use crate::config::Config;
use crate::device::{BtController, probe};
use crate::domain::{ExecutionResult, Exploit, ResultCode, Session, TargetAddr};
use crate::exploit::{CommandExploit, ExploitUnit};
use crate::report;

/// Operator's answer when the gate gives up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Retry,
    Abort,
}

/// Pluggable operator prompt, so the engine is testable without a terminal.
#[async_trait]
pub trait GateDecision: Send + Sync {
    /// Called after `failed_attempts` probes found the target unusable.
    async fn decide(&self, failed_attempts: u32) -> Decision;
}

/// Interactive decision on stdin. Never times out: the operator must
/// explicitly choose.
pub struct StdinDecision;

#[async_trait]
impl GateDecision for StdinDecision {
    async fn decide(&self, failed_attempts: u32) -> Decision {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            println!(
                "Device might not be available ({failed_attempts} failed probes). Try again? (Y/n):"
            );
            match lines.next_line().await {
                Ok(Some(line)) => match line.trim().to_ascii_lowercase().as_str() {
                    "y" => {
                        info!("Trying to verify connectivity again");
                        return Decision::Retry;
                    }
                    "n" => {
                        info!("Backing up");
                        return Decision::Abort;
                    }
                    _ => println!("Invalid input. Please enter 'Y' or 'n'."),
                },
                // Closed stdin cannot answer; aborting preserves state,
                // retrying forever would not.
                Ok(None) | Err(_) => {
                    warn!("stdin closed during gate prompt, aborting run");
                    return Decision::Abort;
                }
            }
        }
    }
}

/// Result of the connectivity gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GateOutcome {
    /// Target is pairable; run the exploit
    Proceed,
    /// Operator gave up
    Abort,
}

/// How a campaign ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every pooled exploit ran
    Completed,
    /// Operator chose abort at the gate; checkpoint written
    Aborted,
    /// Cancellation flag observed; checkpoint written
    Interrupted,
}

pub struct Engine {
    controller: Arc<dyn BtController>,
    decision: Arc<dyn GateDecision>,
    config: Config,

    /// Unit overrides, keyed by exploit name. Entries without an override
    /// run as [`CommandExploit`]s built from their catalog metadata.
    units: HashMap<String, Arc<dyn ExploitUnit>>,
}

impl Engine {
    pub fn new(
        controller: Arc<dyn BtController>,
        decision: Arc<dyn GateDecision>,
        config: Config,
    ) -> Self {
        Self {
            controller,
            decision,
            config,
            units: HashMap::new(),
        }
    }

    /// Register a unit that replaces the command runner for its exploit.
    pub fn register_unit(&mut self, unit: Arc<dyn ExploitUnit>) {
        self.units.insert(unit.name().to_string(), unit);
    }

    fn unit_for(&self, entry: &Exploit) -> Arc<dyn ExploitUnit> {
        match self.units.get(&entry.name) {
            Some(unit) => Arc::clone(unit),
            None => Arc::new(CommandExploit::new(
                entry.clone(),
                Arc::clone(&self.controller),
                self.config.dos_limits(),
            )),
        }
    }

    /// Run the campaign to completion, abort or interruption.
    ///
    /// The session lives behind a mutex shared with the signal task; the
    /// lock is only held between exploits, never across an await.
    pub async fn run(
        &self,
        session: &Arc<Mutex<Session>>,
        cancel: &AtomicBool,
    ) -> anyhow::Result<RunOutcome> {
        loop {
            if cancel.load(Ordering::SeqCst) {
                info!("Interruption observed, creating a checkpoint");
                let snapshot = session.lock().unwrap().clone();
                checkpoint::save_or_warn(&self.config.output_root, &snapshot);
                return Ok(RunOutcome::Interrupted);
            }

            let (entry, target, parameters) = {
                let session = session.lock().unwrap();
                let Some(entry) = session.pool.first().cloned() else {
                    break;
                };
                (entry, session.target.clone(), session.parameters.clone())
            };

            if self.connectivity_gate(&target).await == GateOutcome::Abort {
                let snapshot = session.lock().unwrap().clone();
                checkpoint::save_or_warn(&self.config.output_root, &snapshot);
                return Ok(RunOutcome::Aborted);
            }

            info!(exploit = %entry.name, "running exploit");
            let unit = self.unit_for(&entry);
            let (code, data) = match unit.run(&target, &parameters).await {
                Ok(verdict) => verdict,
                // A failing exploit never aborts the campaign.
                Err(e) => (ResultCode::Error, format!("{e:#}")),
            };

            let result = ExecutionResult::new(entry.name.clone(), code, data);
            info!(exploit = %result.exploit, code = %result.code, "exploit finished");

            {
                let mut session = session.lock().unwrap();
                session.pool.retain(|e| e.name != entry.name);
                session.done.push(result.clone());
            }

            // Persist before moving on so a crash loses at most the
            // in-flight result; a failed write is logged, not fatal.
            if let Err(e) = report::save_result(&self.config.output_root, &target, &result) {
                warn!("Failed to persist result for {}: {e:#}", result.exploit);
            }
        }

        Ok(RunOutcome::Completed)
    }

    /// Verify the target accepts pairing before touching it with a payload.
    ///
    /// Probes up to `gate_attempts` times; only a pairable status (2 or 5)
    /// lets the exploit proceed. After a full round of failures the
    /// operator decides: retry another round or abort the run.
    async fn connectivity_gate(&self, target: &TargetAddr) -> GateOutcome {
        loop {
            for _ in 0..self.config.gate_attempts {
                match probe(self.controller.as_ref(), target, self.config.scan_timeout()).await {
                    Ok(status) if status.is_pairable() => return GateOutcome::Proceed,
                    Ok(status) if status.is_connectable() => {
                        info!("Device does not accept pairing")
                    }
                    Ok(_) => info!("Device does not accept connections"),
                    Err(e) => warn!("probe failed: {e}"),
                }
            }

            match self.decision.decide(self.config.gate_attempts).await {
                Decision::Retry => continue,
                Decision::Abort => return GateOutcome::Abort,
            }
        }
    }
}
