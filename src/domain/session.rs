use super::{ExecutionResult, Exploit, TargetAddr};

/// Mutable state of one campaign, owned by the engine.
///
/// The signal handler holds a clone of the `Arc<Mutex<Session>>` so it can
/// snapshot a checkpoint even while an exploit is mid-call; everything else
/// mutates the session strictly between exploits.
#[derive(Debug, Clone)]
pub struct Session {
    /// Device under test
    pub target: TargetAddr,

    /// Free-form extra parameters forwarded to every exploit invocation
    pub parameters: Vec<String>,

    /// Exploits still to run, in catalog order
    pub pool: Vec<Exploit>,

    /// Results of exploits that already completed
    pub done: Vec<ExecutionResult>,

    /// Operator include selection (dominates exclude when non-empty)
    pub include: Vec<String>,

    /// Operator exclude selection
    pub exclude: Vec<String>,
}

impl Session {
    pub fn new(target: TargetAddr, parameters: Vec<String>, pool: Vec<Exploit>) -> Self {
        Self {
            target,
            parameters,
            pool,
            done: Vec::new(),
            include: Vec::new(),
            exclude: Vec::new(),
        }
    }

    /// Names of exploits that have already been tested.
    pub fn done_names(&self) -> Vec<String> {
        self.done.iter().map(|r| r.exploit.clone()).collect()
    }
}
