//! Denial-of-service classifier.
//!
//! A bounded polling loop over the prober that turns sustained
//! unreachability into a verdict. Used by `dos`-kind exploits after their
//! payload ran, to decide whether the target stack actually died.

use std::time::Duration;
use tracing::debug;

use super::{BtController, probe};
use crate::domain::{ResultCode, TargetAddr};

/// Bounds for the classification loop.
#[derive(Debug, Clone, Copy)]
pub struct DosLimits {
    /// Consecutive unavailable observations tolerated before the verdict
    pub failure_threshold: u32,
    /// Total probe attempts before the loop gives up and declares a DoS
    pub attempt_ceiling: u32,
    /// Scan bound handed to each probe
    pub scan_timeout: Duration,
}

impl Default for DosLimits {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            attempt_ceiling: 10,
            scan_timeout: Duration::from_secs(5),
        }
    }
}

/// Repeatedly probe the target and classify sustained unreachability.
///
/// Any connectable-or-pairable status (codes 1, 2, 4, 5) immediately yields
/// `NotVulnerable` with the number of unavailable observations so far. The
/// loop declares `Vulnerable` only once the counter exceeds both the failure
/// threshold and the attempt ceiling. Probe failures never escape: they are
/// folded into an `Error` verdict with the failure text as data.
pub async fn classify(
    dev: &dyn BtController,
    target: &TargetAddr,
    limits: &DosLimits,
) -> (ResultCode, String) {
    let mut unavailable: u32 = 0;
    loop {
        let status = match probe(dev, target, limits.scan_timeout).await {
            Ok(status) => status,
            Err(e) => return (ResultCode::Error, e.to_string()),
        };

        if status.is_connectable() {
            return (ResultCode::NotVulnerable, unavailable.to_string());
        }

        unavailable += 1;
        debug!(target = %target, unavailable, "target unavailable");

        if unavailable > limits.failure_threshold && unavailable > limits.attempt_ceiling {
            return (ResultCode::Vulnerable, unavailable.to_string());
        }
    }
}
