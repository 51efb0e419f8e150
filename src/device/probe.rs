//! Connectivity prober: one observation cycle against the target.

use std::time::Duration;
use tracing::debug;

use super::{BtController, DeviceError, DeviceStatus};
use crate::domain::TargetAddr;

/// One full probe cycle: scan, connect, pair.
///
/// Reduces the three observations to a [`DeviceStatus`]. When the connect
/// attempt fails the cycle ends early (codes 0 and 3); when pairing fails it
/// ends without cleanup (codes 1 and 4) since the link is already torn down
/// by the failed exchange. Only a fully successful cycle disconnects and
/// powers the adapter off, so no radio state leaks into the next probe.
///
/// There are no retries here. Retry policy belongs to callers: the
/// connectivity gate loops, the DoS classifier counts.
pub async fn probe(
    dev: &dyn BtController,
    target: &TargetAddr,
    scan_timeout: Duration,
) -> Result<DeviceStatus, DeviceError> {
    dev.power_on().await?;

    let found = dev.scan(scan_timeout, target).await?;
    let connected = dev.connect(target).await?;
    if !connected {
        let status = DeviceStatus::from_observation(found, false, false);
        debug!(target = %target, status = %status, "connect failed");
        return Ok(status);
    }

    let (paired, _) = dev.pair().await?;
    if !paired {
        let status = DeviceStatus::from_observation(found, true, false);
        debug!(target = %target, status = %status, "pairing refused");
        return Ok(status);
    }

    dev.disconnect().await?;
    dev.power_off().await?;

    Ok(DeviceStatus::from_observation(found, true, true))
}
