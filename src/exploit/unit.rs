//! Runnable exploit units.

use anyhow::{Context, Result};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::process::Stdio;
use std::sync::Arc;
use tokio::process::Command;
use tracing::{debug, info};

use crate::device::{BtController, DosLimits, classify};
use crate::domain::{Exploit, ExploitKind, ResultCode, TargetAddr};

/// Verdict line emitted by PoC tools on stdout.
static VERDICT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"BLUESWEEP DATA: code=(\d+), data=(.*)").unwrap());

/// One opaque exploit: a single run contract, nothing else.
///
/// Units never abort the campaign. A unit that returns `Err` is recorded by
/// the scheduler as an `Error` verdict with the failure text as data.
#[async_trait]
pub trait ExploitUnit: Send + Sync {
    /// Catalog name of this unit.
    fn name(&self) -> &str;

    /// Run against the target with the campaign's extra parameters.
    async fn run(
        &self,
        target: &TargetAddr,
        parameters: &[String],
    ) -> Result<(ResultCode, String)>;
}

/// Generic unit wrapping an external PoC tool.
///
/// Builds the argv from the catalog entry's template, appends the campaign
/// parameters, runs the tool to completion and reads the last verdict
/// marker off its output. A `dos`-kind tool that prints no verdict gets one
/// from the DoS classifier instead: the payload may well have killed the
/// target before the tool could report.
pub struct CommandExploit {
    entry: Exploit,
    controller: Arc<dyn BtController>,
    dos_limits: DosLimits,
}

impl CommandExploit {
    pub fn new(entry: Exploit, controller: Arc<dyn BtController>, dos_limits: DosLimits) -> Self {
        Self {
            entry,
            controller,
            dos_limits,
        }
    }

    fn build_args(&self, target: &TargetAddr, parameters: &[String]) -> Vec<String> {
        let mut args: Vec<String> = self
            .entry
            .command
            .iter()
            .map(|part| part.replace("{target}", target.as_str()))
            .collect();
        args.extend(parameters.iter().cloned());
        args
    }

    /// Last verdict marker in the tool output, if any.
    fn parse_verdict(output: &str) -> Option<(ResultCode, String)> {
        let caps = VERDICT_RE.captures_iter(output).last()?;
        let code: u8 = caps[1].parse().ok()?;
        let code = ResultCode::try_from(code).ok()?;
        Some((code, caps[2].trim().to_string()))
    }
}

#[async_trait]
impl ExploitUnit for CommandExploit {
    fn name(&self) -> &str {
        &self.entry.name
    }

    async fn run(
        &self,
        target: &TargetAddr,
        parameters: &[String],
    ) -> Result<(ResultCode, String)> {
        let argv = self.build_args(target, parameters);
        let (program, args) = argv
            .split_first()
            .context("exploit entry has an empty command")?;

        info!(exploit = %self.entry.name, %program, "launching exploit tool");
        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .with_context(|| format!("failed to launch {program}"))?;

        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&output.stderr));
        debug!(exploit = %self.entry.name, bytes = text.len(), "tool finished");

        if let Some(verdict) = Self::parse_verdict(&text) {
            return Ok(verdict);
        }

        if self.entry.kind == ExploitKind::Dos {
            info!(exploit = %self.entry.name, "no verdict marker, classifying availability");
            return Ok(classify(self.controller.as_ref(), target, &self.dos_limits).await);
        }

        Ok((
            ResultCode::NoneOfFourStates,
            "no verdict marker in tool output".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_verdict_takes_last_marker() {
        let output = "noise\nBLUESWEEP DATA: code=1, data=probe\nBLUESWEEP DATA: code=0, data=entropy 1\n";
        let (code, data) = CommandExploit::parse_verdict(output).unwrap();
        assert_eq!(code, ResultCode::Vulnerable);
        assert_eq!(data, "entropy 1");
    }

    #[test]
    fn test_parse_verdict_rejects_unknown_code() {
        assert!(CommandExploit::parse_verdict("BLUESWEEP DATA: code=9, data=x").is_none());
        assert!(CommandExploit::parse_verdict("no marker here").is_none());
    }
}
