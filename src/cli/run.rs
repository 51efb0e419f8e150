//! Run and resume command implementations

use anyhow::{Context, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

use bluesweep::checkpoint;
use bluesweep::config::Config;
use bluesweep::device::{BtController, HciController};
use bluesweep::domain::{Session, TargetAddr};
use bluesweep::engine::{Engine, RunOutcome, StdinDecision};
use bluesweep::exploit::{Catalog, apply_filter, verify_hardware};
use bluesweep::recon::{self, ReconRecord};
use bluesweep::storage;

/// Start a fresh campaign against a target.
pub async fn run_command(
    config: &Config,
    target: &str,
    include: Vec<String>,
    exclude: Vec<String>,
    hardware: Vec<String>,
    parameters: Vec<String>,
) -> Result<()> {
    let target: TargetAddr = target.parse().map_err(anyhow::Error::msg)?;
    let controller: Arc<dyn BtController> = Arc::new(HciController::new(&config.hci_device));
    let catalog = Catalog::builtin();

    // --hardware narrows the catalog up front and overrides the name
    // selections, mirroring the precedence of the flags.
    let include = if !hardware.is_empty() {
        catalog
            .entries()
            .iter()
            .filter(|e| hardware.contains(&e.hardware))
            .map(|e| e.name.clone())
            .collect()
    } else {
        include
    };

    let Some(recon) = resolve_recon(config, controller.as_ref(), &target).await? else {
        println!(
            "Recon failed to get device information. Please ensure the device is available and try again."
        );
        return Ok(());
    };

    let hardware_ok = verify_hardware(&config.hci_device);
    let pool = apply_filter(
        catalog.entries().to_vec(),
        &include,
        &exclude,
        recon.version,
        &hardware_ok,
    );

    println!(
        "There are {} out of {} exploits available.\n",
        pool.len(),
        catalog.len()
    );
    print_pool(&pool.iter().map(|e| e.name.clone()).collect::<Vec<_>>());

    let mut session = Session::new(target, parameters, pool);
    session.include = include;
    session.exclude = exclude;

    launch(config, controller, session).await
}

/// Resume an interrupted campaign from its checkpoint.
pub async fn resume_command(config: &Config, target: &str) -> Result<()> {
    let target: TargetAddr = target.parse().map_err(anyhow::Error::msg)?;
    if !checkpoint::exists(&config.output_root, &target) {
        anyhow::bail!("no checkpoint found for {target}");
    }

    let controller: Arc<dyn BtController> = Arc::new(HciController::new(&config.hci_device));
    let catalog = Catalog::builtin();
    let state = checkpoint::load(&config.output_root, &target)
        .context("checkpoint unreadable, re-run from scratch")?;

    let Some(recon) = resolve_recon(config, controller.as_ref(), &target).await? else {
        println!(
            "Recon failed to get device information. Please ensure the device is available and try again."
        );
        return Ok(());
    };

    let hardware_ok = verify_hardware(&config.hci_device);
    let pool = checkpoint::resume_pool(catalog, &state, recon.version, &hardware_ok);

    println!(
        "There are {} / {} exploits left. {} have already been tested.\n",
        pool.len() + state.done.len(),
        catalog.len(),
        state.done.len()
    );
    print_pool(&pool.iter().map(|e| e.name.clone()).collect::<Vec<_>>());

    let mut session = Session::new(target, state.parameters, pool);
    session.done = state.done;
    session.include = state.include;
    session.exclude = state.exclude;

    launch(config, controller, session).await
}

/// Resolve the recon record, acquiring a fresh one on a cache miss.
///
/// `None` means recon is unobtainable: the caller reports zero eligible
/// exploits instead of failing hard.
async fn resolve_recon(
    config: &Config,
    controller: &dyn BtController,
    target: &TargetAddr,
) -> Result<Option<ReconRecord>> {
    if let Some(record) = recon::load(&config.output_root, target)? {
        println!(
            "Recon data found - {}",
            storage::recon_path(&config.output_root, target).display()
        );
        return Ok(Some(record));
    }

    println!("Recon data not found. Running recon...");
    match recon::acquire(
        controller,
        target,
        &config.output_root,
        config.scan_timeout(),
        config.recon_timeout(),
    )
    .await
    {
        Ok(record) => Ok(Some(record)),
        Err(e) => {
            warn!("recon acquisition failed: {e:#}");
            Ok(None)
        }
    }
}

fn print_pool(names: &[String]) {
    println!("Running the following exploits: {names:?}");
}

/// Drive the engine, with Ctrl-C wired to checkpoint-and-exit.
async fn launch(config: &Config, controller: Arc<dyn BtController>, session: Session) -> Result<()> {
    let session = Arc::new(Mutex::new(session));
    let cancel = Arc::new(AtomicBool::new(false));

    // The signal task writes its own checkpoint because the engine only
    // reaches its safe point between exploits; an interrupt landing
    // mid-exploit must still preserve everything completed so far.
    {
        let session = Arc::clone(&session);
        let cancel = Arc::clone(&cancel);
        let output_root = config.output_root.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("Ctrl+C detected. Creating a checkpoint and exiting");
                cancel.store(true, Ordering::SeqCst);
                let snapshot = session.lock().unwrap().clone();
                checkpoint::save_or_warn(&output_root, &snapshot);
                std::process::exit(130);
            }
        });
    }

    let engine = Engine::new(controller, Arc::new(StdinDecision), config.clone());
    match engine.run(&session, &cancel).await? {
        RunOutcome::Completed => {
            let done = session.lock().unwrap().done.len();
            info!("campaign finished");
            println!("\nCampaign complete: {done} exploits tested.");
            let target = session.lock().unwrap().target.clone();
            println!("Generate a report with: bluesweep report {target}");
        }
        RunOutcome::Aborted => {
            println!("\nRun aborted by operator. Checkpoint saved; resume with `bluesweep resume`.");
        }
        RunOutcome::Interrupted => {
            println!("\nRun interrupted. Checkpoint saved; resume with `bluesweep resume`.");
        }
    }

    Ok(())
}
