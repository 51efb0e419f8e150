//! Report command implementation

use anyhow::Result;

use bluesweep::config::Config;
use bluesweep::domain::TargetAddr;
use bluesweep::exploit::Catalog;
use bluesweep::report;

/// Render the campaign report for a target.
pub fn report_command(config: &Config, target: &str, json: bool) -> Result<()> {
    let target: TargetAddr = target.parse().map_err(anyhow::Error::msg)?;
    let catalog = Catalog::builtin();

    if json {
        let path = report::write_machine_report(&config.output_root, &target, catalog)?;
        println!("Report saved to: {}", path.display());
    } else {
        println!("\nReport for target device:\n");
        println!(
            "{}",
            report::render_table(&config.output_root, &target, catalog)
        );
    }
    Ok(())
}
