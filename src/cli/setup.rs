//! Check-setup command implementation

use anyhow::Result;

use bluesweep::config::Config;
use bluesweep::exploit::HardwareProfile;

/// Report which hardware profiles are usable on this box.
pub fn setup_command(config: &Config) -> Result<()> {
    println!("Hardware availability:");
    for profile in HardwareProfile::all() {
        let status = if profile.is_available(&config.hci_device) {
            "available"
        } else {
            "missing"
        };
        println!("{} - status - {}", profile.name, status);
    }
    Ok(())
}
