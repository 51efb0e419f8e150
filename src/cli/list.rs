//! List-exploits command implementation

use anyhow::Result;
use comfy_table::{Cell, Table};

use bluesweep::config::Config;
use bluesweep::domain::Exploit;
use bluesweep::exploit::{Catalog, verify_hardware};

/// Print the catalog with per-exploit hardware availability.
///
/// Display order is hardware availability first, then hardware, then kind —
/// a presentation choice, unrelated to execution order.
pub fn list_command(config: &Config) -> Result<()> {
    let hardware_ok = verify_hardware(&config.hci_device);

    let mut entries: Vec<&Exploit> = Catalog::builtin().entries().iter().collect();
    entries.sort_by_key(|e| e.kind.as_str());
    entries.sort_by_key(|e| e.hardware.clone());
    entries.sort_by_key(|e| !hardware_ok.get(&e.hardware).copied().unwrap_or(false));

    let mut table = Table::new();
    table.set_header(vec![
        "Index", "Exploit", "Type", "Hardware", "Available", "BT min", "BT max",
    ]);

    for (index, entry) in entries.iter().enumerate() {
        let available = hardware_ok.get(&entry.hardware).copied().unwrap_or(false);
        let symbol = if available { "✅" } else { "❌" };
        table.add_row(vec![
            Cell::new(index + 1),
            Cell::new(&entry.name),
            Cell::new(entry.kind),
            Cell::new(&entry.hardware),
            Cell::new(symbol),
            Cell::new(entry.bt_version_min),
            Cell::new(entry.bt_version_max),
        ]);
    }

    println!("{table}");
    Ok(())
}
