//! CLI command definitions for bluesweep.

use clap::Subcommand;

#[derive(Subcommand)]
pub enum Commands {
    /// Run the full exploit sweep against a target
    Run {
        /// Target MAC address
        target: String,

        /// Run only these exploits (exclude list is ignored when set)
        #[arg(long, short = 'i', value_delimiter = ',')]
        include: Vec<String>,

        /// Skip these exploits
        #[arg(long, short = 'e', value_delimiter = ',')]
        exclude: Vec<String>,

        /// Restrict to exploits needing one of these hardware profiles
        #[arg(long, value_delimiter = ',')]
        hardware: Vec<String>,

        /// Extra parameters forwarded verbatim to every exploit tool
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        parameters: Vec<String>,
    },

    /// Resume an interrupted run from its checkpoint
    Resume {
        /// Target MAC address
        target: String,
    },

    /// List the exploit catalog with hardware availability
    ListExploits,

    /// Check which hardware profiles are available on this box
    CheckSetup,

    /// Check connectivity and availability of the target
    CheckTarget {
        /// Target MAC address
        target: String,
    },

    /// Run reconnaissance against the target and cache the record
    Recon {
        /// Target MAC address
        target: String,
    },

    /// Render the report for a target
    Report {
        /// Target MAC address
        target: String,

        /// Write the machine-readable JSON report instead of the table
        #[arg(long)]
        json: bool,
    },
}
