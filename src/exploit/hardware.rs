//! Hardware profiles and setup verification.

use std::collections::HashMap;

use crate::device::HciController;

/// What a profile needs before its exploits can run.
#[derive(Debug, Clone)]
enum Requirement {
    /// An external PoC binary reachable on `$PATH`
    Binary(&'static str),
    /// A local HCI adapter
    Adapter,
}

/// Named capability descriptor with a verifiable availability predicate.
#[derive(Debug, Clone)]
pub struct HardwareProfile {
    pub name: &'static str,
    requirement: Requirement,
}

impl HardwareProfile {
    /// All hardware profiles the catalog can reference.
    pub fn all() -> Vec<HardwareProfile> {
        vec![
            HardwareProfile {
                name: "hci",
                requirement: Requirement::Adapter,
            },
            HardwareProfile {
                name: "esp32",
                requirement: Requirement::Binary("braktooth"),
            },
            HardwareProfile {
                name: "nexus5",
                requirement: Requirement::Binary("internalblue-knob"),
            },
        ]
    }

    /// Check the profile's requirement right now. Availability is verified
    /// per run and never cached across runs.
    pub fn is_available(&self, hci_device: &str) -> bool {
        match &self.requirement {
            Requirement::Adapter => HciController::adapter_present(hci_device),
            Requirement::Binary(binary) => binary_on_path(binary),
        }
    }
}

fn binary_on_path(binary: &str) -> bool {
    std::process::Command::new("which")
        .arg(binary)
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// Availability of every known profile, keyed by name.
pub fn verify_hardware(hci_device: &str) -> HashMap<String, bool> {
    HardwareProfile::all()
        .iter()
        .map(|p| (p.name.to_string(), p.is_available(hci_device)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_catalog_hardware_has_a_profile() {
        let profiles: Vec<_> = HardwareProfile::all()
            .iter()
            .map(|p| p.name.to_string())
            .collect();
        for entry in crate::exploit::Catalog::builtin().entries() {
            assert!(
                profiles.contains(&entry.hardware),
                "catalog entry {} references unknown hardware {}",
                entry.name,
                entry.hardware
            );
        }
    }

    #[test]
    fn test_verify_covers_all_profiles() {
        let verified = verify_hardware("hci0");
        assert_eq!(verified.len(), HardwareProfile::all().len());
    }
}
