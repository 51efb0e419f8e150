//! Static exploit catalog.

use anyhow::{Context, Result, bail};
use once_cell::sync::Lazy;
use serde::Deserialize;
use std::collections::HashSet;

use crate::domain::Exploit;

/// The built-in catalog, embedded at compile time.
const CATALOG_TOML: &str = include_str!("../../assets/catalog.toml");

static BUILTIN: Lazy<Catalog> =
    Lazy::new(|| Catalog::parse(CATALOG_TOML).expect("embedded catalog must parse"));

#[derive(Deserialize)]
struct CatalogFile {
    exploit: Vec<Exploit>,
}

/// Ordered, immutable set of known exploits.
///
/// Catalog order is execution order; the filter never re-sorts. Display
/// ordering is a presentation concern handled by the CLI.
pub struct Catalog {
    entries: Vec<Exploit>,
}

impl Catalog {
    /// The embedded built-in catalog.
    pub fn builtin() -> &'static Catalog {
        &BUILTIN
    }

    /// Parse a catalog from TOML, rejecting duplicate names.
    pub fn parse(text: &str) -> Result<Self> {
        let file: CatalogFile = toml::from_str(text).context("Failed to parse exploit catalog")?;

        let mut seen = HashSet::new();
        for entry in &file.exploit {
            if !seen.insert(entry.name.as_str()) {
                bail!("duplicate exploit name in catalog: {}", entry.name);
            }
            if entry.bt_version_min > entry.bt_version_max {
                bail!(
                    "exploit {} has an empty version range ({} > {})",
                    entry.name,
                    entry.bt_version_min,
                    entry.bt_version_max
                );
            }
        }

        Ok(Self {
            entries: file.exploit,
        })
    }

    pub fn entries(&self) -> &[Exploit] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Exploit> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Catalog entries minus an already-tested set, in catalog order.
    pub fn minus(&self, done: &[String]) -> Vec<Exploit> {
        self.entries
            .iter()
            .filter(|e| !done.iter().any(|d| d == &e.name))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog_parses() {
        let catalog = Catalog::builtin();
        assert!(!catalog.is_empty());
        assert!(catalog.get("knob").is_some());
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let text = r#"
[[exploit]]
name = "a"
kind = "dos"
hardware = "hci"
bt_version_min = 1.0
bt_version_max = 2.0
mass_testing = true
command = ["a"]

[[exploit]]
name = "a"
kind = "dos"
hardware = "hci"
bt_version_min = 1.0
bt_version_max = 2.0
mass_testing = true
command = ["a"]
"#;
        assert!(Catalog::parse(text).is_err());
    }

    #[test]
    fn test_minus_preserves_order() {
        let catalog = Catalog::builtin();
        let first = catalog.entries()[0].name.clone();
        let remaining = catalog.minus(&[first.clone()]);
        assert_eq!(remaining.len(), catalog.len() - 1);
        assert!(remaining.iter().all(|e| e.name != first));
        // Order of the survivors matches the catalog.
        let names: Vec<_> = remaining.iter().map(|e| e.name.as_str()).collect();
        let expected: Vec<_> = catalog
            .entries()
            .iter()
            .map(|e| e.name.as_str())
            .filter(|n| *n != first)
            .collect();
        assert_eq!(names, expected);
    }
}
