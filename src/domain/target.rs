use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Hardware address of the device under test.
///
/// Stored lowercase so paths, checkpoint keys and tool arguments are
/// deterministic regardless of how the operator typed the address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetAddr(String);

impl TargetAddr {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for TargetAddr {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        let octets: Vec<&str> = normalized.split(':').collect();
        let valid = octets.len() == 6
            && octets
                .iter()
                .all(|o| o.len() == 2 && o.chars().all(|c| c.is_ascii_hexdigit()));
        if !valid {
            return Err(format!("`{s}` is not a MAC address (aa:bb:cc:dd:ee:ff)"));
        }
        Ok(TargetAddr(normalized))
    }
}

impl std::fmt::Display for TargetAddr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_normalizes_case() {
        let addr: TargetAddr = "AA:BB:CC:DD:EE:FF".parse().unwrap();
        assert_eq!(addr.as_str(), "aa:bb:cc:dd:ee:ff");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("not-a-mac".parse::<TargetAddr>().is_err());
        assert!("aa:bb:cc:dd:ee".parse::<TargetAddr>().is_err());
        assert!("aa:bb:cc:dd:ee:zz".parse::<TargetAddr>().is_err());
    }
}
