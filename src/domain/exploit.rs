use serde::{Deserialize, Serialize};

/// A catalog entry describing one known exploit.
///
/// Entries are created once at catalog load and never mutated; `name` is the
/// unique identity used everywhere else (done lists, checkpoints, include and
/// exclude selections, result files).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Exploit {
    /// Unique key, e.g. `"knob"`
    pub name: String,

    /// Category tag used for display grouping
    pub kind: ExploitKind,

    /// Name of the hardware profile this exploit requires
    pub hardware: String,

    /// Lowest Bluetooth version the exploit applies to (inclusive)
    pub bt_version_min: f32,

    /// Highest Bluetooth version the exploit applies to (inclusive)
    pub bt_version_max: f32,

    /// Whether the exploit is safe to run unattended in a full sweep
    pub mass_testing: bool,

    /// External tool argv template; `{target}` is replaced with the MAC
    pub command: Vec<String>,
}

/// Exploit category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExploitKind {
    /// Crashes or wedges the target stack
    Dos,
    /// Bypasses or downgrades authentication
    AuthBypass,
    /// Tampers with key negotiation (entropy, cross-transport)
    KeyNegotiation,
    /// Impersonates a previously bonded peer
    Spoofing,
    /// Leaks data without pairing
    InfoLeak,
}

impl ExploitKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExploitKind::Dos => "dos",
            ExploitKind::AuthBypass => "auth-bypass",
            ExploitKind::KeyNegotiation => "key-negotiation",
            ExploitKind::Spoofing => "spoofing",
            ExploitKind::InfoLeak => "info-leak",
        }
    }
}

impl std::fmt::Display for ExploitKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Verdict produced by running one exploit.
///
/// Serialized as the bare integer code so result files and machine reports
/// stay stable across renames. Code 6 ("not tested") exists only inside the
/// machine report and is not a member here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum ResultCode {
    Vulnerable,
    NotVulnerable,
    Error,
    Undefined,
    NoneOfFourStates,
}

impl ResultCode {
    pub fn code(&self) -> u8 {
        match self {
            ResultCode::Vulnerable => 0,
            ResultCode::NotVulnerable => 1,
            ResultCode::Error => 2,
            ResultCode::Undefined => 3,
            ResultCode::NoneOfFourStates => 4,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ResultCode::Vulnerable => "Vulnerable",
            ResultCode::NotVulnerable => "Not vulnerable",
            ResultCode::Error => "Error",
            ResultCode::Undefined => "Undefined",
            ResultCode::NoneOfFourStates => "Toolkit error",
        }
    }
}

impl From<ResultCode> for u8 {
    fn from(code: ResultCode) -> u8 {
        code.code()
    }
}

impl TryFrom<u8> for ResultCode {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, String> {
        match value {
            0 => Ok(ResultCode::Vulnerable),
            1 => Ok(ResultCode::NotVulnerable),
            2 => Ok(ResultCode::Error),
            3 => Ok(ResultCode::Undefined),
            4 => Ok(ResultCode::NoneOfFourStates),
            other => Err(format!("unknown result code {other}")),
        }
    }
}

impl std::fmt::Display for ResultCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of one completed exploit, appended to the done list as soon as the
/// exploit finishes and persisted immediately so partial progress survives a
/// crash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Catalog name of the exploit that ran
    pub exploit: String,

    /// Verdict code
    pub code: ResultCode,

    /// Free-form data reported by the exploit (tool output, error text,
    /// observation counts)
    pub data: String,
}

impl ExecutionResult {
    pub fn new(exploit: impl Into<String>, code: ResultCode, data: impl Into<String>) -> Self {
        Self {
            exploit: exploit.into(),
            code,
            data: data.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_code_roundtrip() {
        for code in [
            ResultCode::Vulnerable,
            ResultCode::NotVulnerable,
            ResultCode::Error,
            ResultCode::Undefined,
            ResultCode::NoneOfFourStates,
        ] {
            let json = serde_json::to_string(&code).unwrap();
            let back: ResultCode = serde_json::from_str(&json).unwrap();
            assert_eq!(code, back);
        }
    }

    #[test]
    fn test_result_code_serializes_as_integer() {
        assert_eq!(serde_json::to_string(&ResultCode::Vulnerable).unwrap(), "0");
        assert_eq!(
            serde_json::to_string(&ResultCode::NoneOfFourStates).unwrap(),
            "4"
        );
    }

    #[test]
    fn test_unknown_code_rejected() {
        assert!(serde_json::from_str::<ResultCode>("7").is_err());
    }
}
