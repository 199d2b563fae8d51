//! Process address classification.
//!
//! Simulated clusters encode the machine class and datacenter into the
//! process address itself:
//!
//! - `[abcd::C:D:x:y]:port` (IPv6 simulation addresses)
//! - `C.D.x.y:port` (IPv4 simulation addresses)
//!
//! where `C` is the class code (2 = main cluster member, 3 = tester) and
//! `D` is the datacenter id.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

static BRACKETED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[abcd::(\d+):(\d+):").expect("static address pattern"));

static DOTTED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)\.(\d+)\.").expect("static address pattern"));

/// What kind of process an address belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MachineClass {
    /// A member of the database cluster.
    Main,
    /// A test-harness process.
    Tester,
    Unknown,
}

impl MachineClass {
    fn from_code(code: &str) -> Self {
        match code {
            "2" => MachineClass::Main,
            "3" => MachineClass::Tester,
            _ => MachineClass::Unknown,
        }
    }

    /// Returns the display label for this class.
    pub fn label(&self) -> &'static str {
        match self {
            MachineClass::Main => "main",
            MachineClass::Tester => "tester",
            MachineClass::Unknown => "unknown",
        }
    }
}

impl fmt::Display for MachineClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Result of classifying an address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddressInfo {
    pub class: MachineClass,
    /// Datacenter id, or `None` when the address could not be parsed.
    pub dc_id: Option<String>,
}

impl AddressInfo {
    fn unknown() -> Self {
        Self {
            class: MachineClass::Unknown,
            dc_id: None,
        }
    }
}

/// Classify a process address into (class, datacenter id).
///
/// Never fails: anything that matches neither grammar is reported as
/// unknown class with no datacenter.
pub fn classify(address: &str) -> AddressInfo {
    let captures = BRACKETED
        .captures(address)
        .or_else(|| DOTTED.captures(address));

    match captures {
        Some(caps) => AddressInfo {
            class: MachineClass::from_code(&caps[1]),
            dc_id: Some(caps[2].to_string()),
        },
        None => AddressInfo::unknown(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bracketed_main_address() {
        let info = classify("[abcd::2:1:1:0]:1");
        assert_eq!(info.class, MachineClass::Main);
        assert_eq!(info.dc_id.as_deref(), Some("1"));
    }

    #[test]
    fn test_bracketed_tester_address() {
        let info = classify("[abcd::3:0:2:5]:4500");
        assert_eq!(info.class, MachineClass::Tester);
        assert_eq!(info.dc_id.as_deref(), Some("0"));
    }

    #[test]
    fn test_dotted_tester_address() {
        let info = classify("3.0.1.3:1");
        assert_eq!(info.class, MachineClass::Tester);
        assert_eq!(info.dc_id.as_deref(), Some("0"));
    }

    #[test]
    fn test_dotted_main_address_with_multi_digit_dc() {
        let info = classify("2.12.0.1:4500:tls");
        assert_eq!(info.class, MachineClass::Main);
        assert_eq!(info.dc_id.as_deref(), Some("12"));
    }

    #[test]
    fn test_unknown_class_code_keeps_dc() {
        let info = classify("1.4.0.1:1");
        assert_eq!(info.class, MachineClass::Unknown);
        assert_eq!(info.dc_id.as_deref(), Some("4"));
    }

    #[test]
    fn test_malformed_addresses_are_unknown() {
        for addr in ["garbage", "", "[::1]:4500", "a.b.c.d:1", "2:1:1"] {
            assert_eq!(classify(addr), AddressInfo::unknown(), "address {:?}", addr);
        }
    }

    #[test]
    fn test_labels() {
        assert_eq!(MachineClass::Main.to_string(), "main");
        assert_eq!(MachineClass::Tester.label(), "tester");
        assert_eq!(MachineClass::Unknown.label(), "unknown");
    }
}
