//! Machine profile shape (§4.8/§6).
//!
//! The teacher's workspace has no equivalent config-loading layer at all
//! (its NES cartridge header is parsed straight into `Rom`, not a
//! deserializable profile struct); this shape and its `serde` derive are
//! grounded in the broader retrieval pack's convention of deriving
//! `Serialize`/`Deserialize` directly on plain config structs rather than
//! hand-writing a parser (see `other_examples` manifests that depend on
//! `serde` with the `derive` feature for small config shapes). The loader
//! that turns a JSON file on disk into one of these is an out-of-scope
//! collaborator per spec.md §1/§4.8 — only the shape and the documented
//! fallback constructor live here.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CpuType {
    #[serde(rename = "65C02")]
    Mos65C02,
    #[serde(rename = "65816")]
    Wdc65816,
    #[serde(rename = "65832")]
    Hypothetical65832,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CpuProfile {
    #[serde(rename = "type")]
    pub cpu_type: CpuType,
    pub clock_speed: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryProfile {
    pub size: u32,
    #[serde(rename = "type")]
    pub memory_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MachineProfile {
    pub name: String,
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub description: Option<String>,
    pub cpu: CpuProfile,
    pub memory: MemoryProfile,
}

impl MachineProfile {
    /// The documented fallback a loader falls back to when it can't find
    /// or parse a named profile, per spec.md §4.8.
    pub fn default_65c02() -> MachineProfile {
        MachineProfile {
            name: "simple-65c02".to_string(),
            display_name: "Simple 65C02".to_string(),
            description: None,
            cpu: CpuProfile {
                cpu_type: CpuType::Mos65C02,
                clock_speed: 1_000_000,
            },
            memory: MemoryProfile {
                size: 65536,
                memory_type: "ram".to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_profile_matches_documented_fallback() {
        let profile = MachineProfile::default_65c02();
        assert_eq!(profile.name, "simple-65c02");
        assert_eq!(profile.memory.size, 65536);
        assert_eq!(profile.cpu.cpu_type, CpuType::Mos65C02);
    }

    #[test]
    fn cpu_type_serializes_to_documented_strings() {
        let json = serde_json::to_string(&CpuType::Mos65C02).unwrap();
        assert_eq!(json, "\"65C02\"");
    }

    #[test]
    fn profile_serializes_to_the_documented_json_shape() {
        let profile = MachineProfile::default_65c02();
        let json = serde_json::to_value(&profile).unwrap();
        assert_eq!(json["cpu"]["type"], "65C02");
        assert_eq!(json["memory"]["type"], "ram");
        assert!(json["cpu"].get("cpu_type").is_none());
        assert!(json["memory"].get("memory_type").is_none());
    }
}
