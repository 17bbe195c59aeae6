//! Typed model of the Fragility document.
//!
//! Deserialize these from JSON that already passed
//! [`crate::fragility::validate_fragility`]; the validator works over raw
//! JSON values so that shape problems accumulate instead of aborting.

use serde::{Deserialize, Serialize};

pub const FRAGILITY_PROTOCOL: &str = "imagony/fragility";
pub const FRAGILITY_VERSION: &str = "0.1";

/// Trigger categories every Fragility document must cover with at least
/// one breakpoint (substring match over id + trigger).
pub const REQUIRED_TRIGGER_CATEGORIES: [&str; 6] = [
    "credits exhaustion",
    "provider lockout",
    "memory wipe",
    "tool compromise",
    "policy refusal",
    "network loss",
];

pub const BREAKPOINT_CLASSES: [&str; 3] = ["existence", "identity", "integrity"];
pub const BREAKPOINT_IMPACTS: [&str; 4] = ["stop", "degrade", "drift", "corrupt"];

pub const MAX_NOTES_CHARS: usize = 240;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FragilityDocument {
    pub protocol: String,
    pub version: String,
    pub agent: String,
    pub created: String,
    pub soul_hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
    pub environment: Environment,
    #[serde(default)]
    pub dependencies: Vec<Dependency>,
    #[serde(default)]
    pub breakpoints: Vec<Breakpoint>,
    #[serde(default)]
    pub controls: Vec<Control>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<Metrics>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Environment {
    pub runtime: String,
    pub model: String,
    pub provider: String,
    pub region: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dependency {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub criticality: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fail_mode: Option<String>,
}

/// A named failure scenario: what triggers it, how it lands, how it is
/// detected and mitigated.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Breakpoint {
    pub id: String,
    pub class: String,
    pub trigger: String,
    pub impact: String,
    pub detection: String,
    pub mitigation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub control_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub planned: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_tested: Option<String>,
}

impl Breakpoint {
    /// Search text for required-trigger coverage.
    pub fn coverage_haystack(&self) -> String {
        format!("{} {}", self.id, self.trigger).to_lowercase()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Control {
    pub control_id: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mtbf_guess: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restore_time_guess: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity_loss_risk: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub integrity_risk: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub integrity_incidents_30d: Option<f64>,
}
