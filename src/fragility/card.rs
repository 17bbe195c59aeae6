//! Compact card view over a validated Fragility document.

use serde::Serialize;

use super::indicators::Indicators;
use super::schema::{Breakpoint, FragilityDocument};

const TOP_BREAKPOINTS: usize = 3;
const TESTED_BADGE_THRESHOLD: f64 = 0.5;
const RECOVERABLE_HOURS: f64 = 48.0;

/// Caller-supplied attestations that cannot be derived from the document.
#[derive(Debug, Clone, Copy)]
pub struct CardOptions {
    pub audited: bool,
    pub witnessed: bool,
}

impl Default for CardOptions {
    fn default() -> Self {
        Self {
            audited: true,
            witnessed: false,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardBreakpoint {
    pub id: String,
    pub trigger: String,
    pub impact: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Badges {
    pub audited: bool,
    pub tested: bool,
    pub recoverable: bool,
    pub witnessed: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub agent: String,
    pub top_breakpoints: Vec<CardBreakpoint>,
    pub worst_identity_scenario: String,
    pub mitigation_commitment: String,
    pub badges: Badges,
}

fn scenario(bp: &Breakpoint) -> String {
    format!("{} → {}", bp.trigger, bp.impact)
}

pub fn build_card(doc: &FragilityDocument, indicators: &Indicators, opts: CardOptions) -> Card {
    let top_breakpoints = doc
        .breakpoints
        .iter()
        .take(TOP_BREAKPOINTS)
        .map(|bp| CardBreakpoint {
            id: bp.id.clone(),
            trigger: bp.trigger.clone(),
            impact: bp.impact.clone(),
        })
        .collect();

    let worst_identity_scenario = doc
        .breakpoints
        .iter()
        .find(|bp| bp.class == "identity")
        .or_else(|| doc.breakpoints.first())
        .map(scenario)
        .unwrap_or_else(|| "unknown → unknown".to_string());

    let with_mitigation: Vec<&Breakpoint> = doc
        .breakpoints
        .iter()
        .filter(|bp| !bp.mitigation.is_empty())
        .collect();
    let mitigation_commitment = with_mitigation
        .iter()
        .find(|bp| bp.planned == Some(true))
        .or_else(|| with_mitigation.first())
        .map(|bp| bp.mitigation.clone())
        .unwrap_or_else(|| "No mitigation recorded".to_string());

    let recoverable = indicators
        .identity_recovery_time
        .is_some_and(|hours| hours <= RECOVERABLE_HOURS);

    Card {
        agent: doc.agent.clone(),
        top_breakpoints,
        worst_identity_scenario,
        mitigation_commitment,
        badges: Badges {
            audited: opts.audited,
            tested: indicators.test_coverage >= TESTED_BADGE_THRESHOLD,
            recoverable,
            witnessed: opts.witnessed,
        },
    }
}
