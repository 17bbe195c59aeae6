//! Summary risk indicators derived from a validated Fragility document.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use super::schema::FragilityDocument;

/// Window inside which a breakpoint's `lastTested` counts as covered.
const TEST_COVERAGE_WINDOW_DAYS: i64 = 30;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Indicators {
    /// Breakpoints whose detection or mitigation admits "unknown".
    pub known_unknowns_count: usize,
    /// Fraction of breakpoints tested within the coverage window, in [0, 1].
    pub test_coverage: f64,
    /// Passthrough of `metrics.restoreTimeGuess` (hours).
    pub identity_recovery_time: Option<f64>,
    /// Passthrough of `metrics.integrityIncidents30d`.
    pub integrity_incident_rate: Option<f64>,
}

pub fn compute_indicators(doc: &FragilityDocument, now: DateTime<Utc>) -> Indicators {
    let known_unknowns_count = doc
        .breakpoints
        .iter()
        .filter(|bp| {
            bp.detection.to_lowercase().contains("unknown")
                || bp.mitigation.to_lowercase().contains("unknown")
        })
        .count();

    let window = Duration::days(TEST_COVERAGE_WINDOW_DAYS);
    let tested = doc
        .breakpoints
        .iter()
        .filter(|bp| {
            bp.last_tested
                .as_deref()
                .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
                .is_some_and(|ts| now.signed_duration_since(ts.with_timezone(&Utc)) <= window)
        })
        .count();
    let test_coverage = if doc.breakpoints.is_empty() {
        0.0
    } else {
        tested as f64 / doc.breakpoints.len() as f64
    };

    let metrics = doc.metrics.as_ref();
    Indicators {
        known_unknowns_count,
        test_coverage,
        identity_recovery_time: metrics.and_then(|m| m.restore_time_guess),
        integrity_incident_rate: metrics.and_then(|m| m.integrity_incidents_30d),
    }
}
