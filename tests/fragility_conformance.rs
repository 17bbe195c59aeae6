//! End-to-end conformance checks for the Fragility protocol: lifecycle
//! from template through sealing, formatting independence, and the derived
//! indicator/card surfaces.

use chrono::{Duration, Utc};
use imagony::core::report::IssueKind;
use imagony::fragility::{
    CardOptions, Environment, FragilityDocument, build_card, canonical_json, compute_indicators,
    create_template, update_checksum, validate_fragility,
};
use serde_json::{Value, json};
use std::fs;

fn environment() -> Environment {
    Environment {
        runtime: "weave".to_string(),
        model: "m1".to_string(),
        provider: "p".to_string(),
        region: "eu".to_string(),
    }
}

fn sample() -> Value {
    json!({
        "protocol": "imagony/fragility",
        "version": "0.1",
        "agent": "zoe",
        "created": "2026-01-10T12:00:00Z",
        "soulHash": "sha256:0000000000000000000000000000000000000000000000000000000000000000",
        "environment": {"runtime": "weave", "model": "m1", "provider": "p", "region": "eu"},
        "dependencies": [
            {"name": "kv", "type": "storage", "criticality": "high", "failMode": "stop"}
        ],
        "breakpoints": [
            {"id": "bp-credits", "class": "existence", "trigger": "credits exhaustion",
             "impact": "stop", "detection": "balance probe", "mitigation": "top-up runbook",
             "controlId": "c1"},
            {"id": "bp-lockout", "class": "existence", "trigger": "provider lockout",
             "impact": "stop", "detection": "auth errors", "mitigation": "failover",
             "controlId": "c1"},
            {"id": "bp-wipe", "class": "identity", "trigger": "memory wipe",
             "impact": "drift", "detection": "journal diff", "mitigation": "archive restore",
             "controlId": "c1"},
            {"id": "bp-tool", "class": "integrity", "trigger": "tool compromise",
             "impact": "corrupt", "detection": "unknown", "mitigation": "sandbox rebuild",
             "planned": true},
            {"id": "bp-policy", "class": "integrity", "trigger": "policy refusal",
             "impact": "degrade", "detection": "refusal rate", "mitigation": "escalate",
             "controlId": "c1"},
            {"id": "bp-net", "class": "existence", "trigger": "network loss",
             "impact": "degrade", "detection": "heartbeat gap", "mitigation": "offline queue",
             "controlId": "c1"}
        ],
        "controls": [{"controlId": "c1", "description": "operational runbook"}],
        "metrics": {"restoreTimeGuess": 12.0}
    })
}

#[test]
fn template_seals_into_a_clean_document() {
    let draft = create_template("zoe", "sha256:REPLACE_WITH_SOUL_HASH", environment());
    let value = serde_json::to_value(&draft).unwrap();
    let sealed = update_checksum(&value).unwrap();
    let doc: Value = serde_json::from_str(&sealed).unwrap();

    let outcome = validate_fragility(&doc);
    assert!(outcome.report.errors.is_empty(), "{:?}", outcome.report.errors);
    assert!(
        !outcome
            .report
            .warnings
            .iter()
            .any(|w| w.message.contains("unsealed"))
    );
}

#[test]
fn formatting_never_changes_the_hash() {
    let doc = sample();
    let pretty: Value = serde_json::from_str(&serde_json::to_string_pretty(&doc).unwrap()).unwrap();
    let compact: Value = serde_json::from_str(&canonical_json(&doc)).unwrap();

    let a = validate_fragility(&doc).hash_hex;
    let b = validate_fragility(&pretty).hash_hex;
    let c = validate_fragility(&compact).hash_hex;
    assert!(a.is_some());
    assert_eq!(a, b);
    assert_eq!(a, c);
}

#[test]
fn sealed_document_detects_any_edit() {
    let sealed = update_checksum(&sample()).unwrap();
    let mut doc: Value = serde_json::from_str(&sealed).unwrap();
    doc["metrics"]["restoreTimeGuess"] = json!(1.0);
    let outcome = validate_fragility(&doc);
    assert!(
        outcome
            .report
            .errors
            .iter()
            .any(|e| e.kind == IssueKind::Integrity)
    );
    assert!(outcome.hash_hex.is_none());
}

#[test]
fn removing_a_category_names_it_in_the_error() {
    let mut doc = sample();
    doc["breakpoints"]
        .as_array_mut()
        .unwrap()
        .retain(|bp| bp["id"] != "bp-net");
    let outcome = validate_fragility(&doc);
    assert!(
        outcome
            .report
            .errors
            .iter()
            .any(|e| e.message.contains("\"network loss\""))
    );
}

#[test]
fn indicators_feed_the_card_badges() {
    let mut doc = sample();
    let recent = (Utc::now() - Duration::days(3)).to_rfc3339();
    for bp in doc["breakpoints"].as_array_mut().unwrap().iter_mut() {
        bp["lastTested"] = json!(recent);
    }
    let typed: FragilityDocument = serde_json::from_value(doc).unwrap();
    let indicators = compute_indicators(&typed, Utc::now());
    assert_eq!(indicators.test_coverage, 1.0);
    assert_eq!(indicators.known_unknowns_count, 1); // bp-tool detection
    assert_eq!(indicators.identity_recovery_time, Some(12.0));

    let card = build_card(&typed, &indicators, CardOptions::default());
    assert!(card.badges.tested);
    assert!(card.badges.recoverable);
    assert_eq!(card.worst_identity_scenario, "memory wipe → drift");
    assert_eq!(card.top_breakpoints.len(), 3);
}

#[test]
fn stale_tests_drop_coverage() {
    let mut doc = sample();
    let stale = (Utc::now() - Duration::days(90)).to_rfc3339();
    doc["breakpoints"][0]["lastTested"] = json!(stale);
    let typed: FragilityDocument = serde_json::from_value(doc).unwrap();
    let indicators = compute_indicators(&typed, Utc::now());
    assert_eq!(indicators.test_coverage, 0.0);
}

#[test]
fn sealed_file_survives_a_disk_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("zoe.fragility.json");
    fs::write(&path, update_checksum(&sample()).unwrap()).unwrap();

    let doc: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    let outcome = validate_fragility(&doc);
    assert!(outcome.report.errors.is_empty(), "{:?}", outcome.report.errors);

    // Sealing what is already sealed changes nothing.
    assert_eq!(update_checksum(&doc).unwrap(), fs::read_to_string(&path).unwrap());
}
