//! Schema validation and sealing for Fragility documents.
//!
//! Works over raw JSON values so every shape problem accumulates into the
//! report; typed access ([`crate::fragility::schema`]) is for documents
//! that already validated.

use serde_json::Value;

use super::canonical::{canonical_for_hash, canonical_json};
use super::schema::{
    BREAKPOINT_CLASSES, BREAKPOINT_IMPACTS, FRAGILITY_PROTOCOL, FRAGILITY_VERSION,
    MAX_NOTES_CHARS, REQUIRED_TRIGGER_CATEGORIES,
};
use crate::core::error::AttestError;
use crate::core::hash::{self, PLACEHOLDER_CHECKSUM};
use crate::core::report::{IssueKind, ValidationOutcome, ValidationReport};
use chrono::DateTime;

fn str_field<'a>(obj: &'a Value, key: &str) -> Option<&'a str> {
    obj.get(key).and_then(Value::as_str)
}

fn require_str(
    obj: &Value,
    key: &str,
    context: &str,
    report: &mut ValidationReport,
) -> Option<String> {
    match obj.get(key) {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        Some(Value::String(_)) => {
            report.error(
                IssueKind::Schema,
                format!("{}: {} must not be empty", context, key),
            );
            None
        }
        Some(_) => {
            report.error(
                IssueKind::Schema,
                format!("{}: {} must be a string", context, key),
            );
            None
        }
        None => {
            report.error(
                IssueKind::Schema,
                format!("{}: missing required field: {}", context, key),
            );
            None
        }
    }
}

fn is_utc_timestamp(value: &str) -> bool {
    DateTime::parse_from_rfc3339(value).is_ok_and(|ts| ts.offset().utc_minus_local() == 0)
}

fn check_environment(doc: &Value, report: &mut ValidationReport) {
    match doc.get("environment") {
        Some(env @ Value::Object(_)) => {
            for key in ["runtime", "model", "provider", "region"] {
                require_str(env, key, "environment", report);
            }
        }
        Some(_) => report.error(IssueKind::Schema, "environment must be an object"),
        None => report.error(IssueKind::Schema, "Missing required field: environment"),
    }
}

fn check_dependencies(doc: &Value, report: &mut ValidationReport) {
    let Some(deps) = doc.get("dependencies") else {
        report.error(IssueKind::Schema, "Missing required field: dependencies");
        return;
    };
    let Some(deps) = deps.as_array() else {
        report.error(IssueKind::Schema, "dependencies must be an array");
        return;
    };
    for (i, dep) in deps.iter().enumerate() {
        let context = format!("dependencies[{}]", i);
        if !dep.is_object() {
            report.error(IssueKind::Schema, format!("{} must be an object", context));
            continue;
        }
        let name = require_str(dep, "name", &context, report)
            .unwrap_or_else(|| context.clone());
        require_str(dep, "type", &context, report);
        // Unsealed operational metadata is surfaced, not fatal.
        if dep.get("criticality").is_none() {
            report.warn(
                IssueKind::Schema,
                format!("Dependency \"{}\" is missing criticality", name),
            );
        }
        if dep.get("failMode").is_none() {
            report.warn(
                IssueKind::Schema,
                format!("Dependency \"{}\" is missing failMode", name),
            );
        }
    }
}

fn check_controls(doc: &Value, report: &mut ValidationReport) -> Vec<String> {
    let mut ids = Vec::new();
    let Some(controls) = doc.get("controls") else {
        report.error(IssueKind::Schema, "Missing required field: controls");
        return ids;
    };
    let Some(controls) = controls.as_array() else {
        report.error(IssueKind::Schema, "controls must be an array");
        return ids;
    };
    for (i, control) in controls.iter().enumerate() {
        let context = format!("controls[{}]", i);
        if let Some(id) = require_str(control, "controlId", &context, report) {
            ids.push(id);
        }
        require_str(control, "description", &context, report);
    }
    ids
}

fn check_breakpoints(doc: &Value, control_ids: &[String], report: &mut ValidationReport) {
    let Some(breakpoints) = doc.get("breakpoints") else {
        report.error(IssueKind::Schema, "Missing required field: breakpoints");
        return;
    };
    let Some(breakpoints) = breakpoints.as_array() else {
        report.error(IssueKind::Schema, "breakpoints must be an array");
        return;
    };

    for (i, bp) in breakpoints.iter().enumerate() {
        let context = bp
            .get("id")
            .and_then(Value::as_str)
            .map(|id| format!("breakpoint \"{}\"", id))
            .unwrap_or_else(|| format!("breakpoints[{}]", i));
        require_str(bp, "id", &context, report);
        require_str(bp, "trigger", &context, report);
        require_str(bp, "detection", &context, report);
        let mitigation = require_str(bp, "mitigation", &context, report);

        if let Some(class) = require_str(bp, "class", &context, report) {
            if !BREAKPOINT_CLASSES.contains(&class.as_str()) {
                report.error(
                    IssueKind::Schema,
                    format!(
                        "{}: class must be one of {:?}, got \"{}\"",
                        context, BREAKPOINT_CLASSES, class
                    ),
                );
            }
        }
        if let Some(impact) = require_str(bp, "impact", &context, report) {
            if !BREAKPOINT_IMPACTS.contains(&impact.as_str()) {
                report.error(
                    IssueKind::Schema,
                    format!(
                        "{}: impact must be one of {:?}, got \"{}\"",
                        context, BREAKPOINT_IMPACTS, impact
                    ),
                );
            }
        }

        // A mitigation is only credible when backed by a declared control,
        // unless the breakpoint is explicitly planned work.
        let planned = bp.get("planned").and_then(Value::as_bool).unwrap_or(false);
        if mitigation.is_some() && !planned {
            match str_field(bp, "controlId") {
                Some(control_id) if control_ids.iter().any(|c| c == control_id) => {}
                Some(control_id) => report.error(
                    IssueKind::Schema,
                    format!(
                        "{}: controlId \"{}\" does not match any declared control",
                        context, control_id
                    ),
                ),
                None => report.error(
                    IssueKind::Schema,
                    format!(
                        "{}: mitigation must reference a controlId unless planned=true",
                        context
                    ),
                ),
            }
        }

        if let Some(last_tested) = str_field(bp, "lastTested") {
            if !is_utc_timestamp(last_tested) {
                report.error(
                    IssueKind::Schema,
                    format!(
                        "{}: lastTested must be an ISO-8601 UTC timestamp, got \"{}\"",
                        context, last_tested
                    ),
                );
            }
        }
    }

    // Required trigger checklist: each category must be covered somewhere.
    for category in REQUIRED_TRIGGER_CATEGORIES {
        let covered = breakpoints.iter().any(|bp| {
            let id = str_field(bp, "id").unwrap_or("");
            let trigger = str_field(bp, "trigger").unwrap_or("");
            format!("{} {}", id, trigger).to_lowercase().contains(category)
        });
        if !covered {
            report.error(
                IssueKind::Schema,
                format!(
                    "Missing breakpoint coverage for required trigger category: \"{}\"",
                    category
                ),
            );
        }
    }
}

fn check_metrics(doc: &Value, report: &mut ValidationReport) {
    let Some(metrics) = doc.get("metrics") else {
        return;
    };
    let Some(metrics) = metrics.as_object() else {
        report.error(IssueKind::Schema, "metrics must be an object");
        return;
    };
    for (key, value) in metrics {
        if !value.is_number() {
            report.error(
                IssueKind::Schema,
                format!("metrics.{} must be a number", key),
            );
        }
    }
}

fn check_top_level(doc: &Value, report: &mut ValidationReport) {
    match str_field(doc, "protocol") {
        Some(FRAGILITY_PROTOCOL) => {}
        Some(other) => report.error(
            IssueKind::Schema,
            format!("protocol must be \"{}\", got \"{}\"", FRAGILITY_PROTOCOL, other),
        ),
        None => report.error(IssueKind::Schema, "Missing required field: protocol"),
    }
    match str_field(doc, "version") {
        Some(FRAGILITY_VERSION) => {}
        Some(other) => report.error(
            IssueKind::Schema,
            format!("version must be \"{}\", got \"{}\"", FRAGILITY_VERSION, other),
        ),
        None => report.error(IssueKind::Schema, "Missing required field: version"),
    }
    require_str(doc, "agent", "document", report);
    if let Some(created) = require_str(doc, "created", "document", report) {
        if !is_utc_timestamp(&created) {
            report.error(
                IssueKind::Schema,
                format!("created must be an ISO-8601 UTC timestamp, got \"{}\"", created),
            );
        }
    }
    if let Some(soul_hash) = require_str(doc, "soulHash", "document", report) {
        if !hash::is_well_formed(&soul_hash) {
            report.warn(
                IssueKind::Schema,
                format!("soulHash does not look like a sha256 value: {}", soul_hash),
            );
        }
    }
    if let Some(notes) = str_field(doc, "notes") {
        if notes.chars().count() > MAX_NOTES_CHARS {
            report.error(
                IssueKind::Schema,
                format!("notes must be at most {} characters", MAX_NOTES_CHARS),
            );
        }
    }
}

fn check_schema(doc: &Value, report: &mut ValidationReport) {
    check_top_level(doc, report);
    check_environment(doc, report);
    check_dependencies(doc, report);
    let control_ids = check_controls(doc, report);
    check_breakpoints(doc, &control_ids, report);
    check_metrics(doc, report);
}

/// Full validation pass over a parsed Fragility document.
pub fn validate_fragility(doc: &Value) -> ValidationOutcome {
    let mut report = ValidationReport::new();
    if !doc.is_object() {
        report.error(IssueKind::Structural, "Fragility document must be a JSON object");
        return ValidationOutcome::fatal(report);
    }

    check_schema(doc, &mut report);
    if report.is_fatal() {
        return ValidationOutcome::fatal(report);
    }

    let hash_hex = hash::prefixed_hash(&canonical_for_hash(doc));
    match str_field(doc, "checksum") {
        Some(PLACEHOLDER_CHECKSUM) => {
            report.warn(
                IssueKind::Integrity,
                "Checksum is the placeholder value; document is unsealed",
            );
        }
        Some(stored) if stored != hash_hex => {
            report.error(
                IssueKind::Integrity,
                format!(
                    "Checksum mismatch: document declares {} but canonical content hashes to {}",
                    stored, hash_hex
                ),
            );
        }
        _ => {}
    }
    if report.is_fatal() {
        return ValidationOutcome::fatal(report);
    }

    ValidationOutcome {
        report,
        canonical_form: Some(canonical_json(doc)),
        hash_hex: Some(hash_hex),
    }
}

/// Recompute the content hash and rewrite the top-level checksum field,
/// returning the sealed canonical document.
pub fn update_checksum(doc: &Value) -> Result<String, AttestError> {
    let mut report = ValidationReport::new();
    let Some(map) = doc.as_object() else {
        return Err(AttestError::InvalidDocument(
            "Fragility document must be a JSON object".into(),
        ));
    };
    check_schema(doc, &mut report);
    if report.is_fatal() {
        return Err(AttestError::InvalidDocument(report.summary()));
    }

    let hash_hex = hash::prefixed_hash(&canonical_for_hash(doc));
    let mut sealed = map.clone();
    sealed.insert("checksum".to_string(), Value::String(hash_hex));
    Ok(canonical_json(&Value::Object(sealed)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

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
                 "controlId": "c1", "lastTested": "2026-01-05T00:00:00Z"},
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
            "metrics": {"restoreTimeGuess": 12.0},
            "notes": "first pass"
        })
    }

    #[test]
    fn valid_document_passes_with_no_errors() {
        let outcome = validate_fragility(&sample());
        assert!(outcome.report.errors.is_empty(), "{:?}", outcome.report.errors);
        assert!(outcome.hash_hex.is_some());
    }

    #[test]
    fn key_order_does_not_change_the_hash() {
        let reordered: Value = serde_json::from_str(
            &canonical_json(&sample()),
        )
        .unwrap();
        let a = validate_fragility(&sample());
        let b = validate_fragility(&reordered);
        assert_eq!(a.hash_hex, b.hash_hex);
    }

    #[test]
    fn missing_memory_wipe_category_is_named_exactly() {
        let mut doc = sample();
        doc["breakpoints"]
            .as_array_mut()
            .unwrap()
            .retain(|bp| bp["id"] != "bp-wipe");
        let outcome = validate_fragility(&doc);
        let category_errors: Vec<_> = outcome
            .report
            .errors
            .iter()
            .filter(|e| e.message.contains("required trigger category"))
            .collect();
        assert_eq!(category_errors.len(), 1);
        assert!(category_errors[0].message.contains("memory wipe"));
    }

    #[test]
    fn unplanned_mitigation_without_control_is_an_error() {
        let mut doc = sample();
        doc["breakpoints"][2].as_object_mut().unwrap().remove("controlId");
        let outcome = validate_fragility(&doc);
        assert!(outcome
            .report
            .errors
            .iter()
            .any(|e| e.message.contains("must reference a controlId")));

        // planned=true waives the requirement.
        doc["breakpoints"][2]["planned"] = json!(true);
        let outcome = validate_fragility(&doc);
        assert!(outcome.report.errors.is_empty(), "{:?}", outcome.report.errors);
    }

    #[test]
    fn dangling_control_reference_is_an_error() {
        let mut doc = sample();
        doc["breakpoints"][0]["controlId"] = json!("c-missing");
        let outcome = validate_fragility(&doc);
        assert!(outcome
            .report
            .errors
            .iter()
            .any(|e| e.message.contains("does not match any declared control")));
    }

    #[test]
    fn missing_dependency_metadata_is_a_warning_not_error() {
        let mut doc = sample();
        doc["dependencies"][0].as_object_mut().unwrap().remove("criticality");
        doc["dependencies"][0].as_object_mut().unwrap().remove("failMode");
        let outcome = validate_fragility(&doc);
        assert!(outcome.report.errors.is_empty(), "{:?}", outcome.report.errors);
        assert_eq!(
            outcome
                .report
                .warnings
                .iter()
                .filter(|w| w.message.contains("kv"))
                .count(),
            2
        );
    }

    #[test]
    fn missing_top_level_fields_accumulate() {
        let doc = json!({"protocol": "imagony/fragility"});
        let outcome = validate_fragility(&doc);
        let messages: Vec<_> = outcome.report.errors.iter().map(|e| &e.message).collect();
        assert!(messages.iter().any(|m| m.contains("version")));
        assert!(messages.iter().any(|m| m.contains("agent")));
        assert!(messages.iter().any(|m| m.contains("environment")));
        assert!(messages.iter().any(|m| m.contains("breakpoints")));
    }

    #[test]
    fn seal_then_validate_round_trips() {
        let sealed = update_checksum(&sample()).unwrap();
        let doc: Value = serde_json::from_str(&sealed).unwrap();
        let outcome = validate_fragility(&doc);
        assert!(outcome.report.errors.is_empty(), "{:?}", outcome.report.errors);
        assert!(!outcome
            .report
            .warnings
            .iter()
            .any(|w| w.message.contains("unsealed")));

        // Any field change after sealing trips the integrity check.
        let mut tampered = doc.clone();
        tampered["breakpoints"][0]["impact"] = json!("degrade");
        let outcome = validate_fragility(&tampered);
        assert!(outcome
            .report
            .errors
            .iter()
            .any(|e| e.kind == IssueKind::Integrity));
        assert!(outcome.hash_hex.is_none());
    }

    #[test]
    fn placeholder_checksum_is_an_unsealed_warning() {
        let mut doc = sample();
        doc["checksum"] = json!(PLACEHOLDER_CHECKSUM);
        let outcome = validate_fragility(&doc);
        assert!(outcome.report.errors.is_empty());
        assert!(outcome
            .report
            .warnings
            .iter()
            .any(|w| w.message.contains("unsealed")));
    }

    #[test]
    fn overlong_notes_are_rejected() {
        let mut doc = sample();
        doc["notes"] = json!("n".repeat(241));
        let outcome = validate_fragility(&doc);
        assert!(outcome
            .report
            .errors
            .iter()
            .any(|e| e.message.contains("240 characters")));
    }
}
