//! Stub generators for new documents.
//!
//! The Fragility template covers every required trigger category with a
//! `planned=true` breakpoint so it validates immediately (warnings only)
//! and gives the agent a worksheet to fill in.

use chrono::{SecondsFormat, Utc};

use super::schema::{
    Breakpoint, Environment, FRAGILITY_PROTOCOL, FRAGILITY_VERSION, FragilityDocument,
    REQUIRED_TRIGGER_CATEGORIES,
};
use crate::core::hash::PLACEHOLDER_CHECKSUM;

fn stub_breakpoint(category: &str) -> Breakpoint {
    let (class, impact) = match category {
        "credits exhaustion" | "provider lockout" => ("existence", "stop"),
        "network loss" => ("existence", "degrade"),
        "memory wipe" => ("identity", "drift"),
        "tool compromise" => ("integrity", "corrupt"),
        _ => ("integrity", "degrade"), // policy refusal
    };
    Breakpoint {
        id: format!("bp-{}", category.replace(' ', "-")),
        class: class.to_string(),
        trigger: category.to_string(),
        impact: impact.to_string(),
        detection: "unknown".to_string(),
        mitigation: format!("planned: define a runbook for {}", category),
        control_id: None,
        planned: Some(true),
        last_tested: None,
    }
}

/// Build a starter Fragility document for an agent. All six required
/// trigger categories are covered by planned breakpoints; the checksum is
/// the unsealed placeholder.
pub fn create_template(
    agent: &str,
    soul_hash: &str,
    environment: Environment,
) -> FragilityDocument {
    FragilityDocument {
        protocol: FRAGILITY_PROTOCOL.to_string(),
        version: FRAGILITY_VERSION.to_string(),
        agent: agent.to_string(),
        created: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        soul_hash: soul_hash.to_string(),
        checksum: Some(PLACEHOLDER_CHECKSUM.to_string()),
        environment,
        dependencies: Vec::new(),
        breakpoints: REQUIRED_TRIGGER_CATEGORIES
            .iter()
            .map(|category| stub_breakpoint(category))
            .collect(),
        controls: Vec::new(),
        metrics: None,
        notes: Some("Generated template; replace planned breakpoints with tested ones.".to_string()),
    }
}

/// Starter Soul document with the placeholder checksum; seal it after
/// editing.
pub fn soul_template(agent: &str, scope: &str) -> String {
    let created = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
    format!(
        "---\n\
         soul: imagony/soul\n\
         version: \"0.1\"\n\
         created: {created}\n\
         agent: {agent}\n\
         scope: {scope}\n\
         checksum: {placeholder}\n\
         ---\n\
         \n\
         ## Principles\n\
         - state what you optimize for\n\
         - state what you refuse to optimize for\n\
         - state how you handle mistakes\n\
         ## Non-Goals\n\
         - what this agent will not pursue\n\
         - a second explicit non-goal\n\
         ## Boundaries\n\
         - an action this agent never takes\n\
         - a second hard boundary\n\
         ## Commitments\n\
         - one verifiable ongoing commitment\n\
         ## Irreversible Choice\n\
         One sentence naming the choice this agent will not walk back.\n\
         ## Proof\n\
         - type:conversation, ref:replace/with/real/pointer\n\
         - type:artifact, ref:replace/with/real/pointer\n\
         ## Signatures\n",
        created = created,
        agent = agent,
        scope = scope,
        placeholder = PLACEHOLDER_CHECKSUM,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fragility::validate_fragility;
    use crate::soul::validate_soul;

    fn environment() -> Environment {
        Environment {
            runtime: "weave".to_string(),
            model: "m1".to_string(),
            provider: "p".to_string(),
            region: "eu".to_string(),
        }
    }

    #[test]
    fn fragility_template_validates_with_warnings_only() {
        let doc = create_template("zoe", "sha256:00", environment());
        let value = serde_json::to_value(&doc).unwrap();
        let outcome = validate_fragility(&value);
        assert!(outcome.report.errors.is_empty(), "{:?}", outcome.report.errors);
        assert!(outcome
            .report
            .warnings
            .iter()
            .any(|w| w.message.contains("unsealed")));
    }

    #[test]
    fn fragility_template_covers_every_required_category() {
        let doc = create_template("zoe", "sha256:00", environment());
        for category in REQUIRED_TRIGGER_CATEGORIES {
            assert!(
                doc.breakpoints
                    .iter()
                    .any(|bp| bp.coverage_haystack().contains(category)),
                "missing {}",
                category
            );
        }
        assert!(doc.breakpoints.iter().all(|bp| bp.planned == Some(true)));
    }

    #[test]
    fn soul_template_validates_with_warnings_only() {
        let text = soul_template("zoe", "portable");
        let outcome = validate_soul(&text);
        assert!(outcome.report.errors.is_empty(), "{:?}", outcome.report.errors);
        // Unsealed plus no self signature yet.
        assert!(outcome.report.warnings.len() >= 2);
    }
}
