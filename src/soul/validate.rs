//! Schema validation and sealing for Soul documents.
//!
//! All checks accumulate; a caller sees every violation in one pass. Hash
//! and canonical form are only produced when no fatal error was found.

use chrono::DateTime;
use regex::Regex;

use super::canonical::canonical_soul;
use super::grammar::{SectionKind, SignatureEntry};
use super::{ParsedSoul, parse_soul};
use crate::core::error::AttestError;
use crate::core::hash::{self, PLACEHOLDER_CHECKSUM};
use crate::core::report::{IssueKind, ValidationOutcome, ValidationReport};

/// Hard ceiling on the encoded document size; forces identity manifestos
/// to stay concise.
pub const MAX_SOUL_BYTES: usize = 1400;
/// Soft ceiling; crossing it is a warning only.
pub const WARN_SOUL_BYTES: usize = 1024;

const REQUIRED_KEYS: [&str; 6] = ["soul", "version", "created", "agent", "scope", "checksum"];
const KNOWN_KEYS: [&str; 7] = ["soul", "version", "created", "agent", "scope", "checksum", "tags"];
const MAX_TAGS: usize = 5;
const MAX_PRINCIPLE_CHARS: usize = 80;

fn is_utc_timestamp(value: &str) -> bool {
    match DateTime::parse_from_rfc3339(value) {
        Ok(ts) => ts.offset().utc_minus_local() == 0,
        Err(_) => false,
    }
}

fn check_front_matter(doc: &ParsedSoul, check_checksum: bool, report: &mut ValidationReport) {
    let fm = &doc.front_matter;

    for key in REQUIRED_KEYS {
        if !check_checksum && key == "checksum" {
            continue;
        }
        if fm.get(key).is_none() {
            report.error(
                IssueKind::Schema,
                format!("Missing required front matter key: {}", key),
            );
        }
    }
    for (key, _) in &fm.fields {
        if !KNOWN_KEYS.contains(&key.as_str()) {
            report.warn(IssueKind::Schema, format!("Unknown front matter key: {}", key));
        }
    }

    if let Some(soul) = fm.text("soul") {
        if soul != "imagony/soul" {
            report.error(
                IssueKind::Schema,
                format!("soul must be \"imagony/soul\", got \"{}\"", soul),
            );
        }
    }
    if let Some(version) = fm.text("version") {
        if version != "0.1" {
            report.error(
                IssueKind::Schema,
                format!("version must be \"0.1\", got \"{}\"", version),
            );
        }
    }
    if let Some(created) = fm.text("created") {
        if !is_utc_timestamp(created) {
            report.error(
                IssueKind::Schema,
                format!("created must be an ISO-8601 UTC timestamp, got \"{}\"", created),
            );
        }
    }
    if let Some(agent) = fm.text("agent") {
        if agent.is_empty() {
            report.error(IssueKind::Schema, "agent must not be empty");
        }
    }
    if let Some(scope) = fm.text("scope") {
        let platform_name = scope.strip_prefix("platform:");
        let valid = scope == "portable" || platform_name.is_some_and(|name| !name.is_empty());
        if !valid {
            report.error(
                IssueKind::Schema,
                format!("scope must be \"portable\" or \"platform:<name>\", got \"{}\"", scope),
            );
        }
    }
    if fm.get("tags").is_some() {
        match fm.list("tags") {
            Some(tags) if tags.len() > MAX_TAGS => {
                report.error(
                    IssueKind::Schema,
                    format!("tags must have at most {} entries, got {}", MAX_TAGS, tags.len()),
                );
            }
            Some(_) => {}
            None => report.error(IssueKind::Schema, "tags must be a [..] list"),
        }
    }
    if check_checksum {
        if let Some(checksum) = fm.text("checksum") {
            let shape = Regex::new(r"^sha256:[0-9a-f]{64}$").unwrap();
            if checksum != PLACEHOLDER_CHECKSUM && !shape.is_match(checksum) {
                report.error(
                    IssueKind::Schema,
                    format!("checksum is not a sha256 value: {}", checksum),
                );
            }
        }
    }
}

fn check_sections(doc: &ParsedSoul, report: &mut ValidationReport) {
    for kind in SectionKind::CANONICAL_ORDER {
        if !doc.sections.contains(kind.title()) {
            report.error(
                IssueKind::Schema,
                format!("Missing required section: {}", kind.title()),
            );
        }
    }
    for section in doc.sections.iter() {
        if SectionKind::from_title(&section.title).is_none() {
            report.warn(
                IssueKind::Schema,
                format!("Unknown section: {}", section.title),
            );
        }
    }

    // Present canonical sections must appear in canonical relative order.
    let mut last_seen: Option<(usize, SectionKind)> = None;
    for kind in SectionKind::CANONICAL_ORDER {
        if let Some(pos) = doc.sections.position(kind.title()) {
            if let Some((prev_pos, prev_kind)) = last_seen {
                if pos < prev_pos {
                    report.error(
                        IssueKind::Schema,
                        format!(
                            "Section '{}' appears before '{}'; sections must follow canonical order",
                            kind.title(),
                            prev_kind.title()
                        ),
                    );
                }
            }
            last_seen = Some((pos, kind));
        }
    }

    let bullet_limits = [
        (SectionKind::Principles, 3, 7),
        (SectionKind::NonGoals, 2, 6),
        (SectionKind::Boundaries, 2, 6),
        (SectionKind::Commitments, 1, 5),
    ];
    for (kind, min, max) in bullet_limits {
        if !doc.sections.contains(kind.title()) {
            continue;
        }
        let count = doc.bullets(kind).len();
        if count < min || count > max {
            report.error(
                IssueKind::Schema,
                format!("{} must have {}-{} bullet points", kind.title(), min, max),
            );
        }
    }

    for bullet in &doc.principles {
        if bullet.chars().count() > MAX_PRINCIPLE_CHARS {
            report.error(
                IssueKind::Schema,
                format!(
                    "Principles: bullet exceeds {} characters: {}",
                    MAX_PRINCIPLE_CHARS, bullet
                ),
            );
        }
        if bullet.contains("http://") || bullet.contains("https://") {
            report.error(
                IssueKind::Schema,
                format!("Principles: bullets must not contain URLs: {}", bullet),
            );
        }
    }

    if doc.sections.contains(SectionKind::Proof.title()) {
        let count = doc.proof.len();
        if !(2..=5).contains(&count) {
            report.error(IssueKind::Schema, "Proof must have 2-5 entries");
        }
    }

    if doc.sections.contains(SectionKind::Signatures.title()) {
        let has_self = doc
            .signatures
            .iter()
            .any(|s| matches!(s, SignatureEntry::SelfSig { .. }));
        if !has_self {
            report.warn(IssueKind::Schema, "No self signature found");
        }
    }
}

fn check_size(text: &str, report: &mut ValidationReport) {
    let bytes = text.len();
    if bytes > MAX_SOUL_BYTES {
        report.error(
            IssueKind::Schema,
            format!("Soul document exceeds {} bytes ({} bytes)", MAX_SOUL_BYTES, bytes),
        );
    } else if bytes > WARN_SOUL_BYTES {
        report.warn(
            IssueKind::Schema,
            format!("Soul document exceeds {} bytes ({} bytes); consider trimming", WARN_SOUL_BYTES, bytes),
        );
    }
}

/// Full validation pass: structure, schema, size, checksum seal. The
/// returned canonical form is the complete document; the hash covers the
/// signature-free form.
pub fn validate_soul(text: &str) -> ValidationOutcome {
    let mut report = ValidationReport::new();
    let Some(doc) = parse_soul(text, &mut report) else {
        return ValidationOutcome::fatal(report);
    };

    check_front_matter(&doc, true, &mut report);
    check_sections(&doc, &mut report);
    check_size(text, &mut report);
    if report.is_fatal() {
        return ValidationOutcome::fatal(report);
    }

    let hash_hex = hash::prefixed_hash(&canonical_soul(&doc, false));
    match doc.front_matter.text("checksum") {
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
        canonical_form: Some(canonical_soul(&doc, true)),
        hash_hex: Some(hash_hex),
    }
}

/// Recompute the content hash and rewrite the checksum field, returning the
/// sealed canonical document. Fails hard when the document has fatal
/// problems besides its checksum.
pub fn update_checksum(text: &str) -> Result<String, AttestError> {
    let mut report = ValidationReport::new();
    let Some(mut doc) = parse_soul(text, &mut report) else {
        return Err(AttestError::InvalidDocument(report.summary()));
    };
    check_front_matter(&doc, false, &mut report);
    check_sections(&doc, &mut report);
    check_size(text, &mut report);
    if report.is_fatal() {
        return Err(AttestError::InvalidDocument(report.summary()));
    }

    let hash_hex = hash::prefixed_hash(&canonical_soul(&doc, false));
    doc.front_matter.set_text("checksum", hash_hex);
    Ok(canonical_soul(&doc, true))
}
