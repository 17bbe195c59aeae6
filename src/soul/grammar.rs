//! Line grammar for Soul section content.
//!
//! Each section kind has its own tagged parse: generic bullet lists, the
//! single-sentence Irreversible Choice, proof entries, and signature
//! entries. Classification is an explicit tokenizer rather than regex
//! branching, so malformed shapes report the offending line precisely.

use crate::core::report::{IssueKind, ValidationReport};

/// The seven Soul sections in canonical order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    Principles,
    NonGoals,
    Boundaries,
    Commitments,
    IrreversibleChoice,
    Proof,
    Signatures,
}

impl SectionKind {
    pub const CANONICAL_ORDER: [SectionKind; 7] = [
        SectionKind::Principles,
        SectionKind::NonGoals,
        SectionKind::Boundaries,
        SectionKind::Commitments,
        SectionKind::IrreversibleChoice,
        SectionKind::Proof,
        SectionKind::Signatures,
    ];

    pub fn title(self) -> &'static str {
        match self {
            SectionKind::Principles => "Principles",
            SectionKind::NonGoals => "Non-Goals",
            SectionKind::Boundaries => "Boundaries",
            SectionKind::Commitments => "Commitments",
            SectionKind::IrreversibleChoice => "Irreversible Choice",
            SectionKind::Proof => "Proof",
            SectionKind::Signatures => "Signatures",
        }
    }

    pub fn from_title(title: &str) -> Option<SectionKind> {
        Self::CANONICAL_ORDER
            .into_iter()
            .find(|kind| kind.title() == title)
    }
}

/// One proof entry: `type:<type>, ref:<ref>`.
#[derive(Debug, Clone, PartialEq)]
pub struct ProofEntry {
    pub entry_type: String,
    pub reference: String,
}

/// One signature entry. Witness signatures carry the witness name; no
/// trust evaluation happens here.
#[derive(Debug, Clone, PartialEq)]
pub enum SignatureEntry {
    SelfSig { alg: String, sig: String },
    Witness { witness: String, alg: String, sig: String },
}

/// Shape of one content line.
#[derive(Debug, Clone, Copy, PartialEq)]
enum LineShape<'a> {
    Blank,
    Dash(&'a str),
    Star(&'a str),
    Plain(&'a str),
}

fn classify(line: &str) -> LineShape<'_> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        LineShape::Blank
    } else if let Some(rest) = trimmed.strip_prefix("- ") {
        LineShape::Dash(rest.trim())
    } else if let Some(rest) = trimmed.strip_prefix("* ") {
        LineShape::Star(rest.trim())
    } else {
        LineShape::Plain(trimmed)
    }
}

/// Case-insensitive label prefix, e.g. `type:` or `wit:`.
fn strip_label<'a>(input: &'a str, label: &str) -> Option<&'a str> {
    let input = input.trim_start();
    if input.len() >= label.len() && input[..label.len()].eq_ignore_ascii_case(label) {
        Some(&input[label.len()..])
    } else {
        None
    }
}

/// Parse a generic bullet-bearing section. Every non-blank line must be a
/// `- ` bullet; `* ` bullets and plain lines are errors naming the line.
pub fn parse_bullets(
    section: &str,
    lines: &[String],
    report: &mut ValidationReport,
) -> Vec<String> {
    let mut bullets = Vec::new();
    for line in lines {
        match classify(line) {
            LineShape::Blank => {}
            LineShape::Dash(text) if !text.is_empty() => bullets.push(text.to_string()),
            LineShape::Dash(_) => {
                report.error(
                    IssueKind::Schema,
                    format!("{}: empty bullet point", section),
                );
            }
            LineShape::Star(_) => {
                report.error(
                    IssueKind::Schema,
                    format!("{}: bullets must use '-' not '*': {}", section, line.trim()),
                );
            }
            LineShape::Plain(text) => {
                report.error(
                    IssueKind::Schema,
                    format!("{}: line is not a bullet point: {}", section, text),
                );
            }
        }
    }
    bullets
}

/// Parse the Irreversible Choice section: exactly one non-bulleted
/// sentence.
pub fn parse_choice(lines: &[String], report: &mut ValidationReport) -> Option<String> {
    let mut sentences = Vec::new();
    for line in lines {
        match classify(line) {
            LineShape::Blank => {}
            LineShape::Dash(_) | LineShape::Star(_) => {
                report.error(
                    IssueKind::Schema,
                    "Irreversible Choice must be a single sentence, not a bullet list",
                );
                return None;
            }
            LineShape::Plain(text) => sentences.push(text.to_string()),
        }
    }
    match sentences.len() {
        1 => Some(sentences.remove(0)),
        0 => {
            report.error(
                IssueKind::Schema,
                "Irreversible Choice must contain exactly one sentence",
            );
            None
        }
        _ => {
            report.error(
                IssueKind::Schema,
                format!(
                    "Irreversible Choice must be exactly one sentence, found {}",
                    sentences.len()
                ),
            );
            None
        }
    }
}

fn parse_proof_entry(text: &str) -> Option<ProofEntry> {
    // `type:<A>, ref:<B>` where B may itself contain commas.
    let (left, right) = text.split_once(',')?;
    let entry_type = strip_label(left, "type:")?.trim();
    let reference = strip_label(right, "ref:")?.trim();
    if entry_type.is_empty() || reference.is_empty() {
        return None;
    }
    Some(ProofEntry {
        entry_type: entry_type.to_string(),
        reference: reference.to_string(),
    })
}

pub fn parse_proof(lines: &[String], report: &mut ValidationReport) -> Vec<ProofEntry> {
    let mut entries = Vec::new();
    for line in lines {
        match classify(line) {
            LineShape::Blank => {}
            LineShape::Dash(text) => match parse_proof_entry(text) {
                Some(entry) => entries.push(entry),
                None => report.error(
                    IssueKind::Schema,
                    format!("Proof: malformed entry (expected 'type:<type>, ref:<ref>'): {}", text),
                ),
            },
            LineShape::Star(_) => report.error(
                IssueKind::Schema,
                format!("Proof: bullets must use '-' not '*': {}", line.trim()),
            ),
            LineShape::Plain(text) => report.error(
                IssueKind::Schema,
                format!("Proof: line is not a bullet point: {}", text),
            ),
        }
    }
    entries
}

fn parse_alg_sig(text: &str) -> Option<(String, String)> {
    let (alg, sig) = text.trim().split_once(':')?;
    let (alg, sig) = (alg.trim(), sig.trim());
    if alg.is_empty() || sig.is_empty() {
        return None;
    }
    Some((alg.to_string(), sig.to_string()))
}

fn parse_signature_entry(text: &str) -> Option<SignatureEntry> {
    if let Some(rest) = strip_label(text, "self:") {
        let (alg, sig) = parse_alg_sig(rest)?;
        return Some(SignatureEntry::SelfSig { alg, sig });
    }
    if let Some(rest) = strip_label(text, "wit:") {
        let (witness, rest) = rest.split_once(',')?;
        let witness = witness.trim();
        let (alg, sig) = parse_alg_sig(rest)?;
        if witness.is_empty() {
            return None;
        }
        return Some(SignatureEntry::Witness {
            witness: witness.to_string(),
            alg,
            sig,
        });
    }
    None
}

pub fn parse_signatures(lines: &[String], report: &mut ValidationReport) -> Vec<SignatureEntry> {
    let mut entries = Vec::new();
    for line in lines {
        match classify(line) {
            LineShape::Blank => {}
            LineShape::Dash(text) => match parse_signature_entry(text) {
                Some(entry) => entries.push(entry),
                None => report.error(
                    IssueKind::Schema,
                    format!(
                        "Signatures: malformed entry (expected 'self: <alg>:<sig>' or 'wit: <name>, <alg>:<sig>'): {}",
                        text
                    ),
                ),
            },
            LineShape::Star(_) => report.error(
                IssueKind::Schema,
                format!("Signatures: bullets must use '-' not '*': {}", line.trim()),
            ),
            LineShape::Plain(text) => report.error(
                IssueKind::Schema,
                format!("Signatures: line is not a bullet point: {}", text),
            ),
        }
    }
    entries
}
