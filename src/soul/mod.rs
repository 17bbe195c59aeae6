//! The Soul protocol: a markdown identity manifesto with front matter,
//! seven ordered sections, and embedded attestation.
//!
//! Pipeline: parse → validate → canonicalize → hash → sign/verify. All
//! functions here are pure over in-memory text; file and key I/O belongs
//! to the CLI layer.

pub mod canonical;
pub mod front_matter;
pub mod grammar;
pub mod sections;
pub mod validate;

use crate::core::report::ValidationReport;
use front_matter::{FrontMatter, parse_front_matter};
use grammar::{ProofEntry, SectionKind, SignatureEntry};
use sections::{SectionList, parse_sections};

pub use validate::{update_checksum, validate_soul};

/// A Soul document after front matter, section, and grammar parsing.
///
/// Grammar problems encountered while building this accumulate in the
/// report passed to [`parse_soul`]; the typed fields hold whatever parsed
/// cleanly.
#[derive(Debug, Clone)]
pub struct ParsedSoul {
    pub front_matter: FrontMatter,
    pub sections: SectionList,
    pub principles: Vec<String>,
    pub non_goals: Vec<String>,
    pub boundaries: Vec<String>,
    pub commitments: Vec<String>,
    pub irreversible_choice: Option<String>,
    pub proof: Vec<ProofEntry>,
    pub signatures: Vec<SignatureEntry>,
}

impl ParsedSoul {
    pub fn bullets(&self, kind: SectionKind) -> &[String] {
        match kind {
            SectionKind::Principles => &self.principles,
            SectionKind::NonGoals => &self.non_goals,
            SectionKind::Boundaries => &self.boundaries,
            SectionKind::Commitments => &self.commitments,
            _ => &[],
        }
    }
}

/// Parse raw text into a [`ParsedSoul`]. Returns `None` only on structural
/// failure (missing front matter delimiters); everything else accumulates.
pub fn parse_soul(text: &str, report: &mut ValidationReport) -> Option<ParsedSoul> {
    let (front_matter, body) = parse_front_matter(text, report)?;
    let sections = parse_sections(body);

    let section_lines = |kind: SectionKind| -> Option<&[String]> {
        sections.get(kind.title()).map(|s| s.lines.as_slice())
    };

    let parse_list = |kind: SectionKind, report: &mut ValidationReport| -> Vec<String> {
        match section_lines(kind) {
            Some(lines) => grammar::parse_bullets(kind.title(), lines, report),
            None => Vec::new(),
        }
    };

    let principles = parse_list(SectionKind::Principles, report);
    let non_goals = parse_list(SectionKind::NonGoals, report);
    let boundaries = parse_list(SectionKind::Boundaries, report);
    let commitments = parse_list(SectionKind::Commitments, report);

    let irreversible_choice = section_lines(SectionKind::IrreversibleChoice)
        .and_then(|lines| grammar::parse_choice(lines, report));
    let proof = section_lines(SectionKind::Proof)
        .map(|lines| grammar::parse_proof(lines, report))
        .unwrap_or_default();
    let signatures = section_lines(SectionKind::Signatures)
        .map(|lines| grammar::parse_signatures(lines, report))
        .unwrap_or_default();

    Some(ParsedSoul {
        front_matter,
        sections,
        principles,
        non_goals,
        boundaries,
        commitments,
        irreversible_choice,
        proof,
        signatures,
    })
}
