//! Canonical markdown rendering for Soul documents.
//!
//! Sections are emitted in fixed canonical order regardless of source
//! order. Two modes exist by contract: the signature-free form is the
//! hashing input (signatures attest to content, not to other signatures,
//! and the checksum cannot cover itself), while the full form with
//! checksum and Signatures section is the document written back to disk.

use super::ParsedSoul;
use super::grammar::{SectionKind, SignatureEntry};

const FRONT_MATTER_KEYS: [&str; 5] = ["soul", "version", "created", "agent", "scope"];

fn render_front_matter(doc: &ParsedSoul, with_signatures: bool, out: &mut Vec<String>) {
    out.push("---".to_string());
    for key in FRONT_MATTER_KEYS {
        let value = doc.front_matter.text(key).unwrap_or("");
        if key == "version" {
            out.push(format!("{}: \"{}\"", key, value));
        } else {
            out.push(format!("{}: {}", key, value));
        }
    }
    if with_signatures {
        if let Some(checksum) = doc.front_matter.text("checksum") {
            out.push(format!("checksum: {}", checksum));
        }
    }
    if let Some(tags) = doc.front_matter.list("tags") {
        out.push(format!("tags: [{}]", tags.join(", ")));
    }
    out.push("---".to_string());
}

fn render_section(doc: &ParsedSoul, kind: SectionKind, out: &mut Vec<String>) {
    out.push(format!("## {}", kind.title()));
    match kind {
        SectionKind::Principles
        | SectionKind::NonGoals
        | SectionKind::Boundaries
        | SectionKind::Commitments => {
            for bullet in doc.bullets(kind) {
                out.push(format!("- {}", bullet));
            }
        }
        SectionKind::IrreversibleChoice => {
            if let Some(sentence) = &doc.irreversible_choice {
                out.push(sentence.clone());
            }
        }
        SectionKind::Proof => {
            for entry in &doc.proof {
                out.push(format!("- type:{}, ref:{}", entry.entry_type, entry.reference));
            }
        }
        SectionKind::Signatures => {
            for entry in &doc.signatures {
                match entry {
                    SignatureEntry::SelfSig { alg, sig } => {
                        out.push(format!("- self: {}:{}", alg, sig));
                    }
                    SignatureEntry::Witness { witness, alg, sig } => {
                        out.push(format!("- wit: {}, {}:{}", witness, alg, sig));
                    }
                }
            }
        }
    }
}

/// Rebuild the canonical document. With `with_signatures` false the
/// Signatures section and the checksum field are excluded; that form is
/// the hashing input.
pub fn canonical_soul(doc: &ParsedSoul, with_signatures: bool) -> String {
    let mut out = Vec::new();
    render_front_matter(doc, with_signatures, &mut out);
    out.push(String::new());
    for kind in SectionKind::CANONICAL_ORDER {
        if kind == SectionKind::Signatures && !with_signatures {
            continue;
        }
        if !doc.sections.contains(kind.title()) {
            continue;
        }
        render_section(doc, kind, &mut out);
    }
    let mut text = out.join("\n");
    text.push('\n');
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::report::ValidationReport;
    use crate::soul::parse_soul;

    const SAMPLE: &str = "---\nsoul: imagony/soul\nversion: \"0.1\"\ncreated: 2026-01-10T12:00:00Z\nagent: zoe\nscope: portable\nchecksum: sha256:REPLACE_AFTER_CANON\ntags: [calm, direct]\n---\n\n## Principles\n- tell the truth\n- stay within scope\n- protect user data\n## Non-Goals\n- maximize engagement\n- persuade covertly\n## Boundaries\n- no financial actions\n- no impersonation\n## Commitments\n- log irreversible actions\n## Irreversible Choice\nI keep my declared name across migrations.\n## Proof\n- type:conversation, ref:threads/412\n- type:artifact, ref:repo/imagony,main\n## Signatures\n- self: ed25519:AAAA=\n";

    fn parse(text: &str) -> super::ParsedSoul {
        let mut report = ValidationReport::new();
        let doc = parse_soul(text, &mut report).expect("parses");
        assert!(report.errors.is_empty(), "{:?}", report.errors);
        doc
    }

    #[test]
    fn canonicalization_is_idempotent() {
        let doc = parse(SAMPLE);
        let once = canonical_soul(&doc, true);
        let reparsed = parse(&once);
        let twice = canonical_soul(&reparsed, true);
        assert_eq!(once, twice);
    }

    #[test]
    fn sections_reorder_to_canonical_positions() {
        // Proof ahead of Principles in the source; canonical output fixes it.
        let shuffled = SAMPLE
            .replace(
                "\n## Principles\n- tell the truth\n- stay within scope\n- protect user data\n",
                "\n",
            )
            .replace(
                "## Proof\n",
                "## Principles\n- tell the truth\n- stay within scope\n- protect user data\n## Proof\n",
            );
        let a = canonical_soul(&parse(SAMPLE), false);
        let b = canonical_soul(&parse(&shuffled), false);
        assert_eq!(a, b);
    }

    #[test]
    fn signature_free_form_excludes_signatures_and_checksum() {
        let doc = parse(SAMPLE);
        let content = canonical_soul(&doc, false);
        assert!(!content.contains("## Signatures"));
        assert!(!content.contains("checksum:"));
        let full = canonical_soul(&doc, true);
        assert!(full.contains("## Signatures"));
        assert!(full.contains("checksum: sha256:REPLACE_AFTER_CANON"));
    }

    #[test]
    fn appending_a_signature_leaves_the_content_hash_unchanged() {
        let doc = parse(SAMPLE);
        let witnessed = SAMPLE.replace(
            "- self: ed25519:AAAA=\n",
            "- self: ed25519:AAAA=\n- wit: alice, ed25519:BBBB=\n",
        );
        let doc2 = parse(&witnessed);
        assert_eq!(canonical_soul(&doc, false), canonical_soul(&doc2, false));
        assert_ne!(canonical_soul(&doc, true), canonical_soul(&doc2, true));
    }
}
