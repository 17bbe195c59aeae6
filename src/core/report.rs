//! Accumulating validation reports.
//!
//! Validation never short-circuits on content problems: every check appends
//! to the report so a caller sees all violations in one pass. Fatal errors
//! block hashing and signing; warnings never do.

use serde::Serialize;

/// Classification of a reported issue, mirroring the error taxonomy:
/// structural (parse aborts for the affected region), schema (cardinality,
/// format, ordering), integrity (checksum mismatch), crypto (key/signature
/// material).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    Structural,
    Schema,
    Integrity,
    Crypto,
}

#[derive(Debug, Clone, Serialize)]
pub struct Issue {
    pub kind: IssueKind,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationReport {
    pub errors: Vec<Issue>,
    pub warnings: Vec<Issue>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn error(&mut self, kind: IssueKind, message: impl Into<String>) {
        self.errors.push(Issue {
            kind,
            message: message.into(),
        });
    }

    pub fn warn(&mut self, kind: IssueKind, message: impl Into<String>) {
        self.warnings.push(Issue {
            kind,
            message: message.into(),
        });
    }

    pub fn is_fatal(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn merge(&mut self, other: ValidationReport) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }

    /// First few error messages joined for hard-error contexts.
    pub fn summary(&self) -> String {
        let shown = self
            .errors
            .iter()
            .take(3)
            .map(|i| i.message.as_str())
            .collect::<Vec<_>>()
            .join("; ");
        if self.errors.len() > 3 {
            format!("{} (+{} more)", shown, self.errors.len() - 3)
        } else {
            shown
        }
    }
}

/// Result of running the full validate pipeline over one document.
///
/// `canonical_form` is the complete canonical rendering (signatures and
/// checksum included); `hash_hex` is the content hash computed over the
/// signature-free canonical form. Both are absent when any fatal error was
/// reported.
#[derive(Debug, Serialize)]
pub struct ValidationOutcome {
    #[serde(flatten)]
    pub report: ValidationReport,
    pub canonical_form: Option<String>,
    pub hash_hex: Option<String>,
}

impl ValidationOutcome {
    pub fn fatal(report: ValidationReport) -> Self {
        Self {
            report,
            canonical_form: None,
            hash_hex: None,
        }
    }
}
