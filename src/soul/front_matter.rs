//! Front matter extraction for Soul documents.
//!
//! The header is the block between the opening `---` line and the next
//! `---` line. Missing delimiters abort parsing of the whole document with
//! a single structural error; individual unparseable header lines only
//! accumulate and parsing continues.

use crate::core::report::{IssueKind, ValidationReport};

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    List(Vec<String>),
}

/// Ordered header fields. Lookup returns the first occurrence.
#[derive(Debug, Clone, Default)]
pub struct FrontMatter {
    pub fields: Vec<(String, FieldValue)>,
}

impl FrontMatter {
    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        match self.get(key) {
            Some(FieldValue::Text(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn list(&self, key: &str) -> Option<&[String]> {
        match self.get(key) {
            Some(FieldValue::List(items)) => Some(items.as_slice()),
            _ => None,
        }
    }

    /// Replace the first occurrence of a key, or append when absent.
    pub fn set_text(&mut self, key: &str, value: impl Into<String>) {
        let value = FieldValue::Text(value.into());
        match self.fields.iter_mut().find(|(k, _)| k == key) {
            Some((_, v)) => *v = value,
            None => self.fields.push((key.to_string(), value)),
        }
    }
}

fn strip_quotes(value: &str) -> &str {
    let value = value.trim();
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

fn parse_value(raw: &str) -> FieldValue {
    let raw = raw.trim();
    if let Some(inner) = raw.strip_prefix('[').and_then(|r| r.strip_suffix(']')) {
        let items = inner
            .split(',')
            .map(|item| strip_quotes(item).to_string())
            .filter(|item| !item.is_empty())
            .collect();
        FieldValue::List(items)
    } else {
        FieldValue::Text(strip_quotes(raw).to_string())
    }
}

/// Split raw document text into front matter and body.
///
/// Returns `None` (after reporting one structural error) when the text does
/// not open with `---` or the closing `---` is missing; no further parsing
/// happens in that case.
pub fn parse_front_matter<'a>(
    text: &'a str,
    report: &mut ValidationReport,
) -> Option<(FrontMatter, &'a str)> {
    let mut lines = text.lines();
    let opens = matches!(lines.next(), Some(first) if first.trim_end() == "---");
    if !opens {
        report.error(
            IssueKind::Structural,
            "Document must start with a '---' front matter delimiter",
        );
        return None;
    }

    let after_open = &text[text.find('\n').map(|i| i + 1).unwrap_or(text.len())..];
    let mut header_end = None;
    let mut offset = 0;
    for line in after_open.lines() {
        if line.trim_end() == "---" {
            header_end = Some((offset, offset + line.len()));
            break;
        }
        offset += line.len() + 1;
    }
    let Some((header_len, close_end)) = header_end else {
        report.error(
            IssueKind::Structural,
            "Front matter is not closed by a second '---' delimiter",
        );
        return None;
    };

    let mut front_matter = FrontMatter::default();
    for line in after_open[..header_len].lines() {
        if line.trim().is_empty() {
            continue;
        }
        match line.split_once(':') {
            Some((key, value)) if !key.trim().is_empty() => {
                front_matter
                    .fields
                    .push((key.trim().to_string(), parse_value(value)));
            }
            _ => {
                report.error(
                    IssueKind::Structural,
                    format!("Unparseable front matter line: {}", line.trim()),
                );
            }
        }
    }

    let body_start = (close_end + 1).min(after_open.len());
    Some((front_matter, &after_open[body_start..]))
}
