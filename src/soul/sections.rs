//! Markdown body splitting for Soul documents.
//!
//! The body splits on `## Title` headers. Sections are kept as an explicit
//! ordered list of `(title, lines)` pairs with a lookup index built once;
//! duplicate titles resolve to the first occurrence. Text before the first
//! header is discarded.

use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct Section {
    pub title: String,
    pub lines: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct SectionList {
    sections: Vec<Section>,
    index: HashMap<String, usize>,
}

impl SectionList {
    pub fn get(&self, title: &str) -> Option<&Section> {
        self.index.get(title).map(|&i| &self.sections[i])
    }

    pub fn contains(&self, title: &str) -> bool {
        self.index.contains_key(title)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Section> {
        self.sections.iter()
    }

    /// Position of a title's first occurrence in source order.
    pub fn position(&self, title: &str) -> Option<usize> {
        self.index.get(title).copied()
    }
}

pub fn parse_sections(body: &str) -> SectionList {
    let mut sections: Vec<Section> = Vec::new();
    for line in body.lines() {
        if let Some(title) = line.strip_prefix("## ") {
            sections.push(Section {
                title: title.trim().to_string(),
                lines: Vec::new(),
            });
        } else if let Some(current) = sections.last_mut() {
            current.lines.push(line.to_string());
        }
        // Preamble before the first header is dropped.
    }

    let mut index = HashMap::new();
    for (i, section) in sections.iter().enumerate() {
        index.entry(section.title.clone()).or_insert(i);
    }
    SectionList { sections, index }
}
