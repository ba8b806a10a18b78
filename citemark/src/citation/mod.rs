use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Superscript glyphs in digit order: index `n` renders the digit `n`.
const SUPERSCRIPT_DIGITS: [char; 10] = ['⁰', '¹', '²', '³', '⁴', '⁵', '⁶', '⁷', '⁸', '⁹'];

/// A reference from rendered text to a source document excerpt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Citation {
    /// Decimal numeral keying the citation table ("1", "2", ...).
    pub id: String,
    pub document_id: String,
    pub document_title: String,
    #[serde(default)]
    pub section: String,
    #[serde(default)]
    pub excerpt: String,
}

/// Read-only lookup from decimal citation ID to its payload.
///
/// Backed by a `BTreeMap` so iteration order never depends on hashing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CitationTable {
    entries: BTreeMap<String, Citation>,
}

impl CitationTable {
    pub fn new() -> Self {
        CitationTable::default()
    }

    /// Insert a citation under its own `id`, replacing any previous entry.
    pub fn insert(&mut self, citation: Citation) {
        self.entries.insert(citation.id.clone(), citation);
    }

    pub fn resolve(&self, id: &str) -> Option<&Citation> {
        self.entries.get(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Citation> {
        self.entries.values()
    }
}

impl FromIterator<Citation> for CitationTable {
    fn from_iter<I: IntoIterator<Item = Citation>>(iter: I) -> Self {
        let mut table = CitationTable::new();
        for citation in iter {
            table.insert(citation);
        }
        table
    }
}

/// Map one superscript glyph to its decimal digit.
pub fn superscript_to_digit(c: char) -> Option<char> {
    SUPERSCRIPT_DIGITS
        .iter()
        .position(|&g| g == c)
        .and_then(|n| char::from_digit(n as u32, 10))
}

pub fn is_superscript_digit(c: char) -> bool {
    superscript_to_digit(c).is_some()
}

/// Convert a run of superscript glyphs into a decimal citation ID.
///
/// Returns `None` for an empty run or when any glyph is not a superscript digit.
pub fn superscripts_to_id(glyphs: &str) -> Option<String> {
    if glyphs.is_empty() {
        return None;
    }
    glyphs.chars().map(superscript_to_digit).collect()
}

/// Inverse of [`superscripts_to_id`]: render a decimal ID as superscript glyphs.
pub fn id_to_superscripts(id: &str) -> Option<String> {
    if id.is_empty() {
        return None;
    }
    id.chars()
        .map(|c| c.to_digit(10).map(|d| SUPERSCRIPT_DIGITS[d as usize]))
        .collect()
}
