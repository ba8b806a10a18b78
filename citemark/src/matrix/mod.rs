//! Cross-document analysis grid.
//!
//! Rows are documents, columns are extracted terms. Unlike markdown tables,
//! the grid is built from typed data where each cell carries an explicit
//! extraction status.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::citation::Citation;
use crate::document::WARNING_GLYPH;
use crate::export::csv::escape_csv_cell;
use crate::render::CitationChip;

/// Rendered in place of a value that was looked for and not found.
pub const NOT_FOUND_TEXT: &str = "\u{2014}";

/// Exported in place of a value that is absent.
pub const ABSENT_CSV_VALUE: &str = "N/A";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellStatus {
    Found,
    Warning,
    NotFound,
    Uncertain,
    Loading,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatrixCell {
    #[serde(default)]
    pub value: Option<String>,
    pub status: CellStatus,
    #[serde(default)]
    pub citation: Option<Citation>,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatrixColumn {
    pub id: String,
    pub label: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    High,
    Medium,
    Low,
}

impl RiskLevel {
    pub fn label(&self) -> &'static str {
        match self {
            RiskLevel::High => "High",
            RiskLevel::Medium => "Medium",
            RiskLevel::Low => "Low",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            RiskLevel::High => "\u{1F534}",
            RiskLevel::Medium => "\u{1F7E1}",
            RiskLevel::Low => "\u{1F7E2}",
        }
    }
}

/// A row's risk level with the free-text justification shown on hover.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub level: RiskLevel,
    #[serde(default)]
    pub reason: String,
}

/// What the risk badge displays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RiskBadge {
    pub emoji: &'static str,
    pub label: &'static str,
    pub tooltip: String,
}

impl RiskAssessment {
    pub fn badge(&self) -> RiskBadge {
        RiskBadge {
            emoji: self.level.emoji(),
            label: self.level.label(),
            tooltip: self.reason.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatrixRow {
    pub document_id: String,
    pub document_title: String,
    /// Cells keyed by column id. A missing key is an absent value.
    #[serde(default)]
    pub cells: BTreeMap<String, MatrixCell>,
    #[serde(default)]
    pub risk: Option<RiskAssessment>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Matrix {
    pub columns: Vec<MatrixColumn>,
    #[serde(default)]
    pub rows: Vec<MatrixRow>,
}

/// Risk counts across all rows, for the header summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RiskSummary {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

impl RiskSummary {
    pub fn total(&self) -> usize {
        self.high + self.medium + self.low
    }
}

/// How a single grid cell presents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CellView {
    pub text: String,
    /// Warning styling (status `warning`).
    pub warning: bool,
    /// Spinner in place of text (status `loading`).
    pub loading: bool,
    /// Low-confidence styling (status `uncertain`).
    pub uncertain: bool,
    /// Clickable chip, same interaction model as inline citations.
    pub chip: Option<CitationChip>,
    pub note: Option<String>,
}

impl MatrixCell {
    pub fn view(&self) -> CellView {
        let value = self.value.clone().unwrap_or_default();
        let chip = self.citation.clone().map(|citation| CitationChip::Resolved {
            display_text: None,
            citation,
        });
        let (text, chip) = match self.status {
            CellStatus::NotFound => (NOT_FOUND_TEXT.to_string(), None),
            CellStatus::Warning => (format!("{} {}", WARNING_GLYPH, value), chip),
            // Extraction still running: any attached citation is provisional.
            CellStatus::Loading => (String::new(), None),
            CellStatus::Found | CellStatus::Uncertain => (value, chip),
        };
        CellView {
            text,
            warning: self.status == CellStatus::Warning,
            loading: self.status == CellStatus::Loading,
            uncertain: self.status == CellStatus::Uncertain,
            chip,
            note: self.note.clone(),
        }
    }
}

impl MatrixRow {
    pub fn cell(&self, column_id: &str) -> Option<&MatrixCell> {
        self.cells.get(column_id)
    }
}

impl Matrix {
    /// Render the cell at `(row, column_id)`; a missing cell renders like
    /// `not_found`.
    pub fn render_cell(&self, row: usize, column_id: &str) -> Option<CellView> {
        let row = self.rows.get(row)?;
        Some(match row.cell(column_id) {
            Some(cell) => cell.view(),
            None => CellView {
                text: NOT_FOUND_TEXT.to_string(),
                warning: false,
                loading: false,
                uncertain: false,
                chip: None,
                note: None,
            },
        })
    }

    pub fn risk_summary(&self) -> RiskSummary {
        let mut summary = RiskSummary::default();
        for risk in self.rows.iter().filter_map(|r| r.risk.as_ref()) {
            match risk.level {
                RiskLevel::High => summary.high += 1,
                RiskLevel::Medium => summary.medium += 1,
                RiskLevel::Low => summary.low += 1,
            }
        }
        summary
    }

    fn has_risk(&self) -> bool {
        self.rows.iter().any(|r| r.risk.is_some())
    }

    /// CSV export: `Document`, one column per matrix column, then
    /// `Risk Level` when any row carries one. Absent values export as `N/A`.
    pub fn to_csv(&self) -> String {
        let with_risk = self.has_risk();

        let mut header = vec![escape_csv_cell("Document")];
        header.extend(self.columns.iter().map(|c| escape_csv_cell(&c.label)));
        if with_risk {
            header.push(escape_csv_cell("Risk Level"));
        }

        let mut lines = vec![header.join(",")];
        for row in &self.rows {
            let mut fields = vec![escape_csv_cell(&row.document_title)];
            for column in &self.columns {
                let value = row
                    .cell(&column.id)
                    .and_then(|cell| cell.value.as_deref())
                    .unwrap_or(ABSENT_CSV_VALUE);
                fields.push(escape_csv_cell(value));
            }
            if with_risk {
                let level = row
                    .risk
                    .as_ref()
                    .map_or(ABSENT_CSV_VALUE, |r| r.level.label());
                fields.push(escape_csv_cell(level));
            }
            lines.push(fields.join(","));
        }
        lines.join("\n")
    }
}
