//! Non-fatal diagnostics for dialect documents.
//!
//! Rendering never fails; these checks point at constructs that degrade
//! silently (unresolved citations, pipe lines that fall back to paragraphs,
//! ragged tables) so authors can fix them.

use std::ops::Range;

use codespan_reporting::diagnostic::{Diagnostic, Label, Severity};

use crate::citation::CitationTable;
use crate::document::{BlockKind, InlineRun};
use crate::parser::inline::scan_spanned;
use crate::parser::segment::{
    ITEM_PREFIX_LEN, Line, cell_spans, header_prefix, is_table_line, metadata_content, segment,
    split_cells, split_lines,
};

/// One lint finding with its source location.
#[derive(Debug, Clone)]
pub struct LintDiagnostic {
    pub message: String,
    pub span: Range<usize>,
    pub file_id: usize,
    pub severity: Severity,
    pub notes: Vec<String>,
}

impl LintDiagnostic {
    pub fn warning(message: impl Into<String>, span: Range<usize>, file_id: usize) -> Self {
        LintDiagnostic {
            message: message.into(),
            span,
            file_id,
            severity: Severity::Warning,
            notes: Vec::new(),
        }
    }

    pub fn note(message: impl Into<String>, span: Range<usize>, file_id: usize) -> Self {
        LintDiagnostic {
            message: message.into(),
            span,
            file_id,
            severity: Severity::Note,
            notes: Vec::new(),
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn is_warning(&self) -> bool {
        matches!(
            self.severity,
            Severity::Warning | Severity::Error | Severity::Bug
        )
    }

    /// Convert to a codespan-reporting Diagnostic for display.
    pub fn to_diagnostic(&self) -> Diagnostic<usize> {
        Diagnostic::new(self.severity)
            .with_message(&self.message)
            .with_labels(vec![Label::primary(self.file_id, self.span.clone())])
            .with_notes(self.notes.clone())
    }
}

/// Check `source` against `citations`. Findings are ordered by position.
pub fn lint(source: &str, citations: &CitationTable, file_id: usize) -> Vec<LintDiagnostic> {
    let lines = split_lines(source);
    let mut out = Vec::new();

    for block in segment(source) {
        let block_lines: Vec<Line<'_>> = lines
            .iter()
            .copied()
            .filter(|l| block.span.contains(&l.start))
            .collect();
        match &block.kind {
            BlockKind::Table { headers, .. } => {
                check_table(&block_lines, headers.len(), file_id, &mut out);
            }
            BlockKind::Paragraph { line } if is_table_line(line) => {
                out.push(
                    LintDiagnostic::note(
                        "pipe-delimited line rendered as a paragraph",
                        block.span.clone(),
                        file_id,
                    )
                    .with_note("a table needs a header row followed by a separator row"),
                );
            }
            _ => {}
        }

        for span in inline_spans(&block.kind, &block_lines) {
            check_citations(&source[span.clone()], span.start, citations, file_id, &mut out);
        }
    }

    out.sort_by_key(|d| d.span.start);
    out
}

/// Source ranges the renderer scans for inline runs: header text after its
/// marker, each table cell outside the separator row, blockquote lines and
/// list items after their prefix, metadata inside its asterisks.
fn inline_spans(kind: &BlockKind, lines: &[Line<'_>]) -> Vec<Range<usize>> {
    match kind {
        BlockKind::Rule => Vec::new(),
        BlockKind::Header { .. } => lines
            .iter()
            .filter_map(|l| header_prefix(l.text).map(|(_, len)| shift(l, len..l.text.len())))
            .collect(),
        BlockKind::Table { .. } => lines
            .iter()
            .enumerate()
            .filter(|&(i, _)| i != 1)
            .flat_map(|(_, l)| cell_spans(l.text).into_iter().map(move |r| shift(l, r)))
            .collect(),
        BlockKind::Blockquote { .. } | BlockKind::List { .. } => lines
            .iter()
            .map(|l| shift(l, ITEM_PREFIX_LEN..l.text.len()))
            .collect(),
        BlockKind::Paragraph { .. } => lines.iter().map(Line::span).collect(),
        BlockKind::Metadata { .. } => lines
            .iter()
            .map(|l| shift(l, metadata_content(l.text)))
            .collect(),
    }
}

/// Move a range within `line` to a range within the whole source.
fn shift(line: &Line<'_>, range: Range<usize>) -> Range<usize> {
    line.start + range.start..line.start + range.end
}

fn check_citations(
    text: &str,
    offset: usize,
    citations: &CitationTable,
    file_id: usize,
    out: &mut Vec<LintDiagnostic>,
) {
    for (run, range) in scan_spanned(text) {
        let InlineRun::CitationRef { citation_id, .. } = run else {
            continue;
        };
        if citations.resolve(&citation_id).is_none() {
            out.push(
                LintDiagnostic::warning(
                    format!("unresolved citation {}", citation_id),
                    offset + range.start..offset + range.end,
                    file_id,
                )
                .with_note("rendered as a plain numbered chip without tooltip or click"),
            );
        }
    }
}

fn check_table(
    lines: &[Line<'_>],
    columns: usize,
    file_id: usize,
    out: &mut Vec<LintDiagnostic>,
) {
    if let Some(sep) = lines.get(1) {
        if !is_separator_row(sep.text) {
            out.push(
                LintDiagnostic::warning(
                    "second table row is not a separator row",
                    sep.span(),
                    file_id,
                )
                .with_note("the second row of a table is always discarded"),
            );
        }
    }
    for row in lines.iter().skip(2) {
        let found = split_cells(row.text).len();
        if found != columns {
            out.push(LintDiagnostic::warning(
                format!("table row has {} cells, header has {}", found, columns),
                row.span(),
                file_id,
            ));
        }
    }
}

fn is_separator_row(text: &str) -> bool {
    text.contains('-')
        && text
            .chars()
            .all(|c| matches!(c, '-' | ':' | '|' | ' ' | '\t'))
}
