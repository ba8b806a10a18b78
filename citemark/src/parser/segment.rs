use std::ops::Range;

use tracing::debug;

use crate::document::{Block, BlockKind};

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Split a document into ordered blocks in a single forward pass.
///
/// Every non-blank line lands in exactly one block. Tables, blockquotes and
/// lists are greedy: they consume every following line that continues them.
pub fn segment(source: &str) -> Vec<Block> {
    let lines = split_lines(source);
    let mut state = SegmentState::new(&lines);
    state.run();
    debug!(
        lines = lines.len(),
        blocks = state.blocks.len(),
        "segmented document"
    );
    state.blocks
}

/// Split one pipe-delimited row into trimmed cells, dropping the empty cells
/// produced by leading and trailing pipes.
pub fn split_cells(line: &str) -> Vec<String> {
    cell_spans(line)
        .into_iter()
        .map(|span| line[span].to_string())
        .collect()
}

/// Byte ranges of the trimmed cells [`split_cells`] returns.
pub(crate) fn cell_spans(line: &str) -> Vec<Range<usize>> {
    let mut spans = Vec::new();
    let mut start = 0;
    for part in line.split('|') {
        let lead = part.len() - part.trim_start().len();
        let len = part.trim().len();
        spans.push(start + lead..start + lead + len);
        start += part.len() + 1;
    }
    if spans.first().is_some_and(|s| s.is_empty()) {
        spans.remove(0);
    }
    if spans.last().is_some_and(|s| s.is_empty()) {
        spans.pop();
    }
    spans
}

/// Byte range of a metadata line's content inside its wrapping asterisks.
pub(crate) fn metadata_content(text: &str) -> Range<usize> {
    let lead = text.len() - text.trim_start().len();
    let trimmed = text.trim();
    match trimmed.strip_prefix('*').and_then(|s| s.strip_suffix('*')) {
        Some(inner) => lead + 1..lead + 1 + inner.len(),
        None => lead..lead + trimmed.len(),
    }
}

// ---------------------------------------------------------------------------
// Lines
// ---------------------------------------------------------------------------

/// A source line without its terminator, plus its byte offset.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Line<'a> {
    pub text: &'a str,
    pub start: usize,
}

impl Line<'_> {
    pub fn span(&self) -> Range<usize> {
        self.start..self.start + self.text.len()
    }
}

/// Split on `\n`, tolerating `\r\n`. A trailing newline does not produce an
/// extra empty line.
pub(crate) fn split_lines(source: &str) -> Vec<Line<'_>> {
    let mut lines = Vec::new();
    let mut start = 0;
    for raw in source.split_inclusive('\n') {
        let text = raw.strip_suffix('\n').unwrap_or(raw);
        let text = text.strip_suffix('\r').unwrap_or(text);
        lines.push(Line { text, start });
        start += raw.len();
    }
    lines
}

/// Header level and marker length for `## ` and `### ` lines.
pub(crate) fn header_prefix(text: &str) -> Option<(u8, usize)> {
    if text.starts_with("### ") {
        Some((3, 4))
    } else if text.starts_with("## ") {
        Some((2, 3))
    } else {
        None
    }
}

/// Exactly `---`; surrounding whitespace makes it a paragraph.
pub(crate) fn is_rule(text: &str) -> bool {
    text == "---"
}

pub(crate) fn is_table_line(text: &str) -> bool {
    text.contains('|')
}

/// Marker length stripped from blockquote lines and list items.
pub(crate) const ITEM_PREFIX_LEN: usize = 2;

fn is_blockquote_line(text: &str) -> bool {
    text.starts_with("> ")
}

fn is_list_line(text: &str) -> bool {
    text.starts_with("- ") || text.starts_with("* ")
}

/// A single line wrapped in one asterisk on each side (`*Updated May 2024*`),
/// but not a bold line.
pub(crate) fn is_metadata_line(text: &str) -> bool {
    let text = text.trim();
    text.len() >= 2
        && text.starts_with('*')
        && text.ends_with('*')
        && !text.starts_with("**")
        && !text.ends_with("**")
}

// ---------------------------------------------------------------------------
// Segment state
// ---------------------------------------------------------------------------

struct SegmentState<'a, 'l> {
    lines: &'l [Line<'a>],
    pos: usize,
    blocks: Vec<Block>,
}

impl<'a, 'l> SegmentState<'a, 'l> {
    fn new(lines: &'l [Line<'a>]) -> Self {
        SegmentState {
            lines,
            pos: 0,
            blocks: Vec::new(),
        }
    }

    fn run(&mut self) {
        while self.pos < self.lines.len() {
            let line = self.lines[self.pos];
            let text = line.text;

            if text.trim().is_empty() {
                self.pos += 1;
                continue;
            }

            if is_rule(text) {
                self.push_single(line, BlockKind::Rule);
                continue;
            }

            if let Some((level, prefix)) = header_prefix(text) {
                self.push_single(
                    line,
                    BlockKind::Header {
                        level,
                        content: text[prefix..].to_string(),
                    },
                );
                continue;
            }

            if is_table_line(text) && self.next_is(is_table_line) {
                self.collect_table();
                continue;
            }

            if is_blockquote_line(text) {
                let (run, span) = self.take_run(is_blockquote_line);
                let lines = run
                    .iter()
                    .map(|l| l.text[ITEM_PREFIX_LEN..].to_string())
                    .collect();
                self.blocks.push(Block {
                    kind: BlockKind::Blockquote { lines },
                    span,
                });
                continue;
            }

            if is_list_line(text) {
                let (run, span) = self.take_run(is_list_line);
                let items = run
                    .iter()
                    .map(|l| l.text[ITEM_PREFIX_LEN..].to_string())
                    .collect();
                self.blocks.push(Block {
                    kind: BlockKind::List { items },
                    span,
                });
                continue;
            }

            if is_metadata_line(text) {
                self.push_single(
                    line,
                    BlockKind::Metadata {
                        line: text.to_string(),
                    },
                );
                continue;
            }

            self.push_single(
                line,
                BlockKind::Paragraph {
                    line: text.to_string(),
                },
            );
        }
    }

    fn next_is(&self, pred: fn(&str) -> bool) -> bool {
        self.lines
            .get(self.pos + 1)
            .is_some_and(|next| pred(next.text))
    }

    fn push_single(&mut self, line: Line<'_>, kind: BlockKind) {
        self.blocks.push(Block {
            kind,
            span: line.span(),
        });
        self.pos += 1;
    }

    /// Consume the maximal run of lines starting at the cursor that satisfy `pred`.
    fn take_run(&mut self, pred: fn(&str) -> bool) -> (&'l [Line<'a>], Range<usize>) {
        let lines = self.lines;
        let start = self.pos;
        while self.pos < lines.len() && pred(lines[self.pos].text) {
            self.pos += 1;
        }
        let run = &lines[start..self.pos];
        let span = match (run.first(), run.last()) {
            (Some(first), Some(last)) => first.start..last.span().end,
            _ => 0..0,
        };
        (run, span)
    }

    /// Row 0 is the header, row 1 the separator (discarded), the rest are data rows.
    fn collect_table(&mut self) {
        let (run, span) = self.take_run(is_table_line);
        let headers = run.first().map(|l| split_cells(l.text)).unwrap_or_default();
        let rows = run.iter().skip(2).map(|l| split_cells(l.text)).collect();
        self.blocks.push(Block {
            kind: BlockKind::Table { headers, rows },
            span,
        });
    }
}
