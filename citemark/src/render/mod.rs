mod html;
mod text;

pub use html::escape_html;

use serde::Serialize;

use crate::citation::{Citation, CitationTable};
use crate::config::RenderConfig;
use crate::document::{BlockKind, InlineRun};
use crate::export::csv::table_to_csv;
use crate::parser::segment::metadata_content;
use crate::parser::{Parser, scan};
use crate::tooltip::{Rect, Size, Tooltip};

/// The rendered form of one document: one node per block, in source order.
///
/// Nodes are positional; a host UI keys them by index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderTree {
    pub nodes: Vec<RenderNode>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RenderNode {
    Header {
        level: u8,
        content: Vec<InlineNode>,
    },
    Rule,
    Table(TableView),
    Blockquote {
        lines: Vec<Vec<InlineNode>>,
    },
    List {
        items: Vec<Vec<InlineNode>>,
    },
    Paragraph {
        content: Vec<InlineNode>,
    },
    /// Italic-styled line; `content` excludes the wrapping asterisks.
    Metadata {
        content: Vec<InlineNode>,
    },
}

/// Inline content with citations resolved against the table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InlineNode {
    Text { text: String },
    Bold { text: String },
    Italic { text: String },
    Warning,
    Citation { chip: CitationChip },
}

/// A citation marker after lookup.
///
/// Unresolved chips keep their number and display text but carry no
/// interaction: they never open a tooltip and never invoke the click callback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CitationChip {
    Resolved {
        display_text: Option<String>,
        citation: Citation,
    },
    Unresolved {
        id: String,
        display_text: Option<String>,
    },
}

impl CitationChip {
    pub fn id(&self) -> &str {
        match self {
            CitationChip::Resolved { citation, .. } => &citation.id,
            CitationChip::Unresolved { id, .. } => id,
        }
    }

    pub fn display_text(&self) -> Option<&str> {
        match self {
            CitationChip::Resolved { display_text, .. }
            | CitationChip::Unresolved { display_text, .. } => display_text.as_deref(),
        }
    }

    pub fn citation(&self) -> Option<&Citation> {
        match self {
            CitationChip::Resolved { citation, .. } => Some(citation),
            CitationChip::Unresolved { .. } => None,
        }
    }

    pub fn is_interactive(&self) -> bool {
        matches!(self, CitationChip::Resolved { .. })
    }

    /// Handle a click: resolved chips pass their full payload to `on_click`.
    /// Returns whether the callback ran.
    pub fn click<F>(&self, mut on_click: F) -> bool
    where
        F: FnMut(&Citation),
    {
        match self.citation() {
            Some(citation) => {
                on_click(citation);
                true
            }
            None => false,
        }
    }

    /// Handle pointer-enter over a chip whose bounding box is `anchor`.
    pub fn hover(&self, anchor: Rect, viewport: Size, config: &RenderConfig) -> Option<Tooltip> {
        self.citation()
            .map(|citation| Tooltip::for_citation(citation, anchor, viewport, config))
    }
}

/// A pipe table with every cell run through the inline scanner, plus the raw
/// cells used for CSV export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableView {
    pub headers: Vec<Vec<InlineNode>>,
    pub rows: Vec<Vec<Vec<InlineNode>>>,
    raw_headers: Vec<String>,
    raw_rows: Vec<Vec<String>>,
}

impl TableView {
    /// CSV text for the "Copy CSV" action, citation decoration stripped.
    pub fn to_csv(&self) -> String {
        table_to_csv(&self.raw_headers, &self.raw_rows)
    }
}

impl RenderTree {
    /// Every citation chip in reading order.
    pub fn citations(&self) -> Vec<&CitationChip> {
        let mut chips = Vec::new();
        for node in &self.nodes {
            node.for_each_line(|line| {
                chips.extend(line.iter().filter_map(|inline| match inline {
                    InlineNode::Citation { chip } => Some(chip),
                    _ => None,
                }));
            });
        }
        chips
    }

    pub fn tables(&self) -> impl Iterator<Item = &TableView> {
        self.nodes.iter().filter_map(|node| match node {
            RenderNode::Table(table) => Some(table),
            _ => None,
        })
    }

    pub fn to_html(&self) -> String {
        html::render_tree(self)
    }

    pub fn to_text(&self) -> String {
        text::render_tree(self)
    }
}

impl RenderNode {
    /// Visit each line of inline content in reading order.
    fn for_each_line<'a>(&'a self, mut visit: impl FnMut(&'a [InlineNode])) {
        match self {
            RenderNode::Header { content, .. }
            | RenderNode::Paragraph { content }
            | RenderNode::Metadata { content } => visit(content),
            RenderNode::Rule => {}
            RenderNode::Table(table) => {
                for cell in table.headers.iter().chain(table.rows.iter().flatten()) {
                    visit(cell);
                }
            }
            RenderNode::Blockquote { lines } => lines.iter().for_each(|l| visit(l)),
            RenderNode::List { items } => items.iter().for_each(|l| visit(l)),
        }
    }
}

// ---------------------------------------------------------------------------
// Renderer
// ---------------------------------------------------------------------------

/// Turns dialect text into a [`RenderTree`] against a fixed citation table.
pub struct Renderer<'c> {
    citations: &'c CitationTable,
}

impl<'c> Renderer<'c> {
    pub fn new(citations: &'c CitationTable) -> Self {
        Renderer { citations }
    }

    /// Render `content`. Pure: no callbacks run and the same input always
    /// yields an equal tree.
    pub fn render(&self, content: &str) -> RenderTree {
        let document = Parser::new(content).parse();
        let nodes = document
            .blocks
            .into_iter()
            .map(|block| self.render_block(block.kind))
            .collect();
        RenderTree { nodes }
    }

    fn render_block(&self, kind: BlockKind) -> RenderNode {
        match kind {
            BlockKind::Header { level, content } => RenderNode::Header {
                level,
                content: self.render_line(&content),
            },
            BlockKind::Rule => RenderNode::Rule,
            BlockKind::Table { headers, rows } => RenderNode::Table(TableView {
                headers: headers.iter().map(|c| self.render_line(c)).collect(),
                rows: rows
                    .iter()
                    .map(|row| row.iter().map(|c| self.render_line(c)).collect())
                    .collect(),
                raw_headers: headers,
                raw_rows: rows,
            }),
            BlockKind::Blockquote { lines } => RenderNode::Blockquote {
                lines: lines.iter().map(|l| self.render_line(l)).collect(),
            },
            BlockKind::List { items } => RenderNode::List {
                items: items.iter().map(|l| self.render_line(l)).collect(),
            },
            BlockKind::Paragraph { line } => RenderNode::Paragraph {
                content: self.render_line(&line),
            },
            BlockKind::Metadata { line } => RenderNode::Metadata {
                content: self.render_line(&line[metadata_content(&line)]),
            },
        }
    }

    /// Scan one line and resolve its citation markers.
    pub fn render_line(&self, line: &str) -> Vec<InlineNode> {
        scan(line)
            .into_iter()
            .map(|run| self.resolve_run(run))
            .collect()
    }

    fn resolve_run(&self, run: InlineRun) -> InlineNode {
        match run {
            InlineRun::Text { text } => InlineNode::Text { text },
            InlineRun::Bold { text } => InlineNode::Bold { text },
            InlineRun::Italic { text } => InlineNode::Italic { text },
            InlineRun::Warning => InlineNode::Warning,
            InlineRun::CitationRef {
                citation_id,
                display_text,
            } => {
                let chip = match self.citations.resolve(&citation_id) {
                    Some(citation) => CitationChip::Resolved {
                        display_text,
                        citation: citation.clone(),
                    },
                    None => CitationChip::Unresolved {
                        id: citation_id,
                        display_text,
                    },
                };
                InlineNode::Citation { chip }
            }
        }
    }
}
