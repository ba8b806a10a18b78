use std::fmt;
use std::ops::Range;

use serde::Serialize;

use crate::citation::id_to_superscripts;

/// The warning glyph recognised inline: U+26A0 followed by the emoji presentation selector.
pub const WARNING_GLYPH: &str = "\u{26A0}\u{FE0F}";

/// A segmented document: the ordered blocks of one render pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Document {
    pub blocks: Vec<Block>,
}

impl Document {
    pub fn empty() -> Self {
        Document { blocks: Vec::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Iterate over every table block as `(headers, rows)`.
    pub fn tables(&self) -> impl Iterator<Item = (&[String], &[Vec<String>])> {
        self.blocks.iter().filter_map(|block| match &block.kind {
            BlockKind::Table { headers, rows } => Some((headers.as_slice(), rows.as_slice())),
            _ => None,
        })
    }
}

/// One structural unit of the document with the byte range of the lines it covers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Block {
    pub kind: BlockKind,
    pub span: Range<usize>,
}

/// Block-level constructs of the dialect. Text is kept raw; inline scanning
/// happens at render time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BlockKind {
    Header { level: u8, content: String },
    Rule,
    Table {
        headers: Vec<String>,
        rows: Vec<Vec<String>>,
    },
    Blockquote { lines: Vec<String> },
    List { items: Vec<String> },
    Paragraph { line: String },
    /// A whole line wrapped in single asterisks, rendered italic.
    Metadata { line: String },
}

impl BlockKind {
    /// Lower-case name of the construct, as used in serialized output.
    pub fn name(&self) -> &'static str {
        match self {
            BlockKind::Header { .. } => "header",
            BlockKind::Rule => "rule",
            BlockKind::Table { .. } => "table",
            BlockKind::Blockquote { .. } => "blockquote",
            BlockKind::List { .. } => "list",
            BlockKind::Paragraph { .. } => "paragraph",
            BlockKind::Metadata { .. } => "metadata",
        }
    }
}

/// One styled or interactive span within a single line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InlineRun {
    Text { text: String },
    Bold { text: String },
    Italic { text: String },
    CitationRef {
        citation_id: String,
        display_text: Option<String>,
    },
    Warning,
}

impl InlineRun {
    pub fn text(s: impl Into<String>) -> Self {
        InlineRun::Text { text: s.into() }
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, block) in self.blocks.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", block)?;
        }
        Ok(())
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockKind::Header { level, content } => {
                for _ in 0..*level {
                    write!(f, "#")?;
                }
                writeln!(f, " {}", content)
            }
            BlockKind::Rule => writeln!(f, "---"),
            BlockKind::Table { headers, rows } => {
                write_table_row(f, headers)?;
                write!(f, "|")?;
                for _ in headers {
                    write!(f, "---|")?;
                }
                writeln!(f)?;
                for row in rows {
                    write_table_row(f, row)?;
                }
                Ok(())
            }
            BlockKind::Blockquote { lines } => {
                for line in lines {
                    writeln!(f, "> {}", line)?;
                }
                Ok(())
            }
            BlockKind::List { items } => {
                for item in items {
                    writeln!(f, "- {}", item)?;
                }
                Ok(())
            }
            BlockKind::Paragraph { line } | BlockKind::Metadata { line } => writeln!(f, "{}", line),
        }
    }
}

fn write_table_row(f: &mut fmt::Formatter<'_>, cells: &[String]) -> fmt::Result {
    write!(f, "|")?;
    for cell in cells {
        write!(f, " {} |", cell)?;
    }
    writeln!(f)
}

impl fmt::Display for InlineRun {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InlineRun::Text { text } => write!(f, "{}", text),
            InlineRun::Bold { text } => write!(f, "**{}**", text),
            InlineRun::Italic { text } => write!(f, "*{}*", text),
            InlineRun::CitationRef {
                citation_id,
                display_text,
            } => {
                let sup = id_to_superscripts(citation_id).unwrap_or_default();
                match display_text {
                    Some(text) => write!(f, "[{}]{}", text, sup),
                    None => write!(f, "[{}]", sup),
                }
            }
            InlineRun::Warning => write!(f, "{}", WARNING_GLYPH),
        }
    }
}
