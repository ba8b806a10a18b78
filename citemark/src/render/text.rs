use super::{InlineNode, RenderNode, RenderTree};
use crate::document::WARNING_GLYPH;

/// Plain-text rendering: markup removed, chips shown as `[n]`, blocks
/// separated by a blank line.
pub(super) fn render_tree(tree: &RenderTree) -> String {
    let blocks: Vec<String> = tree.nodes.iter().map(render_node).collect();
    blocks.join("\n\n")
}

fn render_node(node: &RenderNode) -> String {
    match node {
        RenderNode::Header { content, .. }
        | RenderNode::Paragraph { content }
        | RenderNode::Metadata { content } => render_inlines(content),
        RenderNode::Rule => "----".to_string(),
        RenderNode::Table(table) => {
            let mut lines = vec![join_cells(&table.headers)];
            lines.extend(table.rows.iter().map(|row| join_cells(row)));
            lines.join("\n")
        }
        RenderNode::Blockquote { lines } => lines
            .iter()
            .map(|line| format!("  {}", render_inlines(line)))
            .collect::<Vec<_>>()
            .join("\n"),
        RenderNode::List { items } => items
            .iter()
            .map(|item| format!("• {}", render_inlines(item)))
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

fn join_cells(cells: &[Vec<InlineNode>]) -> String {
    cells
        .iter()
        .map(|cell| render_inlines(cell))
        .collect::<Vec<_>>()
        .join("\t")
}

fn render_inlines(inlines: &[InlineNode]) -> String {
    let mut out = String::new();
    for inline in inlines {
        match inline {
            InlineNode::Text { text } | InlineNode::Bold { text } | InlineNode::Italic { text } => {
                out.push_str(text)
            }
            InlineNode::Warning => out.push_str(WARNING_GLYPH),
            InlineNode::Citation { chip } => {
                if let Some(text) = chip.display_text() {
                    out.push_str(text);
                }
                out.push('[');
                out.push_str(chip.id());
                out.push(']');
            }
        }
    }
    out
}
