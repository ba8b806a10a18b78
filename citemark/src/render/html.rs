use std::fmt::Write;

use super::{CitationChip, InlineNode, RenderNode, RenderTree, TableView};
use crate::document::WARNING_GLYPH;

/// Escape text for use in HTML element content and quoted attributes.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

pub(super) fn render_tree(tree: &RenderTree) -> String {
    let mut out = String::new();
    for (key, node) in tree.nodes.iter().enumerate() {
        render_node(&mut out, key, node);
        out.push('\n');
    }
    out
}

fn render_node(out: &mut String, key: usize, node: &RenderNode) {
    match node {
        RenderNode::Header { level, content } => {
            let _ = write!(out, "<h{} data-key=\"{}\">", level, key);
            render_inlines(out, content);
            let _ = write!(out, "</h{}>", level);
        }
        RenderNode::Rule => {
            let _ = write!(out, "<hr data-key=\"{}\">", key);
        }
        RenderNode::Table(table) => render_table(out, key, table),
        RenderNode::Blockquote { lines } => {
            let _ = write!(out, "<blockquote data-key=\"{}\">", key);
            for (i, line) in lines.iter().enumerate() {
                if i > 0 {
                    out.push_str("<br>");
                }
                render_inlines(out, line);
            }
            out.push_str("</blockquote>");
        }
        RenderNode::List { items } => {
            let _ = write!(out, "<ul data-key=\"{}\">", key);
            for item in items {
                out.push_str("<li>");
                render_inlines(out, item);
                out.push_str("</li>");
            }
            out.push_str("</ul>");
        }
        RenderNode::Paragraph { content } => {
            let _ = write!(out, "<p data-key=\"{}\">", key);
            render_inlines(out, content);
            out.push_str("</p>");
        }
        RenderNode::Metadata { content } => {
            let _ = write!(out, "<p class=\"metadata\" data-key=\"{}\"><em>", key);
            render_inlines(out, content);
            out.push_str("</em></p>");
        }
    }
}

fn render_table(out: &mut String, key: usize, table: &TableView) {
    let _ = write!(
        out,
        "<div class=\"table\" data-key=\"{}\"><button class=\"copy-csv\" data-csv=\"{}\">Copy CSV</button><table><thead><tr>",
        key,
        escape_html(&table.to_csv())
    );
    for header in &table.headers {
        out.push_str("<th>");
        render_inlines(out, header);
        out.push_str("</th>");
    }
    out.push_str("</tr></thead><tbody>");
    for row in &table.rows {
        out.push_str("<tr>");
        for cell in row {
            out.push_str("<td>");
            render_inlines(out, cell);
            out.push_str("</td>");
        }
        out.push_str("</tr>");
    }
    out.push_str("</tbody></table></div>");
}

fn render_inlines(out: &mut String, inlines: &[InlineNode]) {
    for inline in inlines {
        match inline {
            InlineNode::Text { text } => out.push_str(&escape_html(text)),
            InlineNode::Bold { text } => {
                let _ = write!(out, "<strong>{}</strong>", escape_html(text));
            }
            InlineNode::Italic { text } => {
                let _ = write!(out, "<em>{}</em>", escape_html(text));
            }
            InlineNode::Warning => {
                let _ = write!(out, "<span class=\"warning\">{}</span>", WARNING_GLYPH);
            }
            InlineNode::Citation { chip } => render_chip(out, chip),
        }
    }
}

fn render_chip(out: &mut String, chip: &CitationChip) {
    if let Some(text) = chip.display_text() {
        out.push_str(&escape_html(text));
    }
    match chip {
        CitationChip::Resolved { citation, .. } => {
            let _ = write!(
                out,
                "<button class=\"citation\" data-citation-id=\"{}\" data-document-id=\"{}\" title=\"{}\">{}</button>",
                escape_html(&citation.id),
                escape_html(&citation.document_id),
                escape_html(&citation.document_title),
                escape_html(&citation.id)
            );
        }
        CitationChip::Unresolved { id, .. } => {
            let _ = write!(
                out,
                "<span class=\"citation unresolved\">{}</span>",
                escape_html(id)
            );
        }
    }
}
