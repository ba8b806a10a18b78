use citemark::render::{CitationChip, InlineNode, RenderNode};
use citemark::tooltip::{Rect, Size};
use citemark::{Citation, CitationTable, RenderConfig, Renderer, render};

fn msa() -> Citation {
    Citation {
        id: "1".into(),
        document_id: "doc-msa".into(),
        document_title: "MSA".into(),
        section: "§4.2".into(),
        excerpt: "Either party may terminate for convenience with 30 days notice.".into(),
    }
}

fn table() -> CitationTable {
    [msa()].into_iter().collect()
}

fn paragraph(tree: &citemark::RenderTree) -> &[InlineNode] {
    match &tree.nodes[0] {
        RenderNode::Paragraph { content } => content,
        other => panic!("expected paragraph, got {:?}", other),
    }
}

#[test]
fn resolved_citation_carries_payload() {
    let citations = table();
    let tree = render("See [Section 1]¹ for terms.", &citations);
    let chips = tree.citations();
    assert_eq!(chips.len(), 1);
    assert_eq!(chips[0].id(), "1");
    assert_eq!(chips[0].display_text(), Some("Section 1"));
    assert_eq!(chips[0].citation(), Some(&msa()));
    assert!(chips[0].is_interactive());
}

#[test]
fn unresolved_citation_degrades_to_plain_chip() {
    let tree = render("See [Section 1]¹ for terms.", &CitationTable::new());
    let content = paragraph(&tree);
    assert_eq!(
        content[1],
        InlineNode::Citation {
            chip: CitationChip::Unresolved {
                id: "1".into(),
                display_text: Some("Section 1".into()),
            }
        }
    );

    let chip = tree.citations()[0];
    let mut clicked = 0;
    assert!(!chip.click(|_| clicked += 1));
    assert_eq!(clicked, 0);
    let config = RenderConfig::default();
    assert!(
        chip.hover(Rect::new(10.0, 10.0, 12.0, 12.0), Size::new(1000.0, 800.0), &config)
            .is_none()
    );
}

#[test]
fn click_passes_full_citation() {
    let citations = table();
    let tree = render("Terminate on notice [¹].", &citations);
    let mut seen = Vec::new();
    assert!(tree.citations()[0].click(|c| seen.push(c.clone())));
    assert_eq!(seen, vec![msa()]);
}

#[test]
fn hover_builds_truncated_tooltip() {
    let mut citation = msa();
    citation.excerpt = "x".repeat(150);
    let citations: CitationTable = [citation].into_iter().collect();
    let tree = render("[¹]", &citations);
    let config = RenderConfig::default();
    let tooltip = tree.citations()[0]
        .hover(
            Rect::new(960.0, 100.0, 14.0, 14.0),
            Size::new(1000.0, 800.0),
            &config,
        )
        .expect("resolved chip has a tooltip");
    assert_eq!(tooltip.document_title, "MSA");
    assert_eq!(tooltip.excerpt, format!("{}...", "x".repeat(100)));
    assert!(tooltip.position.left <= 1000.0 - config.tooltip_width - 16.0);
}

#[test]
fn rendering_is_deterministic() {
    let citations = table();
    let content = "## Overview\n| Party | Term |\n|---|---|\n| [Acme]¹ | 3 years |\n> **Note** [²]\n- ⚠️ auto-renews\n*Generated*";
    let first = Renderer::new(&citations).render(content);
    let second = Renderer::new(&citations).render(content);
    assert_eq!(first, second);
    assert_eq!(first.to_html(), second.to_html());
}

#[test]
fn table_cells_are_scanned() {
    let citations = table();
    let tree = render("| Party | Fee |\n|---|---|\n| [Acme]¹ | **$10** |", &citations);
    let view = tree.tables().next().expect("one table");
    assert_eq!(view.headers.len(), 2);
    assert!(matches!(
        &view.rows[0][0][0],
        InlineNode::Citation { chip: CitationChip::Resolved { .. } }
    ));
    assert_eq!(
        view.rows[0][1],
        vec![InlineNode::Bold {
            text: "$10".into()
        }]
    );
    assert_eq!(view.to_csv(), "Party,Fee\nAcme,**$10**");
}

#[test]
fn metadata_renders_inner_text() {
    let tree = render("*Based on 3 agreements*", &CitationTable::new());
    assert_eq!(
        tree.nodes,
        vec![RenderNode::Metadata {
            content: vec![InlineNode::Text {
                text: "Based on 3 agreements".into()
            }]
        }]
    );
}

#[test]
fn html_output_escapes_and_marks_chips() {
    let citations = table();
    let html = render("a < b [x]¹ [²]", &citations).to_html();
    assert_eq!(
        html,
        "<p data-key=\"0\">a &lt; b x<button class=\"citation\" data-citation-id=\"1\" data-document-id=\"doc-msa\" title=\"MSA\">1</button> <span class=\"citation unresolved\">2</span></p>\n"
    );
}

#[test]
fn text_output_strips_markup() {
    let citations = table();
    let text = render("## Terms\n**Fee** is due [Net 30]¹.\n- one\n- two", &citations).to_text();
    assert_eq!(text, "Terms\n\nFee is due Net 30[1].\n\n• one\n• two");
}

#[test]
fn json_tree_is_tagged() {
    let tree = render("---", &CitationTable::new());
    let json = serde_json::to_value(&tree).expect("serialize");
    assert_eq!(json["nodes"][0]["type"], "rule");
}

#[test]
fn indented_metadata_keeps_citation_chip() {
    let tree = render("  *Source: [MSA]¹ reviewed*", &table());
    let ids: Vec<&str> = tree.citations().into_iter().map(|c| c.id()).collect();
    assert_eq!(ids, vec!["1"]);
    assert!(matches!(tree.nodes[0], RenderNode::Metadata { .. }));
}
