use citemark::lint::lint;
use citemark::{Citation, CitationTable};
use codespan_reporting::diagnostic::Severity;

fn table() -> CitationTable {
    [Citation {
        id: "1".into(),
        document_id: "msa".into(),
        document_title: "MSA".into(),
        section: String::new(),
        excerpt: String::new(),
    }]
    .into_iter()
    .collect()
}

#[test]
fn clean_document_has_no_findings() {
    assert!(lint("## Terms\nSee [MSA]¹.\n| a | b |\n|---|---|\n| 1 | 2 |", &table(), 0).is_empty());
}

#[test]
fn unresolved_citation_points_at_marker() {
    let source = "ok [¹]\nbad [Fee]²";
    let findings = lint(source, &table(), 0);
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].severity, Severity::Warning);
    assert_eq!(&source[findings[0].span.clone()], "[Fee]²");
    assert!(findings[0].message.contains("unresolved citation 2"));
}

#[test]
fn degenerate_table_is_a_note() {
    let findings = lint("a | b\n\nplain", &table(), 0);
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].severity, Severity::Note);
    assert!(!findings[0].is_warning());
}

#[test]
fn ragged_rows_and_bad_separator() {
    let source = "| a | b |\n| x | y |\n| 1 |";
    let findings = lint(source, &table(), 0);
    let messages: Vec<&str> = findings.iter().map(|d| d.message.as_str()).collect();
    assert_eq!(
        messages,
        vec![
            "second table row is not a separator row",
            "table row has 1 cells, header has 2",
        ]
    );
}

#[test]
fn unresolved_citation_inside_metadata_line() {
    let source = "*Source: [MSA]⁹ reviewed*";
    let findings = lint(source, &CitationTable::new(), 0);
    assert_eq!(findings.len(), 1);
    assert!(findings[0].message.contains("unresolved citation 9"));
    assert_eq!(&source[findings[0].span.clone()], "[MSA]⁹");
}

#[test]
fn unresolved_citation_inside_asterisk_list_item() {
    let source = "intro\n* see [Fee]² *now*";
    let findings = lint(source, &CitationTable::new(), 0);
    assert_eq!(findings.len(), 1);
    assert!(findings[0].message.contains("unresolved citation 2"));
    assert_eq!(&source[findings[0].span.clone()], "[Fee]²");
}

#[test]
fn lint_agrees_with_rendered_chips() {
    let source = "## Fees [³]\n\
                  | Term | Source |\n\
                  |---|---|\n\
                  | Cap | [Cap]⁴ |\n\
                  > quoted [¹] and [⁵]\n\
                  - item [Fee]⁶\n\
                  *Updated [⁷]*";
    let table = table();
    let unresolved: Vec<String> = citemark::render(source, &table)
        .citations()
        .into_iter()
        .filter(|chip| !chip.is_interactive())
        .map(|chip| chip.id().to_string())
        .collect();
    let linted: Vec<String> = lint(source, &table, 0)
        .iter()
        .filter_map(|d| d.message.strip_prefix("unresolved citation ").map(String::from))
        .collect();
    assert_eq!(unresolved, vec!["3", "4", "5", "6", "7"]);
    assert_eq!(linted, unresolved);
}

#[test]
fn discarded_separator_row_is_not_scanned() {
    let source = "| a | b |\n| [⁸] | x |\n| 1 | 2 |";
    let findings = lint(source, &table(), 0);
    assert!(findings.iter().all(|d| !d.message.contains("unresolved")));
}
