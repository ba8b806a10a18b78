use std::collections::BTreeMap;

use citemark::Citation;
use citemark::matrix::{
    CellStatus, Matrix, MatrixCell, MatrixColumn, MatrixRow, RiskAssessment, RiskLevel,
    RiskSummary,
};

fn cell(value: Option<&str>, status: CellStatus) -> MatrixCell {
    MatrixCell {
        value: value.map(String::from),
        status,
        citation: None,
        note: None,
    }
}

fn row(title: &str, cells: Vec<(&str, MatrixCell)>, risk: Option<RiskLevel>) -> MatrixRow {
    MatrixRow {
        document_id: title.to_lowercase(),
        document_title: title.into(),
        cells: cells
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect::<BTreeMap<_, _>>(),
        risk: risk.map(|level| RiskAssessment {
            level,
            reason: "uncapped liability".into(),
        }),
    }
}

fn sample() -> Matrix {
    Matrix {
        columns: vec![
            MatrixColumn {
                id: "party".into(),
                label: "Counterparty".into(),
            },
            MatrixColumn {
                id: "cap".into(),
                label: "Liability Cap".into(),
            },
        ],
        rows: vec![
            row(
                "MSA",
                vec![
                    ("party", cell(Some("Acme, Inc."), CellStatus::Found)),
                    ("cap", cell(None, CellStatus::NotFound)),
                ],
                Some(RiskLevel::High),
            ),
            row(
                "SOW",
                vec![("party", cell(Some(""), CellStatus::Uncertain))],
                Some(RiskLevel::Low),
            ),
            row("NDA", vec![], Some(RiskLevel::High)),
        ],
    }
}

#[test]
fn risk_summary_counts_levels() {
    assert_eq!(
        sample().risk_summary(),
        RiskSummary {
            high: 2,
            medium: 0,
            low: 1
        }
    );
}

#[test]
fn csv_uses_na_for_absent_values_only() {
    assert_eq!(
        sample().to_csv(),
        "Document,Counterparty,Liability Cap,Risk Level\n\
         MSA,\"Acme, Inc.\",N/A,High\n\
         SOW,,N/A,Low\n\
         NDA,N/A,N/A,High"
    );
}

#[test]
fn not_found_suppresses_citation() {
    let mut c = cell(Some("ignored"), CellStatus::NotFound);
    c.citation = Some(Citation {
        id: "1".into(),
        document_id: "d".into(),
        document_title: "D".into(),
        section: String::new(),
        excerpt: String::new(),
    });
    let view = c.view();
    assert_eq!(view.text, "\u{2014}");
    assert!(view.chip.is_none());
}

#[test]
fn warning_prefixes_glyph() {
    let view = cell(Some("Auto-renews"), CellStatus::Warning).view();
    assert_eq!(view.text, "⚠️ Auto-renews");
    assert!(view.warning);
}

#[test]
fn found_cell_with_citation_is_clickable() {
    let mut c = cell(Some("Net 30"), CellStatus::Found);
    c.citation = Some(Citation {
        id: "4".into(),
        document_id: "d".into(),
        document_title: "D".into(),
        section: String::new(),
        excerpt: String::new(),
    });
    let view = c.view();
    let chip = view.chip.expect("chip");
    let mut clicked = None;
    assert!(chip.click(|citation| clicked = Some(citation.id.clone())));
    assert_eq!(clicked.as_deref(), Some("4"));
}

#[test]
fn missing_cell_renders_as_not_found() {
    let view = sample().render_cell(2, "cap").expect("row exists");
    assert_eq!(view.text, "\u{2014}");
    assert!(sample().render_cell(9, "cap").is_none());
}

#[test]
fn badge_carries_reason() {
    let badge = RiskAssessment {
        level: RiskLevel::Medium,
        reason: "short notice period".into(),
    }
    .badge();
    assert_eq!(badge.label, "Medium");
    assert_eq!(badge.emoji, "\u{1F7E1}");
    assert_eq!(badge.tooltip, "short notice period");
}

#[test]
fn matrix_deserializes_from_toml() {
    let matrix: Matrix = toml::from_str(
        r#"
        [[columns]]
        id = "term"
        label = "Term"

        [[rows]]
        document_id = "msa"
        document_title = "MSA"
        risk = { level = "medium", reason = "renewal" }

        [rows.cells.term]
        value = "3 years"
        status = "not_found"
        "#,
    )
    .expect("parse matrix");
    assert_eq!(matrix.rows[0].cells["term"].status, CellStatus::NotFound);
    assert_eq!(matrix.risk_summary().medium, 1);
}

#[test]
fn uncertain_cells_are_flagged_and_keep_their_chip() {
    let mut uncertain = cell(Some("Delaware"), CellStatus::Uncertain);
    uncertain.citation = Some(Citation {
        id: "3".into(),
        document_id: "msa".into(),
        document_title: "MSA".into(),
        section: "§14".into(),
        excerpt: String::new(),
    });
    let view = uncertain.view();
    assert!(view.uncertain);
    assert!(!view.warning && !view.loading);
    assert_eq!(view.text, "Delaware");
    assert_eq!(view.chip.map(|c| c.id().to_string()), Some("3".to_string()));

    assert!(!cell(Some("Delaware"), CellStatus::Found).view().uncertain);
    assert!(!sample().render_cell(2, "party").unwrap().uncertain);
}
