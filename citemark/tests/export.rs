use std::time::{Duration, Instant};

use citemark::export::{
    Clipboard, ClipboardError, CopyAction, MemoryClipboard, WriterClipboard, escape_csv_cell,
    strip_citation_decoration, table_to_csv,
};

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

struct DeniedClipboard;

impl Clipboard for DeniedClipboard {
    fn write_text(&mut self, _text: &str) -> Result<(), ClipboardError> {
        Err(ClipboardError::Denied)
    }
}

#[test]
fn csv_escaping() {
    assert_eq!(escape_csv_cell("Acme, Inc."), "\"Acme, Inc.\"");
    assert_eq!(escape_csv_cell("say \"hi\""), "\"say \"\"hi\"\"\"");
    assert_eq!(escape_csv_cell("two\nlines"), "\"two\nlines\"");
    assert_eq!(escape_csv_cell("plain"), "plain");
}

#[test]
fn citation_decoration_is_stripped() {
    assert_eq!(strip_citation_decoration("[Acme]¹"), "Acme");
    assert_eq!(strip_citation_decoration("[¹²]"), "");
    assert_eq!(strip_citation_decoration("30 days [¹]"), "30 days");
    assert_eq!(strip_citation_decoration("[a]¹ and [b]²"), "a and b");
    assert_eq!(strip_citation_decoration("[not a cite]"), "[not a cite]");
}

#[test]
fn table_export() {
    let headers = strings(&["Vendor", "Term"]);
    let rows = vec![
        strings(&["[Acme, Inc.]¹", "3 years"]),
        strings(&["Globex", "[²]"]),
    ];
    assert_eq!(
        table_to_csv(&headers, &rows),
        "Vendor,Term\n\"Acme, Inc.\",3 years\nGlobex,"
    );
}

#[test]
fn copy_feedback_reverts_after_delay() {
    let mut clipboard = MemoryClipboard::new();
    let mut action = CopyAction::new(Duration::from_secs(2));
    let t0 = Instant::now();

    assert_eq!(action.label(t0), "Copy CSV");
    assert!(action.copy(&mut clipboard, "a,b", t0));
    assert_eq!(clipboard.contents(), Some("a,b"));
    assert!(action.is_copied(t0 + Duration::from_millis(1999)));
    assert_eq!(action.label(t0 + Duration::from_secs(1)), "Copied");
    assert!(!action.is_copied(t0 + Duration::from_secs(2)));
}

#[test]
fn clipboard_failure_is_swallowed() {
    let mut action = CopyAction::new(Duration::from_secs(2));
    let now = Instant::now();
    assert!(!action.copy(&mut DeniedClipboard, "a,b", now));
    assert!(!action.is_copied(now));
}

#[test]
fn writer_clipboard_terminates_line() {
    let mut clipboard = WriterClipboard::new(Vec::new());
    clipboard.write_text("x,y").expect("write");
    assert_eq!(clipboard.into_inner(), b"x,y\n");
}
