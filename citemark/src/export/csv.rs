use crate::document::InlineRun;
use crate::parser::inline::match_citation;

/// Remove citation markup from a cell: `[Acme]¹` becomes `Acme` and a bare
/// `[¹]` disappears. Everything else, bold and italic markers included, is
/// left as written. The result is trimmed.
pub fn strip_citation_decoration(cell: &str) -> String {
    let mut out = String::with_capacity(cell.len());
    let mut pos = 0;
    while pos < cell.len() {
        let rest = &cell[pos..];
        if let Some((run, len)) = match_citation(rest) {
            if let InlineRun::CitationRef {
                display_text: Some(text),
                ..
            } = run
            {
                out.push_str(&text);
            }
            pos += len;
            continue;
        }
        let Some(c) = rest.chars().next() else {
            break;
        };
        out.push(c);
        pos += c.len_utf8();
    }
    out.trim().to_string()
}

/// Quote a value when it contains a comma, a double quote or a line break,
/// doubling any interior quotes.
pub fn escape_csv_cell(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Serialise a table to CSV: header row first, rows separated by `\n`.
pub fn table_to_csv(headers: &[String], rows: &[Vec<String>]) -> String {
    std::iter::once(headers)
        .chain(rows.iter().map(Vec::as_slice))
        .map(csv_row)
        .collect::<Vec<_>>()
        .join("\n")
}

fn csv_row(cells: &[String]) -> String {
    cells
        .iter()
        .map(|cell| escape_csv_cell(&strip_citation_decoration(cell)))
        .collect::<Vec<_>>()
        .join(",")
}
