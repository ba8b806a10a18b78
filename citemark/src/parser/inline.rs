use std::ops::Range;

use crate::citation::{is_superscript_digit, superscripts_to_id};
use crate::document::{InlineRun, WARNING_GLYPH};

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Scan one line into inline runs in reading order.
pub fn scan(line: &str) -> Vec<InlineRun> {
    scan_spanned(line).into_iter().map(|(run, _)| run).collect()
}

/// Scan one line, keeping the byte range each run was produced from.
///
/// The ranges are contiguous and cover the whole line, so concatenating the
/// source slices reproduces the input exactly.
pub fn scan_spanned(line: &str) -> Vec<(InlineRun, Range<usize>)> {
    let mut lexer = Lexer::new(line);
    lexer.run();
    lexer.runs
}

// ---------------------------------------------------------------------------
// Lexer
// ---------------------------------------------------------------------------

/// Explicit single-pass lexer. At each position the constructs are tried in
/// priority order: bold, italic, citation with text, bare citation, warning
/// glyph. Each matcher scans forward at most to its closing delimiter and
/// never backtracks.
struct Lexer<'a> {
    src: &'a str,
    pos: usize,
    text_start: usize,
    runs: Vec<(InlineRun, Range<usize>)>,
}

impl<'a> Lexer<'a> {
    fn new(src: &'a str) -> Self {
        Lexer {
            src,
            pos: 0,
            text_start: 0,
            runs: Vec::new(),
        }
    }

    fn run(&mut self) {
        while self.pos < self.src.len() {
            let rest = &self.src[self.pos..];
            match match_construct(rest) {
                Some((run, len)) => {
                    self.flush_text();
                    self.runs.push((run, self.pos..self.pos + len));
                    self.pos += len;
                    self.text_start = self.pos;
                }
                None => {
                    let width = rest.chars().next().map_or(1, char::len_utf8);
                    self.pos += width;
                }
            }
        }
        self.flush_text();
    }

    fn flush_text(&mut self) {
        if self.text_start < self.pos {
            let text = &self.src[self.text_start..self.pos];
            self.runs
                .push((InlineRun::text(text), self.text_start..self.pos));
        }
        self.text_start = self.pos;
    }
}

/// Try every construct at the start of `rest`; returns the run and its byte length.
fn match_construct(rest: &str) -> Option<(InlineRun, usize)> {
    match_bold(rest)
        .or_else(|| match_italic(rest))
        .or_else(|| match_citation_with_text(rest))
        .or_else(|| match_bare_citation(rest))
        .or_else(|| match_warning(rest))
}

/// `**text**` where text is non-empty and contains no `*`.
fn match_bold(rest: &str) -> Option<(InlineRun, usize)> {
    let inner = rest.strip_prefix("**")?;
    let close = inner.find('*')?;
    if close == 0 || !inner[close..].starts_with("**") {
        return None;
    }
    let text = inner[..close].to_string();
    Some((InlineRun::Bold { text }, close + 4))
}

/// `*text*` where text is non-empty and contains no `*`.
fn match_italic(rest: &str) -> Option<(InlineRun, usize)> {
    let inner = rest.strip_prefix('*')?;
    let close = inner.find('*')?;
    if close == 0 {
        return None;
    }
    let text = inner[..close].to_string();
    Some((InlineRun::Italic { text }, close + 2))
}

/// `[display text]¹²`: non-empty text without `]`, then one or more superscripts.
fn match_citation_with_text(rest: &str) -> Option<(InlineRun, usize)> {
    let inner = rest.strip_prefix('[')?;
    let close = inner.find(']')?;
    if close == 0 {
        return None;
    }
    let after = &inner[close + 1..];
    let sup_len = superscript_prefix_len(after);
    let citation_id = superscripts_to_id(&after[..sup_len])?;
    let display_text = Some(inner[..close].to_string());
    Some((
        InlineRun::CitationRef {
            citation_id,
            display_text,
        },
        1 + close + 1 + sup_len,
    ))
}

/// `[¹²]`: one or more superscripts inside brackets.
fn match_bare_citation(rest: &str) -> Option<(InlineRun, usize)> {
    let inner = rest.strip_prefix('[')?;
    let sup_len = superscript_prefix_len(inner);
    let citation_id = superscripts_to_id(&inner[..sup_len])?;
    if !inner[sup_len..].starts_with(']') {
        return None;
    }
    Some((
        InlineRun::CitationRef {
            citation_id,
            display_text: None,
        },
        1 + sup_len + 1,
    ))
}

fn match_warning(rest: &str) -> Option<(InlineRun, usize)> {
    rest.starts_with(WARNING_GLYPH)
        .then(|| (InlineRun::Warning, WARNING_GLYPH.len()))
}

/// Byte length of the leading run of superscript digits.
fn superscript_prefix_len(s: &str) -> usize {
    s.char_indices()
        .find(|&(_, c)| !is_superscript_digit(c))
        .map_or(s.len(), |(i, _)| i)
}

/// Match a citation marker (with or without display text) at the start of `rest`.
pub(crate) fn match_citation(rest: &str) -> Option<(InlineRun, usize)> {
    match_citation_with_text(rest).or_else(|| match_bare_citation(rest))
}
