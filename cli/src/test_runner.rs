use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use citemark::lint::{LintDiagnostic, lint};
use citemark::parser::Parser;
use citemark::{Citation, CitationTable, Renderer};

#[derive(Debug, Deserialize)]
pub struct ExpectedWarning {
    /// Substring that must appear in the warning message.
    pub contains: String,

    /// If set, the warning's span must start on this 1-based source line.
    #[serde(default)]
    pub line: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct TestConfig {
    /// Human-readable test description.
    #[serde(default)]
    pub description: Option<String>,

    /// Citation table the document is rendered against.
    #[serde(default)]
    pub citations: Vec<Citation>,

    /// Expected block sequence by construct name (`header`, `table`, ...).
    #[serde(default)]
    pub expect_blocks: Option<Vec<String>>,

    /// Expected plain-text rendering (trimmed comparison).
    #[serde(default)]
    pub expect_text: Option<String>,

    /// Expected HTML rendering (trimmed comparison).
    #[serde(default)]
    pub expect_html: Option<String>,

    /// Expected CSV export of the first table.
    #[serde(default)]
    pub expect_csv: Option<String>,

    /// Expected ids of citation chips that resolved, in reading order.
    #[serde(default)]
    pub expect_resolved: Option<Vec<String>>,

    /// Expected warnings. If present (even empty), warning count and content are checked.
    /// Each entry checks message substring and optionally the source line.
    #[serde(default)]
    pub expect_warnings: Option<Vec<ExpectedWarning>>,
}

/// Parse a `.test.md` file into its TOML config and document source.
fn parse_test_file(content: &str) -> Result<(TestConfig, &str), String> {
    let content = content.trim_start_matches('\u{feff}'); // strip BOM

    if !content.starts_with("+++") {
        return Err("missing opening +++ frontmatter delimiter".into());
    }

    let after_open = &content[3..];
    let after_open = after_open
        .strip_prefix('\n')
        .or_else(|| after_open.strip_prefix("\r\n"))
        .unwrap_or(after_open);

    let close_pos = after_open
        .find("\n+++")
        .ok_or("missing closing +++ frontmatter delimiter")?;

    let toml_str = after_open[..close_pos].trim_end_matches('\r');
    let rest_start = close_pos + 4; // skip \n+++
    let source = after_open[rest_start..]
        .strip_prefix("\r\n")
        .or_else(|| after_open[rest_start..].strip_prefix('\n'))
        .unwrap_or(&after_open[rest_start..]);

    let config: TestConfig =
        toml::from_str(toml_str).map_err(|e| format!("TOML parse error: {}", e))?;

    Ok((config, source))
}

pub enum TestOutcome {
    Pass,
    Fail(String),
}

pub struct TestResult {
    pub path: PathBuf,
    pub description: Option<String>,
    pub outcome: TestOutcome,
}

fn run_single_test(path: &Path) -> TestResult {
    // 1. Read file
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            return TestResult {
                path: path.to_path_buf(),
                description: None,
                outcome: TestOutcome::Fail(format!("cannot read file: {}", e)),
            };
        }
    };

    // 2. Parse frontmatter
    let (config, source) = match parse_test_file(&content) {
        Ok(pair) => pair,
        Err(e) => {
            return TestResult {
                path: path.to_path_buf(),
                description: None,
                outcome: TestOutcome::Fail(format!("frontmatter error: {}", e)),
            };
        }
    };

    let description = config.description.clone();
    let outcome = match check_expectations(&config, source) {
        None => TestOutcome::Pass,
        Some(reason) => TestOutcome::Fail(reason),
    };

    TestResult {
        path: path.to_path_buf(),
        description,
        outcome,
    }
}

/// Render `source` and compare against every expectation present in `config`.
/// Returns `Some(reason)` on the first mismatch.
fn check_expectations(config: &TestConfig, source: &str) -> Option<String> {
    let citations: CitationTable = config.citations.iter().cloned().collect();
    let document = Parser::new(source).parse();
    let tree = Renderer::new(&citations).render(source);

    // Rendering must not depend on anything but its inputs.
    if tree != Renderer::new(&citations).render(source) {
        return Some("rendering the same input twice gave different trees".into());
    }

    if let Some(expected) = &config.expect_blocks {
        let actual: Vec<&str> = document.blocks.iter().map(|b| b.kind.name()).collect();
        if actual != *expected {
            return Some(format!(
                "block mismatch\n  expected: {}\n  actual:   {}",
                expected.join(", "),
                actual.join(", ")
            ));
        }
    }

    if let Some(expected) = &config.expect_text {
        if let Some(reason) = compare_trimmed("text", expected, &tree.to_text()) {
            return Some(reason);
        }
    }

    if let Some(expected) = &config.expect_html {
        if let Some(reason) = compare_trimmed("html", expected, &tree.to_html()) {
            return Some(reason);
        }
    }

    if let Some(expected) = &config.expect_csv {
        let Some(table) = tree.tables().next() else {
            return Some("expected a table to export, found none".into());
        };
        if let Some(reason) = compare_trimmed("csv", expected, &table.to_csv()) {
            return Some(reason);
        }
    }

    if let Some(expected) = &config.expect_resolved {
        let actual: Vec<&str> = tree
            .citations()
            .into_iter()
            .filter(|chip| chip.is_interactive())
            .map(|chip| chip.id())
            .collect();
        if actual != *expected {
            return Some(format!(
                "resolved citations mismatch\n  expected: {:?}\n  actual:   {:?}",
                expected, actual
            ));
        }
    }

    if let Some(expected_warnings) = &config.expect_warnings {
        let diagnostics = lint(source, &citations, 0);
        if let Some(reason) = check_warnings(source, &diagnostics, expected_warnings) {
            return Some(reason);
        }
    }

    None
}

fn compare_trimmed(what: &str, expected: &str, actual: &str) -> Option<String> {
    let expected = expected.trim();
    let actual = actual.trim();
    if expected == actual {
        None
    } else {
        Some(format!(
            "{} mismatch\n  expected: {}\n  actual:   {}",
            what, expected, actual
        ))
    }
}

/// Convert a byte offset in `source` to a 1-based line number.
fn byte_offset_to_line(source: &str, offset: usize) -> usize {
    source[..offset.min(source.len())]
        .bytes()
        .filter(|&b| b == b'\n')
        .count()
        + 1
}

/// Check that actual warnings match expectations. Returns `Some(reason)` on mismatch.
fn check_warnings(
    source: &str,
    diagnostics: &[LintDiagnostic],
    expected: &[ExpectedWarning],
) -> Option<String> {
    let actual_warnings: Vec<&LintDiagnostic> =
        diagnostics.iter().filter(|d| d.is_warning()).collect();

    if actual_warnings.len() != expected.len() {
        let actual_msgs: Vec<String> = actual_warnings
            .iter()
            .map(|w| format!("  - {}", w.message))
            .collect();
        return Some(format!(
            "expected {} warning(s), got {}\n  actual warnings:\n{}",
            expected.len(),
            actual_warnings.len(),
            if actual_msgs.is_empty() {
                "    (none)".to_string()
            } else {
                actual_msgs.join("\n")
            }
        ));
    }

    for (i, (actual, expected)) in actual_warnings.iter().zip(expected.iter()).enumerate() {
        if !actual.message.contains(&expected.contains) {
            return Some(format!(
                "warning[{}]: expected message containing \"{}\", got: {}",
                i, expected.contains, actual.message
            ));
        }

        if let Some(expected_line) = expected.line {
            let actual_line = byte_offset_to_line(source, actual.span.start);
            if actual_line != expected_line {
                return Some(format!(
                    "warning[{}]: expected on line {}, but span is on line {}",
                    i, expected_line, actual_line
                ));
            }
        }
    }

    None
}

/// Discover `.test.md` files grouped by category (subfolder relative to root).
/// Files directly in `root` get category "" (uncategorized).
fn discover_categorized(root: &Path) -> BTreeMap<String, Vec<PathBuf>> {
    let mut categories: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
    collect_tests(root, root, &mut categories);
    for files in categories.values_mut() {
        files.sort();
    }
    categories
}

fn collect_tests(dir: &Path, root: &Path, out: &mut BTreeMap<String, Vec<PathBuf>>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for path in entries.flatten().map(|entry| entry.path()) {
        if path.is_dir() {
            collect_tests(&path, root, out);
            continue;
        }
        let is_test = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|name| name.ends_with(".test.md"));
        if is_test {
            let category = path
                .parent()
                .and_then(|p| p.strip_prefix(root).ok())
                .map(|p| p.to_string_lossy().replace('\\', "/"))
                .unwrap_or_default();
            out.entry(category).or_default().push(path);
        }
    }
}

fn category_label(category: &str) -> &str {
    if category.is_empty() {
        "(root)"
    } else {
        category
    }
}

/// List available categories for the given test path.
pub fn list_categories(path: &Path) {
    if path.is_file() {
        eprintln!("(single file, no categories)");
        return;
    }

    let categories = discover_categorized(path);
    if categories.is_empty() {
        eprintln!("no .test.md files found in {}", path.display());
        return;
    }

    eprintln!("available categories:");
    for (cat, files) in &categories {
        eprintln!("  {} ({} tests)", category_label(cat), files.len());
    }
}

struct Palette {
    no_color: bool,
}

impl Palette {
    fn paint(&self, code: &str, s: &str) -> String {
        if self.no_color {
            s.to_string()
        } else {
            format!("\x1b[{}m{}\x1b[0m", code, s)
        }
    }

    fn pass(&self) -> String {
        self.paint("32", "PASS")
    }

    fn fail(&self) -> String {
        self.paint("31", "FAIL")
    }

    fn bold(&self, s: &str) -> String {
        self.paint("1", s)
    }
}

fn test_label(result: &TestResult) -> &str {
    result.description.as_deref().unwrap_or_else(|| {
        result
            .path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("?")
    })
}

/// Select the categories to run. An empty request means all of them.
fn select_categories<'a>(
    all: &'a BTreeMap<String, Vec<PathBuf>>,
    requested: &[String],
) -> BTreeMap<&'a str, &'a Vec<PathBuf>> {
    if requested.is_empty() {
        return all.iter().map(|(k, v)| (k.as_str(), v)).collect();
    }
    let mut selected = BTreeMap::new();
    for req in requested.iter().map(|r| r.trim_matches('/')) {
        let prefix = format!("{}/", req);
        let before = selected.len();
        for (cat, files) in all {
            if cat == req || cat.starts_with(&prefix) {
                selected.insert(cat.as_str(), files);
            }
        }
        if selected.len() == before {
            let available: Vec<&str> = all.keys().map(|k| category_label(k)).collect();
            eprintln!(
                "warning: category '{}' not found (available: {})",
                req,
                available.join(", ")
            );
        }
    }
    selected
}

/// Run all `.test.md` files under `path` (or a single file).
/// If `categories` is non-empty, only run tests in those categories.
/// Returns exit code: 0 = all pass, 1 = any failure.
pub fn run_tests(path: &Path, no_color: bool, categories: &[String]) -> i32 {
    let palette = Palette { no_color };

    let groups: BTreeMap<String, Vec<PathBuf>> = if path.is_file() {
        BTreeMap::from([(String::new(), vec![path.to_path_buf()])])
    } else {
        let all = discover_categorized(path);
        if all.is_empty() {
            eprintln!("no .test.md files found in {}", path.display());
            return 1;
        }
        select_categories(&all, categories)
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    };

    if groups.is_empty() {
        eprintln!("no matching categories found");
        return 1;
    }

    let mut passed = 0usize;
    let mut failures: Vec<TestResult> = Vec::new();

    for (cat, files) in &groups {
        if !path.is_file() {
            eprintln!();
            eprintln!("{}", palette.bold(category_label(cat)));
        }
        for file in files {
            let result = run_single_test(file);
            match &result.outcome {
                TestOutcome::Pass => {
                    passed += 1;
                    eprintln!("  {}  {}", palette.pass(), test_label(&result));
                }
                TestOutcome::Fail(_) => {
                    eprintln!("  {}  {}", palette.fail(), test_label(&result));
                    failures.push(result);
                }
            }
        }
    }

    if !failures.is_empty() {
        eprintln!();
        eprintln!("failures:");
        for f in &failures {
            eprintln!();
            eprintln!("  --- {} ---", f.path.display());
            if let TestOutcome::Fail(reason) = &f.outcome {
                for line in reason.lines() {
                    eprintln!("  {}", line);
                }
            }
        }
    }

    eprintln!();
    let failed = failures.len();
    if failed == 0 {
        eprintln!("test result: {}. {} passed, 0 failed", palette.paint("32", "ok"), passed);
        0
    } else {
        eprintln!(
            "test result: {}. {} passed, {} failed (of {})",
            palette.paint("31", "FAILED"),
            passed,
            failed,
            passed + failed
        );
        1
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    const PASSING: &str = "+++\ndescription = \"citation resolves\"\nexpect_blocks = [\"paragraph\"]\nexpect_resolved = [\"1\"]\n\n[[citations]]\nid = \"1\"\ndocumentId = \"msa\"\ndocumentTitle = \"MSA\"\n+++\nSee [Section 1]\u{b9} for terms.\n";

    #[test]
    fn frontmatter_splits_config_and_source() {
        let (config, source) = parse_test_file(PASSING).unwrap();
        assert_eq!(config.description.as_deref(), Some("citation resolves"));
        assert_eq!(config.citations.len(), 1);
        assert_eq!(source, "See [Section 1]\u{b9} for terms.\n");
    }

    #[test]
    fn missing_delimiter_is_reported() {
        assert!(parse_test_file("no frontmatter").is_err());
        assert!(parse_test_file("+++\ndescription = \"x\"\n").is_err());
    }

    #[test]
    fn runs_a_directory_of_fixtures() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("citations")).unwrap();
        fs::write(dir.path().join("citations/resolve.test.md"), PASSING).unwrap();
        assert_eq!(run_tests(dir.path(), true, &[]), 0);

        fs::write(
            dir.path().join("broken.test.md"),
            "+++\nexpect_blocks = [\"table\"]\n+++\na|b\n",
        )
        .unwrap();
        assert_eq!(run_tests(dir.path(), true, &[]), 1);
        assert_eq!(run_tests(dir.path(), true, &["citations".to_string()]), 0);
    }

    #[test]
    fn warning_lines_are_checked() {
        let source = "ok\nsee [\u{b2}]\n";
        let config: TestConfig = toml::from_str(
            "[[expect_warnings]]\ncontains = \"unresolved citation 2\"\nline = 2\n",
        )
        .unwrap();
        assert_eq!(check_expectations(&config, source), None);
    }
}
