mod chat;
mod config;
mod test_runner;

use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use std::process;
use std::time::Instant;

use clap::{Parser, Subcommand, ValueEnum};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};
use tracing_subscriber::EnvFilter;

use citemark::export::{CopyAction, WriterClipboard};
use citemark::lint::LintDiagnostic;
use citemark::matrix::Matrix;
use citemark::{CitationTable, Renderer};

use crate::config::{Config, ConfigError, load_citations, load_data, read_source};

const SUBCOMMANDS: &[&str] = &["render", "check", "csv", "matrix", "chat", "test", "help"];

/// Environment variable holding the tracing filter.
const LOG_ENV: &str = "CITEMARK_LOG";

#[derive(Parser)]
#[command(
    name = "citemark",
    version,
    about = "Citation-aware markdown renderer and Agreement Studio prototype"
)]
struct Cli {
    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Configuration file (defaults to ./citemark.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render a document
    Render(RenderArgs),

    /// Report unresolved citations and malformed tables
    Check(SourceArgs),

    /// Export a table from a document as CSV
    Csv(CsvArgs),

    /// Summarise or export a cross-document analysis matrix
    Matrix(MatrixArgs),

    /// Chat with a scripted assistant
    Chat(ChatArgs),

    /// Run .test.md fixture files
    Test(TestArgs),
}

#[derive(clap::Args)]
struct SourceArgs {
    /// Document to read
    file: PathBuf,

    /// Citation table (TOML `[[citation]]` entries or a JSON array)
    #[arg(short, long)]
    citations: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Html,
    Text,
    Json,
    Source,
}

#[derive(clap::Args)]
struct RenderArgs {
    #[command(flatten)]
    source: SourceArgs,

    /// Output format
    #[arg(short, long, value_enum, default_value = "html")]
    format: Format,
}

#[derive(clap::Args)]
struct CsvArgs {
    #[command(flatten)]
    source: SourceArgs,

    /// Zero-based index of the table to export
    #[arg(short, long, default_value_t = 0)]
    table: usize,

    /// Write to this file instead of stdout
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(clap::Args)]
struct MatrixArgs {
    /// Matrix definition (TOML or JSON)
    file: PathBuf,

    /// Print CSV instead of the summary
    #[arg(long)]
    csv: bool,
}

#[derive(clap::Args)]
struct ChatArgs {
    /// Script of canned responses (TOML)
    script: PathBuf,
}

#[derive(clap::Args)]
struct TestArgs {
    /// Path to a .test.md file or directory containing them
    path: PathBuf,

    /// Run only tests in these categories (subfolder names). Repeatable.
    #[arg(short, long)]
    category: Vec<String>,

    /// List available categories and exit
    #[arg(long)]
    list_categories: bool,
}

fn main() {
    // `citemark doc.md` is shorthand for `citemark render doc.md`.
    let mut args: Vec<String> = std::env::args().collect();
    if let Some(pos) = first_positional(&args) {
        if !SUBCOMMANDS.contains(&args[pos].as_str()) {
            args.insert(pos, "render".to_string());
        }
    }

    let cli = Cli::parse_from(&args);
    init_tracing(cli.no_color);

    let config = match Config::load(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => fail(&e),
    };

    let code = match cli.command {
        Command::Render(args) => do_render(args),
        Command::Check(args) => do_check(args, cli.no_color),
        Command::Csv(args) => do_csv(args, &config),
        Command::Matrix(args) => do_matrix(args),
        Command::Chat(args) => chat::run(&args.script, &config),
        Command::Test(args) => {
            if args.list_categories {
                test_runner::list_categories(&args.path);
                0
            } else {
                test_runner::run_tests(&args.path, cli.no_color, &args.category)
            }
        }
    };
    process::exit(code);
}

/// Index of the first argument that is neither a flag nor a flag's value.
fn first_positional(args: &[String]) -> Option<usize> {
    let mut i = 1;
    while i < args.len() {
        let arg = &args[i];
        if arg == "--config" {
            i += 2;
            continue;
        }
        if !arg.starts_with('-') {
            return Some(i);
        }
        i += 1;
    }
    None
}

fn init_tracing(no_color: bool) {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(!no_color)
        .with_target(false)
        .init();
}

fn fail(error: &dyn std::fmt::Display) -> ! {
    eprintln!("error: {}", error);
    process::exit(1);
}

fn load_inputs(args: &SourceArgs) -> Result<(String, CitationTable), ConfigError> {
    let source = read_source(&args.file)?;
    let citations = match &args.citations {
        Some(path) => load_citations(path)?,
        None => CitationTable::new(),
    };
    Ok((source, citations))
}

fn do_render(args: RenderArgs) -> i32 {
    let (source, citations) = match load_inputs(&args.source) {
        Ok(inputs) => inputs,
        Err(e) => fail(&e),
    };

    let output = match args.format {
        Format::Source => citemark::parser::Parser::new(&source).parse().to_string(),
        Format::Html => Renderer::new(&citations).render(&source).to_html(),
        Format::Text => Renderer::new(&citations).render(&source).to_text(),
        Format::Json => {
            let tree = Renderer::new(&citations).render(&source);
            match serde_json::to_string_pretty(&tree) {
                Ok(json) => json,
                Err(e) => fail(&e),
            }
        }
    };
    println!("{}", output.trim_end());
    0
}

fn do_check(args: SourceArgs, no_color: bool) -> i32 {
    let (source, citations) = match load_inputs(&args) {
        Ok(inputs) => inputs,
        Err(e) => fail(&e),
    };

    let mut files = SimpleFiles::new();
    let file_id = files.add(args.file.display().to_string(), source.clone());
    let findings = citemark::lint::lint(&source, &citations, file_id);

    let color_choice = if no_color {
        ColorChoice::Never
    } else {
        ColorChoice::Auto
    };
    let writer = StandardStream::stderr(color_choice);
    let term_config = term::Config::default();
    for finding in &findings {
        let diagnostic = finding.to_diagnostic();
        let _ = term::emit_to_write_style(&mut writer.lock(), &term_config, &files, &diagnostic);
    }

    let code = check_exit_code(&findings);
    if code == 0 {
        eprintln!("ok: {} has no warnings", args.file.display());
    }
    code
}

/// Notes alone pass; any warning or error fails the check.
fn check_exit_code(findings: &[LintDiagnostic]) -> i32 {
    if findings.iter().any(|f| f.is_warning()) {
        1
    } else {
        0
    }
}

fn do_csv(args: CsvArgs, config: &Config) -> i32 {
    let (source, citations) = match load_inputs(&args.source) {
        Ok(inputs) => inputs,
        Err(e) => fail(&e),
    };
    let tree = Renderer::new(&citations).render(&source);
    let Some(table) = tree.tables().nth(args.table) else {
        eprintln!(
            "error: {} has no table #{} ({} found)",
            args.source.file.display(),
            args.table,
            tree.tables().count()
        );
        return 1;
    };

    let csv = table.to_csv();
    let mut action = CopyAction::new(config.render.copy_feedback());
    let copied = match &args.out {
        Some(path) => match File::create(path) {
            Ok(file) => action.copy(&mut WriterClipboard::new(file), &csv, Instant::now()),
            Err(e) => fail(&format!("cannot create '{}': {}", path.display(), e)),
        },
        None => action.copy(
            &mut WriterClipboard::new(std::io::stdout().lock()),
            &csv,
            Instant::now(),
        ),
    };
    if copied { 0 } else { 1 }
}

fn do_matrix(args: MatrixArgs) -> i32 {
    let matrix: Matrix = match load_data(&args.file) {
        Ok(m) => m,
        Err(e) => fail(&e),
    };

    if args.csv {
        println!("{}", matrix.to_csv());
        return 0;
    }

    let summary = matrix.risk_summary();
    let mut out = std::io::stdout().lock();
    let _ = writeln!(
        out,
        "{} documents: \u{1F534} {} high, \u{1F7E1} {} medium, \u{1F7E2} {} low",
        matrix.rows.len(),
        summary.high,
        summary.medium,
        summary.low
    );
    for (i, row) in matrix.rows.iter().enumerate() {
        let _ = writeln!(out);
        match &row.risk {
            Some(risk) => {
                let badge = risk.badge();
                let _ = writeln!(out, "{} [{} {}]", row.document_title, badge.emoji, badge.label);
                if !badge.tooltip.is_empty() {
                    let _ = writeln!(out, "  risk: {}", badge.tooltip);
                }
            }
            None => {
                let _ = writeln!(out, "{}", row.document_title);
            }
        }
        for column in &matrix.columns {
            let Some(view) = matrix.render_cell(i, &column.id) else {
                continue;
            };
            let text = if view.loading {
                "…".to_string()
            } else if view.uncertain {
                format!("{} (uncertain)", view.text)
            } else {
                view.text
            };
            let chip = view
                .chip
                .as_ref()
                .map(|c| format!(" [{}]", c.id()))
                .unwrap_or_default();
            let _ = writeln!(out, "  {}: {}{}", column.label, text, chip);
            if let Some(note) = &view.note {
                let _ = writeln!(out, "    note: {}", note);
            }
        }
    }
    0
}

#[cfg(test)]
mod tests {
    use std::fs;

    use citemark::lint::lint;

    use super::*;

    fn check(source: &str, citations: Option<&str>) -> i32 {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("doc.md");
        fs::write(&file, source).unwrap();
        let citations = citations.map(|toml| {
            let path = dir.path().join("citations.toml");
            fs::write(&path, toml).unwrap();
            path
        });
        let (source, table) = load_inputs(&SourceArgs { file, citations }).unwrap();
        check_exit_code(&lint(&source, &table, 0))
    }

    const CITATIONS: &str = "[[citation]]\nid = \"1\"\ndocumentId = \"msa\"\ndocumentTitle = \"MSA\"\n";

    #[test]
    fn check_fails_on_unresolved_citation() {
        assert_eq!(check("See [MSA]\u{b9}.", None), 1);
        assert_eq!(check("*Source: [MSA]\u{b2}*", Some(CITATIONS)), 1);
    }

    #[test]
    fn check_passes_when_everything_resolves() {
        assert_eq!(check("See [MSA]\u{b9}.", Some(CITATIONS)), 0);
    }

    #[test]
    fn notes_do_not_fail_the_check() {
        assert_eq!(check("a | b\n\nplain", None), 0);
    }

    #[test]
    fn bare_file_argument_is_rendered() {
        let args: Vec<String> = ["citemark", "--config", "c.toml", "doc.md"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(first_positional(&args), Some(3));
    }
}
