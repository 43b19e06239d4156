//! cherrydoc — extract `@tag` documentation from annotated source files.
//!
//! Two modes:
//!
//! - **stdin mode**: `cherrydoc --lang javascript < file.js`
//! - **file mode**: `cherrydoc -o docs/api src/*.js lib/*.py`
//!
//! Diagnostics go to stderr as `file:line:col: kind: message`. Output is
//! written even when the input is damaged; `--strict` turns any diagnostic
//! into a failing exit status.

mod render;
mod toc;

use anyhow::{Context, Result};
use cherry_syntax::{scan_with, Diagnostic, LanguageSet, ScanOptions, ScanOutput, TagRegistry};
use clap::Parser;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(
    name = "cherrydoc",
    about = "Extract documentation tags from annotated source files"
)]
struct Cli {
    /// Input files (glob patterns and directories supported). If omitted, reads from stdin.
    files: Vec<String>,

    /// Language id; required for stdin, otherwise overrides detection by extension
    #[arg(short = 'l', long)]
    lang: Option<String>,

    /// Output format: markdown (default), tree, json
    #[arg(short = 'f', long, default_value = "markdown")]
    format: String,

    /// Output directory; without it everything is written to stdout
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Blank lines tolerated between a comment and the code it documents
    #[arg(long)]
    max_blank_lines: Option<usize>,

    /// Maximum nesting depth tracked by the scanner
    #[arg(long)]
    max_depth: Option<usize>,

    /// Exit with an error if any diagnostic was reported
    #[arg(long)]
    strict: bool,

    /// Log scanner decisions (same as RUST_LOG=debug)
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn scan_options(&self) -> ScanOptions {
        let mut options = ScanOptions::default();
        if let Some(n) = self.max_blank_lines {
            options = options.with_max_blank_lines(n);
        }
        if let Some(n) = self.max_depth {
            options = options.with_max_depth(n);
        }
        options
    }
}

/// Shared state for one invocation.
struct Session {
    languages: LanguageSet,
    registry: TagRegistry,
    options: ScanOptions,
    diagnostics: usize,
}

impl Session {
    fn new(cli: &Cli) -> Self {
        Session {
            languages: LanguageSet::builtin(),
            registry: TagRegistry::standard(),
            options: cli.scan_options(),
            diagnostics: 0,
        }
    }

    /// Scan one source and report its diagnostics under `label`.
    fn scan(&mut self, label: &str, source: &str, language: &str) -> Result<ScanOutput> {
        let out = scan_with(source, language, &self.languages, &self.registry, &self.options)
            .with_context(|| format!("cannot scan {}", label))?;
        for diagnostic in &out.diagnostics {
            eprintln!("{}", format_diagnostic(label, diagnostic));
        }
        self.diagnostics += out.diagnostics.len();
        Ok(out)
    }

    fn language_for(&self, cli: &Cli, path: &Path) -> Option<String> {
        if let Some(ref lang) = cli.lang {
            return Some(lang.clone());
        }
        let ext = path.extension().and_then(|e| e.to_str())?;
        self.languages.for_extension(ext).map(|g| g.name.clone())
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut session = Session::new(&cli);
    if cli.files.is_empty() {
        stdin_mode(&cli, &mut session)?;
    } else {
        file_mode(&cli, &mut session)?;
    }

    if cli.strict && session.diagnostics > 0 {
        anyhow::bail!("{} diagnostic(s) reported", session.diagnostics);
    }
    Ok(())
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default)),
        )
        .with_writer(io::stderr)
        .try_init();
}

/// stdin mode: read from stdin, write the rendered document to stdout.
fn stdin_mode(cli: &Cli, session: &mut Session) -> Result<()> {
    let lang = cli
        .lang
        .as_deref()
        .context("--lang is required when reading stdin")?;

    let mut input = String::new();
    io::stdin()
        .read_to_string(&mut input)
        .context("failed to read stdin")?;

    let out = session.scan("<stdin>", &input, lang)?;
    let renderer = render::create_renderer(&cli.format)?;
    print!("{}", renderer.render("<stdin>", &out)?);
    Ok(())
}

/// file mode: scan every input, write one document per file.
fn file_mode(cli: &Cli, session: &mut Session) -> Result<()> {
    let renderer = render::create_renderer(&cli.format)?;

    if let Some(ref dir) = cli.output {
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create output directory: {}", dir.display()))?;
    }

    let input_files = expand_globs(&cli.files, |p| session.language_for(cli, p).is_some())?;

    for path in &input_files {
        let Some(lang) = session.language_for(cli, path) else {
            eprintln!("warning: skipping {}: unrecognized extension", path.display());
            continue;
        };
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;

        let label = path.to_string_lossy();
        tracing::debug!(file = %label, %lang, "scanning");
        let out = session.scan(&label, &content, &lang)?;
        let rendered = renderer.render(&label, &out)?;

        match cli.output {
            Some(ref dir) => {
                let name = derive_output_name(path);
                let out_path = dir.join(format!("{}.{}", name, renderer.file_extension()));
                fs::write(&out_path, &rendered)
                    .with_context(|| format!("failed to write {}", out_path.display()))?;
            }
            None => print!("{}", rendered),
        }
    }

    Ok(())
}

fn format_diagnostic(label: &str, diagnostic: &Diagnostic) -> String {
    format!("{}:{}", label, diagnostic)
}

/// Expand glob patterns into a list of real file paths.
/// Bare directories are scanned (non-recursively) for files `accept` likes.
fn expand_globs(patterns: &[String], accept: impl Fn(&Path) -> bool) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for pattern in patterns {
        let path = Path::new(pattern);
        if path.is_file() {
            files.push(path.to_path_buf());
            continue;
        }
        if path.is_dir() {
            let entries = fs::read_dir(path)
                .with_context(|| format!("failed to read directory: {}", path.display()))?;
            files.extend(
                entries
                    .flatten()
                    .map(|e| e.path())
                    .filter(|p| p.is_file() && accept(p)),
            );
            continue;
        }
        let matches: Vec<_> = glob::glob(pattern)
            .with_context(|| format!("invalid glob pattern: {}", pattern))?
            .filter_map(|r| r.ok())
            .filter(|p| p.is_file())
            .collect();
        if matches.is_empty() {
            eprintln!("warning: no files matched: {}", pattern);
        }
        files.extend(matches);
    }
    files.sort();
    files.dedup();
    Ok(files)
}

/// "src/util/filter.js" → "filter"
fn derive_output_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "out".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cherry_syntax::{DiagnosticKind, Position, Span};

    #[test]
    fn output_name_strips_directory_and_extension() {
        assert_eq!(derive_output_name(Path::new("src/util/filter.js")), "filter");
        assert_eq!(derive_output_name(Path::new("shapes.py")), "shapes");
        assert_eq!(derive_output_name(Path::new("Makefile")), "Makefile");
    }

    #[test]
    fn diagnostics_are_prefixed_with_the_file() {
        let at = Position {
            offset: 10,
            line: 2,
            column: 4,
        };
        let d = Diagnostic::new(DiagnosticKind::UnknownTag, Span::point(at), "unknown tag @route");
        assert_eq!(
            format_diagnostic("a.js", &d),
            "a.js:2:4: unknown-tag: unknown tag @route"
        );
    }

    #[test]
    fn scan_options_follow_flags() {
        let cli = Cli::parse_from(["cherrydoc", "--max-blank-lines", "3", "--max-depth", "8"]);
        let options = cli.scan_options();
        assert_eq!(options.max_blank_lines, 3);
        assert_eq!(options.max_depth, 8);
        assert_eq!(Cli::parse_from(["cherrydoc"]).scan_options(), ScanOptions::default());
    }

    #[test]
    fn language_from_flag_or_extension() {
        let cli = Cli::parse_from(["cherrydoc"]);
        let session = Session::new(&cli);
        assert_eq!(session.language_for(&cli, Path::new("a.py")).as_deref(), Some("python"));
        assert_eq!(session.language_for(&cli, Path::new("a.txt")), None);

        let forced = Cli::parse_from(["cherrydoc", "--lang", "go"]);
        assert_eq!(session.language_for(&forced, Path::new("a.txt")).as_deref(), Some("go"));
    }
}
