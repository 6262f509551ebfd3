//! # Bracelight - Brace Matching for Live Buffers
//!
//! Highlights the delimiter next to a caret together with its partner,
//! skipping delimiters inside comments and string literals.
//!
//! ## Quick Start
//!
//! ```bash
//! # Match the brace at character offset 42
//! cargo run -- src/lib.rs --offset 42
//!
//! # Match at line 10, column 5 and print parse errors too
//! cargo run -- src/lib.rs --at 10:5 --diagnostics
//!
//! # Machine-readable output
//! cargo run -- data.json --at 1:1 --json
//! ```

use anyhow::Context;
use clap::{ArgGroup, Parser};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bracelight_buffer::{Position, Snapshot, SnapshotSpan, TextBuffer};
use bracelight_core::{
    BraceMatcher, ClassificationOracle, Config, MemoryView, PlainText, TextView, UpdateOutcome,
};
use bracelight_syntax::{ErrorListener, ErrorProvidingParser, SyntaxClassifier, language_for_path};

/// Bracelight - find the partner of the brace at a caret
#[derive(Parser, Debug)]
#[command(name = "bracelight")]
#[command(author, version, about, long_about = None)]
#[command(group(ArgGroup::new("caret").required(true).args(["offset", "at"])))]
struct Args {
    /// File to read
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Caret as a character offset
    #[arg(short, long)]
    offset: Option<usize>,

    /// Caret as a 1-indexed line and column
    #[arg(short, long, value_name = "LINE:COL")]
    at: Option<Position>,

    /// Lines searched before the scan moves to the background
    #[arg(long, value_name = "N", default_value_t = 50)]
    viewport_lines: usize,

    /// Language used to skip comments and strings (guessed from the extension)
    #[arg(short, long)]
    language: Option<String>,

    /// Config file (defaults to the user config directory)
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Also report parse errors
    #[arg(short, long)]
    diagnostics: bool,

    /// Print JSON instead of text
    #[arg(long)]
    json: bool,

    /// Verbose logging
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// A location in the file, both as an offset and as a position.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
struct Location {
    offset: usize,
    /// 1-indexed
    line: usize,
    /// 1-indexed
    column: usize,
}

impl Location {
    fn new(snapshot: &Snapshot, offset: usize) -> anyhow::Result<Self> {
        let position = snapshot.offset_to_position(offset)?;
        Ok(Self {
            offset,
            line: position.line + 1,
            column: position.column + 1,
        })
    }

    fn of_span(snapshot: &Snapshot, span: &SnapshotSpan) -> anyhow::Result<Self> {
        Self::new(snapshot, span.span.start)
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{} (offset {})", self.line, self.column, self.offset)
    }
}

#[derive(Debug, Serialize)]
struct Diagnostic {
    message: String,
    location: Location,
}

#[derive(Debug, Serialize)]
struct Report {
    file: PathBuf,
    language: Option<String>,
    caret: Location,
    /// The delimiter at the caret followed by its partner.
    highlight: Option<[Location; 2]>,
    diagnostics: Vec<Diagnostic>,
}

impl Report {
    fn print_text(&self) {
        match &self.highlight {
            Some([delimiter, matched]) => println!("{delimiter} <-> {matched}"),
            None => println!("no match at {}", self.caret),
        }
        for diagnostic in &self.diagnostics {
            println!(
                "{}:{}: {}",
                self.file.display(),
                diagnostic.location,
                diagnostic.message
            );
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging
    let log_level = match args.verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_level(true)
                .with_writer(std::io::stderr),
        )
        .with(tracing_subscriber::filter::LevelFilter::from_level(
            log_level,
        ))
        .init();

    tracing::info!("Starting Bracelight v{}", env!("CARGO_PKG_VERSION"));

    let report = run(&args).await?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        report.print_text();
    }

    Ok(())
}

async fn run(args: &Args) -> anyhow::Result<Report> {
    let config = match &args.config {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => Config::load(),
    };

    let buffer = TextBuffer::from_file(&args.file)
        .with_context(|| format!("Failed to read {}", args.file.display()))?;

    let language = args
        .language
        .clone()
        .or_else(|| language_for_path(&args.file).map(str::to_string));
    let table = config.delimiter_table(language.as_deref())?;
    let oracle = oracle_for(language.as_deref());

    let view = Arc::new(MemoryView::new(buffer, args.viewport_lines));
    let snapshot = view.snapshot();
    let offset = match (args.offset, args.at) {
        (Some(offset), _) => offset,
        (None, Some(position)) => snapshot.position_to_offset(position)?,
        (None, None) => anyhow::bail!("either --offset or --at is required"),
    };
    let caret = view
        .set_caret(offset)
        .with_context(|| format!("Caret {offset} is outside the file"))?;

    let matcher = BraceMatcher::new(
        view.clone(),
        oracle,
        table,
        tokio::runtime::Handle::current(),
    );
    if let UpdateOutcome::Deferred(scan) = matcher.on_caret_moved(caret) {
        tracing::debug!("Waiting for background scan {}", scan.revision());
        scan.wait().await;
    }

    let highlight = match matcher.tags().highlight() {
        Some(pair) => Some([
            Location::of_span(&snapshot, &pair.delimiter)?,
            Location::of_span(&snapshot, &pair.matched)?,
        ]),
        None => None,
    };

    let diagnostics = match (&language, args.diagnostics) {
        (Some(language), true) => diagnostics(language, &snapshot)?,
        (None, true) => {
            tracing::warn!("No language known for {}; skipping diagnostics", args.file.display());
            Vec::new()
        }
        (_, false) => Vec::new(),
    };

    Ok(Report {
        file: args.file.clone(),
        language,
        caret: Location::new(&snapshot, offset)?,
        highlight,
        diagnostics,
    })
}

/// Picks the classifier for `language`, falling back to plain text.
fn oracle_for(language: Option<&str>) -> Arc<dyn ClassificationOracle> {
    let Some(language) = language else {
        return Arc::new(PlainText);
    };
    match SyntaxClassifier::new(language) {
        Ok(classifier) => Arc::new(classifier),
        Err(err) => {
            tracing::warn!("{}; comments and strings will not be skipped", err);
            Arc::new(PlainText)
        }
    }
}

/// Collects the parse errors relayed for `snapshot`.
fn diagnostics(language: &str, snapshot: &Snapshot) -> anyhow::Result<Vec<Diagnostic>> {
    let parser = ErrorProvidingParser::new(language)?;
    let mut events = parser.subscribe();
    parser.report(snapshot, &ErrorListener)?;

    let mut diagnostics = Vec::new();
    while let Ok(event) = events.try_recv() {
        diagnostics.push(Diagnostic {
            location: Location::new(snapshot, event.span.start)?,
            message: event.message,
        });
    }
    Ok(diagnostics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn source_file(suffix: &str, text: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(text.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_args_parsing() {
        let args = Args::parse_from(["bracelight", "test.rs", "--offset", "4"]);
        assert_eq!(args.file, PathBuf::from("test.rs"));
        assert_eq!(args.offset, Some(4));
        assert_eq!(args.viewport_lines, 50);
        assert!(!args.json);
    }

    #[test]
    fn test_args_with_position() {
        let args = Args::parse_from(["bracelight", "test.rs", "--at", "3:7"]);
        assert_eq!(args.at, Some(Position::new(2, 6)));
    }

    #[test]
    fn test_args_require_a_caret() {
        assert!(Args::try_parse_from(["bracelight", "test.rs"]).is_err());
        assert!(
            Args::try_parse_from(["bracelight", "test.rs", "--offset", "1", "--at", "1:1"])
                .is_err()
        );
        assert!(Args::try_parse_from(["bracelight", "test.rs", "--at", "0:1"]).is_err());
    }

    #[tokio::test]
    async fn test_run_finds_pair() {
        let file = source_file(".rs", "fn main() {\n    let v = [1, 2];\n}\n");
        let path = file.path().to_str().unwrap();

        let args = Args::parse_from(["bracelight", path, "--at", "1:11"]);
        let report = run(&args).await.unwrap();

        assert_eq!(report.language.as_deref(), Some("rust"));
        let [delimiter, matched] = report.highlight.unwrap();
        assert_eq!(delimiter.offset, 10);
        assert_eq!((matched.line, matched.column), (3, 1));
        assert!(report.diagnostics.is_empty());
    }

    #[tokio::test]
    async fn test_run_defers_beyond_viewport() {
        let text = format!("({})", "\n".repeat(20));
        let file = source_file(".txt", &text);
        let path = file.path().to_str().unwrap();

        let args = Args::parse_from([
            "bracelight",
            path,
            "--offset",
            "0",
            "--viewport-lines",
            "2",
        ]);
        let report = run(&args).await.unwrap();

        assert_eq!(report.language, None);
        let [_, matched] = report.highlight.unwrap();
        assert_eq!(matched.offset, 21);
    }

    #[tokio::test]
    async fn test_run_reports_diagnostics() {
        let file = source_file(".json", "{\"a\": [1, 2}");
        let path = file.path().to_str().unwrap();

        let args = Args::parse_from(["bracelight", path, "--offset", "0", "--diagnostics"]);
        let report = run(&args).await.unwrap();

        assert!(!report.diagnostics.is_empty());
        assert!(report.diagnostics[0].message.contains("syntax error"));
    }

    #[tokio::test]
    async fn test_run_rejects_caret_outside_file() {
        let file = source_file(".txt", "()");
        let path = file.path().to_str().unwrap();

        let args = Args::parse_from(["bracelight", path, "--offset", "99"]);
        assert!(run(&args).await.is_err());
    }
}
