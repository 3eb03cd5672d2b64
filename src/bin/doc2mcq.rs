//! CLI binary for doc2mcq.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ExtractionConfig` and prints results as JSON.

use anyhow::{Context, Result};
use clap::Parser;
use doc2mcq::extract::write_atomic;
use doc2mcq::{
    extract_file, extract_stream, AnswerPolicy, DocumentResult, ExtractionConfig,
    ExtractionOutput, ExtractionProgressCallback, ProgressCallback, SectionSpec,
};
use futures::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress for batch runs: one bar, one log line per document.
/// Documents complete out of order, so lines are printed as they arrive.
struct CliProgressCallback {
    bar: ProgressBar,
    /// Documents that decoded but produced no questions.
    empty: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} documents  \
             ⏱ {elapsed_precise}  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        let bar = ProgressBar::new(0);
        bar.set_style(style);
        bar.set_prefix("Extracting");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            empty: AtomicUsize::new(0),
        })
    }
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

impl ExtractionProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total_documents: usize) {
        self.bar.set_length(total_documents as u64);
        self.bar.reset_eta();
    }

    fn on_document_start(&self, path: &Path) {
        self.bar.set_message(file_label(path));
    }

    fn on_document_complete(&self, path: &Path, questions: usize, blocks_seen: usize) {
        let mark = if questions == 0 {
            self.empty.fetch_add(1, Ordering::SeqCst);
            yellow("⚠")
        } else {
            green("✓")
        };
        self.bar.println(format!(
            "  {} {:<40}  {}",
            mark,
            file_label(path),
            dim(&format!("{questions} questions / {blocks_seen} blocks")),
        ));
        self.bar.inc(1);
    }

    fn on_document_error(&self, path: &Path, error: &str) {
        // First line only; some errors carry a remediation hint below.
        let msg = error.lines().next().unwrap_or_default();
        self.bar
            .println(format!("  {} {:<40}  {}", red("✗"), file_label(path), red(msg)));
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, total_documents: usize, success_count: usize) {
        self.bar.finish_and_clear();
        let failed = total_documents.saturating_sub(success_count);
        let empty = self.empty.load(Ordering::SeqCst);
        if failed == 0 && empty == 0 {
            eprintln!(
                "{} {} documents extracted",
                green("✔"),
                bold(&success_count.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} documents extracted  ({} unreadable, {} without questions)",
                if failed == total_documents {
                    red("✘")
                } else {
                    yellow("⚠")
                },
                bold(&success_count.to_string()),
                total_documents,
                red(&failed.to_string()),
                yellow(&empty.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # One document, JSON to stdout
  doc2mcq paper.docx

  # Write to a file
  doc2mcq paper.docx -o paper.json

  # Sectional test: first 25 questions English, next 25 Math
  doc2mcq --section English:25 --section Math:25 paper.docx

  # Four marks per question, drop questions without an answer key
  doc2mcq --marks 4 --strict-answers paper.docx

  # Many documents, four at a time, 30 s each at most
  doc2mcq --concurrency 4 --timeout 30 papers/*.docx -o all.json

  # Only the question records, one line
  doc2mcq --questions-only --compact paper.docx

SUPPORTED INPUT:
  .docx        Word (Office Open XML); inline pictures and list numbering kept
  .html        HTML exports; <img src="data:..."> pictures kept
  .txt         UTF-8 text
  Legacy .doc files are rejected; re-save them as .docx.

RECOGNISED LAYOUT:
  Questions    Q.1  Q1.  Q 1  1.  Question 1  Q1)
  Options      a. b. c. d.   A) B) C) D)   (A) (B) (C) (D)   1. 2. 3. 4.   A. B. C. D.
  Answer       Ans. b   Answer: C   Correct answer is (d)   Ans: 2
  Solution     Sol. ...   Solution: ...   Explanation: ...

EXIT STATUS:
  0  questions extracted
  1  a document could not be read or decoded
  2  documents were readable but no questions were found

ENVIRONMENT VARIABLES:
  RUST_LOG                 Override log filter (e.g. doc2mcq=debug)
  DOC2MCQ_SECTIONS         Comma-separated NAME:COUNT list
  DOC2MCQ_MARKS            Marks per question
  DOC2MCQ_CONCURRENCY      Documents extracted at once
"#;

/// Extract multiple-choice questions from Word, HTML and text documents.
#[derive(Parser, Debug)]
#[command(
    name = "doc2mcq",
    version,
    about = "Extract multiple-choice questions from Word, HTML and text documents",
    long_about = "Extract multiple-choice questions (stem, four options, answer key, solution \
and inline images) from loosely formatted question papers, and report every block that could \
not be parsed.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Documents to extract (.docx, .html, .txt).
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Write JSON to this file instead of stdout.
    #[arg(short, long, env = "DOC2MCQ_OUTPUT")]
    output: Option<PathBuf>,

    /// Section as NAME:COUNT; repeat in paper order.
    #[arg(
        long = "section",
        value_name = "NAME:COUNT",
        env = "DOC2MCQ_SECTIONS",
        value_delimiter = ','
    )]
    sections: Vec<SectionSpec>,

    /// Marks assigned to every question.
    #[arg(long, env = "DOC2MCQ_MARKS", default_value_t = 1)]
    marks: u32,

    /// Drop questions without an answer marker instead of assuming A.
    #[arg(long, env = "DOC2MCQ_STRICT_ANSWERS")]
    strict_answers: bool,

    /// Number of documents extracted at once.
    #[arg(short, long, env = "DOC2MCQ_CONCURRENCY", default_value_t = 4)]
    concurrency: usize,

    /// Per-document time limit in seconds.
    #[arg(long, env = "DOC2MCQ_TIMEOUT",
          value_parser = clap::value_parser!(u64).range(1..))]
    timeout: Option<u64>,

    /// Single-line JSON instead of pretty-printed.
    #[arg(long, env = "DOC2MCQ_COMPACT")]
    compact: bool,

    /// Emit only the question records, without diagnostics.
    #[arg(long)]
    questions_only: bool,

    /// Disable progress bar.
    #[arg(long, env = "DOC2MCQ_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "DOC2MCQ_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "DOC2MCQ_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let batch = cli.inputs.len() > 1;

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO-level library logs in batch mode.
    let show_progress = batch && !cli.quiet && !cli.no_progress;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn ExtractionProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb)?;

    // ── Run extraction ───────────────────────────────────────────────────
    if batch {
        run_batch(&cli, &config).await
    } else {
        run_single(&cli, &config).await
    }
}

async fn run_single(cli: &Cli, config: &ExtractionConfig) -> Result<ExitCode> {
    let input = &cli.inputs[0];
    let output = extract_file(input, config)
        .await
        .with_context(|| format!("Extraction failed for {}", input.display()))?;

    emit(cli, &render_output(cli, &output)).await?;

    let diag = &output.diagnostics;
    if diag.nothing_extracted() {
        eprintln!(
            "{} No questions could be extracted from {} ({} blocks seen). \
             Check the question numbering and option markers.",
            yellow("⚠"),
            bold(&input.display().to_string()),
            diag.blocks_seen
        );
        for reason in diag.rejected_reasons.iter().take(5) {
            eprintln!("   {}", dim(reason));
        }
        return Ok(ExitCode::from(2));
    }

    if !cli.quiet {
        eprintln!(
            "{}  {}/{} blocks → questions  {}  {}ms",
            if diag.rejected_reasons.is_empty() {
                green("✔")
            } else {
                yellow("⚠")
            },
            diag.blocks_accepted,
            diag.blocks_seen,
            dim(&format!("{} low-confidence answers", diag.low_confidence.len())),
            diag.duration_ms,
        );
        for reason in &diag.rejected_reasons {
            eprintln!("   {}", dim(reason));
        }
    }
    Ok(ExitCode::SUCCESS)
}

async fn run_batch(cli: &Cli, config: &ExtractionConfig) -> Result<ExitCode> {
    let mut results: Vec<DocumentResult> =
        extract_stream(cli.inputs.clone(), config).collect().await;

    // Completion order → command-line order.
    results.sort_by_key(|doc| cli.inputs.iter().position(|p| *p == doc.path));

    let failed = results.iter().filter(|doc| doc.result.is_err()).count();
    let empty = results
        .iter()
        .filter(|doc| matches!(&doc.result, Ok(out) if out.diagnostics.nothing_extracted()))
        .count();

    let entries: Vec<serde_json::Value> = results
        .iter()
        .map(|doc| match &doc.result {
            Ok(output) => json!({
                "path": doc.path.display().to_string(),
                "output": render_output(cli, output),
            }),
            Err(e) => json!({
                "path": doc.path.display().to_string(),
                "error": e.to_string(),
            }),
        })
        .collect();
    emit(cli, &serde_json::Value::Array(entries)).await?;

    // With the bar active the callback already printed the summary.
    if !cli.quiet && cli.no_progress {
        eprintln!(
            "Extracted {}/{} documents ({} without questions)",
            results.len() - failed,
            results.len(),
            empty
        );
    }
    Ok(exit_status(failed, empty))
}

fn exit_status(failed: usize, empty: usize) -> ExitCode {
    if failed > 0 {
        ExitCode::FAILURE
    } else if empty > 0 {
        ExitCode::from(2)
    } else {
        ExitCode::SUCCESS
    }
}

fn render_output(cli: &Cli, output: &ExtractionOutput) -> serde_json::Value {
    let value = if cli.questions_only {
        serde_json::to_value(&output.questions)
    } else {
        serde_json::to_value(output)
    };
    // Plain data with string keys; serialisation to a Value cannot fail.
    value.unwrap_or(serde_json::Value::Null)
}

/// Print JSON to stdout or write it atomically to `--output`.
async fn emit(cli: &Cli, value: &serde_json::Value) -> Result<()> {
    let mut text = if cli.compact {
        serde_json::to_string(value)
    } else {
        serde_json::to_string_pretty(value)
    }
    .context("Failed to serialise output")?;
    text.push('\n');

    match cli.output {
        Some(ref path) => {
            write_atomic(path, text.as_bytes()).await?;
            if !cli.quiet {
                eprintln!("{} wrote {}", green("→"), bold(&path.display().to_string()));
            }
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            handle
                .write_all(text.as_bytes())
                .context("Failed to write to stdout")?;
        }
    }
    Ok(())
}

/// Map CLI args to `ExtractionConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ExtractionConfig> {
    let mut builder = ExtractionConfig::builder()
        .sections(cli.sections.iter().cloned())
        .default_marks(cli.marks)
        .concurrency(cli.concurrency)
        .answer_policy(if cli.strict_answers {
            AnswerPolicy::Reject
        } else {
            AnswerPolicy::DefaultToA
        });

    if let Some(secs) = cli.timeout {
        builder = builder.timeout_secs(secs);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
