//! CLI binary for pdf2pubmed.
//!
//! A thin shim over the library crate: the command line is the conversion
//! form, the terminal is where alerts and the validation panel show up.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pdf2pubmed::{
    ArticleType, ClientConfig, ConversionSession, ConversionState, FileIntake, FileRef,
    HttpBackend, SessionObserver, SubmitOutcome, ValidationReport,
};
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
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

// ── Terminal observer ────────────────────────────────────────────────────────

/// Prints alerts to stderr and spins while the service is converting.
struct CliObserver {
    /// `None` when progress display is disabled.
    bar: Option<ProgressBar>,
}

impl CliObserver {
    fn new(show_progress: bool) -> Arc<Self> {
        let bar = show_progress.then(|| {
            let bar = ProgressBar::new_spinner();
            bar.set_style(
                ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  ⏱ {elapsed}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner())
                    .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
            );
            bar.set_prefix("Converting");
            bar
        });
        Arc::new(Self { bar })
    }
}

impl SessionObserver for CliObserver {
    fn on_alert(&self, message: &str) {
        // Alerts are errors from the user's point of view: always shown.
        let line = format!("{} {}", red("✘"), message);
        match self.bar {
            Some(ref bar) => bar.suspend(|| eprintln!("{line}")),
            None => eprintln!("{line}"),
        }
    }

    fn on_state_change(&self, _from: ConversionState, to: ConversionState) {
        let Some(ref bar) = self.bar else { return };
        match to {
            ConversionState::Converting => {
                bar.set_message("waiting for the conversion service…");
                bar.enable_steady_tick(Duration::from_millis(80));
            }
            ConversionState::Completed | ConversionState::Idle => bar.finish_and_clear(),
        }
    }

    fn on_report(&self, report: &ValidationReport) {
        tracing::debug!(
            "validation report: {} error(s), {} warning(s)",
            report.errors().len(),
            report.warnings.len()
        );
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Abstract-only conversion, archive saved to the current directory
  pdf2pubmed article.pdf

  # Full article with figures, saved into ./out
  pdf2pubmed --article-type full -f fig1.png -f fig2.jpg article.pdf -o out

  # Talk to a remote service
  pdf2pubmed --server https://converter.example.org article.pdf

  # Print the validation report as JSON (archive still saved)
  pdf2pubmed --json article.pdf > report.json

  # Print the full validation report, warnings included
  pdf2pubmed --report-text article.pdf

  # Check the service is up
  pdf2pubmed --health

OUTPUT:
  The service answers with <name>.zip holding the original PDF, the
  generated XML, the figures and validation_report.json. The archive is
  saved as-is; its validation errors are listed on stderr.

ENVIRONMENT VARIABLES:
  PDF2PUBMED_SERVER        Conversion service root URL
  PDF2PUBMED_OUTPUT_DIR    Directory the archive is saved into
  PDF2PUBMED_ARTICLE_TYPE  abstract | full
  PDF2PUBMED_TIMEOUT       Request timeout in seconds (default: none)
  RUST_LOG                 Override log filtering (e.g. pdf2pubmed=debug)
"#;

/// Convert PDF articles to PubMed XML through a conversion service.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2pubmed",
    version,
    about = "Convert PDF articles to PubMed XML through a conversion service",
    long_about = "Upload a PDF article (and optional figure images) to a PDF-to-PubMed-XML \
conversion service, list the validation issues it reports, and save the returned ZIP archive.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Article PDF to convert.
    #[arg(required_unless_present = "health")]
    pdf: Option<PathBuf>,

    /// Figure image to send with the article (repeatable).
    #[arg(short, long = "figure", value_name = "IMAGE")]
    figures: Vec<PathBuf>,

    /// Conversion flavour.
    #[arg(short, long, env = "PDF2PUBMED_ARTICLE_TYPE", value_enum, default_value = "abstract")]
    article_type: ArticleTypeArg,

    /// Conversion service root URL.
    #[arg(short, long, env = "PDF2PUBMED_SERVER", default_value = "http://localhost:5000")]
    server: String,

    /// Directory to save the returned archive into.
    #[arg(short, long, env = "PDF2PUBMED_OUTPUT_DIR", default_value = ".")]
    output_dir: PathBuf,

    /// Request timeout in seconds. No timeout when unset.
    #[arg(long, env = "PDF2PUBMED_TIMEOUT")]
    timeout: Option<u64>,

    /// Largest PDF to upload, in bytes.
    #[arg(long, env = "PDF2PUBMED_MAX_PDF_BYTES", default_value_t = pdf2pubmed::config::DEFAULT_MAX_PDF_BYTES)]
    max_pdf_bytes: u64,

    /// Print the validation report as JSON on stdout.
    #[arg(long, env = "PDF2PUBMED_JSON")]
    json: bool,

    /// Print the full validation report as text on stdout.
    #[arg(long, env = "PDF2PUBMED_REPORT_TEXT", conflicts_with = "json")]
    report_text: bool,

    /// Probe the service health endpoint and exit.
    #[arg(long)]
    health: bool,

    /// Disable the progress spinner.
    #[arg(long, env = "PDF2PUBMED_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDF2PUBMED_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDF2PUBMED_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum ArticleTypeArg {
    Abstract,
    Full,
}

impl From<ArticleTypeArg> for ArticleType {
    fn from(v: ArticleTypeArg) -> Self {
        match v {
            ArticleTypeArg::Abstract => ArticleType::Abstract,
            ArticleTypeArg::Full => ArticleType::Full,
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Keep library INFO logs out of the way of the spinner.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
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

    let config = build_config(&cli)?;
    let backend = Arc::new(HttpBackend::new(&config).context("Failed to set up HTTP client")?);

    // ── Health-only mode ─────────────────────────────────────────────────
    if cli.health {
        let health = backend
            .health()
            .await
            .with_context(|| format!("Health check against {} failed", cli.server))?;
        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&health).context("Failed to serialise health")?
            );
        } else {
            let mark = if health.is_healthy() { green("✔") } else { red("✘") };
            println!("{} {}  {}", mark, bold(&health.status), dim(&cli.server));
            for (component, status) in &health.components {
                println!("   {component:<20} {status}");
            }
        }
        anyhow::ensure!(health.is_healthy(), "service reports '{}'", health.status);
        return Ok(ExitCode::SUCCESS);
    }

    // ── Fill in the form ─────────────────────────────────────────────────
    let observer = CliObserver::new(show_progress);
    let mut session =
        ConversionSession::new(backend, &config).with_observer(observer.clone());
    session.set_article_type(cli.article_type.clone().into());

    let pdf_path = cli
        .pdf
        .as_ref()
        .context("A PDF file is required unless --health is given")?;
    let pdf = FileRef::from_path(pdf_path).await?;
    // Session errors have already been alerted by the observer.
    if let Some(event) = FileIntake::pdf().select(vec![pdf]) {
        if session.apply(event).is_err() {
            return Ok(ExitCode::FAILURE);
        }
    }

    let mut figures = Vec::with_capacity(cli.figures.len());
    for path in &cli.figures {
        figures.push(FileRef::from_path(path).await?);
    }
    if let Some(event) = FileIntake::figures().select(figures) {
        if session.apply(event).is_err() {
            return Ok(ExitCode::FAILURE);
        }
    }

    // ── Convert ──────────────────────────────────────────────────────────
    match session.submit().await {
        Ok(SubmitOutcome::Completed) => {}
        Ok(SubmitOutcome::MissingPdf | SubmitOutcome::Busy) | Err(_) => {
            return Ok(ExitCode::FAILURE)
        }
    }

    if cli.json {
        let report = session.report().cloned().unwrap_or_default();
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Failed to serialise report")?
        );
    } else if cli.report_text {
        let report = session.report().cloned().unwrap_or_default();
        println!("{}", report.render_text());
    } else if !cli.quiet {
        print_issues(&session);
    }

    // ── Download ─────────────────────────────────────────────────────────
    let entries = session
        .artifact()
        .map(|a| a.entries().len())
        .unwrap_or_default();
    let saved = session
        .download_to(&cli.output_dir)
        .await
        .context("Failed to save archive")?;

    if !cli.quiet {
        eprintln!(
            "{}  {}  {}",
            green("✔"),
            bold(&saved.display().to_string()),
            dim(&format!("{entries} entries")),
        );
    }

    Ok(ExitCode::SUCCESS)
}

/// Map CLI args to `ClientConfig`.
fn build_config(cli: &Cli) -> Result<ClientConfig> {
    let mut builder = ClientConfig::builder()
        .base_url(cli.server.clone())
        .max_pdf_bytes(cli.max_pdf_bytes);
    if let Some(secs) = cli.timeout {
        builder = builder.request_timeout_secs(secs);
    }
    builder.build().context("Invalid configuration")
}

/// The validation panel: one line per issue, suggestion underneath.
fn print_issues(session: &ConversionSession) {
    let issues = session.issues();
    if issues.is_empty() {
        eprintln!("{} no validation errors reported", green("✔"));
    } else {
        eprintln!(
            "{} {} validation error(s):",
            yellow("⚠"),
            bold(&issues.len().to_string())
        );
        for issue in issues {
            eprintln!("  {} {}", yellow("•"), issue);
            if let Some(ref s) = issue.suggestion {
                eprintln!("    {}", dim(s));
            }
        }
    }

    let warnings = session.report().map(|r| r.warnings.len()).unwrap_or_default();
    if warnings > 0 {
        eprintln!("  {}", dim(&format!("{warnings} warning(s) in validation_report.json")));
    }
}
