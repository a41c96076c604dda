//! CLI binary for doc2txt.
//!
//! A thin shim over the library crate: `serve` runs the backend, `extract`
//! drives an upload session against it, `health` asks it how Tika is doing.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use doc2txt::client::{write_atomic, Osc52Clipboard, SessionObserver};
use doc2txt::config::{DEFAULT_BACKEND_URL, DEFAULT_BIND_ADDR, DEFAULT_TIKA_ENDPOINT};
use doc2txt::{
    Backend, BackendClient, BackendConfig, ClientConfig, HealthStatus, UploadSession, UploadStatus,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── Terminal renderer for the upload session ─────────────────────────────────

/// Spinner that follows the session through its states.
struct SpinnerObserver {
    bar: ProgressBar,
}

impl SpinnerObserver {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Idle");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl SessionObserver for SpinnerObserver {
    fn on_transition(&self, _from: UploadStatus, to: UploadStatus) {
        let prefix = match to {
            UploadStatus::Idle => "Idle",
            UploadStatus::Uploading => "Uploading",
            UploadStatus::Processing => "Processing",
            UploadStatus::Done => "Done",
            UploadStatus::Error => "Error",
        };
        self.bar.set_prefix(prefix);
    }

    fn on_file_selected(&self, filename: &str, size: usize) {
        self.bar
            .set_message(format!("{filename} {}", dim(&format!("({size} bytes)"))));
    }

    fn on_done(&self, text_len: usize) {
        self.bar.finish_and_clear();
        eprintln!("{} {} bytes of text extracted", green("✔"), bold(&text_len.to_string()));
    }

    fn on_error(&self, message: &str) {
        self.bar.finish_and_clear();
        eprintln!("{} {}", red("✘"), red(message));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Run the backend against a local Tika server
  doc2txt serve --tika-endpoint http://localhost:9998

  # Extract a PDF through the running backend (stdout)
  doc2txt extract report.pdf

  # Markdown engine, result saved to a file
  doc2txt extract --markitdown notes.md -o notes.txt

  # No backend process: run the extraction in-process
  doc2txt extract --local report.pdf

  # Copy the result to the terminal's clipboard (OSC 52)
  doc2txt extract report.pdf --copy

  # Is Tika reachable?
  doc2txt health

ENVIRONMENT VARIABLES:
  TIKA_SERVER_ENDPOINT    Tika server URL (default http://localhost:9998)
  TIKA_PATH               Accepted for compatibility; unused
  DOC2TXT_BIND            Backend listen address (default 0.0.0.0:8005)
  DOC2TXT_TIKA_TIMEOUT    Seconds to wait for Tika (default 60)
  DOC2TXT_MAX_REQUEST_MB  Largest accepted request body (default 64)
  DOC2TXT_BACKEND         Backend URL used by extract/health (default http://localhost:8005)
  RUST_LOG                Log filter, overrides --verbose/--quiet

SETUP:
  1. Start Tika:     docker run -p 9998:9998 apache/tika
  2. Start backend:  doc2txt serve
  3. Extract:        doc2txt extract document.pdf
"#;

/// Extract plain text from documents via Apache Tika.
#[derive(Parser, Debug)]
#[command(
    name = "doc2txt",
    version,
    about = "Extract plain text from documents via Apache Tika or the built-in Markdown engine",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "DOC2TXT_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "DOC2TXT_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP backend.
    Serve(ServeArgs),
    /// Extract the text of one file.
    Extract(ExtractArgs),
    /// Query a backend's health report.
    Health(HealthArgs),
}

#[derive(clap::Args, Debug)]
struct ServeArgs {
    /// Address to listen on.
    #[arg(long, env = "DOC2TXT_BIND", default_value = DEFAULT_BIND_ADDR)]
    bind: String,

    /// Tika server URL.
    #[arg(long, env = "TIKA_SERVER_ENDPOINT", default_value = DEFAULT_TIKA_ENDPOINT)]
    tika_endpoint: String,

    /// Path to a local Tika jar. Accepted and logged; extraction always uses the endpoint.
    #[arg(long, env = "TIKA_PATH")]
    tika_path: Option<PathBuf>,

    /// Seconds to wait for Tika per request.
    #[arg(long, env = "DOC2TXT_TIKA_TIMEOUT", default_value_t = 60,
          value_parser = clap::value_parser!(u64).range(1..))]
    tika_timeout: u64,

    /// Largest accepted request body, in MiB.
    #[arg(long, env = "DOC2TXT_MAX_REQUEST_MB", default_value_t = 64,
          value_parser = clap::value_parser!(u64).range(1..=4096))]
    max_request_mb: u64,

    /// Return engine output as-is, without whitespace normalisation.
    #[arg(long)]
    raw: bool,
}

#[derive(clap::Args, Debug)]
struct ExtractArgs {
    /// File to extract.
    file: PathBuf,

    /// Backend URL. Ignored with --local.
    #[arg(long, env = "DOC2TXT_BACKEND", default_value = DEFAULT_BACKEND_URL)]
    backend: String,

    /// Run the backend in-process instead of calling a server.
    #[arg(long)]
    local: bool,

    /// Tika server URL, used with --local.
    #[arg(long, env = "TIKA_SERVER_ENDPOINT", default_value = DEFAULT_TIKA_ENDPOINT)]
    tika_endpoint: String,

    /// Use the Markdown engine instead of Tika.
    #[arg(long)]
    markitdown: bool,

    /// Write the text to this file instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print the result as JSON (`extractedText` or `errorMessage`).
    #[arg(long)]
    json: bool,

    /// Also copy the text to the clipboard via an OSC 52 terminal sequence.
    #[arg(long)]
    copy: bool,

    /// Disable the spinner.
    #[arg(long, env = "DOC2TXT_NO_PROGRESS")]
    no_progress: bool,
}

#[derive(clap::Args, Debug)]
struct HealthArgs {
    /// Backend URL.
    #[arg(long, env = "DOC2TXT_BACKEND", default_value = DEFAULT_BACKEND_URL)]
    backend: String,

    /// Print the raw JSON report.
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner gives all the feedback that matters during `extract`, so
    // library INFO logs are hidden there unless --verbose.
    let spinner_active = match &cli.command {
        Command::Extract(args) => !cli.quiet && !args.no_progress && !args.json,
        _ => false,
    };
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || spinner_active {
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

    match cli.command {
        Command::Serve(args) => serve(args).await,
        Command::Extract(args) => extract(args, cli.quiet, spinner_active).await,
        Command::Health(args) => health(args).await,
    }
}

async fn serve(args: ServeArgs) -> Result<ExitCode> {
    let mut builder = BackendConfig::builder()
        .tika_endpoint(&args.tika_endpoint)
        .tika_timeout_secs(args.tika_timeout)
        .normalize_output(!args.raw)
        .max_request_bytes((args.max_request_mb * 1024 * 1024) as usize);
    if let Some(path) = args.tika_path {
        builder = builder.tika_path(path);
    }
    let config = builder.build().context("Invalid configuration")?;
    let backend = Arc::new(Backend::new(config).context("Failed to initialise backend")?);

    let listener = tokio::net::TcpListener::bind(&args.bind)
        .await
        .with_context(|| format!("Failed to bind {}", args.bind))?;

    doc2txt::server::serve(listener, backend, async {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Ctrl-C received, shutting down");
        }
    })
    .await
    .context("Server failed")?;

    Ok(ExitCode::SUCCESS)
}

async fn extract(args: ExtractArgs, quiet: bool, spinner: bool) -> Result<ExitCode> {
    let bytes = tokio::fs::read(&args.file)
        .await
        .with_context(|| format!("Failed to read {}", args.file.display()))?;
    let filename = display_name(&args.file);

    let mut session = UploadSession::new();
    if spinner {
        session.subscribe(SpinnerObserver::new());
    }
    session.set_use_markitdown(args.markitdown)?;
    session.select_file(filename, bytes)?;

    if args.local {
        let config = BackendConfig::builder()
            .tika_endpoint(&args.tika_endpoint)
            .build()
            .context("Invalid configuration")?;
        let backend = Backend::new(config).context("Failed to initialise backend")?;
        session.submit(&backend).await?;
    } else {
        let config = ClientConfig::new(&args.backend).context("Invalid backend URL")?;
        let client = BackendClient::new(config)?;
        session.submit(&client).await?;
    }

    if args.json {
        if let Some(result) = session.result() {
            let json = serde_json::to_string_pretty(result).context("Failed to serialise result")?;
            println!("{json}");
        }
    }

    let Some(text) = session.text() else {
        if !spinner && !args.json {
            eprintln!(
                "{} {}",
                red("✘"),
                session.error().unwrap_or("Upload failed. Please try again.")
            );
        }
        return Ok(ExitCode::FAILURE);
    };

    if let Some(ref path) = args.output {
        write_atomic(path, text).with_context(|| format!("Failed to write {}", path.display()))?;
        if !quiet {
            eprintln!("{}  →  {}", green("✔"), bold(&path.display().to_string()));
        }
    } else if !args.json {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        handle
            .write_all(text.as_bytes())
            .context("Failed to write to stdout")?;
        if !text.ends_with('\n') {
            handle.write_all(b"\n").ok();
        }
    }

    if args.copy {
        let mut clipboard = Osc52Clipboard::stderr();
        session
            .copy_to_clipboard(&mut clipboard)
            .context("Failed to copy to clipboard")?;
        if !quiet {
            eprintln!("{} copied to clipboard", dim("⧉"));
        }
    }

    Ok(ExitCode::SUCCESS)
}

async fn health(args: HealthArgs) -> Result<ExitCode> {
    let client = BackendClient::new(ClientConfig::new(&args.backend).context("Invalid backend URL")?)?;
    let report = client.health().await.context("Health check failed")?;

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Failed to serialise health report")?
        );
    } else {
        print_health(&args.backend, &report);
    }

    Ok(if report.tika_up {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn print_health(url: &str, report: &HealthStatus) {
    let mark = |up: bool| if up { green("✓") } else { red("✗") };
    println!("Backend:     {} {} {}", mark(report.backend_up), report.service, dim(url));
    println!("Tika:        {} {}", mark(report.tika_up), report.tika_server);
    println!("MarkItDown:  {} {}", mark(true), report.markitdown);
}

/// The file's own name, falling back to the path as given.
fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
