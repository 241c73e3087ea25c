//! CLI binary for resume-audit.
//!
//! Maps flags onto an `AnalyzerConfig`, feeds the file and job details
//! through a `Session`, and prints the report.

use anyhow::{bail, Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use resume_audit::pipeline::input::load_upload;
use resume_audit::{
    analyze::write_atomic, render_markdown, resolve_backend, AnalysisProgressCallback,
    AnalyzerConfig, JobField, Phase, ProgressCallback, Session,
};
use std::io::{self, Write};
use std::path::PathBuf;
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
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Spinner shown while the single inference call is in flight.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Preparing");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl AnalysisProgressCallback for CliProgressCallback {
    fn on_validated(&self, display_name: &str, size_bytes: u64) {
        self.bar.set_message(format!(
            "{display_name} {}",
            dim(&format!("({:.1} KiB)", size_bytes as f64 / 1024.0))
        ));
    }

    fn on_request_sent(&self, backend: &str) {
        self.bar.set_prefix("Analysing");
        self.bar.set_message(format!("waiting for {backend}…"));
    }

    fn on_complete(&self, overall_score: f64, elapsed_ms: u64) {
        self.bar.finish_and_clear();
        eprintln!(
            "{} Score {}  {}",
            green("✔"),
            bold(&format!("{overall_score}/100")),
            dim(&format!("{:.1}s", elapsed_ms as f64 / 1000.0)),
        );
    }

    fn on_error(&self, message: &str) {
        self.bar.finish_and_clear();
        eprintln!("{} {}", red("✘"), message);
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Audit a PDF résumé, Markdown report on stdout
  resume-audit resume.pdf --title "Backend Engineer" --description "Go, Kubernetes, gRPC"

  # Company name, description from a file, report to disk
  resume-audit cv.png --title "Data Scientist" --company Acme \
      --description-file job.txt -o report.md

  # Raw JSON result
  resume-audit resume.pdf --title SRE --description "Linux, on-call" --json > audit.json

  # Another edgequake-llm provider instead of native Gemini
  resume-audit resume.pdf --provider openai --model gpt-4.1-mini --title ... --description ...

SUPPORTED FILES:
  PDF, PNG, JPEG, WEBP up to 4 MB.

ENVIRONMENT VARIABLES:
  GEMINI_API_KEY          Google Gemini API key (API_KEY is also accepted)
  RESUME_AUDIT_MODEL      Override model ID (default gemini-3-flash-preview)
  RESUME_AUDIT_PROVIDER   Use an edgequake-llm provider (openai, anthropic, ollama, …)
  RUST_LOG                Override log filter
"#;

/// Score a résumé against a job description with a multimodal LLM.
#[derive(Parser, Debug)]
#[command(
    name = "resume-audit",
    version,
    about = "Score a résumé against a job description with a multimodal LLM",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Résumé file (PDF, PNG, JPEG or WEBP).
    file: PathBuf,

    /// Job title.
    #[arg(short, long, env = "RESUME_AUDIT_TITLE")]
    title: Option<String>,

    /// Company name (optional).
    #[arg(short, long, env = "RESUME_AUDIT_COMPANY")]
    company: Option<String>,

    /// Job description text.
    #[arg(short, long, env = "RESUME_AUDIT_DESCRIPTION", conflicts_with = "description_file")]
    description: Option<String>,

    /// Read the job description from a file.
    #[arg(long, env = "RESUME_AUDIT_DESCRIPTION_FILE")]
    description_file: Option<PathBuf>,

    /// Write the report to this file instead of stdout.
    #[arg(short, long, env = "RESUME_AUDIT_OUTPUT")]
    output: Option<PathBuf>,

    /// Model ID.
    #[arg(long, env = "RESUME_AUDIT_MODEL")]
    model: Option<String>,

    /// edgequake-llm provider name; omit (or "gemini") for the native client.
    #[arg(long, env = "RESUME_AUDIT_PROVIDER")]
    provider: Option<String>,

    /// Gemini API key.
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Sampling temperature (0.0–2.0).
    #[arg(long, env = "RESUME_AUDIT_TEMPERATURE")]
    temperature: Option<f32>,

    /// Output token cap.
    #[arg(long, env = "RESUME_AUDIT_MAX_OUTPUT_TOKENS")]
    max_output_tokens: Option<usize>,

    /// HTTP timeout for the inference call, in seconds (default: none).
    #[arg(long, env = "RESUME_AUDIT_API_TIMEOUT")]
    api_timeout: Option<u64>,

    /// Output the AnalysisResult as JSON instead of Markdown.
    #[arg(long, env = "RESUME_AUDIT_JSON")]
    json: bool,

    /// Disable the spinner.
    #[arg(long, env = "RESUME_AUDIT_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "RESUME_AUDIT_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "RESUME_AUDIT_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
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

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn AnalysisProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb)?;
    let description = read_description(&cli).await?;

    // ── Fill the session ─────────────────────────────────────────────────
    let upload = load_upload(&cli.file, config.max_file_bytes)
        .await
        .with_context(|| format!("Cannot use {}", cli.file.display()))?;

    let backend = resolve_backend(&config).context("No analysis backend available")?;
    let mut session = Session::new(config);

    if let Some(err) = session.select_file(upload).error.clone() {
        bail!(err);
    }
    session.set_job_field(JobField::Title, cli.title.clone().unwrap_or_default());
    session.set_job_field(JobField::Company, cli.company.clone().unwrap_or_default());
    session.set_job_field(JobField::Description, description);

    // ── Run ──────────────────────────────────────────────────────────────
    let state = session.submit(backend.as_ref()).await;
    let result = match &state.phase {
        Phase::Succeeded(result) => &**result,
        Phase::Failed(message) => bail!("Analysis failed: {message}"),
        _ => bail!(state
            .error
            .clone()
            .unwrap_or_else(|| "Analysis did not run".to_string())),
    };

    let rendered = if cli.json {
        serde_json::to_string_pretty(result).context("Failed to serialise result")?
    } else {
        render_markdown(result, &state.job)
    };

    if let Some(ref path) = cli.output {
        write_atomic(path, &rendered)
            .await
            .context("Failed to write report")?;
        if !cli.quiet {
            eprintln!("{}  →  {}", green("✔"), bold(&path.display().to_string()));
        }
    } else {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        handle
            .write_all(rendered.as_bytes())
            .context("Failed to write to stdout")?;
        if !rendered.ends_with('\n') {
            handle.write_all(b"\n").ok();
        }
    }

    Ok(())
}

/// Map CLI args to `AnalyzerConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<AnalyzerConfig> {
    let mut builder = AnalyzerConfig::builder();
    if let Some(ref model) = cli.model {
        builder = builder.model(model);
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider);
    }
    if let Some(ref key) = cli.api_key {
        builder = builder.api_key(key);
    }
    if let Some(t) = cli.temperature {
        builder = builder.temperature(t);
    }
    if let Some(n) = cli.max_output_tokens {
        builder = builder.max_output_tokens(n);
    }
    if let Some(secs) = cli.api_timeout {
        builder = builder.api_timeout_secs(secs);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }
    builder.build().context("Invalid configuration")
}

async fn read_description(cli: &Cli) -> Result<String> {
    match (&cli.description, &cli.description_file) {
        (Some(text), _) => Ok(text.clone()),
        (None, Some(path)) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read job description from {:?}", path)),
        (None, None) => Ok(String::new()),
    }
}
