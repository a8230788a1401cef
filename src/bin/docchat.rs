//! Server binary for edgequake-docchat.
//!
//! A thin shim over the library crate that maps CLI flags to `ChatConfig`
//! and `ServerConfig`, validates the API key, and serves the chat page.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_docchat::{serve, ChatConfig, ChatEngine, ServerConfig, TurnProgressCallback};
use std::io;
use std::sync::Arc;
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

// ── Console progress callback ────────────────────────────────────────────────

/// Prints model selection to stderr so operators can see which candidate
/// identifiers are actually answering.
struct ConsoleProgress;

impl TurnProgressCallback for ConsoleProgress {
    fn on_probe_failed(&self, model: &str, error: &str) {
        let msg = if error.chars().count() > 80 {
            format!("{}\u{2026}", error.chars().take(79).collect::<String>())
        } else {
            error.to_string()
        };
        eprintln!("  {} {:<28} {}", red("✗"), model, dim(&msg));
    }

    fn on_model_selected(&self, model: &str) {
        eprintln!("  {} {}", green("✓"), bold(model));
    }

    fn on_turn_error(&self, error: &str) {
        eprintln!("  {} {}", red("✗"), red(error));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Serve on the default port (8501)
  GEMINI_API_KEY=... docchat

  # Custom bind address
  docchat --host 127.0.0.1 --port 9000

  # Try newer models first
  docchat --models gemini-2.0-flash,gemini-1.5-flash

  # Skip the probe call (one request per candidate instead of two)
  docchat --no-probe

  # Cap uploads at 50 MB
  docchat --max-upload-bytes 52428800

ENVIRONMENT VARIABLES:
  GEMINI_API_KEY          Google Gemini API key (required for the default provider)
  <PROVIDER>_API_KEY      Key for another provider, e.g. OPENAI_API_KEY
  DOCCHAT_*               Every flag below also reads DOCCHAT_<FLAG>
  RUST_LOG                Log filter, overrides --verbose / --quiet

SETUP:
  1. Set API key:     export GEMINI_API_KEY=...
  2. Serve:           docchat
  3. Open:            http://localhost:8501
"#;

/// Chat with uploaded PDFs and spreadsheets through a hosted LLM.
#[derive(Parser, Debug)]
#[command(
    name = "docchat",
    version,
    about = "Chat with uploaded PDFs and spreadsheets through a hosted LLM",
    long_about = "Serve a single-page chat UI. Upload a PDF or a CSV/XLSX file, ask questions \
about it, and ask for a \"pdf report\" to download the last answer as a PDF. Candidate models \
are tried in order until one answers.",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Host to bind to.
    #[arg(long, env = "DOCCHAT_HOST", default_value = "0.0.0.0")]
    host: String,

    /// Port to bind to.
    #[arg(short, long, env = "DOCCHAT_PORT", default_value_t = 8501)]
    port: u16,

    /// LLM provider: gemini, openai, anthropic, ollama, …
    #[arg(long, env = "DOCCHAT_PROVIDER", default_value = "gemini")]
    provider: String,

    /// Comma-separated candidate model identifiers, tried in order.
    #[arg(long, env = "DOCCHAT_MODELS", value_delimiter = ',')]
    models: Vec<String>,

    /// Characters of each upload placed in a prompt.
    #[arg(long, env = "DOCCHAT_CONTEXT_CHARS", default_value_t = 8000)]
    context_chars: usize,

    /// Send the real prompt to each candidate instead of probing first.
    #[arg(long, env = "DOCCHAT_NO_PROBE")]
    no_probe: bool,

    /// Reject uploads larger than this many bytes (default: no limit).
    #[arg(long, env = "DOCCHAT_MAX_UPLOAD_BYTES")]
    max_upload_bytes: Option<usize>,

    /// Drop sessions untouched for this many seconds (0 keeps them forever).
    #[arg(long, env = "DOCCHAT_SESSION_IDLE_SECS", default_value_t = 3600)]
    session_idle_secs: u64,

    /// LLM temperature (0.0–2.0).
    #[arg(long, env = "DOCCHAT_TEMPERATURE")]
    temperature: Option<f32>,

    /// Max LLM output tokens per reply.
    #[arg(long, env = "DOCCHAT_MAX_TOKENS")]
    max_tokens: Option<usize>,

    /// Report title line.
    #[arg(long, env = "DOCCHAT_REPORT_TITLE")]
    report_title: Option<String>,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "DOCCHAT_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "DOCCHAT_QUIET")]
    quiet: bool,
}

fn chat_config(cli: &Cli) -> Result<ChatConfig> {
    let mut builder = ChatConfig::builder()
        .provider_name(&cli.provider)
        .api_key_from_env()
        .context_char_budget(cli.context_chars)
        .probe_before_prompt(!cli.no_probe);

    if !cli.models.is_empty() {
        builder = builder.candidate_models(cli.models.iter().cloned());
    }
    if let Some(t) = cli.temperature {
        builder = builder.temperature(t);
    }
    if let Some(n) = cli.max_tokens {
        builder = builder.max_tokens(n);
    }
    if let Some(ref title) = cli.report_title {
        builder = builder.report_title(title);
    }
    if !cli.quiet {
        builder = builder.progress_callback(Arc::new(ConsoleProgress));
    }

    builder.build().context("Configuration error")
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Configuration ────────────────────────────────────────────────────
    let config = chat_config(&cli)?;
    let server = ServerConfig {
        host: cli.host.clone(),
        port: cli.port,
        max_upload_bytes: cli.max_upload_bytes,
        session_idle_secs: (cli.session_idle_secs > 0).then_some(cli.session_idle_secs),
    };

    if !cli.quiet {
        eprintln!(
            "{} {}  {}",
            green("◆"),
            bold(&format!("docchat on http://{}", server.bind_addr())),
            dim(&format!(
                "{} · {} candidates",
                config.provider_name,
                config.candidate_models.len()
            )),
        );
    }

    // ── Serve ────────────────────────────────────────────────────────────
    let engine = ChatEngine::from_config(config);
    serve(engine, server).await.context("Server failed")?;
    Ok(())
}
