//! # edgequake-docchat
//!
//! Chat with uploaded PDFs and spreadsheets through a hosted LLM, and export
//! the answer as a PDF report.
//!
//! The crate is orchestration glue: text extraction, table parsing, the
//! model call and PDF writing are each one library or API call. What it adds
//! is the conversation loop around them: per-session state, a bounded
//! context built from the uploads, and fallback across an ordered list of
//! model identifiers until one answers.
//!
//! ## Turn Overview
//!
//! ```text
//! message
//!  │
//!  ├─ 1. Session   append the user message
//!  ├─ 2. Context   PDF text + table text, each cut to 8000 chars
//!  ├─ 3. Select    probe candidate models in order, first answer wins
//!  ├─ 4. Ask       send the assembled prompt to the selected model
//!  ├─ 5. Record    append the reply, bump the request counter
//!  └─ 6. Report    render the reply as a PDF when the message asks for one
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_docchat::{ChatConfig, ChatEngine, SessionState};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Reads GEMINI_API_KEY
//!     let config = ChatConfig::builder().api_key_from_env().build()?;
//!     let engine = ChatEngine::from_config(config);
//!
//!     let mut session = SessionState::new();
//!     engine.ingest_table(&mut session, "sales.csv", b"region,total\nnorth,12\nsouth,9\n")?;
//!     let outcome = engine.send_message(&mut session, "Which region sold more?").await?;
//!     println!("{} (via {})", outcome.reply, outcome.model);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `docchat` server binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` to embed the engine or the router without CLI-only deps:
//! ```toml
//! edgequake-docchat = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod chat;
pub mod config;
pub mod context;
pub mod error;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod server;
pub mod session;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use chat::{ChatEngine, PdfSummary, TableSummary, TurnOutcome};
pub use config::{ChatConfig, ChatConfigBuilder, ServerConfig};
pub use context::assemble_prompt;
pub use error::ChatError;
pub use pipeline::llm::{EdgequakeConnector, GenerationOptions, ModelConnector, TextModel};
pub use pipeline::report::Report;
pub use progress::{NoopProgressCallback, ProgressCallback, TurnProgressCallback};
pub use server::{create_router, serve, AppState};
pub use session::{Message, Role, SessionSnapshot, SessionState, SessionStore};
