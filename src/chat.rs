//! Chat engine: one user turn, one upload, one session at a time.
//!
//! [`ChatEngine`] holds the configuration and the model connector. It owns
//! no conversation state: every call takes the [`SessionState`] it works on,
//! so a host decides how sessions are stored and locked.
//!
//! A turn runs:
//!
//! 1. reject blank input (state untouched)
//! 2. append the user message
//! 3. assemble the prompt from the session's artifacts
//! 4. fall back across candidate models
//! 5. on success, bump `request_count`, append the reply, and render a
//!    report when the message asks for one
//!
//! On a model failure the user message stays in the history and nothing
//! else changes. Uploads are all-or-nothing: the artifact field is replaced
//! only after the new text has been extracted.

use crate::config::ChatConfig;
use crate::context::{assemble_prompt, truncate_chars};
use crate::error::ChatError;
use crate::pipeline::input::{detect_tabular_format, TabularFormat};
use crate::pipeline::llm::{complete_with_fallback, EdgequakeConnector, ModelConnector};
use crate::pipeline::report::{render_report, wants_report, Report};
use crate::pipeline::{pdf, tabular};
use crate::session::{Message, SessionState};
use chrono::Local;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Characters of extracted PDF text shown after an upload.
pub const PDF_PREVIEW_CHARS: usize = 500;

/// Table rows shown after an upload.
pub const TABLE_PREVIEW_ROWS: usize = 5;

/// Result of a successful turn.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub reply: String,
    /// Identifier of the model that answered.
    pub model: String,
    /// Session request count after this turn.
    pub request_count: u64,
    /// Present when the message asked for a report and rendering worked.
    pub report: Option<Report>,
    /// Present when the message asked for a report and rendering failed.
    pub report_error: Option<String>,
}

/// What the user sees after a PDF upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PdfSummary {
    pub characters: usize,
    pub pages: usize,
    pub preview: String,
}

impl PdfSummary {
    pub fn status_line(&self) -> String {
        format!("PDF loaded ({} characters)", self.characters)
    }
}

/// What the user sees after a CSV/XLSX upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableSummary {
    pub format: TabularFormat,
    pub rows: usize,
    pub columns: usize,
    pub preview: String,
}

impl TableSummary {
    pub fn status_line(&self) -> String {
        format!("Data loaded ({} rows, {} columns)", self.rows, self.columns)
    }
}

/// Drives chat turns and uploads against caller-owned sessions.
pub struct ChatEngine {
    config: ChatConfig,
    connector: Arc<dyn ModelConnector>,
}

impl ChatEngine {
    /// Engine over an explicit connector.
    pub fn new(config: ChatConfig, connector: Arc<dyn ModelConnector>) -> Self {
        Self { config, connector }
    }

    /// Engine over the `edgequake-llm` provider named in `config`.
    ///
    /// The configured API key is handed to the provider; see
    /// [`EdgequakeConnector`] for the providers that read the environment
    /// instead.
    pub fn from_config(config: ChatConfig) -> Self {
        let connector = Arc::new(EdgequakeConnector::from_config(&config));
        Self::new(config, connector)
    }

    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    /// Run one chat turn.
    pub async fn send_message(
        &self,
        state: &mut SessionState,
        message: &str,
    ) -> Result<TurnOutcome, ChatError> {
        if message.trim().is_empty() {
            return Err(ChatError::EmptyMessage);
        }

        state.messages.push(Message::user(message));
        let prompt = assemble_prompt(state, message, self.config.context_char_budget);
        info!(
            "Turn start: {} prompt chars (pdf: {}, data: {})",
            prompt.chars().count(),
            state.has_pdf(),
            state.has_data()
        );
        if let Some(ref cb) = self.config.progress_callback {
            cb.on_turn_start(prompt.chars().count());
        }

        let start = Instant::now();
        let reply = match complete_with_fallback(self.connector.as_ref(), &self.config, &prompt).await
        {
            Ok(reply) => reply,
            Err(e) => {
                warn!("Turn failed: {}", e);
                if let Some(ref cb) = self.config.progress_callback {
                    cb.on_turn_error(&e.user_message());
                }
                return Err(e);
            }
        };

        state.request_count += 1;
        state.messages.push(Message::assistant(reply.text.clone()));
        info!(
            "Turn complete: model '{}' in {:?}, request #{}",
            reply.model,
            start.elapsed(),
            state.request_count
        );
        if let Some(ref cb) = self.config.progress_callback {
            cb.on_turn_complete(&reply.model, reply.text.chars().count());
        }

        let (report, report_error) = if wants_report(message, &self.config.report_keywords) {
            match render_report(
                &self.config.report_title,
                &reply.text,
                Local::now().naive_local(),
            ) {
                Ok(report) => {
                    info!("Report ready: {}", report.file_name);
                    (Some(report), None)
                }
                Err(e) => {
                    warn!("Report failed: {}", e);
                    (None, Some(e.to_string()))
                }
            }
        } else {
            (None, None)
        };

        Ok(TurnOutcome {
            reply: reply.text,
            model: reply.model,
            request_count: state.request_count,
            report,
            report_error,
        })
    }

    /// Replace the session's PDF text with the text of `bytes`.
    pub async fn ingest_pdf(
        &self,
        state: &mut SessionState,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<PdfSummary, ChatError> {
        let extracted = pdf::extract_text(file_name, bytes).await?;

        let characters = extracted.char_count();
        let preview = format!("{}...", truncate_chars(&extracted.text, PDF_PREVIEW_CHARS));
        state.pdf_text = extracted.text;

        info!("Loaded PDF '{}': {} characters", file_name, characters);
        Ok(PdfSummary {
            characters,
            pages: extracted.page_count,
            preview,
        })
    }

    /// Replace the session's data context with the rendering of a CSV/XLSX upload.
    pub fn ingest_table(
        &self,
        state: &mut SessionState,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<TableSummary, ChatError> {
        let format = detect_tabular_format(file_name, bytes)?;
        let table = tabular::parse_table(format, bytes)?;
        let (rows, columns) = table.shape();

        state.data_context = table.render();

        info!(
            "Loaded {} '{}': {} rows, {} columns",
            format.label(),
            file_name,
            rows,
            columns
        );
        Ok(TableSummary {
            format,
            rows,
            columns,
            preview: table.head(TABLE_PREVIEW_ROWS),
        })
    }
}
