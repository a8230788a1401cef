//! Error types for the edgequake-docchat library.
//!
//! Every failure the chat loop can hit is a variant of [`ChatError`]. The
//! variants fall into five families:
//!
//! * **Configuration** — missing API key, invalid settings. Fatal at startup;
//!   the message carries the remediation steps.
//! * **Artifact** — an upload could not be turned into text. Recovered
//!   locally: the session keeps whatever it had before the upload.
//! * **Model unreachable** — every candidate model identifier failed.
//! * **Quota** — the provider reported a usage or rate limit.
//! * **Model call** — any other provider failure, shown verbatim.
//!
//! None of them is retried, and none of them leaves a session half-updated.

use thiserror::Error;
use uuid::Uuid;

/// Shown after model failures, next to the error itself.
pub const SUPPORT_HINT: &str =
    "If you continue experiencing issues, please refresh the page or contact support.";

/// All errors returned by the edgequake-docchat library.
#[derive(Debug, Error)]
pub enum ChatError {
    // ── Configuration errors ──────────────────────────────────────────────
    /// The provider API key is not set.
    #[error(
        "API key not found: {var} is not set.\n\
Add it to the environment or the hosting platform's secrets, e.g.\n\
  {var}=\"your-api-key\""
    )]
    MissingApiKey { var: String },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The LLM provider could not be constructed for a model identifier.
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    // ── Artifact errors ───────────────────────────────────────────────────
    /// The upload does not start with the PDF signature.
    #[error("File '{name}' is not a valid PDF (first bytes: {magic:?})")]
    NotAPdf { name: String, magic: Vec<u8> },

    /// The PDF signature was present but text extraction failed.
    #[error("PDF could not be parsed: {detail}")]
    CorruptPdf { detail: String },

    /// A CSV or XLSX upload could not be parsed into a table.
    #[error("{format} file could not be parsed: {detail}")]
    TabularParse { format: String, detail: String },

    /// The file name and contents match no supported tabular format.
    #[error("Unsupported file '{name}': expected a .csv or .xlsx file")]
    UnsupportedFormat { name: String },

    /// The multipart request itself was malformed or had no file part.
    #[error("Invalid upload: {0}")]
    InvalidUpload(String),

    // ── Model errors ──────────────────────────────────────────────────────
    /// Every candidate model identifier failed to construct or to answer the probe.
    #[error("Could not connect to any model ({tried} tried). Last error: {last_error}")]
    ModelUnreachable { tried: usize, last_error: String },

    /// The provider reported a quota or rate limit.
    #[error("Usage limit reached on model '{model}': {message}")]
    QuotaExceeded { model: String, message: String },

    /// The provider returned any other error.
    #[error("Model '{model}' failed: {message}")]
    ModelCall { model: String, message: String },

    // ── Session errors ────────────────────────────────────────────────────
    /// No live session has this id.
    #[error("Session {0} not found")]
    SessionNotFound(Uuid),

    /// The chat message was empty or whitespace.
    #[error("Message is empty")]
    EmptyMessage,

    // ── Report errors ─────────────────────────────────────────────────────
    /// The PDF report could not be written.
    #[error("Report rendering failed: {0}")]
    ReportRender(String),

    // ── Server errors ─────────────────────────────────────────────────────
    /// Binding or serving the HTTP listener failed.
    #[error("Server error: {0}")]
    Server(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ChatError {
    /// Classify a failed model call by its raw error text.
    ///
    /// Any mention of "quota" or "limit" (case-insensitive) is a quota error;
    /// everything else is a plain model-call error.
    pub fn from_model_failure(model: impl Into<String>, message: impl Into<String>) -> Self {
        let model = model.into();
        let message = message.into();
        let lower = message.to_lowercase();
        if lower.contains("quota") || lower.contains("limit") {
            ChatError::QuotaExceeded { model, message }
        } else {
            ChatError::ModelCall { model, message }
        }
    }

    /// The underlying error text without the variant prefix.
    ///
    /// Used as the "last error" when falling through candidate models.
    pub fn raw_message(&self) -> String {
        match self {
            ChatError::ModelCall { message, .. } | ChatError::QuotaExceeded { message, .. } => {
                message.clone()
            }
            ChatError::ProviderNotConfigured { hint, .. } => hint.clone(),
            ChatError::ModelUnreachable { last_error, .. } => last_error.clone(),
            other => other.to_string(),
        }
    }

    /// The message shown to the person in the chat window.
    pub fn user_message(&self) -> String {
        match self {
            ChatError::QuotaExceeded { .. } => {
                "Daily usage limit reached. Please try again later or contact support.".to_string()
            }
            ChatError::ModelCall { message, .. } => format!("Error: {message}"),
            ChatError::ModelUnreachable { last_error, .. } => {
                format!("Could not connect to any model. Last error: {last_error}")
            }
            ChatError::NotAPdf { .. } | ChatError::CorruptPdf { .. } => {
                format!("Error reading PDF: {self}")
            }
            ChatError::TabularParse { .. } | ChatError::UnsupportedFormat { .. } => {
                format!("Error reading file: {self}")
            }
            other => other.to_string(),
        }
    }

    /// A follow-up suggestion for the user, when one applies.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            ChatError::ModelUnreachable { .. } => Some("Please check your API key configuration."),
            ChatError::QuotaExceeded { .. } | ChatError::ModelCall { .. } => Some(SUPPORT_HINT),
            _ => None,
        }
    }

    /// True for errors caused by an upload rather than by the service.
    pub fn is_artifact_error(&self) -> bool {
        matches!(
            self,
            ChatError::NotAPdf { .. }
                | ChatError::CorruptPdf { .. }
                | ChatError::TabularParse { .. }
                | ChatError::UnsupportedFormat { .. }
                | ChatError::InvalidUpload(_)
        )
    }
}
