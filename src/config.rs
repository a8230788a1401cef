//! Configuration types for the chat engine and the HTTP server.
//!
//! Chat behaviour is controlled through [`ChatConfig`], built via
//! [`ChatConfigBuilder`]. Server wiring (bind address, upload cap) lives in
//! the separate [`ServerConfig`] so the engine can be embedded without a
//! server.

use crate::error::ChatError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Default ordered list of candidate model identifiers.
///
/// The same model is listed under both its short and `models/`-prefixed
/// names because different API versions accept different spellings.
pub const DEFAULT_CANDIDATE_MODELS: &[&str] = &[
    "gemini-1.5-flash",
    "gemini-1.5-pro",
    "gemini-pro",
    "models/gemini-1.5-flash",
    "models/gemini-1.5-pro",
    "models/gemini-pro",
];

/// Phrases that ask for the last answer as a PDF report.
pub const DEFAULT_REPORT_KEYWORDS: &[&str] = &[
    "generate pdf",
    "create pdf",
    "make pdf",
    "pdf report",
    "download report",
];

/// Characters of each artifact that may enter a prompt.
pub const DEFAULT_CONTEXT_CHAR_BUDGET: usize = 8000;

/// Name of the environment variable holding the API key for `provider`.
pub fn api_key_var(provider: &str) -> String {
    match provider.to_ascii_lowercase().as_str() {
        "gemini" | "google" | "vertex" => "GEMINI_API_KEY".to_string(),
        "openai" => "OPENAI_API_KEY".to_string(),
        "anthropic" | "claude" => "ANTHROPIC_API_KEY".to_string(),
        "mistral" => "MISTRAL_API_KEY".to_string(),
        other => format!("{}_API_KEY", other.to_ascii_uppercase().replace('-', "_")),
    }
}

/// Configuration for the chat engine.
///
/// # Example
/// ```rust
/// use edgequake_docchat::ChatConfig;
///
/// let config = ChatConfig::builder()
///     .api_key("AIza-example")
///     .candidate_models(["gemini-2.0-flash", "gemini-1.5-flash"])
///     .context_char_budget(4000)
///     .build()
///     .unwrap();
/// assert_eq!(config.candidate_models.len(), 2);
/// ```
#[derive(Clone)]
pub struct ChatConfig {
    /// LLM provider name passed to `edgequake_llm::ProviderFactory`. Default: `gemini`.
    pub provider_name: String,

    /// Provider API key. Required; never printed by `Debug`.
    pub api_key: Option<String>,

    /// Candidate model identifiers, tried in order until one answers.
    pub candidate_models: Vec<String>,

    /// Maximum characters of `pdf_text` and, separately, of `data_context`
    /// placed in a prompt. Default: 8000.
    pub context_char_budget: usize,

    /// Prompt sent to each candidate to check it is reachable. Default: `test`.
    pub probe_prompt: String,

    /// Probe each candidate before sending the real prompt. Default: true.
    ///
    /// When false, the real prompt is sent to each candidate in order and
    /// the first answer wins, which halves the number of calls per turn.
    pub probe_before_prompt: bool,

    /// Sampling temperature for the real prompt. None uses the provider default.
    pub temperature: Option<f32>,

    /// Output token cap for the real prompt. None uses the provider default.
    pub max_tokens: Option<usize>,

    /// Output token cap for the probe. None uses the provider default.
    pub probe_max_tokens: Option<usize>,

    /// Case-insensitive phrases that trigger a PDF report.
    pub report_keywords: Vec<String>,

    /// Title line of generated reports. Default: `AI Generated Report`.
    pub report_title: String,

    /// Optional per-turn progress observer.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            provider_name: "gemini".to_string(),
            api_key: None,
            candidate_models: DEFAULT_CANDIDATE_MODELS
                .iter()
                .map(|m| m.to_string())
                .collect(),
            context_char_budget: DEFAULT_CONTEXT_CHAR_BUDGET,
            probe_prompt: "test".to_string(),
            probe_before_prompt: true,
            temperature: None,
            max_tokens: None,
            probe_max_tokens: None,
            report_keywords: DEFAULT_REPORT_KEYWORDS
                .iter()
                .map(|k| k.to_string())
                .collect(),
            report_title: "AI Generated Report".to_string(),
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ChatConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatConfig")
            .field("provider_name", &self.provider_name)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("candidate_models", &self.candidate_models)
            .field("context_char_budget", &self.context_char_budget)
            .field("probe_prompt", &self.probe_prompt)
            .field("probe_before_prompt", &self.probe_before_prompt)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("probe_max_tokens", &self.probe_max_tokens)
            .field("report_keywords", &self.report_keywords)
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn TurnProgressCallback>"),
            )
            .finish()
    }
}

impl ChatConfig {
    /// Create a new builder for `ChatConfig`.
    pub fn builder() -> ChatConfigBuilder {
        ChatConfigBuilder {
            config: Self::default(),
        }
    }

    /// Name of the environment variable the configured provider reads its key from.
    pub fn api_key_var(&self) -> String {
        api_key_var(&self.provider_name)
    }
}

/// Builder for [`ChatConfig`].
#[derive(Debug)]
pub struct ChatConfigBuilder {
    config: ChatConfig,
}

impl ChatConfigBuilder {
    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = name.into();
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    /// Read the API key from the provider's environment variable, if set.
    ///
    /// Call after [`Self::provider_name`] so the right variable is consulted.
    pub fn api_key_from_env(mut self) -> Self {
        let var = self.config.api_key_var();
        if let Ok(key) = std::env::var(&var) {
            self.config.api_key = Some(key);
        }
        self
    }

    pub fn candidate_models<I, S>(mut self, models: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.candidate_models = models
            .into_iter()
            .map(Into::into)
            .map(|m: String| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .collect();
        self
    }

    pub fn context_char_budget(mut self, chars: usize) -> Self {
        self.config.context_char_budget = chars;
        self
    }

    pub fn probe_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.probe_prompt = prompt.into();
        self
    }

    pub fn probe_before_prompt(mut self, v: bool) -> Self {
        self.config.probe_before_prompt = v;
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = Some(t.clamp(0.0, 2.0));
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = Some(n.max(1));
        self
    }

    pub fn probe_max_tokens(mut self, n: usize) -> Self {
        self.config.probe_max_tokens = Some(n.max(1));
        self
    }

    pub fn report_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.report_keywords = keywords
            .into_iter()
            .map(Into::into)
            .map(|k: String| k.trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        self
    }

    pub fn report_title(mut self, title: impl Into<String>) -> Self {
        self.config.report_title = title.into();
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ChatConfig, ChatError> {
        let c = &self.config;
        let has_key = c.api_key.as_deref().is_some_and(|k| !k.trim().is_empty());
        if !has_key {
            return Err(ChatError::MissingApiKey {
                var: c.api_key_var(),
            });
        }
        if c.provider_name.trim().is_empty() {
            return Err(ChatError::InvalidConfig("Provider name must not be empty".into()));
        }
        if c.candidate_models.is_empty() {
            return Err(ChatError::InvalidConfig(
                "At least one candidate model is required".into(),
            ));
        }
        if c.context_char_budget == 0 {
            return Err(ChatError::InvalidConfig(
                "Context character budget must be ≥ 1".into(),
            ));
        }
        if c.probe_before_prompt && c.probe_prompt.trim().is_empty() {
            return Err(ChatError::InvalidConfig(
                "Probe prompt must not be empty when probing is enabled".into(),
            ));
        }
        Ok(self.config)
    }
}

/// Bind address and request limits for the HTTP server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to. Default: `0.0.0.0`.
    pub host: String,
    /// Port to bind to. Default: 8501.
    pub port: u16,
    /// Upload size cap in bytes. None (default) accepts any size.
    pub max_upload_bytes: Option<usize>,
    /// Sessions untouched for this many seconds are dropped. Default: 3600.
    /// None keeps sessions until they are deleted.
    pub session_idle_secs: Option<u64>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8501,
            max_upload_bytes: None,
            session_idle_secs: Some(3600),
        }
    }
}

impl ServerConfig {
    /// `host:port` string for binding.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn session_idle_ttl(&self) -> Option<Duration> {
        self.session_idle_secs.map(Duration::from_secs)
    }
}
