//! Model client: ordered fallback across candidate model identifiers.
//!
//! The remote service is reached through two small traits:
//!
//! * [`ModelConnector`] — builds a [`TextModel`] bound to one identifier.
//! * [`TextModel`] — sends one prompt and returns text.
//!
//! [`EdgequakeConnector`] implements them on top of `edgequake-llm`; tests
//! substitute scripted fakes.
//!
//! ## Selection
//!
//! Candidates are tried strictly in order. With probing enabled, each
//! candidate gets the probe prompt first; the first one that answers is
//! selected and receives the real prompt as a second call. Later candidates
//! are never touched. Without probing, the real prompt itself goes to each
//! candidate in turn. There is no retry and no backoff: when the list is
//! exhausted the turn fails with the last error seen.

use crate::config::ChatConfig;
use crate::error::ChatError;
use async_trait::async_trait;
use edgequake_llm::{
    AnthropicProvider, ChatMessage, CompletionOptions, GeminiProvider, LLMProvider,
    OpenAIProvider, OpenRouterProvider, ProviderFactory, ProviderType,
};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Sampling knobs for one call.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GenerationOptions {
    pub temperature: Option<f32>,
    pub max_tokens: Option<usize>,
}

/// A model bound to one identifier.
#[async_trait]
pub trait TextModel: Send + Sync {
    /// The identifier this model was built for.
    fn model_id(&self) -> &str;

    /// Send a single-turn prompt and return the reply text.
    async fn generate(&self, prompt: &str, options: &GenerationOptions) -> Result<String, ChatError>;
}

/// Builds [`TextModel`]s by identifier.
pub trait ModelConnector: Send + Sync {
    /// Construct a model for `model_id`. Construction failures count as a
    /// failed candidate.
    fn connect(&self, model_id: &str) -> Result<Arc<dyn TextModel>, ChatError>;
}

/// The answer to one turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelReply {
    /// Identifier that produced the answer.
    pub model: String,
    pub text: String,
    /// Candidates that failed before `model` was selected.
    pub skipped: usize,
}

/// Pick the first candidate that answers the probe.
///
/// Returns the model and the number of candidates that failed before it.
pub async fn select_model(
    connector: &dyn ModelConnector,
    config: &ChatConfig,
) -> Result<(Arc<dyn TextModel>, usize), ChatError> {
    let probe_options = GenerationOptions {
        temperature: None,
        max_tokens: config.probe_max_tokens,
    };
    let total = config.candidate_models.len();
    let mut last_error: Option<String> = None;

    for (idx, model_id) in config.candidate_models.iter().enumerate() {
        if let Some(ref cb) = config.progress_callback {
            cb.on_probe_start(model_id, idx + 1, total);
        }

        let attempt = match connector.connect(model_id) {
            Ok(model) => model
                .generate(&config.probe_prompt, &probe_options)
                .await
                .map(|_| model),
            Err(e) => Err(e),
        };

        match attempt {
            Ok(model) => {
                info!("Model '{}' answered the probe ({}/{})", model_id, idx + 1, total);
                if let Some(ref cb) = config.progress_callback {
                    cb.on_model_selected(model_id);
                }
                return Ok((model, idx));
            }
            Err(e) => {
                let msg = e.raw_message();
                warn!("Candidate '{}' failed: {}", model_id, msg);
                if let Some(ref cb) = config.progress_callback {
                    cb.on_probe_failed(model_id, &msg);
                }
                last_error = Some(msg);
            }
        }
    }

    Err(ChatError::ModelUnreachable {
        tried: total,
        last_error: last_error.unwrap_or_else(|| "no candidate models configured".to_string()),
    })
}

/// Answer `prompt` with the first working candidate.
///
/// A failure of the real call (after a successful probe) is classified by
/// [`ChatError::from_model_failure`] into a quota or model-call error.
pub async fn complete_with_fallback(
    connector: &dyn ModelConnector,
    config: &ChatConfig,
    prompt: &str,
) -> Result<ModelReply, ChatError> {
    let options = GenerationOptions {
        temperature: config.temperature,
        max_tokens: config.max_tokens,
    };

    if !config.probe_before_prompt {
        return first_answer(connector, config, prompt, &options).await;
    }

    let (model, skipped) = select_model(connector, config).await?;
    let start = Instant::now();
    let text = model
        .generate(prompt, &options)
        .await
        .map_err(|e| ChatError::from_model_failure(model.model_id(), e.raw_message()))?;

    debug!(
        "Model '{}' answered in {:?} ({} chars)",
        model.model_id(),
        start.elapsed(),
        text.chars().count()
    );

    Ok(ModelReply {
        model: model.model_id().to_string(),
        text,
        skipped,
    })
}

/// Send the real prompt to each candidate in order; first answer wins.
async fn first_answer(
    connector: &dyn ModelConnector,
    config: &ChatConfig,
    prompt: &str,
    options: &GenerationOptions,
) -> Result<ModelReply, ChatError> {
    let total = config.candidate_models.len();
    let mut last_error: Option<ChatError> = None;

    for (idx, model_id) in config.candidate_models.iter().enumerate() {
        if let Some(ref cb) = config.progress_callback {
            cb.on_probe_start(model_id, idx + 1, total);
        }

        let attempt = match connector.connect(model_id) {
            Ok(model) => model.generate(prompt, options).await,
            Err(e) => Err(e),
        };

        match attempt {
            Ok(text) => {
                info!("Model '{}' answered ({}/{})", model_id, idx + 1, total);
                if let Some(ref cb) = config.progress_callback {
                    cb.on_model_selected(model_id);
                }
                return Ok(ModelReply {
                    model: model_id.clone(),
                    text,
                    skipped: idx,
                });
            }
            Err(e) => {
                let msg = e.raw_message();
                warn!("Candidate '{}' failed: {}", model_id, msg);
                if let Some(ref cb) = config.progress_callback {
                    cb.on_probe_failed(model_id, &msg);
                }
                last_error = Some(e);
            }
        }
    }

    match last_error {
        Some(e) => Err(ChatError::ModelUnreachable {
            tried: total,
            last_error: e.raw_message(),
        }),
        None => Err(ChatError::ModelUnreachable {
            tried: 0,
            last_error: "no candidate models configured".to_string(),
        }),
    }
}

// ── edgequake-llm backend ────────────────────────────────────────────────

/// [`ModelConnector`] backed by `edgequake-llm`.
///
/// With an explicit API key, the key-based providers (Gemini, OpenAI,
/// Anthropic, OpenRouter) are built from it directly. Every other case goes
/// through `ProviderFactory::create_llm_provider`, which reads the
/// environment (e.g. `GEMINI_API_KEY`).
#[derive(Clone)]
pub struct EdgequakeConnector {
    provider_name: String,
    api_key: Option<String>,
}

impl fmt::Debug for EdgequakeConnector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EdgequakeConnector")
            .field("provider_name", &self.provider_name)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl EdgequakeConnector {
    pub fn new(provider_name: impl Into<String>) -> Self {
        Self {
            provider_name: provider_name.into(),
            api_key: None,
        }
    }

    /// Connector for the provider and key of `config`.
    pub fn from_config(config: &ChatConfig) -> Self {
        let connector = Self::new(config.provider_name.clone());
        match config.api_key.as_deref() {
            Some(key) if !key.trim().is_empty() => connector.with_api_key(key),
            _ => connector,
        }
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn provider_name(&self) -> &str {
        &self.provider_name
    }

    fn provider_for(&self, model_id: &str) -> edgequake_llm::Result<Arc<dyn LLMProvider>> {
        let Some(key) = self.api_key.as_deref() else {
            return ProviderFactory::create_llm_provider(&self.provider_name, model_id);
        };
        let provider: Arc<dyn LLMProvider> = match ProviderType::from_str(&self.provider_name) {
            Some(ProviderType::Gemini) if !model_id.starts_with("vertexai:") => {
                Arc::new(GeminiProvider::new(key).with_model(model_id))
            }
            Some(ProviderType::OpenAI) => Arc::new(OpenAIProvider::new(key).with_model(model_id)),
            Some(ProviderType::Anthropic) => {
                Arc::new(AnthropicProvider::new(key).with_model(model_id))
            }
            Some(ProviderType::OpenRouter) => {
                Arc::new(OpenRouterProvider::new(key).with_model(model_id))
            }
            _ => return ProviderFactory::create_llm_provider(&self.provider_name, model_id),
        };
        Ok(provider)
    }
}

impl ModelConnector for EdgequakeConnector {
    fn connect(&self, model_id: &str) -> Result<Arc<dyn TextModel>, ChatError> {
        let provider =
            self.provider_for(model_id)
                .map_err(|e| ChatError::ProviderNotConfigured {
                    provider: self.provider_name.clone(),
                    hint: format!("{e}"),
                })?;
        Ok(Arc::new(EdgequakeModel {
            model_id: model_id.to_string(),
            provider,
        }))
    }
}

/// [`TextModel`] over an `edgequake_llm::LLMProvider`.
pub struct EdgequakeModel {
    model_id: String,
    provider: Arc<dyn LLMProvider>,
}

#[async_trait]
impl TextModel for EdgequakeModel {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn generate(&self, prompt: &str, options: &GenerationOptions) -> Result<String, ChatError> {
        let messages = vec![ChatMessage::user(prompt)];
        let completion = build_options(options);

        let response = self
            .provider
            .chat(&messages, Some(&completion))
            .await
            .map_err(|e| ChatError::ModelCall {
                model: self.model_id.clone(),
                message: format!("{e}"),
            })?;

        debug!(
            "Model '{}': {} input tokens, {} output tokens",
            self.model_id, response.prompt_tokens, response.completion_tokens
        );
        Ok(response.content)
    }
}

/// Build `CompletionOptions` from per-call generation options.
fn build_options(options: &GenerationOptions) -> CompletionOptions {
    CompletionOptions {
        temperature: options.temperature,
        max_tokens: options.max_tokens,
        ..Default::default()
    }
}
