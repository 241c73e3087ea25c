//! Inference boundary: the [`AnalysisBackend`] seam and its generic provider adapter.
//!
//! Every network call in the crate goes through [`AnalysisBackend::generate`].
//! The pipeline only sees the raw text (or an [`UpstreamFailure`]); turning
//! that into an [`crate::output::AnalysisResult`] or a user-facing error is
//! the decoder's job, so backends stay thin and tests can swap in a fake.
//!
//! Two backends ship with the crate:
//!
//! * [`crate::pipeline::gemini::GeminiClient`] — native `generateContent`
//!   with `responseSchema`, so the provider enforces the schema.
//! * [`ProviderBackend`] — any `edgequake-llm` vision provider. The schema is
//!   sent as a system message instead, and the decoder tolerates fenced JSON.

use crate::pipeline::request::AnalysisRequest;
use crate::prompts::schema_instructions;
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, ImageData, LLMProvider};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Text returned by a backend plus token accounting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawResponse {
    /// `None` when the provider answered without any text part.
    pub text: Option<String>,
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl RawResponse {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Default::default()
        }
    }
}

/// A provider-side failure, before classification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct UpstreamFailure {
    /// HTTP status, when the failure came from an HTTP response.
    pub status: Option<u16>,
    /// Provider status code such as `INVALID_ARGUMENT` or `RESOURCE_EXHAUSTED`.
    pub code: Option<String>,
    pub message: String,
}

impl UpstreamFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: None,
            code: None,
            message: message.into(),
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }
}

/// One schema-constrained inference round trip.
///
/// Implementations must be `Send + Sync`; the pipeline holds them as
/// `Arc<dyn AnalysisBackend>`.
#[async_trait]
pub trait AnalysisBackend: Send + Sync {
    /// Short label for logs and stats, e.g. `gemini/gemini-3-flash-preview`.
    fn name(&self) -> String;

    async fn generate(&self, request: &AnalysisRequest) -> Result<RawResponse, UpstreamFailure>;
}

/// Adapter over an `edgequake-llm` provider (OpenAI, Anthropic, Ollama, …).
///
/// ## Message Layout
///
/// 1. **System message** — the response schema as instructions
/// 2. **User message** — the audit prompt with the document attached as an image
pub struct ProviderBackend {
    provider: Arc<dyn LLMProvider>,
    label: String,
    temperature: Option<f32>,
    max_tokens: Option<usize>,
}

impl ProviderBackend {
    pub fn new(provider: Arc<dyn LLMProvider>, label: impl Into<String>) -> Self {
        Self {
            provider,
            label: label.into(),
            temperature: None,
            max_tokens: None,
        }
    }

    pub fn with_temperature(mut self, t: Option<f32>) -> Self {
        self.temperature = t;
        self
    }

    pub fn with_max_tokens(mut self, n: Option<usize>) -> Self {
        self.max_tokens = n;
        self
    }

    fn build_messages(request: &AnalysisRequest) -> Vec<ChatMessage> {
        let document = ImageData::new(request.payload.data.clone(), request.payload.mime_type());
        vec![
            ChatMessage::system(schema_instructions(&request.response_schema).as_str()),
            ChatMessage::user_with_images(request.prompt.as_str(), vec![document]),
        ]
    }

    fn build_options(&self) -> CompletionOptions {
        CompletionOptions {
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            ..Default::default()
        }
    }
}

#[async_trait]
impl AnalysisBackend for ProviderBackend {
    fn name(&self) -> String {
        self.label.clone()
    }

    async fn generate(&self, request: &AnalysisRequest) -> Result<RawResponse, UpstreamFailure> {
        let messages = Self::build_messages(request);
        let options = self.build_options();

        let response = self
            .provider
            .chat(&messages, Some(&options))
            .await
            .map_err(|e| UpstreamFailure::new(format!("{}", e)))?;

        debug!(
            "{}: {} input tokens, {} output tokens",
            self.label, response.prompt_tokens, response.completion_tokens
        );

        let text = (!response.content.trim().is_empty()).then_some(response.content);
        Ok(RawResponse {
            text,
            input_tokens: response.prompt_tokens as u64,
            output_tokens: response.completion_tokens as u64,
        })
    }
}
