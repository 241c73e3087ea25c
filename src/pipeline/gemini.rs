//! Native Gemini `generateContent` client.
//!
//! The request inlines the document as `inlineData`, follows it with the
//! audit prompt, and pins `responseMimeType` + `responseSchema` so the
//! provider itself guarantees the JSON shape.
//!
//! Body building and response parsing are pure functions
//! ([`GeminiClient::request_body`], [`parse_generate_response`]) so the wire
//! format is testable without a network.

use crate::pipeline::llm::{AnalysisBackend, RawResponse, UpstreamFailure};
use crate::pipeline::request::{AnalysisRequest, RESPONSE_MIME_TYPE};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

/// Public Generative Language API root.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Model used when none is configured.
pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";

// ── Wire types: request ──────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig<'a>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct Part<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    inline_data: Option<Blob<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<&'a str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Blob<'a> {
    mime_type: &'static str,
    data: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig<'a> {
    response_mime_type: &'static str,
    response_schema: &'a Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<usize>,
}

// ── Wire types: response ─────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
    #[serde(default)]
    thought: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u64,
    #[serde(default)]
    candidates_token_count: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    code: Option<u16>,
    #[serde(default)]
    message: String,
    status: Option<String>,
}

// ── Client ───────────────────────────────────────────────────────────────

/// Gemini REST client implementing [`AnalysisBackend`].
#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
    temperature: Option<f32>,
    max_output_tokens: Option<usize>,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl GeminiClient {
    /// Create a client. `timeout_secs = None` leaves the call unbounded.
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout_secs: Option<u64>,
    ) -> Result<Self, reqwest::Error> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        Ok(Self {
            http: builder.build()?,
            api_key: api_key.into(),
            model: model.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            temperature: None,
            max_output_tokens: None,
        })
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_temperature(mut self, t: Option<f32>) -> Self {
        self.temperature = t;
        self
    }

    pub fn with_max_output_tokens(mut self, n: Option<usize>) -> Self {
        self.max_output_tokens = n;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }

    /// The JSON body for `request`: document first, then the prompt.
    pub fn request_body<'a>(&self, request: &'a AnalysisRequest) -> GenerateContentRequest<'a> {
        GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![
                    Part {
                        inline_data: Some(Blob {
                            mime_type: request.payload.mime_type(),
                            data: request.payload.data.as_str(),
                        }),
                        ..Default::default()
                    },
                    Part {
                        text: Some(request.prompt.as_str()),
                        ..Default::default()
                    },
                ],
            }],
            generation_config: GenerationConfig {
                response_mime_type: RESPONSE_MIME_TYPE,
                response_schema: &request.response_schema,
                temperature: self.temperature,
                max_output_tokens: self.max_output_tokens,
            },
        }
    }
}

#[async_trait]
impl AnalysisBackend for GeminiClient {
    fn name(&self) -> String {
        format!("gemini/{}", self.model)
    }

    async fn generate(&self, request: &AnalysisRequest) -> Result<RawResponse, UpstreamFailure> {
        let body = self.request_body(request);
        debug!(
            "POST {} ({} bytes inline, {})",
            self.endpoint(),
            request.payload.data.len(),
            request.payload.mime_type()
        );

        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(transport_failure)?;

        let status = response.status().as_u16();
        let text = response.text().await.map_err(transport_failure)?;
        parse_generate_response(status, &text)
    }
}

fn transport_failure(e: reqwest::Error) -> UpstreamFailure {
    let failure = UpstreamFailure::new(e.to_string());
    match e.status() {
        Some(s) => failure.with_status(s.as_u16()),
        None => failure,
    }
}

/// Interpret a `generateContent` HTTP response.
///
/// Success bodies yield the concatenated text of the first candidate
/// (thought parts skipped); error bodies yield an [`UpstreamFailure`]
/// carrying the HTTP status, the provider status string and its message.
pub fn parse_generate_response(status: u16, body: &str) -> Result<RawResponse, UpstreamFailure> {
    if !(200..300).contains(&status) {
        return Err(match serde_json::from_str::<ErrorEnvelope>(body) {
            Ok(env) => {
                let mut f = UpstreamFailure::new(env.error.message)
                    .with_status(env.error.code.unwrap_or(status));
                if let Some(code) = env.error.status {
                    f = f.with_code(code);
                }
                f
            }
            Err(_) => UpstreamFailure::new(format!("HTTP {}: {}", status, body.trim()))
                .with_status(status),
        });
    }

    let parsed: GenerateContentResponse = serde_json::from_str(body)
        .map_err(|e| UpstreamFailure::new(format!("Unreadable generateContent response: {e}")))?;

    if let Some(reason) = parsed.prompt_feedback.and_then(|p| p.block_reason) {
        warn!("Prompt blocked by provider: {}", reason);
    }

    let (input_tokens, output_tokens) = parsed
        .usage_metadata
        .map(|u| (u.prompt_token_count, u.candidates_token_count))
        .unwrap_or((0, 0));

    let first = parsed.candidates.into_iter().next();
    if let Some(reason) = first.as_ref().and_then(|c| c.finish_reason.as_deref()) {
        if reason != "STOP" {
            warn!("Candidate finished with reason {}", reason);
        }
    }

    let text: String = first
        .and_then(|c| c.content)
        .map(|c| {
            c.parts
                .into_iter()
                .filter(|p| !p.thought)
                .filter_map(|p| p.text)
                .collect()
        })
        .unwrap_or_default();

    Ok(RawResponse {
        text: (!text.is_empty()).then_some(text),
        input_tokens,
        output_tokens,
    })
}
