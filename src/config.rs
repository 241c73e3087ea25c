//! Configuration for résumé analysis.
//!
//! All behaviour is controlled through [`AnalyzerConfig`], built via its
//! [`AnalyzerConfigBuilder`] or read from the environment with
//! [`AnalyzerConfig::from_env`]. The only environment-driven setting is the
//! API credential.

use crate::error::AuditError;
use crate::pipeline::gemini::DEFAULT_BASE_URL;
use crate::pipeline::input::MAX_FILE_BYTES;
use crate::pipeline::llm::AnalysisBackend;
use crate::progress::ProgressCallback;
use std::fmt;
use std::sync::Arc;

/// Environment variables checked, in order, for the Gemini API key.
pub const API_KEY_ENV_VARS: [&str; 2] = ["GEMINI_API_KEY", "API_KEY"];

/// Configuration for an analysis.
///
/// # Example
/// ```rust
/// use resume_audit::AnalyzerConfig;
///
/// let config = AnalyzerConfig::builder()
///     .model("gemini-2.5-flash")
///     .api_key("test-key")
///     .api_timeout_secs(90)
///     .build()
///     .unwrap();
/// assert_eq!(config.max_file_bytes, 4 * 1024 * 1024);
/// ```
#[derive(Clone)]
pub struct AnalyzerConfig {
    /// Model identifier. If None, the backend default is used
    /// (`gemini-3-flash-preview` for the native client).
    pub model: Option<String>,

    /// Gemini API key. If None, read from [`API_KEY_ENV_VARS`] at resolution time.
    pub api_key: Option<String>,

    /// Gemini REST root. Default: the public `v1beta` endpoint.
    pub base_url: String,

    /// `edgequake-llm` provider name (e.g. "openai", "anthropic", "ollama").
    /// None or "gemini" selects the native Gemini client.
    pub provider_name: Option<String>,

    /// Pre-constructed backend. Takes precedence over everything else.
    pub backend: Option<Arc<dyn AnalysisBackend>>,

    /// Sampling temperature. None leaves the provider default.
    pub temperature: Option<f32>,

    /// Output token cap. None leaves the provider default.
    pub max_output_tokens: Option<usize>,

    /// Upload limit in bytes. Default: 4 MiB.
    pub max_file_bytes: u64,

    /// HTTP timeout for the inference call. Default: None (unbounded).
    pub api_timeout_secs: Option<u64>,

    /// Progress events for UIs.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            model: None,
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            provider_name: None,
            backend: None,
            temperature: None,
            max_output_tokens: None,
            max_file_bytes: MAX_FILE_BYTES,
            api_timeout_secs: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for AnalyzerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalyzerConfig")
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("provider_name", &self.provider_name)
            .field("backend", &self.backend.as_ref().map(|b| b.name()))
            .field("temperature", &self.temperature)
            .field("max_output_tokens", &self.max_output_tokens)
            .field("max_file_bytes", &self.max_file_bytes)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn AnalysisProgressCallback>"),
            )
            .finish()
    }
}

impl AnalyzerConfig {
    /// Create a new builder for `AnalyzerConfig`.
    pub fn builder() -> AnalyzerConfigBuilder {
        AnalyzerConfigBuilder {
            config: Self::default(),
        }
    }

    /// Defaults plus the API key from the environment, if any.
    pub fn from_env() -> Self {
        Self {
            api_key: api_key_from_env(),
            ..Self::default()
        }
    }

    /// The configured key, else the first non-empty [`API_KEY_ENV_VARS`] entry.
    pub fn resolved_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(api_key_from_env)
    }
}

fn api_key_from_env() -> Option<String> {
    API_KEY_ENV_VARS
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .find(|v| !v.trim().is_empty())
}

/// Builder for [`AnalyzerConfig`].
#[derive(Debug)]
pub struct AnalyzerConfigBuilder {
    config: AnalyzerConfig,
}

impl AnalyzerConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn backend(mut self, backend: Arc<dyn AnalysisBackend>) -> Self {
        self.config.backend = Some(backend);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = Some(t.clamp(0.0, 2.0));
        self
    }

    pub fn max_output_tokens(mut self, n: usize) -> Self {
        self.config.max_output_tokens = Some(n);
        self
    }

    pub fn max_file_bytes(mut self, n: u64) -> Self {
        self.config.max_file_bytes = n;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = Some(secs);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<AnalyzerConfig, AuditError> {
        let c = &self.config;
        if c.max_file_bytes == 0 {
            return Err(AuditError::InvalidConfig(
                "max_file_bytes must be ≥ 1".into(),
            ));
        }
        if c.max_output_tokens == Some(0) {
            return Err(AuditError::InvalidConfig(
                "max_output_tokens must be ≥ 1".into(),
            ));
        }
        if c.api_timeout_secs == Some(0) {
            return Err(AuditError::InvalidConfig(
                "api_timeout_secs must be ≥ 1".into(),
            ));
        }
        if !(c.base_url.starts_with("http://") || c.base_url.starts_with("https://")) {
            return Err(AuditError::InvalidConfig(format!(
                "base_url must be an HTTP/HTTPS URL, got '{}'",
                c.base_url
            )));
        }
        Ok(self.config)
    }
}
