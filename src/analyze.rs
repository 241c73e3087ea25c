//! Analysis entry points.
//!
//! Every entry point funnels into [`analyze_payload`]: validate the job
//! fields, build the one request, call the backend once, decode. There are
//! no retries. A failure is classified and returned; it is never swallowed.

use crate::config::AnalyzerConfig;
use crate::error::AuditError;
use crate::output::{AnalysisOutput, AnalysisStats};
use crate::pipeline::encode::{encode_upload, parse_data_url, InlinePayload};
use crate::pipeline::gemini::{GeminiClient, DEFAULT_MODEL};
use crate::pipeline::input::{load_upload, validate_file, validate_job_details, JobDetails, UploadedFile};
use crate::pipeline::llm::{AnalysisBackend, ProviderBackend};
use crate::pipeline::{decode, request};
use crate::report::render_markdown;
use edgequake_llm::ProviderFactory;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Analyse a résumé file on disk against `job`.
///
/// # Example
/// ```rust,no_run
/// use resume_audit::{analyze_file, AnalyzerConfig, JobDetails};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// // API key read from GEMINI_API_KEY / API_KEY
/// let config = AnalyzerConfig::from_env();
/// let job = JobDetails::new("Backend Engineer", "Go, Kubernetes, gRPC");
/// let output = analyze_file("resume.pdf", &job, &config).await?;
/// println!("score: {}", output.result.overall_score);
/// # Ok(())
/// # }
/// ```
///
/// # Errors
/// - File not found / permission denied / over the size limit / wrong type
/// - Missing job title or description
/// - Provider rejection, provider failure, empty or malformed response
pub async fn analyze_file(
    path: impl AsRef<Path>,
    job: &JobDetails,
    config: &AnalyzerConfig,
) -> Result<AnalysisOutput, AuditError> {
    let path = path.as_ref();
    info!("Starting analysis: {}", path.display());
    let upload = load_upload(path, config.max_file_bytes).await?;
    analyze_upload(&upload, job, config).await
}

/// Analyse an in-memory upload.
pub async fn analyze_upload(
    upload: &UploadedFile,
    job: &JobDetails,
    config: &AnalyzerConfig,
) -> Result<AnalysisOutput, AuditError> {
    validate_file(upload, config.max_file_bytes)?;
    validate_job_details(job)?;
    let payload = encode_upload(upload)?;

    if let Some(ref cb) = config.progress_callback {
        cb.on_validated(&upload.display_name, upload.size_bytes);
    }

    let backend = resolve_backend(config)?;
    analyze_payload(backend.as_ref(), payload, job, config).await
}

/// Analyse a document given as a `data:<mime>;base64,<payload>` URL.
pub async fn analyze_data_url(
    data_url: &str,
    job: &JobDetails,
    config: &AnalyzerConfig,
) -> Result<AnalysisOutput, AuditError> {
    validate_job_details(job)?;
    let payload = parse_data_url(data_url)?;
    let backend = resolve_backend(config)?;
    analyze_payload(backend.as_ref(), payload, job, config).await
}

/// The single request/response contract: (payload, job) → result or error.
///
/// `backend` is the only I/O; pass a fake to test without a network.
pub async fn analyze_payload(
    backend: &dyn AnalysisBackend,
    payload: InlinePayload,
    job: &JobDetails,
    config: &AnalyzerConfig,
) -> Result<AnalysisOutput, AuditError> {
    let outcome = run_once(backend, payload, job, config).await;
    if let (Err(e), Some(cb)) = (&outcome, config.progress_callback.as_ref()) {
        cb.on_error(&e.user_message());
    }
    outcome
}

async fn run_once(
    backend: &dyn AnalysisBackend,
    payload: InlinePayload,
    job: &JobDetails,
    config: &AnalyzerConfig,
) -> Result<AnalysisOutput, AuditError> {
    validate_job_details(job)?;

    let start = Instant::now();
    let backend_name = backend.name();
    let req = request::build_request(payload, job);
    debug!("Built request: {:?}, prompt {} chars", req.payload, req.prompt.len());

    if let Some(ref cb) = config.progress_callback {
        cb.on_request_sent(&backend_name);
    }

    let raw = backend
        .generate(&req)
        .await
        .map_err(decode::classify_failure)?;
    let result = decode::decode_response(raw.text.as_deref())?;

    let duration_ms = start.elapsed().as_millis() as u64;
    info!(
        "Analysis complete via {}: score {}, match {}%, {}ms",
        backend_name, result.overall_score, result.job_alignment.match_percentage, duration_ms
    );

    if let Some(ref cb) = config.progress_callback {
        cb.on_complete(result.overall_score, duration_ms);
    }

    Ok(AnalysisOutput {
        result,
        stats: AnalysisStats {
            backend: backend_name,
            input_tokens: raw.input_tokens,
            output_tokens: raw.output_tokens,
            duration_ms,
        },
    })
}

/// Analyse a file and write the Markdown report to `output_path`.
///
/// Uses atomic write (temp file + rename) to prevent partial files.
pub async fn analyze_to_file(
    path: impl AsRef<Path>,
    job: &JobDetails,
    output_path: impl AsRef<Path>,
    config: &AnalyzerConfig,
) -> Result<AnalysisOutput, AuditError> {
    let output = analyze_file(path, job, config).await?;
    write_atomic(output_path.as_ref(), &render_markdown(&output.result, job)).await?;
    Ok(output)
}

/// Write `contents` to `path` via a sibling temp file and rename.
pub async fn write_atomic(path: &Path, contents: &str) -> Result<(), AuditError> {
    let fail = |source| AuditError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(fail)?;
    }
    let tmp_path = tmp_path_for(path);
    tokio::fs::write(&tmp_path, contents).await.map_err(fail)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(fail)?;
    Ok(())
}

/// `report.md` → `report.md.tmp`, keeping the full file name.
fn tmp_path_for(path: &Path) -> std::path::PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Synchronous wrapper around [`analyze_file`].
///
/// Creates a temporary tokio runtime internally.
pub fn analyze_sync(
    path: impl AsRef<Path>,
    job: &JobDetails,
    config: &AnalyzerConfig,
) -> Result<AnalysisOutput, AuditError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| AuditError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(analyze_file(path, job, config))
}

// ── Backend resolution ───────────────────────────────────────────────────

/// Resolve the backend, from most-specific to least-specific:
///
/// 1. **Pre-built backend** (`config.backend`): used as-is (tests, custom
///    middleware).
/// 2. **Named provider** (`config.provider_name`, anything but `"gemini"`):
///    created through [`ProviderFactory::create_llm_provider`], which reads
///    that provider's own API key variable.
/// 3. **Native Gemini**: the configured key, else `GEMINI_API_KEY` /
///    `API_KEY` from the environment.
pub fn resolve_backend(config: &AnalyzerConfig) -> Result<Arc<dyn AnalysisBackend>, AuditError> {
    if let Some(ref backend) = config.backend {
        return Ok(Arc::clone(backend));
    }

    let model = config.model.as_deref().unwrap_or(DEFAULT_MODEL);

    if let Some(name) = config
        .provider_name
        .as_deref()
        .filter(|n| !n.eq_ignore_ascii_case("gemini"))
    {
        let provider = ProviderFactory::create_llm_provider(name, model).map_err(|e| {
            AuditError::ProviderNotConfigured {
                provider: name.to_string(),
                hint: format!("{e}"),
            }
        })?;
        let backend = ProviderBackend::new(provider, format!("{name}/{model}"))
            .with_temperature(config.temperature)
            .with_max_tokens(config.max_output_tokens);
        return Ok(Arc::new(backend));
    }

    let api_key = config
        .resolved_api_key()
        .ok_or_else(|| AuditError::ProviderNotConfigured {
            provider: "gemini".to_string(),
            hint: "Set GEMINI_API_KEY (or API_KEY), or pass an API key explicitly.".to_string(),
        })?;

    let client = GeminiClient::new(api_key, model, config.api_timeout_secs)
        .map_err(|e| AuditError::Internal(format!("Failed to build HTTP client: {e}")))?
        .with_base_url(config.base_url.clone())
        .with_temperature(config.temperature)
        .with_max_output_tokens(config.max_output_tokens);
    Ok(Arc::new(client))
}
