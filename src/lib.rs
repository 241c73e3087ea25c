//! # resume-audit
//!
//! Score a résumé against a job description with a multimodal LLM.
//!
//! The résumé (PDF, PNG, JPEG or WEBP, up to 4 MiB) is sent inline together
//! with the job title, company and description in a **single** request whose
//! response is constrained to a strict JSON schema. The reply decodes into an
//! [`AnalysisResult`]: overall score, summary, strengths, weaknesses,
//! prioritised improvements, spelling errors and job-alignment data.
//!
//! ## Pipeline Overview
//!
//! ```text
//! résumé file + job details
//!  │
//!  ├─ 1. Input    size/type checks, job-field checks (nothing sent on failure)
//!  ├─ 2. Encode   bytes → base64 inline payload / data URL
//!  ├─ 3. Request  audit prompt + response schema
//!  ├─ 4. Backend  one call to Gemini (or any edgequake-llm provider)
//!  ├─ 5. Decode   JSON → AnalysisResult, failures → AuditError
//!  └─ 6. Report   Markdown dashboard or JSON
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use resume_audit::{analyze_file, render_markdown, AnalyzerConfig, JobDetails};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // API key from GEMINI_API_KEY (or API_KEY)
//!     let config = AnalyzerConfig::from_env();
//!     let job = JobDetails::new("Backend Engineer", "Go, Kubernetes, gRPC")
//!         .with_company("Acme");
//!     let output = analyze_file("resume.pdf", &job, &config).await?;
//!     println!("{}", render_markdown(&output.result, &job));
//!     Ok(())
//! }
//! ```
//!
//! ## Interactive use
//!
//! UIs that need a reset/resubmit cycle should drive a [`Session`]; every
//! transition goes through the pure [`session::reduce`] function.
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `resume-audit` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod analyze;
pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod report;
pub mod session;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use analyze::{
    analyze_data_url, analyze_file, analyze_payload, analyze_sync, analyze_to_file,
    analyze_upload, resolve_backend,
};
pub use config::{AnalyzerConfig, AnalyzerConfigBuilder};
pub use error::{AuditError, ValidationError};
pub use output::{
    AnalysisOutput, AnalysisResult, AnalysisStats, Impact, Improvement, JobAlignment,
    SpellingError,
};
pub use pipeline::gemini::GeminiClient;
pub use pipeline::input::{DocumentKind, JobDetails, UploadedFile, MAX_FILE_BYTES};
pub use pipeline::llm::{AnalysisBackend, ProviderBackend, RawResponse, UpstreamFailure};
pub use progress::{AnalysisProgressCallback, NoopProgressCallback, ProgressCallback};
pub use report::render_markdown;
pub use session::{Event, JobField, Phase, Session, SessionState};
