//! Pipeline stages for a résumé audit.
//!
//! Each submodule implements exactly one step, so each is testable on its own.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ encode ──▶ request ──▶ llm / gemini ──▶ decode
//! (validate) (base64)  (prompt+schema) (one call)   (result | error)
//! ```
//!
//! 1. [`input`]   — file and job-field validation, loading from disk
//! 2. [`encode`]  — base64 payloads and data URLs
//! 3. [`request`] — audit prompt plus the fixed response schema
//! 4. [`llm`]     — the [`llm::AnalysisBackend`] seam; [`gemini`] is the
//!    native client. The only stage with network I/O
//! 5. [`decode`]  — JSON → [`crate::output::AnalysisResult`], failure classification

pub mod decode;
pub mod encode;
pub mod gemini;
pub mod input;
pub mod llm;
pub mod request;
