//! Interactive session state and its reducer.
//!
//! All mutable UI state (current file, preview, job details, result, error)
//! lives in one [`SessionState`] value. The only way to change it is
//! [`reduce`], which consumes the old state and an [`Event`] and returns the
//! new state. [`Session`] drives the asynchronous part (the inference call)
//! by feeding events through the reducer.
//!
//! ```text
//!           SubmitRequested        Validated(Ok)         Finished(Ok)
//!   Idle ─────────────────▶ Validating ────────▶ Submitting ──────────▶ Succeeded
//!    ▲                          │                     │
//!    │     Validated(Err)       │                     │ Finished(Err)
//!    └──────────────────────────┘                     ▼
//!    ◀──────────────────── Reset ─────────────────  Failed
//! ```
//!
//! Terminal states start a new cycle on the next `SubmitRequested`.

use crate::analyze::analyze_payload;
use crate::config::AnalyzerConfig;
use crate::error::{AuditError, ValidationError};
use crate::output::AnalysisResult;
use crate::pipeline::encode::{parse_data_url, to_data_url, InlinePayload};
use crate::pipeline::input::{
    validate_file, validate_job_details, JobDetails, UploadedFile, MAX_FILE_BYTES,
};
use crate::pipeline::llm::AnalysisBackend;
use tracing::{debug, info};

/// Where the current analysis attempt stands.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Validating,
    Submitting,
    Succeeded(Box<AnalysisResult>),
    Failed(String),
}

impl Phase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::Succeeded(_) | Phase::Failed(_))
    }
}

/// Which job field a change event targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobField {
    Title,
    Company,
    Description,
}

/// Everything needed to send one request, produced by validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub payload: InlinePayload,
    pub job: JobDetails,
}

/// Inputs to the reducer.
#[derive(Debug)]
pub enum Event {
    FileSelected(UploadedFile),
    JobFieldChanged(JobField, String),
    SubmitRequested,
    SubmissionValidated(Result<Submission, ValidationError>),
    AnalysisFinished(Result<AnalysisResult, AuditError>),
    Reset,
}

/// The whole session, replaced on every transition.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    pub file: Option<UploadedFile>,
    /// `data:<mime>;base64,…` of the accepted file.
    pub preview: Option<String>,
    pub job: JobDetails,
    pub phase: Phase,
    pub error: Option<String>,
    /// Upload limit applied to `FileSelected`.
    pub max_file_bytes: u64,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new(MAX_FILE_BYTES)
    }
}

impl SessionState {
    pub fn new(max_file_bytes: u64) -> Self {
        Self {
            file: None,
            preview: None,
            job: JobDetails::default(),
            phase: Phase::Idle,
            error: None,
            max_file_bytes,
        }
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        match &self.phase {
            Phase::Succeeded(r) => Some(&**r),
            _ => None,
        }
    }

    pub fn is_submitting(&self) -> bool {
        matches!(self.phase, Phase::Submitting)
    }

    /// Check the stored preview and job fields, producing a [`Submission`].
    pub fn validate_submission(&self) -> Result<Submission, ValidationError> {
        let preview = match (&self.file, &self.preview) {
            (Some(_), Some(p)) => p,
            _ => {
                let mut missing = vec!["file"];
                if let Err(ValidationError::MissingInput { missing: fields }) =
                    validate_job_details(&self.job)
                {
                    missing.extend(fields);
                }
                return Err(ValidationError::MissingInput { missing });
            }
        };
        validate_job_details(&self.job)?;
        let payload = parse_data_url(preview)?;
        Ok(Submission {
            payload,
            job: self.job.clone(),
        })
    }
}

/// The single transition function.
pub fn reduce(mut state: SessionState, event: Event) -> SessionState {
    match event {
        Event::FileSelected(file) => {
            if state.is_submitting() {
                debug!("Ignoring file selection while a request is in flight");
                return state;
            }
            let accepted = validate_file(&file, state.max_file_bytes)
                .and_then(|_| to_data_url(&file));
            match accepted {
                Ok(preview) => {
                    debug!("Accepted {:?}", file);
                    state.file = Some(file);
                    state.preview = Some(preview);
                    state.error = None;
                }
                Err(e) => {
                    debug!("Rejected {:?}: {}", file, e);
                    state.error = Some(e.to_string());
                }
            }
        }
        Event::JobFieldChanged(field, value) => {
            if state.is_submitting() {
                return state;
            }
            match field {
                JobField::Title => state.job.title = value,
                JobField::Company => state.job.company = value,
                JobField::Description => state.job.description = value,
            }
        }
        Event::SubmitRequested => {
            if state.is_submitting() || state.phase == Phase::Validating {
                debug!("Ignoring resubmission while {:?}", state.phase);
                return state;
            }
            state.phase = Phase::Validating;
            state.error = None;
        }
        Event::SubmissionValidated(outcome) => {
            if state.phase != Phase::Validating {
                return state;
            }
            match outcome {
                Ok(_) => state.phase = Phase::Submitting,
                Err(e) => {
                    state.phase = Phase::Idle;
                    state.error = Some(e.to_string());
                }
            }
        }
        Event::AnalysisFinished(outcome) => {
            if !state.is_submitting() {
                return state;
            }
            match outcome {
                Ok(result) => {
                    state.phase = Phase::Succeeded(Box::new(result));
                    state.error = None;
                }
                Err(e) => {
                    let msg = e.user_message();
                    state.phase = Phase::Failed(msg.clone());
                    state.error = Some(msg);
                }
            }
        }
        Event::Reset => {
            state = SessionState {
                job: state.job,
                ..SessionState::new(state.max_file_bytes)
            };
        }
    }
    state
}

/// Drives a [`SessionState`] through one or more analysis attempts.
pub struct Session {
    state: SessionState,
    config: AnalyzerConfig,
}

impl Session {
    pub fn new(config: AnalyzerConfig) -> Self {
        Self {
            state: SessionState::new(config.max_file_bytes),
            config,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Apply one event.
    pub fn dispatch(&mut self, event: Event) -> &SessionState {
        let prev = std::mem::take(&mut self.state);
        self.state = reduce(prev, event);
        &self.state
    }

    pub fn select_file(&mut self, file: UploadedFile) -> &SessionState {
        self.dispatch(Event::FileSelected(file))
    }

    pub fn set_job_field(&mut self, field: JobField, value: impl Into<String>) -> &SessionState {
        self.dispatch(Event::JobFieldChanged(field, value.into()))
    }

    pub fn reset(&mut self) -> &SessionState {
        self.dispatch(Event::Reset)
    }

    /// Validate, send the single request through `backend`, record the outcome.
    ///
    /// Does nothing if a submission is already in flight. Errors never escape:
    /// they end up as [`Phase::Failed`] or as `error` with phase Idle.
    pub async fn submit(&mut self, backend: &dyn AnalysisBackend) -> &SessionState {
        if self.state.is_submitting() {
            return &self.state;
        }
        self.dispatch(Event::SubmitRequested);

        let validated = self.state.validate_submission();
        let checked = validated.clone();
        self.dispatch(Event::SubmissionValidated(validated));

        let submission = match checked {
            Ok(s) => s,
            Err(e) => {
                if let Some(ref cb) = self.config.progress_callback {
                    cb.on_error(&e.to_string());
                }
                return &self.state;
            }
        };

        if let (Some(cb), Some(file)) = (&self.config.progress_callback, &self.state.file) {
            cb.on_validated(&file.display_name, file.size_bytes);
        }

        let outcome = analyze_payload(backend, submission.payload, &submission.job, &self.config)
            .await
            .map(|o| o.result);
        match &outcome {
            Ok(r) => info!("Session analysis succeeded (score {})", r.overall_score),
            Err(e) => info!("Session analysis failed: {}", e),
        }
        self.dispatch(Event::AnalysisFinished(outcome))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::JobAlignment;
    use crate::progress::AnalysisProgressCallback;
    use std::sync::{Arc, Mutex};
    use crate::pipeline::llm::{RawResponse, UpstreamFailure};
    use crate::pipeline::request::AnalysisRequest;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn pdf(size: usize) -> UploadedFile {
        UploadedFile::new("resume.pdf", "application/pdf", vec![b'%'; size])
    }

    fn ready_state() -> SessionState {
        let s = SessionState::new(MAX_FILE_BYTES);
        let s = reduce(s, Event::FileSelected(pdf(100)));
        let s = reduce(s, Event::JobFieldChanged(JobField::Title, "Engineer".into()));
        reduce(s, Event::JobFieldChanged(JobField::Description, "Rust".into()))
    }

    fn result(score: f64) -> AnalysisResult {
        AnalysisResult {
            overall_score: score,
            summary: "ok".into(),
            strengths: vec![],
            weaknesses: vec![],
            improvements: vec![],
            spelling_errors: vec![],
            job_alignment: JobAlignment {
                match_percentage: 50.0,
                missing_keywords: vec![],
                suggested_keywords: vec![],
                role_fit_summary: "ok".into(),
            },
        }
    }

    struct Canned {
        calls: AtomicUsize,
        reply: Result<RawResponse, UpstreamFailure>,
    }

    #[async_trait]
    impl AnalysisBackend for Canned {
        fn name(&self) -> String {
            "canned".into()
        }

        async fn generate(&self, _req: &AnalysisRequest) -> Result<RawResponse, UpstreamFailure> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.reply.clone()
        }
    }

    #[derive(Default)]
    struct ErrorLog(Mutex<Vec<String>>);

    impl AnalysisProgressCallback for ErrorLog {
        fn on_error(&self, message: &str) {
            self.0.lock().unwrap().push(message.to_string());
        }
    }

    #[test]
    fn default_state_uses_upload_limit() {
        let s = SessionState::default();
        assert_eq!(s.max_file_bytes, MAX_FILE_BYTES);
        let s = reduce(s, Event::FileSelected(pdf(10)));
        assert!(s.file.is_some());
        assert_eq!(s.error, None);
    }

    #[test]
    fn accepted_file_sets_preview() {
        let s = ready_state();
        assert!(s.file.is_some());
        assert!(s.preview.as_deref().unwrap().starts_with("data:application/pdf;base64,"));
        assert_eq!(s.error, None);
    }

    #[test]
    fn rejected_file_keeps_previous_file() {
        let s = ready_state();
        let before = s.file.clone();
        let s = reduce(
            s,
            Event::FileSelected(UploadedFile::new("a.gif", "image/gif", vec![0; 10])),
        );
        assert_eq!(s.file, before);
        assert!(s.error.unwrap().starts_with("Unsupported file format."));
    }

    #[test]
    fn submit_walks_through_validating() {
        let s = reduce(ready_state(), Event::SubmitRequested);
        assert_eq!(s.phase, Phase::Validating);
        let v = s.validate_submission();
        assert!(v.is_ok());
        let s = reduce(s, Event::SubmissionValidated(v));
        assert_eq!(s.phase, Phase::Submitting);
    }

    #[test]
    fn missing_file_blocks_submission() {
        let s = SessionState::new(MAX_FILE_BYTES);
        let s = reduce(s, Event::JobFieldChanged(JobField::Title, "Engineer".into()));
        let s = reduce(s, Event::SubmitRequested);
        let v = s.validate_submission();
        assert!(matches!(
            &v,
            Err(ValidationError::MissingInput { missing }) if missing == &vec!["file", "description"]
        ));
        let s = reduce(s, Event::SubmissionValidated(v));
        assert_eq!(s.phase, Phase::Idle);
        assert!(s.error.unwrap().starts_with("Please upload your resume"));
    }

    #[test]
    fn tampered_preview_is_malformed() {
        let mut s = ready_state();
        s.preview = Some("not-a-data-url".into());
        assert_eq!(s.validate_submission(), Err(ValidationError::MalformedDataUrl));
    }

    #[test]
    fn events_ignored_while_submitting() {
        let mut s = ready_state();
        s.phase = Phase::Submitting;
        let s = reduce(s, Event::SubmitRequested);
        assert_eq!(s.phase, Phase::Submitting);
        let s = reduce(s, Event::JobFieldChanged(JobField::Title, "Other".into()));
        assert_eq!(s.job.title, "Engineer");
        let s = reduce(s, Event::FileSelected(pdf(5)));
        assert_eq!(s.file.as_ref().unwrap().size_bytes, 100);
    }

    #[test]
    fn finished_outside_submitting_is_ignored() {
        let s = reduce(ready_state(), Event::AnalysisFinished(Ok(result(90.0))));
        assert_eq!(s.phase, Phase::Idle);
    }

    #[test]
    fn failure_records_user_message() {
        let mut s = ready_state();
        s.phase = Phase::Submitting;
        let s = reduce(s, Event::AnalysisFinished(Err(AuditError::EmptyResponse)));
        assert!(matches!(&s.phase, Phase::Failed(m) if m.contains("too large or complex")));
        assert!(s.phase.is_terminal());
        assert_eq!(s.error, Some(AuditError::EmptyResponse.user_message()));
    }

    #[test]
    fn reset_clears_everything_but_job() {
        let mut s = ready_state();
        s.phase = Phase::Succeeded(Box::new(result(70.0)));
        s.error = Some("stale".into());
        let s = reduce(s, Event::Reset);
        assert_eq!(s.file, None);
        assert_eq!(s.preview, None);
        assert_eq!(s.result(), None);
        assert_eq!(s.error, None);
        assert_eq!(s.phase, Phase::Idle);
        assert_eq!(s.job.title, "Engineer");
        assert_eq!(s.max_file_bytes, MAX_FILE_BYTES);
    }

    #[test]
    fn session_submit_success() {
        let backend = Canned {
            calls: AtomicUsize::new(0),
            reply: Ok(RawResponse::text(serde_json::to_string(&result(64.0)).unwrap())),
        };
        let mut session = Session::new(AnalyzerConfig::default());
        session.select_file(pdf(10));
        session.set_job_field(JobField::Title, "Engineer");
        session.set_job_field(JobField::Description, "Rust");

        let state = tokio_test::block_on(session.submit(&backend));
        assert_eq!(state.result().map(|r| r.overall_score), Some(64.0));
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn session_submit_invalid_never_calls_backend() {
        let backend = Canned {
            calls: AtomicUsize::new(0),
            reply: Ok(RawResponse::default()),
        };
        let mut session = Session::new(AnalyzerConfig::default());
        session.select_file(pdf(10));

        let state = tokio_test::block_on(session.submit(&backend));
        assert_eq!(state.phase, Phase::Idle);
        assert!(state.error.is_some());
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn invalid_submission_reports_error_to_callback() {
        let backend = Canned {
            calls: AtomicUsize::new(0),
            reply: Ok(RawResponse::default()),
        };
        let log = Arc::new(ErrorLog::default());
        let config = AnalyzerConfig::builder()
            .progress_callback(log.clone())
            .build()
            .unwrap();
        let mut session = Session::new(config);
        session.select_file(pdf(10));
        session.set_job_field(JobField::Title, "Engineer");

        let state = tokio_test::block_on(session.submit(&backend));
        let shown = state.error.clone();
        assert_eq!(
            *log.0.lock().unwrap(),
            vec!["Please upload your resume and provide the job details.".to_string()]
        );
        assert_eq!(shown.as_deref(), Some(log.0.lock().unwrap()[0].as_str()));
    }
}
