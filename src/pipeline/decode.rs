//! Response decoding and upstream failure classification.
//!
//! Three outcomes reach the caller:
//!
//! | Input | Result |
//! |-------|--------|
//! | absent / blank text | [`AuditError::EmptyResponse`] |
//! | schema-conforming JSON | [`AnalysisResult`] |
//! | provider rejection (400, 413, `INVALID_ARGUMENT`) | [`AuditError::UpstreamRejection`] |
//! | any other provider failure | [`AuditError::Upstream`], message verbatim |

use crate::error::AuditError;
use crate::output::AnalysisResult;
use crate::pipeline::llm::UpstreamFailure;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

static RE_JSON_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```(?:json|JSON)?\s*\n(.*?)\n?```\s*$").unwrap());

static RE_REJECTION: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b400\b|INVALID_ARGUMENT").unwrap());

/// Decode the provider's text into an [`AnalysisResult`].
pub fn decode_response(text: Option<&str>) -> Result<AnalysisResult, AuditError> {
    let text = match text.map(str::trim) {
        Some(t) if !t.is_empty() => t,
        _ => return Err(AuditError::EmptyResponse),
    };

    let json = strip_json_fence(text);
    let mut result: AnalysisResult =
        serde_json::from_str(json).map_err(AuditError::MalformedResponse)?;
    clamp_scores(&mut result);
    Ok(result)
}

/// Map a provider failure to the error the user sees.
pub fn classify_failure(failure: UpstreamFailure) -> AuditError {
    if is_rejection(&failure) {
        warn!("Provider rejected the document: {}", failure.message);
        AuditError::UpstreamRejection {
            detail: failure.message,
        }
    } else {
        warn!("Provider failure: {}", failure.message);
        AuditError::Upstream {
            status: failure.status,
            message: failure.message,
        }
    }
}

fn is_rejection(f: &UpstreamFailure) -> bool {
    matches!(f.status, Some(400) | Some(413))
        || f.code.as_deref() == Some("INVALID_ARGUMENT")
        || RE_REJECTION.is_match(&f.message)
}

fn strip_json_fence(text: &str) -> &str {
    RE_JSON_FENCE
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim())
        .unwrap_or(text)
}

fn clamp_scores(r: &mut AnalysisResult) {
    let overall = r.overall_score.clamp(0.0, 100.0);
    if overall != r.overall_score {
        warn!("overallScore {} out of range, clamped to {}", r.overall_score, overall);
        r.overall_score = overall;
    }
    let matched = r.job_alignment.match_percentage.clamp(0.0, 100.0);
    if matched != r.job_alignment.match_percentage {
        warn!(
            "matchPercentage {} out of range, clamped to {}",
            r.job_alignment.match_percentage, matched
        );
        r.job_alignment.match_percentage = matched;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::Impact;

    const SAMPLE: &str = r#"{
        "overallScore": 82,
        "summary": "Strong match",
        "strengths": ["Go experience"],
        "weaknesses": ["No cloud certs"],
        "improvements": [{"category": "Skills", "description": "Add Kubernetes cert", "impact": "Medium"}],
        "spellingErrors": [{"original": "recieve", "suggestion": "receive", "context": "to recieve alerts"}],
        "jobAlignment": {
            "matchPercentage": 75,
            "missingKeywords": ["Kubernetes"],
            "suggestedKeywords": ["Helm"],
            "roleFitSummary": "Good fit"
        }
    }"#;

    #[test]
    fn decodes_conforming_document() {
        let r = decode_response(Some(SAMPLE)).unwrap();
        assert_eq!(r.overall_score, 82.0);
        assert_eq!(r.summary, "Strong match");
        assert_eq!(r.strengths, ["Go experience"]);
        assert_eq!(r.weaknesses, ["No cloud certs"]);
        assert_eq!(r.improvements[0].impact, Impact::Medium);
        assert_eq!(r.spelling_errors[0].suggestion, "receive");
        assert_eq!(r.job_alignment.match_percentage, 75.0);
        assert_eq!(r.job_alignment.suggested_keywords, ["Helm"]);
    }

    #[test]
    fn absent_or_blank_text_is_empty_response() {
        assert!(matches!(decode_response(None), Err(AuditError::EmptyResponse)));
        assert!(matches!(decode_response(Some("")), Err(AuditError::EmptyResponse)));
        assert!(matches!(decode_response(Some(" \n ")), Err(AuditError::EmptyResponse)));
    }

    #[test]
    fn missing_field_is_malformed() {
        let partial = r#"{"overallScore": 50, "summary": "x"}"#;
        assert!(matches!(
            decode_response(Some(partial)),
            Err(AuditError::MalformedResponse(_))
        ));
    }

    #[test]
    fn tolerates_json_fence() {
        let fenced = format!("```json\n{SAMPLE}\n```");
        assert_eq!(decode_response(Some(&fenced)).unwrap().overall_score, 82.0);
    }

    #[test]
    fn clamps_out_of_range_scores() {
        let over = SAMPLE
            .replace("\"overallScore\": 82", "\"overallScore\": 140")
            .replace("\"matchPercentage\": 75", "\"matchPercentage\": -3");
        let r = decode_response(Some(&over)).unwrap();
        assert_eq!(r.overall_score, 100.0);
        assert_eq!(r.job_alignment.match_percentage, 0.0);
    }

    #[test]
    fn invalid_argument_maps_to_fixed_rejection() {
        let raw = "[GoogleGenerativeAI Error]: [400 Bad Request] Unable to process input image";
        for failure in [
            UpstreamFailure::new("bad").with_status(400),
            UpstreamFailure::new("too big").with_status(413),
            UpstreamFailure::new("nope").with_code("INVALID_ARGUMENT"),
            UpstreamFailure::new(raw),
        ] {
            let e = classify_failure(failure);
            assert!(matches!(e, AuditError::UpstreamRejection { .. }));
            let msg = e.user_message();
            assert!(msg.starts_with("The document could not be processed."));
            assert!(!msg.contains("Unable to process input image"));
        }
    }

    #[test]
    fn other_failures_pass_through_verbatim() {
        let e = classify_failure(
            UpstreamFailure::new("Resource has been exhausted").with_status(429),
        );
        assert!(matches!(e, AuditError::Upstream { status: Some(429), .. }));
        assert_eq!(e.user_message(), "Resource has been exhausted");
    }

    #[test]
    fn status_digits_inside_words_are_not_rejections() {
        let e = classify_failure(UpstreamFailure::new("quota 14000 tokens exceeded"));
        assert!(matches!(e, AuditError::Upstream { .. }));
    }
}
