//! Request construction: payload + prompt + response schema.
//!
//! The schema is the Gemini OpenAPI subset (upper-case type names). Every
//! property of [`crate::output::AnalysisResult`] is listed as required at
//! every nesting level, so the provider either returns a complete document
//! or fails; there is no partial result to handle downstream.

use crate::pipeline::encode::InlinePayload;
use crate::pipeline::input::JobDetails;
use crate::prompts::audit_prompt;
use once_cell::sync::Lazy;
use serde_json::{json, Value};

/// `responseMimeType` sent with every request.
pub const RESPONSE_MIME_TYPE: &str = "application/json";

/// One inference request, independent of the backend that sends it.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub payload: InlinePayload,
    pub prompt: String,
    pub response_schema: Value,
}

/// Assemble the single request for `payload` audited against `job`.
pub fn build_request(payload: InlinePayload, job: &JobDetails) -> AnalysisRequest {
    AnalysisRequest {
        payload,
        prompt: audit_prompt(job),
        response_schema: analysis_schema().clone(),
    }
}

static ANALYSIS_SCHEMA: Lazy<Value> = Lazy::new(|| {
    let string_array = json!({ "type": "ARRAY", "items": { "type": "STRING" } });
    json!({
        "type": "OBJECT",
        "properties": {
            "overallScore": { "type": "NUMBER" },
            "summary": { "type": "STRING" },
            "strengths": string_array,
            "weaknesses": string_array,
            "improvements": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "category": { "type": "STRING" },
                        "description": { "type": "STRING" },
                        "impact": {
                            "type": "STRING",
                            "format": "enum",
                            "enum": ["High", "Medium", "Low"]
                        }
                    },
                    "required": ["category", "description", "impact"]
                }
            },
            "spellingErrors": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "original": { "type": "STRING" },
                        "suggestion": { "type": "STRING" },
                        "context": { "type": "STRING" }
                    },
                    "required": ["original", "suggestion", "context"]
                }
            },
            "jobAlignment": {
                "type": "OBJECT",
                "properties": {
                    "matchPercentage": { "type": "NUMBER" },
                    "missingKeywords": string_array,
                    "suggestedKeywords": string_array,
                    "roleFitSummary": { "type": "STRING" }
                },
                "required": [
                    "matchPercentage",
                    "missingKeywords",
                    "suggestedKeywords",
                    "roleFitSummary"
                ]
            }
        },
        "required": [
            "overallScore",
            "summary",
            "strengths",
            "weaknesses",
            "improvements",
            "spellingErrors",
            "jobAlignment"
        ]
    })
});

/// The fixed response schema for an [`crate::output::AnalysisResult`].
pub fn analysis_schema() -> &'static Value {
    &ANALYSIS_SCHEMA
}
