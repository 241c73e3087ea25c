//! Prompts for the résumé audit.
//!
//! Every instruction sent to the model lives here so prompt changes never
//! touch request plumbing, and tests can inspect the exact text without a
//! live provider.

use crate::pipeline::input::JobDetails;
use serde_json::Value;

/// Company placeholder when the job details leave it blank.
pub const UNNAMED_COMPANY: &str = "Confidential";

/// Build the audit instruction for one job.
///
/// The instruction travels next to the inline document in the same user turn.
pub fn audit_prompt(job: &JobDetails) -> String {
    format!(
        r#"Act as an expert Recruiter and Technical Resume Specialist.
Analyze the provided resume document (PDF or image) against the specified job description.

Job Context:
- Target Role: {title}
- Company: {company}
- Full Job Description: {description}

Your goal is to provide a comprehensive audit of the candidate's document.

Audit Tasks:
1. Extract and process all content from the document (OCR if needed).
2. Rate the resume from 0-100 based on its content relevance, formatting, and alignment with the job.
3. Provide a high-level summary of the candidate's suitability.
4. List key strengths found and critical weaknesses to address.
5. Provide actionable improvements categorized by 'category' (e.g., Experience, Skills, Education, Formatting) with their estimated impact (High, Medium, Low).
6. Identify specific spelling, typographical, or grammatical errors (provide original text, suggested fix, and context).
7. Analyze job alignment:
   - Identify specific high-value keywords missing from the resume.
   - Provide a list of recommended industry keywords to add.
   - Calculate a match percentage.
   - Provide a concise role fit summary.

IMPORTANT: If the file is not a resume or is completely unreadable, provide a score of 0.
Format the response strictly as a JSON object matching the provided schema."#,
        title = job.title.trim(),
        company = job.company().unwrap_or(UNNAMED_COMPANY),
        description = job.description.trim(),
    )
}

/// Schema instructions for providers that cannot enforce a response schema
/// natively. Appended as a system message.
pub fn schema_instructions(schema: &Value) -> String {
    let pretty = serde_json::to_string_pretty(schema).unwrap_or_else(|_| schema.to_string());
    format!(
        "Respond with a single JSON object and nothing else. No markdown fences, \
no commentary. Every property listed as required must be present. The object \
must conform to this schema (OpenAPI subset, type names upper-case):\n\n{pretty}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn prompt_embeds_job_context() {
        let job = JobDetails::new("Backend Engineer", "Go, Kubernetes, gRPC").with_company("Acme");
        let p = audit_prompt(&job);
        assert!(p.contains("- Target Role: Backend Engineer"));
        assert!(p.contains("- Company: Acme"));
        assert!(p.contains("Go, Kubernetes, gRPC"));
    }

    #[test]
    fn blank_company_is_confidential() {
        let p = audit_prompt(&JobDetails::new("Engineer", "Rust"));
        assert!(p.contains("- Company: Confidential"));
    }

    #[test]
    fn prompt_keeps_zero_score_rule() {
        let p = audit_prompt(&JobDetails::new("Engineer", "Rust"));
        assert!(p.contains("not a resume or is completely unreadable, provide a score of 0"));
    }

    #[test]
    fn schema_instructions_include_schema() {
        let s = schema_instructions(&json!({"type": "OBJECT", "required": ["overallScore"]}));
        assert!(s.contains("\"overallScore\""));
        assert!(s.starts_with("Respond with a single JSON object"));
    }
}
