//! Result types produced by a successful analysis.
//!
//! [`AnalysisResult`] mirrors the response schema declared to the provider
//! field for field (camelCase on the wire). Every field is required: a
//! document missing any of them fails to decode rather than producing a
//! partially populated result.

use serde::{Deserialize, Serialize};

/// The structured audit of one résumé against one job description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    /// 0–100. A score of 0 means the document was not a résumé or was
    /// unreadable.
    pub overall_score: f64,
    pub summary: String,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub improvements: Vec<Improvement>,
    pub spelling_errors: Vec<SpellingError>,
    pub job_alignment: JobAlignment,
}

impl AnalysisResult {
    /// `true` when the provider flagged the document as not a résumé or
    /// unreadable (sentinel score of 0).
    pub fn is_unreadable(&self) -> bool {
        self.overall_score <= 0.0
    }

    /// Improvements with [`Impact::High`], in the order the provider listed them.
    pub fn high_impact_improvements(&self) -> impl Iterator<Item = &Improvement> {
        self.improvements
            .iter()
            .filter(|i| i.impact == Impact::High)
    }
}

/// One actionable change, e.g. `{ category: "Skills", impact: Medium }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Improvement {
    /// Free-form grouping such as Experience, Skills, Education, Formatting.
    pub category: String,
    pub description: String,
    pub impact: Impact,
}

/// Estimated impact of an [`Improvement`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Impact {
    #[serde(alias = "high", alias = "HIGH")]
    High,
    #[serde(alias = "medium", alias = "MEDIUM")]
    Medium,
    #[serde(alias = "low", alias = "LOW")]
    Low,
}

impl Impact {
    pub fn as_str(&self) -> &'static str {
        match self {
            Impact::High => "High",
            Impact::Medium => "Medium",
            Impact::Low => "Low",
        }
    }
}

impl std::fmt::Display for Impact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A spelling, typographical or grammatical error found in the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpellingError {
    pub original: String,
    pub suggestion: String,
    /// Surrounding text so the reader can locate the error.
    pub context: String,
}

/// How well the résumé lines up with the target role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobAlignment {
    /// 0–100.
    pub match_percentage: f64,
    pub missing_keywords: Vec<String>,
    pub suggested_keywords: Vec<String>,
    pub role_fit_summary: String,
}

/// A decoded result plus bookkeeping about the call that produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisOutput {
    pub result: AnalysisResult,
    pub stats: AnalysisStats,
}

/// Per-call statistics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisStats {
    /// Backend label, e.g. `gemini/gemini-3-flash-preview`.
    pub backend: String,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub duration_ms: u64,
}
