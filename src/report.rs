//! Markdown rendering of an [`AnalysisResult`] (the dashboard view).
//!
//! Sections appear in a fixed order: score, summary, job alignment,
//! strengths, weaknesses, improvements (grouped by impact), spelling.
//! Empty lists render as an explicit "none" line rather than disappearing,
//! so a reader can tell "no issues" from "section missing".

use crate::output::{AnalysisResult, Impact};
use crate::pipeline::input::JobDetails;
use std::fmt::Write as _;

/// Qualitative band for a 0–100 score.
pub fn score_band(score: f64) -> &'static str {
    match score {
        s if s >= 80.0 => "Excellent",
        s if s >= 60.0 => "Good",
        s if s >= 40.0 => "Fair",
        s if s > 0.0 => "Needs work",
        _ => "Unreadable",
    }
}

/// Render the full report.
pub fn render_markdown(result: &AnalysisResult, job: &JobDetails) -> String {
    let mut md = String::new();

    let _ = writeln!(md, "# Resume Audit: {}", job.title.trim());
    if let Some(company) = job.company() {
        let _ = writeln!(md, "\n_{company}_");
    }

    let _ = writeln!(
        md,
        "\n**Overall score:** {}/100 ({})",
        fmt_number(result.overall_score),
        score_band(result.overall_score)
    );
    if result.is_unreadable() {
        md.push_str(
            "\n> The document could not be read as a resume. \
Upload a standard PDF or a clear image of your resume.\n",
        );
    }

    let _ = writeln!(md, "\n## Summary\n\n{}", result.summary.trim());

    let ja = &result.job_alignment;
    let _ = writeln!(md, "\n## Job Alignment\n");
    let _ = writeln!(md, "**Match:** {}%\n", fmt_number(ja.match_percentage));
    let _ = writeln!(md, "{}", ja.role_fit_summary.trim());
    push_keywords(&mut md, "Missing keywords", &ja.missing_keywords);
    push_keywords(&mut md, "Suggested keywords", &ja.suggested_keywords);

    push_list(&mut md, "Strengths", &result.strengths);
    push_list(&mut md, "Weaknesses", &result.weaknesses);

    md.push_str("\n## Improvements\n");
    if result.improvements.is_empty() {
        md.push_str("\n_None._\n");
    }
    for impact in [Impact::High, Impact::Medium, Impact::Low] {
        let items: Vec<_> = result
            .improvements
            .iter()
            .filter(|i| i.impact == impact)
            .collect();
        if items.is_empty() {
            continue;
        }
        let _ = writeln!(md, "\n### {impact} impact\n");
        for i in items {
            let _ = writeln!(md, "- **{}**: {}", i.category.trim(), i.description.trim());
        }
    }

    md.push_str("\n## Spelling & Grammar\n\n");
    if result.spelling_errors.is_empty() {
        md.push_str("_No errors found._\n");
    } else {
        md.push_str("| Original | Suggestion | Context |\n|---|---|---|\n");
        for e in &result.spelling_errors {
            let _ = writeln!(
                md,
                "| {} | {} | {} |",
                escape_cell(&e.original),
                escape_cell(&e.suggestion),
                escape_cell(&e.context)
            );
        }
    }

    md
}

fn push_list(md: &mut String, heading: &str, items: &[String]) {
    let _ = writeln!(md, "\n## {heading}\n");
    if items.is_empty() {
        md.push_str("_None._\n");
    }
    for item in items {
        let _ = writeln!(md, "- {}", item.trim());
    }
}

fn push_keywords(md: &mut String, label: &str, words: &[String]) {
    let joined = if words.is_empty() {
        "none".to_string()
    } else {
        words
            .iter()
            .map(|w| format!("`{}`", w.trim()))
            .collect::<Vec<_>>()
            .join(", ")
    };
    let _ = writeln!(md, "\n**{label}:** {joined}");
}

/// Whole numbers print without a fractional part.
fn fmt_number(n: f64) -> String {
    if n.fract() == 0.0 {
        format!("{}", n as i64)
    } else {
        format!("{n:.1}")
    }
}

fn escape_cell(s: &str) -> String {
    s.trim().replace('|', "\\|").replace('\n', " ")
}
