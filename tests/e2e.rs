//! End-to-end tests against the live Gemini API.
//!
//! Gated behind `E2E_ENABLED` so they do not run in CI unless explicitly
//! requested. A key must be available in `GEMINI_API_KEY` (or `API_KEY`).
//!
//! Run with:
//!   E2E_ENABLED=1 cargo test --test e2e -- --nocapture

use resume_audit::pipeline::encode::encode_bytes;
use resume_audit::{
    analyze_payload, render_markdown, resolve_backend, AnalyzerConfig, AuditError, DocumentKind,
    JobDetails,
};
use tracing_subscriber::EnvFilter;

/// Route library `tracing` output to the test harness (`--nocapture` shows it).
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("resume_audit=debug")),
        )
        .with_test_writer()
        .try_init();
}

/// Skip unless E2E_ENABLED is set and a key is configured.
macro_rules! e2e_skip_unless_ready {
    () => {{
        init_tracing();
        if std::env::var("E2E_ENABLED").is_err() {
            println!("SKIP — set E2E_ENABLED=1 to run e2e tests");
            return;
        }
        let config = AnalyzerConfig::from_env();
        if config.resolved_api_key().is_none() {
            println!("SKIP — GEMINI_API_KEY not set");
            return;
        }
        config
    }};
}

/// Smallest valid PDF with one line of résumé text.
fn tiny_resume_pdf() -> Vec<u8> {
    let text = "BT /F1 12 Tf 72 720 Td (Jane Doe - Senior Go Engineer, 6 years Kubernetes, gRPC) Tj ET";
    let objects = [
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
        "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Contents 4 0 R \
         /Resources << /Font << /F1 5 0 R >> >> >>"
            .to_string(),
        format!("<< /Length {} >>\nstream\n{}\nendstream", text.len(), text),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_string(),
    ];

    let mut pdf = b"%PDF-1.4\n".to_vec();
    let mut offsets = Vec::new();
    for (i, body) in objects.iter().enumerate() {
        offsets.push(pdf.len());
        pdf.extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", i + 1, body).as_bytes());
    }
    let xref = pdf.len();
    pdf.extend_from_slice(format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1).as_bytes());
    for off in offsets {
        pdf.extend_from_slice(format!("{off:010} 00000 n \n").as_bytes());
    }
    pdf.extend_from_slice(
        format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
            objects.len() + 1,
            xref
        )
        .as_bytes(),
    );
    pdf
}

#[tokio::test]
async fn e2e_analyze_tiny_pdf() {
    let config = e2e_skip_unless_ready!();
    let backend = resolve_backend(&config).expect("backend");
    let job = JobDetails::new("Backend Engineer", "Go, Kubernetes, gRPC, on-call rotation")
        .with_company("Acme");

    let payload = encode_bytes(DocumentKind::Pdf, &tiny_resume_pdf());
    let output = analyze_payload(backend.as_ref(), payload, &job, &config)
        .await
        .expect("analysis should succeed");

    let r = &output.result;
    println!("{}", render_markdown(r, &job));
    println!(
        "tokens: {} in / {} out, {}ms",
        output.stats.input_tokens, output.stats.output_tokens, output.stats.duration_ms
    );
    assert!((0.0..=100.0).contains(&r.overall_score));
    assert!((0.0..=100.0).contains(&r.job_alignment.match_percentage));
    assert!(!r.summary.trim().is_empty());
}

#[tokio::test]
async fn e2e_garbage_image_is_rejected_or_scored_zero() {
    let config = e2e_skip_unless_ready!();
    let backend = resolve_backend(&config).expect("backend");
    let job = JobDetails::new("Backend Engineer", "Go");

    // PNG signature followed by noise: not a decodable image.
    let mut bytes = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    bytes.extend(std::iter::repeat(0xAB).take(512));
    let payload = encode_bytes(DocumentKind::Png, &bytes);

    match analyze_payload(backend.as_ref(), payload, &job, &config).await {
        Err(AuditError::UpstreamRejection { detail }) => println!("rejected: {detail}"),
        Ok(output) => assert!(output.result.overall_score <= 10.0),
        Err(other) => panic!("unexpected error: {other}"),
    }
}
