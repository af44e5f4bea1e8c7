//! Export formats for a finished fact-check.

use crate::models::{FactCheckResponse, FinalReport};
use chrono::{DateTime, Local};
use std::fmt::Write;

const RULE: &str = "-------------------------------------------------";

pub fn to_json(report: &FinalReport) -> serde_json::Result<String> {
    serde_json::to_string_pretty(report)
}

/// Plain-text report, the same layout users get from the download button.
pub fn render_text(run: &FactCheckResponse, generated_at: DateTime<Local>) -> String {
    let report = &run.report;
    let mut out = String::new();
    let _ = writeln!(out, "FACT CHECK REPORT");
    let _ = writeln!(out, "{RULE}");
    let _ = writeln!(out, "Generated On: {}", generated_at.format("%Y-%m-%d %H:%M:%S"));
    let _ = writeln!(out, "Processing Time: {:.2}s", run.total_time_ms as f64 / 1000.0);
    let _ = writeln!(out);
    let _ = writeln!(out, "CLAIM:\n{}", run.claim);
    let _ = writeln!(out);
    let _ = writeln!(out, "{RULE}");
    let _ = writeln!(out, "VERDICT: {}", report.verdict);
    let _ = writeln!(out);
    let _ = writeln!(out, "REASONING:\n{}", report.reasoning);
    let _ = writeln!(out);
    let _ = writeln!(out, "RECOMMENDATION:\n{}", report.recommendation);
    let _ = writeln!(out);
    let _ = writeln!(out, "SOURCES CHECKED: {}", report.total_sources);
    let _ = writeln!(out);
    let _ = writeln!(out, "SUPPORTING CITATIONS:");
    if report.citations.is_empty() {
        let _ = writeln!(out, "None");
    }
    for (i, citation) in report.citations.iter().enumerate() {
        let _ = writeln!(out, "{}. Title: {}\n   URL: {}", i + 1, citation.title, citation.url);
    }
    out
}
