use super::{fail_stage, load_context, record_task_time, CONTEXT_KEY};
use crate::config::PipelineSettings;
use crate::error::FactCheckError;
use crate::extract::{extract_record, read_bool, read_label, read_sources, read_string, read_strings, Record};
use crate::models::{Level, SearchResult, Tone, TriageReport, VerificationStatus, NO_CORRECTION};
use crate::tools::{gather, EvidenceSource, NarrativeGenerator};
use async_trait::async_trait;
use graph_flow::{Context, GraphError, NextAction, Task, TaskResult};
use serde_json::json;
use std::sync::Arc;
use tracing::{info, instrument, warn};

pub const TRIAGE_TASK: &str = "triage";

const ROLE: &str = "You are a senior news analyst and fact-checker. You judge claims strictly \
from the search evidence you are given, and you read coverage for tone, sensationalism and bias.";

/// Stage 1: searches for the literal claim, asks the generator for a direct
/// verification status plus the linguistic read of the coverage.
pub struct TriageTask {
    search: Arc<dyn EvidenceSource>,
    generator: Arc<dyn NarrativeGenerator>,
    settings: PipelineSettings,
}

impl TriageTask {
    pub fn new(
        search: Arc<dyn EvidenceSource>,
        generator: Arc<dyn NarrativeGenerator>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            search,
            generator,
            settings,
        }
    }

    async fn triage(&self, claim: &str) -> Result<TriageReport, FactCheckError> {
        let direct = gather(&self.search, &direct_queries(claim), self.settings.max_results).await;
        let broader = gather(&self.search, &context_queries(claim), self.settings.max_results).await;
        info!(direct = direct.len(), broader = broader.len(), "collected triage evidence");

        if direct.is_empty() && broader.is_empty() {
            warn!("no evidence found for claim, marking unverifiable");
            return Ok(TriageReport::inconclusive());
        }

        let context = json!({
            "claim": claim,
            "direct_evidence": direct,
            "context_evidence": broader,
        });
        let response = self
            .generator
            .generate(ROLE, &instructions(claim, self.settings.max_claims), Some(&context))
            .await
            .map_err(|e| FactCheckError::generation(TRIAGE_TASK, format!("{e:#}")))?;

        let record = extract_record(&response);
        if record.is_empty() {
            warn!("triage response had no structured block");
        }
        Ok(normalize(&record, &direct, self.settings.max_claims))
    }
}

#[async_trait]
impl Task for TriageTask {
    fn id(&self) -> &str {
        TRIAGE_TASK
    }

    #[instrument(skip(self, context))]
    async fn run(&self, context: Context) -> Result<TaskResult, GraphError> {
        let start_time = std::time::Instant::now();
        info!("Starting content and context triage");

        let mut fact_check = load_context(&context).await?;
        let report = match self.triage(&fact_check.claim).await {
            Ok(report) => report,
            Err(e) => return Ok(fail_stage(&context, e).await),
        };

        info!(
            status = %report.direct_verification_status,
            core_claims = report.core_claims.len(),
            "Triage complete"
        );
        fact_check.triage = Some(report);
        context.set(CONTEXT_KEY, fact_check).await;
        record_task_time(&context, TRIAGE_TASK, start_time).await;

        Ok(TaskResult::new(
            Some("Triage completed".to_string()),
            NextAction::ContinueAndExecute,
        ))
    }
}

pub(crate) fn direct_queries(claim: &str) -> Vec<String> {
    vec![
        format!("{claim} fact check"),
        format!("{claim} debunked"),
        format!("{claim} true or false"),
    ]
}

pub(crate) fn context_queries(claim: &str) -> Vec<String> {
    vec![claim.to_string(), format!("{claim} news coverage")]
}

fn instructions(claim: &str, max_claims: usize) -> String {
    format!(
        r#"Assess the claim: "{claim}"

The context holds two sets of web search results. `direct_evidence` came from
fact-check style searches for the literal claim; `context_evidence` came from
broader searches on the topic. Snippets are all you have; do not assume
anything they do not say.

Rules:
- direct_verification_status is "debunked" only if authoritative results in
  direct_evidence explicitly contradict the claim, "verified" only if they
  explicitly confirm it, otherwise "unverifiable".
- correction states the accurate information when debunked, otherwise "{NO_CORRECTION}".
- direct_sources lists the direct_evidence results that support your status,
  copied exactly (title and url).
- inferred_tone, inferred_intensity, sensationalism_level and bias_detected
  describe the language of all snippets taken together.
- core_claims lists up to {max_claims} distinct factual sub-claims or topics
  worth checking separately. Use an empty list if there are none.

Reply with a single fenced json block in exactly this shape:
```json
{{
  "direct_verification_status": "verified | debunked | unverifiable",
  "correction": "...",
  "direct_sources": [{{"title": "...", "url": "..."}}],
  "inferred_tone": "positive | negative | neutral | mixed",
  "inferred_intensity": "low | medium | high",
  "sensationalism_level": "low | medium | high",
  "bias_detected": false,
  "core_claims": ["..."]
}}
```"#
    )
}

/// Turns a raw record into a report, replacing anything missing or invalid
/// with the least committal value.
pub(crate) fn normalize(record: &Record, direct: &[SearchResult], max_claims: usize) -> TriageReport {
    let status = read_label(record, "direct_verification_status").unwrap_or(VerificationStatus::Unverifiable);
    let direct_sources = read_sources(record, "direct_sources", direct);
    let correction = read_string(record, "correction").filter(|c| c != NO_CORRECTION);

    let mut report = match (status, correction) {
        (VerificationStatus::Unverifiable, _) => TriageReport::new(status, direct_sources),
        _ if direct_sources.is_empty() => {
            warn!(%status, "status has no supporting direct source, downgrading");
            TriageReport::new(VerificationStatus::Unverifiable, direct_sources)
        }
        (VerificationStatus::Debunked, Some(correction)) => TriageReport::debunked(correction, direct_sources),
        (VerificationStatus::Debunked, None) => {
            warn!("debunked without a correction, downgrading");
            TriageReport::new(VerificationStatus::Unverifiable, direct_sources)
        }
        (VerificationStatus::Verified, _) => TriageReport::new(status, direct_sources),
    };

    report.inferred_tone = read_label(record, "inferred_tone").unwrap_or(Tone::Neutral);
    report.inferred_intensity = read_label(record, "inferred_intensity").unwrap_or(Level::Medium);
    report.sensationalism_level = read_label(record, "sensationalism_level").unwrap_or(Level::Medium);
    report.bias_detected = read_bool(record, "bias_detected").unwrap_or(false);
    report.core_claims = read_strings(record, "core_claims").into_iter().take(max_claims).collect();
    report
}
