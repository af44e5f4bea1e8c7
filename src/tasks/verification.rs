use super::{fail_stage, load_context, record_task_time, CONTEXT_KEY};
use crate::config::PipelineSettings;
use crate::error::FactCheckError;
use crate::extract::{extract_record, read_label, read_sources, read_string, Record};
use crate::models::{Citation, ClaimVerdict, SearchResult, VerificationReport, VerificationStatus};
use crate::tools::{gather, EvidenceSource, NarrativeGenerator};
use async_trait::async_trait;
use futures::future::join_all;
use graph_flow::{Context, GraphError, NextAction, Task, TaskResult};
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, instrument, warn};

pub const VERIFICATION_TASK: &str = "claim_verification";

/// Outlets whose refutation alone is enough to call a claim debunked.
pub const FACT_CHECK_DOMAINS: &[&str] = &[
    "snopes.com",
    "politifact.com",
    "factcheck.org",
    "fullfact.org",
    "factcheck.afp.com",
    "leadstories.com",
    "checkyourfact.com",
    "altnews.in",
    "boomlive.in",
    "factly.in",
    "healthfeedback.org",
    "africacheck.org",
];

const ROLE: &str = "You are a meticulous claim verification specialist. You decide whether a \
single claim holds up using only the search results you are shown, and you prefer \
\"unverifiable\" over guessing.";

/// Stage 2: verifies every core claim from triage independently.
pub struct ClaimVerificationTask {
    search: Arc<dyn EvidenceSource>,
    generator: Arc<dyn NarrativeGenerator>,
    settings: PipelineSettings,
}

impl ClaimVerificationTask {
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

    /// Search failures only thin out the evidence; a generator failure is an
    /// error for the whole stage.
    async fn verify_claim(&self, claim: String) -> Result<ClaimVerdict, FactCheckError> {
        let evidence = gather(&self.search, &claim_queries(&claim), self.settings.max_results).await;
        if evidence.is_empty() {
            return Ok(ClaimVerdict {
                claim_text: claim,
                status: VerificationStatus::Unverifiable,
                reasoning: "No search results were found for this claim.".to_string(),
                sources: Vec::new(),
            });
        }

        let context = json!({ "claim": claim, "evidence": evidence });
        let response = self
            .generator
            .generate(ROLE, &instructions(&claim), Some(&context))
            .await
            .map_err(|e| {
                warn!(claim = %claim, error = %e, "claim verification failed");
                FactCheckError::generation(VERIFICATION_TASK, format!("claim \"{claim}\": {e:#}"))
            })?;
        Ok(classify(claim, &extract_record(&response), &evidence))
    }
}

#[async_trait]
impl Task for ClaimVerificationTask {
    fn id(&self) -> &str {
        VERIFICATION_TASK
    }

    #[instrument(skip(self, context))]
    async fn run(&self, context: Context) -> Result<TaskResult, GraphError> {
        let start_time = std::time::Instant::now();
        info!("Starting claim verification");

        let mut fact_check = load_context(&context).await?;
        let claims = fact_check
            .triage
            .as_ref()
            .map(|t| t.core_claims.clone())
            .ok_or_else(|| GraphError::ContextError("Triage report not found".to_string()))?;

        // join_all keeps input order, whatever order the claims finish in.
        let verdicts = join_all(
            claims
                .into_iter()
                .take(self.settings.max_claims)
                .map(|claim| self.verify_claim(claim)),
        )
        .await;

        // Every claim runs to completion before the first failure is reported.
        let verdicts = match verdicts.into_iter().collect::<Result<Vec<_>, _>>() {
            Ok(verdicts) => verdicts,
            Err(e) => return Ok(fail_stage(&context, e).await),
        };

        let report = VerificationReport::from_verdicts(verdicts);
        info!(
            claims = report.claims.len(),
            verified = report.count(VerificationStatus::Verified),
            debunked = report.count(VerificationStatus::Debunked),
            sources = report.all_sources.len(),
            "Claim verification complete"
        );
        fact_check.verification = Some(report);
        context.set(CONTEXT_KEY, fact_check).await;
        record_task_time(&context, VERIFICATION_TASK, start_time).await;

        Ok(TaskResult::new(
            Some("Claims verified".to_string()),
            NextAction::ContinueAndExecute,
        ))
    }
}

pub(crate) fn claim_queries(claim: &str) -> Vec<String> {
    vec![
        format!("is {claim} true"),
        format!("{claim} debunked"),
        format!("{claim} fact check"),
    ]
}

fn instructions(claim: &str) -> String {
    format!(
        r#"Verify the claim: "{claim}"

The context lists web search results gathered for this claim.

Rules:
- "verified" needs several authoritative sources agreeing the claim is true.
- "debunked" needs an explicit refutation from a recognised fact-checking
  organisation, or several authoritative sources agreeing it is false.
- Anything else, including authoritative sources that disagree, is "unverifiable".
- sources lists the results your decision rests on, copied exactly.

Reply with a single fenced json block in exactly this shape:
```json
{{
  "status": "verified | debunked | unverifiable",
  "reasoning": "...",
  "sources": [{{"title": "...", "url": "..."}}]
}}
```"#
    )
}

/// Applies the corroboration rules on top of what the generator said.
pub(crate) fn classify(claim: String, record: &Record, evidence: &[SearchResult]) -> ClaimVerdict {
    let sources = read_sources(record, "sources", evidence);
    let claimed = read_label(record, "status").unwrap_or(VerificationStatus::Unverifiable);
    let mut reasoning = read_string(record, "reasoning").unwrap_or_else(|| "No reasoning was provided.".to_string());

    let hosts = distinct_hosts(&sources);
    let corroborated = match claimed {
        VerificationStatus::Verified => hosts.len() >= 2,
        VerificationStatus::Debunked => hosts.len() >= 2 || hosts.iter().any(|h| is_fact_checker(h)),
        VerificationStatus::Unverifiable => true,
    };

    let status = if corroborated {
        claimed
    } else {
        warn!(claim = %claim, %claimed, hosts = hosts.len(), "insufficient corroboration");
        reasoning.push_str(&format!(" (Reported as {claimed}, but without enough independent sources.)"));
        VerificationStatus::Unverifiable
    };

    ClaimVerdict {
        claim_text: claim,
        status,
        reasoning,
        sources,
    }
}

fn distinct_hosts(sources: &[Citation]) -> HashSet<String> {
    sources
        .iter()
        .filter_map(|s| reqwest::Url::parse(&s.url).ok())
        .filter_map(|url| url.host_str().map(|h| h.trim_start_matches("www.").to_ascii_lowercase()))
        .collect()
}

fn is_fact_checker(host: &str) -> bool {
    FACT_CHECK_DOMAINS
        .iter()
        .any(|domain| host == *domain || host.ends_with(&format!(".{domain}")))
}
