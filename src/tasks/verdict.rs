use super::{load_context, record_task_time, CONTEXT_KEY};
use crate::models::{
    dedup_by_url, Citation, FinalReport, Level, TriageReport, Verdict, VerificationReport, VerificationStatus,
};
use async_trait::async_trait;
use graph_flow::{Context, GraphError, NextAction, Task, TaskResult};
use tracing::{info, instrument};

pub const VERDICT_TASK: &str = "verdict_synthesis";

/// Stage 3: collapses the triage and claim reports into one verdict. No model
/// call happens here; the outcome is a pure function of the two reports.
pub struct VerdictTask;

#[async_trait]
impl Task for VerdictTask {
    fn id(&self) -> &str {
        VERDICT_TASK
    }

    #[instrument(skip(self, context))]
    async fn run(&self, context: Context) -> Result<TaskResult, GraphError> {
        let start_time = std::time::Instant::now();
        info!("Starting verdict synthesis");

        let mut fact_check = load_context(&context).await?;
        let triage = fact_check
            .triage
            .as_ref()
            .ok_or_else(|| GraphError::ContextError("Triage report not found".to_string()))?;
        let verification = fact_check
            .verification
            .as_ref()
            .ok_or_else(|| GraphError::ContextError("Verification report not found".to_string()))?;

        let report = synthesize(&fact_check.claim, triage, verification);
        info!(verdict = %report.verdict, sources = report.total_sources, "Verdict reached");

        fact_check.report = Some(report);
        context.set(CONTEXT_KEY, fact_check).await;
        record_task_time(&context, VERDICT_TASK, start_time).await;

        Ok(TaskResult::new(
            Some("Verdict synthesized".to_string()),
            NextAction::End,
        ))
    }
}

/// The decision table. Only the direct status of the literal claim decides;
/// sensationalism or bias can only soften a verified claim. A debunk with no
/// correction to quote is not enough to call the claim fake.
pub fn decide(triage: &TriageReport) -> Verdict {
    match triage.direct_verification_status {
        VerificationStatus::Debunked if triage.correction.is_none() => Verdict::Uncertain,
        VerificationStatus::Debunked => Verdict::Fake,
        VerificationStatus::Verified if triage.sensationalism_level == Level::High || triage.bias_detected => {
            Verdict::LikelyVerified
        }
        VerificationStatus::Verified => Verdict::Verified,
        VerificationStatus::Unverifiable => Verdict::Uncertain,
    }
}

pub fn recommendation(verdict: Verdict, correction: &str) -> String {
    match verdict {
        Verdict::Fake => format!(
            "AVOID SHARING THIS CONTENT. The original claim is false. The correct information is: {correction}."
        ),
        Verdict::Verified => "This information appears reliable and can be shared.".to_string(),
        Verdict::LikelyVerified => "This information appears largely reliable, but contains some \
             sensationalism/bias. Share with mild caution."
            .to_string(),
        Verdict::Uncertain => "Proceed with caution. The veracity of this information could not be \
             definitively determined. Seek additional reputable sources."
            .to_string(),
    }
}

/// Direct sources first, then claim sources, one entry per url.
pub fn compile_citations(triage: &TriageReport, verification: &VerificationReport) -> Vec<Citation> {
    dedup_by_url([triage.direct_sources.as_slice(), verification.all_sources.as_slice()])
}

pub fn synthesize(claim: &str, triage: &TriageReport, verification: &VerificationReport) -> FinalReport {
    let verdict = decide(triage);
    let citations = compile_citations(triage, verification);
    FinalReport {
        verdict,
        reasoning: reasoning(claim, verdict, triage, verification),
        total_sources: citations.len(),
        citations,
        recommendation: recommendation(verdict, triage.correction_text()),
    }
}

fn reasoning(claim: &str, verdict: Verdict, triage: &TriageReport, verification: &VerificationReport) -> String {
    let mut lines = Vec::new();
    lines.push(match verdict {
        Verdict::Fake => format!(
            "The original claim \"{claim}\" is false. Authoritative sources contradict it. Correct information: {}",
            triage.correction_text()
        ),
        Verdict::Verified => format!("Authoritative sources directly confirm the claim \"{claim}\"."),
        Verdict::LikelyVerified => {
            let mut concerns = Vec::new();
            if triage.sensationalism_level == Level::High {
                concerns.push("highly sensational framing");
            }
            if triage.bias_detected {
                concerns.push("signs of bias");
            }
            format!(
                "Authoritative sources confirm the claim \"{claim}\", but its coverage shows {}.",
                concerns.join(" and ")
            )
        }
        Verdict::Uncertain => {
            format!("No authoritative source directly confirms or refutes the claim \"{claim}\".")
        }
    });

    lines.push(format!(
        "Coverage reads as {} in tone with {} intensity; sensationalism is {} and bias was {}.",
        triage.inferred_tone,
        triage.inferred_intensity,
        triage.sensationalism_level,
        if triage.bias_detected { "detected" } else { "not detected" },
    ));

    if !verification.claims.is_empty() {
        lines.push(format!(
            "Related claims checked: {} verified, {} debunked, {} unverifiable.",
            verification.count(VerificationStatus::Verified),
            verification.count(VerificationStatus::Debunked),
            verification.count(VerificationStatus::Unverifiable),
        ));
        for verdict in &verification.claims {
            lines.push(format!("- \"{}\": {}. {}", verdict.claim_text, verdict.status, verdict.reasoning));
        }
    }

    lines.join("\n")
}
