mod triage;
mod verdict;
mod verification;

pub use triage::{TriageTask, TRIAGE_TASK};
pub use verdict::{compile_citations, decide, recommendation, synthesize, VerdictTask, VERDICT_TASK};
pub use verification::{ClaimVerificationTask, FACT_CHECK_DOMAINS, VERIFICATION_TASK};

use crate::error::FactCheckError;
use crate::models::FactCheckContext;
use graph_flow::{Context, GraphError, NextAction, TaskResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Instant;
use tracing::error;

pub const CONTEXT_KEY: &str = "fact_check_context";
pub const TASK_TIMES_KEY: &str = "task_times";
pub const FAILURE_KEY: &str = "stage_failure";

/// A generation failure parked in the session. The graph runner flattens task
/// errors into strings, so stages record the failure here and end the graph
/// instead of returning `Err`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageFailure {
    pub stage: String,
    pub message: String,
}

impl StageFailure {
    pub fn into_error(self) -> FactCheckError {
        let stage = [TRIAGE_TASK, VERIFICATION_TASK, VERDICT_TASK]
            .into_iter()
            .find(|id| *id == self.stage)
            .unwrap_or("unknown");
        FactCheckError::Generation {
            stage,
            message: self.message,
        }
    }
}

pub async fn take_failure(context: &Context) -> Option<FactCheckError> {
    context
        .get::<StageFailure>(FAILURE_KEY)
        .await
        .map(StageFailure::into_error)
}

async fn fail_stage(context: &Context, err: FactCheckError) -> TaskResult {
    error!("{}", err);
    let failure = match err {
        FactCheckError::Generation { stage, message } => StageFailure {
            stage: stage.to_string(),
            message,
        },
        other => StageFailure {
            stage: "unknown".to_string(),
            message: other.to_string(),
        },
    };
    let summary = format!("{} stage failed", failure.stage);
    context.set(FAILURE_KEY, failure).await;
    TaskResult::new(Some(summary), NextAction::End)
}

async fn load_context(context: &Context) -> Result<FactCheckContext, GraphError> {
    context
        .get(CONTEXT_KEY)
        .await
        .ok_or_else(|| GraphError::ContextError("Fact-check context not found".to_string()))
}

async fn record_task_time(context: &Context, task_id: &str, started: Instant) {
    let elapsed = started.elapsed().as_millis() as u64;
    let mut task_times: HashMap<String, u64> = context.get(TASK_TIMES_KEY).await.unwrap_or_default();
    task_times.insert(task_id.to_string(), elapsed);
    context.set(TASK_TIMES_KEY, task_times).await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn failures_come_back_typed() {
        let context = Context::new();
        assert!(take_failure(&context).await.is_none());

        fail_stage(&context, FactCheckError::generation(VERIFICATION_TASK, "quota exceeded")).await;
        match take_failure(&context).await {
            Some(FactCheckError::Generation { stage, message }) => {
                assert_eq!(stage, VERIFICATION_TASK);
                assert_eq!(message, "quota exceeded");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }
}
