use crate::config::{Config, PipelineSettings};
use crate::error::FactCheckError;
use crate::models::{FactCheckContext, FactCheckResponse, FinalReport};
use crate::tasks::{
    take_failure, ClaimVerificationTask, TriageTask, VerdictTask, CONTEXT_KEY, TASK_TIMES_KEY, TRIAGE_TASK,
    VERDICT_TASK, VERIFICATION_TASK,
};
use crate::tools::{llm::RigGenerator, tavily::TavilySearch, EvidenceSource, NarrativeGenerator};
use graph_flow::{ExecutionStatus, FlowRunner, GraphBuilder, InMemorySessionStorage, Session, SessionStorage};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Runs triage, claim verification and verdict synthesis in that order.
///
/// Holds no per-run state: each call gets its own graph-flow session, which
/// is removed once the report has been read back.
#[derive(Clone)]
pub struct FactChecker {
    runner: Arc<FlowRunner>,
    storage: Arc<dyn SessionStorage>,
}

impl FactChecker {
    pub fn new(
        search: Arc<dyn EvidenceSource>,
        generator: Arc<dyn NarrativeGenerator>,
        settings: PipelineSettings,
    ) -> Self {
        let storage: Arc<dyn SessionStorage> = Arc::new(InMemorySessionStorage::new());

        let graph = GraphBuilder::new("fact_check_workflow")
            .add_task(Arc::new(TriageTask::new(search.clone(), generator.clone(), settings)))
            .add_task(Arc::new(ClaimVerificationTask::new(search, generator, settings)))
            .add_task(Arc::new(VerdictTask))
            .add_edge(TRIAGE_TASK, VERIFICATION_TASK)
            .add_edge(VERIFICATION_TASK, VERDICT_TASK)
            .build();

        let runner = Arc::new(FlowRunner::new(Arc::new(graph), storage.clone()));
        Self { runner, storage }
    }

    /// Wires the Tavily and OpenAI adapters from a loaded configuration.
    pub fn from_config(config: &Config) -> Result<Self, FactCheckError> {
        if config.openai_api_key.trim().is_empty() {
            return Err(FactCheckError::Configuration("OPENAI_API_KEY is not set".to_string()));
        }
        if config.tavily_api_key.is_none() {
            warn!("TAVILY_API_KEY is not set; every search will come back empty");
        }

        let search = TavilySearch::new(config.tavily_api_key.clone(), config.search_timeout)
            .map_err(|e| FactCheckError::Configuration(format!("search client: {e}")))?;
        let generator = RigGenerator::new(
            &config.openai_api_key,
            config.model.clone(),
            config.temperature,
            config.generation_timeout,
        );
        Ok(Self::new(Arc::new(search), Arc::new(generator), config.pipeline))
    }

    pub async fn run(&self, claim: &str) -> Result<FinalReport, FactCheckError> {
        Ok(self.check(claim).await?.report)
    }

    /// Like [`FactChecker::run`], with the session id and per-task timings.
    #[instrument(skip(self))]
    pub async fn check(&self, claim: &str) -> Result<FactCheckResponse, FactCheckError> {
        let claim = claim.trim();
        if claim.is_empty() {
            return Err(FactCheckError::EmptyClaim);
        }

        let start_time = std::time::Instant::now();
        let session_id = Uuid::new_v4().to_string();
        info!("Starting fact-check workflow for session {}", session_id);

        let session = Session::new_from_task(session_id.clone(), TRIAGE_TASK);
        session.context.set(CONTEXT_KEY, FactCheckContext::new(claim)).await;
        self.storage.save(session).await?;

        let outcome = self.drive(&session_id).await;
        if let Err(e) = self.storage.delete(&session_id).await {
            warn!(session = %session_id, error = %e, "failed to drop finished session");
        }
        let (context, task_times) = outcome?;

        let report = context
            .report
            .ok_or_else(|| FactCheckError::Workflow("workflow finished without a final report".to_string()))?;
        info!("Fact-check completed in {:?}", start_time.elapsed());

        Ok(FactCheckResponse {
            session_id,
            claim: claim.to_string(),
            report,
            total_time_ms: start_time.elapsed().as_millis() as u64,
            task_times,
        })
    }

    async fn drive(
        &self,
        session_id: &str,
    ) -> Result<(FactCheckContext, HashMap<String, u64>), FactCheckError> {
        loop {
            let result = self.runner.run(session_id).await?;

            match &result.status {
                ExecutionStatus::Completed => break,
                ExecutionStatus::Paused { next_task_id, .. } => {
                    info!("Workflow paused, next task: {}", next_task_id);
                    continue;
                }
                ExecutionStatus::Error(e) => {
                    tracing::error!("Workflow error: {}", e);
                    return Err(FactCheckError::Workflow(e.to_string()));
                }
                _ => continue,
            }
        }

        let session = self
            .storage
            .get(session_id)
            .await?
            .ok_or_else(|| FactCheckError::Workflow(format!("session {session_id} disappeared")))?;

        // A stage that failed ended the graph early and left its error behind.
        if let Some(err) = take_failure(&session.context).await {
            return Err(err);
        }

        let context: FactCheckContext = session
            .context
            .get(CONTEXT_KEY)
            .await
            .ok_or_else(|| FactCheckError::Workflow("fact-check context missing".to_string()))?;
        let task_times = session.context.get(TASK_TIMES_KEY).await.unwrap_or_default();
        Ok((context, task_times))
    }
}
