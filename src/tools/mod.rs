pub mod llm;
pub mod tavily;

use crate::models::SearchResult;
use async_trait::async_trait;
use futures::future::join_all;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

/// Web search capability. Results come back in rank order.
#[async_trait]
pub trait EvidenceSource: Send + Sync {
    async fn search(&self, query: &str, max_results: usize) -> anyhow::Result<Vec<SearchResult>>;
}

/// Text generation capability. The reply is free text that should embed a
/// fenced JSON block.
#[async_trait]
pub trait NarrativeGenerator: Send + Sync {
    async fn generate(&self, role: &str, instructions: &str, context: Option<&Value>) -> anyhow::Result<String>;
}

/// Runs every query concurrently and concatenates the hits in query order,
/// dropping urls already seen. A failed query counts as zero results.
pub async fn gather(source: &Arc<dyn EvidenceSource>, queries: &[String], max_results: usize) -> Vec<SearchResult> {
    let searches = queries.iter().map(|query| {
        let source = source.clone();
        async move {
            match source.search(query, max_results).await {
                Ok(hits) => {
                    debug!(query = %query, hits = hits.len(), "search complete");
                    hits
                }
                Err(e) => {
                    warn!(query = %query, error = %e, "search failed, treating as no results");
                    Vec::new()
                }
            }
        }
    });

    let mut seen = HashSet::new();
    join_all(searches)
        .await
        .into_iter()
        .flatten()
        .filter(|hit| !hit.url.is_empty() && seen.insert(hit.url.clone()))
        .collect()
}
