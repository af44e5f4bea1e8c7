use super::EvidenceSource;
use crate::models::{SearchResult, TavilySearchRequest, TavilySearchResponse};
use async_trait::async_trait;
use std::time::Duration;

const TAVILY_URL: &str = "https://api.tavily.com/search";

#[derive(Debug)]
pub struct TavilyError(String);

impl std::fmt::Display for TavilyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Tavily error: {}", self.0)
    }
}

impl std::error::Error for TavilyError {}

/// Tavily-backed evidence source. Without an API key every search fails,
/// which the stages absorb as empty evidence.
#[derive(Debug, Clone)]
pub struct TavilySearch {
    client: reqwest::Client,
    api_key: Option<String>,
}

impl TavilySearch {
    pub fn new(api_key: Option<String>, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, api_key })
    }
}

#[async_trait]
impl EvidenceSource for TavilySearch {
    async fn search(&self, query: &str, max_results: usize) -> anyhow::Result<Vec<SearchResult>> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| TavilyError("TAVILY_API_KEY not set".to_string()))?;

        let request = TavilySearchRequest {
            query: query.to_string(),
            max_results,
            search_depth: "advanced".to_string(),
            include_raw_content: false,
        };

        let response = self
            .client
            .post(TAVILY_URL)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| TavilyError(format!("Request failed: {}", e)))?
            .error_for_status()
            .map_err(|e| TavilyError(format!("Search rejected: {}", e)))?;

        let search_response: TavilySearchResponse = response
            .json()
            .await
            .map_err(|e| TavilyError(format!("Failed to parse response: {}", e)))?;

        Ok(search_response
            .results
            .into_iter()
            .take(max_results)
            .map(|r| SearchResult {
                title: r.title,
                url: r.url,
                snippet: r.content,
            })
            .collect())
    }
}
