#![allow(dead_code)]

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use factcheck_graphflow::models::SearchResult;
use factcheck_graphflow::tools::{EvidenceSource, NarrativeGenerator};
use factcheck_graphflow::{FactChecker, PipelineSettings};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub fn hit(title: &str, url: &str, snippet: &str) -> SearchResult {
    SearchResult {
        title: title.to_string(),
        url: url.to_string(),
        snippet: snippet.to_string(),
    }
}

/// Answers exact queries from a table; anything else returns no results.
#[derive(Default)]
pub struct FakeSearch {
    pub results: HashMap<String, Vec<SearchResult>>,
    pub queries: Mutex<Vec<String>>,
}

impl FakeSearch {
    pub fn with(mut self, query: &str, hits: Vec<SearchResult>) -> Self {
        self.results.insert(query.to_string(), hits);
        self
    }

    pub fn seen_queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl EvidenceSource for FakeSearch {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchResult>> {
        self.queries.lock().unwrap().push(query.to_string());
        let mut hits = self.results.get(query).cloned().unwrap_or_default();
        hits.truncate(max_results);
        Ok(hits)
    }
}

/// Every query fails, as if the provider were down.
pub struct BrokenSearch;

#[async_trait]
impl EvidenceSource for BrokenSearch {
    async fn search(&self, _query: &str, _max_results: usize) -> Result<Vec<SearchResult>> {
        Err(anyhow!("connection refused"))
    }
}

type Handler = Box<dyn Fn(&str, Option<&Value>) -> Result<String> + Send + Sync>;

/// Generator whose reply is computed from the instructions and context.
pub struct FakeGenerator {
    handler: Handler,
    pub calls: AtomicUsize,
}

impl FakeGenerator {
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&str, Option<&Value>) -> Result<String> + Send + Sync + 'static,
    {
        Self {
            handler: Box::new(handler),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NarrativeGenerator for FakeGenerator {
    async fn generate(&self, _role: &str, instructions: &str, context: Option<&Value>) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        (self.handler)(instructions, context)
    }
}

pub fn is_triage(instructions: &str) -> bool {
    instructions.starts_with("Assess the claim")
}

pub fn context_claim(context: Option<&Value>) -> String {
    context
        .and_then(|c| c.get("claim"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

pub fn fenced(json: Value) -> String {
    format!("Here is my analysis.\n```json\n{}\n```\nLet me know if you need more.", json)
}

pub fn checker(search: Arc<FakeSearch>, generator: Arc<FakeGenerator>) -> FactChecker {
    FactChecker::new(search, generator, PipelineSettings::default())
}
