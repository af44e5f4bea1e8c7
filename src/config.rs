use crate::error::FactCheckError;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_BIND: &str = "0.0.0.0:3000";

/// Knobs the stages read while running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineSettings {
    /// Results requested per search query.
    pub max_results: usize,
    /// Upper bound on sub-claims checked in claim verification.
    pub max_claims: usize,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            max_results: 5,
            max_claims: 5,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub openai_api_key: String,
    pub tavily_api_key: Option<String>,
    pub model: String,
    pub temperature: f64,
    pub bind_addr: String,
    pub search_timeout: Duration,
    pub generation_timeout: Duration,
    pub pipeline: PipelineSettings,
}

impl Config {
    pub fn from_env() -> Result<Self, FactCheckError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup. The generator credential
    /// is checked here, once, so no stage starts without it.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, FactCheckError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let present = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let openai_api_key = present("OPENAI_API_KEY")
            .ok_or_else(|| FactCheckError::Configuration("OPENAI_API_KEY is not set".to_string()))?;

        let defaults = PipelineSettings::default();
        Ok(Self {
            openai_api_key,
            tavily_api_key: present("TAVILY_API_KEY"),
            model: present("FACTCHECK_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            temperature: parse_or(present("FACTCHECK_TEMPERATURE"), "FACTCHECK_TEMPERATURE", 0.2)?,
            bind_addr: present("FACTCHECK_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string()),
            search_timeout: Duration::from_secs(parse_or(
                present("FACTCHECK_SEARCH_TIMEOUT_SECS"),
                "FACTCHECK_SEARCH_TIMEOUT_SECS",
                20,
            )?),
            generation_timeout: Duration::from_secs(parse_or(
                present("FACTCHECK_GENERATION_TIMEOUT_SECS"),
                "FACTCHECK_GENERATION_TIMEOUT_SECS",
                90,
            )?),
            pipeline: PipelineSettings {
                max_results: parse_or(present("FACTCHECK_MAX_RESULTS"), "FACTCHECK_MAX_RESULTS", defaults.max_results)?,
                max_claims: parse_or(present("FACTCHECK_MAX_CLAIMS"), "FACTCHECK_MAX_CLAIMS", defaults.max_claims)?,
            },
        })
    }
}

fn parse_or<T: FromStr>(raw: Option<String>, key: &str, default: T) -> Result<T, FactCheckError> {
    match raw {
        None => Ok(default),
        Some(value) => value
            .parse()
            .map_err(|_| FactCheckError::Configuration(format!("{key} has an invalid value: {value:?}"))),
    }
}
