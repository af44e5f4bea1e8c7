use serde::{Deserialize, Serialize, Serializer};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Placeholder written in place of a correction when the claim was not debunked.
pub const NO_CORRECTION: &str = "N/A";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FactCheckRequest {
    pub claim: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FactCheckResponse {
    pub session_id: String,
    pub claim: String,
    pub report: FinalReport,
    pub total_time_ms: u64,
    pub task_times: HashMap<String, u64>,
}

/// Shared graph-flow context for one fact-check session. Each task fills in
/// its own slot and never rewrites a slot left by an earlier task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FactCheckContext {
    pub claim: String,
    pub triage: Option<TriageReport>,
    pub verification: Option<VerificationReport>,
    pub report: Option<FinalReport>,
}

impl FactCheckContext {
    pub fn new(claim: impl Into<String>) -> Self {
        Self {
            claim: claim.into(),
            triage: None,
            verification: None,
            report: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub snippet: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    pub title: String,
    pub url: String,
}

impl From<&SearchResult> for Citation {
    fn from(result: &SearchResult) -> Self {
        Self {
            title: result.title.clone(),
            url: result.url.clone(),
        }
    }
}

/// Merges citation lists by url. The first title seen for a url wins and
/// first-seen order is kept.
pub fn dedup_by_url<'a, I>(lists: I) -> Vec<Citation>
where
    I: IntoIterator<Item = &'a [Citation]>,
{
    let mut seen = HashSet::new();
    let mut merged = Vec::new();
    for list in lists {
        for citation in list {
            if seen.insert(citation.url.clone()) {
                merged.push(citation.clone());
            }
        }
    }
    merged
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationStatus {
    Verified,
    Debunked,
    Unverifiable,
}

impl fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Verified => "verified",
            Self::Debunked => "debunked",
            Self::Unverifiable => "unverifiable",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Positive,
    Negative,
    Neutral,
    Mixed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Low,
    Medium,
    High,
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Positive => "positive",
            Self::Negative => "negative",
            Self::Neutral => "neutral",
            Self::Mixed => "mixed",
        };
        f.write_str(label)
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        };
        f.write_str(label)
    }
}

/// Stage 1 output.
///
/// `correction` is `Some` exactly when the status is `Debunked`; use
/// [`TriageReport::new`] or [`TriageReport::debunked`] to keep that pairing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriageReport {
    pub direct_verification_status: VerificationStatus,
    #[serde(serialize_with = "serialize_correction", deserialize_with = "deserialize_correction")]
    pub correction: Option<String>,
    pub direct_sources: Vec<Citation>,
    pub inferred_tone: Tone,
    pub inferred_intensity: Level,
    pub sensationalism_level: Level,
    pub bias_detected: bool,
    pub core_claims: Vec<String>,
}

impl TriageReport {
    /// Report for a non-debunked status. A `Debunked` status passed here has no
    /// correction to show and is recorded as `Unverifiable`.
    pub fn new(status: VerificationStatus, direct_sources: Vec<Citation>) -> Self {
        let status = match status {
            VerificationStatus::Debunked => VerificationStatus::Unverifiable,
            other => other,
        };
        Self {
            direct_verification_status: status,
            correction: None,
            direct_sources,
            inferred_tone: Tone::Neutral,
            inferred_intensity: Level::Medium,
            sensationalism_level: Level::Medium,
            bias_detected: false,
            core_claims: Vec::new(),
        }
    }

    pub fn debunked(correction: impl Into<String>, direct_sources: Vec<Citation>) -> Self {
        Self {
            direct_verification_status: VerificationStatus::Debunked,
            correction: Some(correction.into()),
            ..Self::new(VerificationStatus::Unverifiable, direct_sources)
        }
    }

    /// What Stage 1 reports when the search turned up nothing at all.
    pub fn inconclusive() -> Self {
        Self::new(VerificationStatus::Unverifiable, Vec::new())
    }

    pub fn correction_text(&self) -> &str {
        self.correction.as_deref().unwrap_or(NO_CORRECTION)
    }
}

fn serialize_correction<S: Serializer>(value: &Option<String>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(value.as_deref().unwrap_or(NO_CORRECTION))
}

fn deserialize_correction<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.filter(|c| !c.trim().is_empty() && c.trim() != NO_CORRECTION))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimVerdict {
    pub claim_text: String,
    pub status: VerificationStatus,
    pub reasoning: String,
    pub sources: Vec<Citation>,
}

/// Stage 2 output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VerificationReport {
    pub claims: Vec<ClaimVerdict>,
    pub all_sources: Vec<Citation>,
}

impl VerificationReport {
    pub fn from_verdicts(claims: Vec<ClaimVerdict>) -> Self {
        let all_sources = dedup_by_url(claims.iter().map(|c| c.sources.as_slice()));
        Self { claims, all_sources }
    }

    pub fn count(&self, status: VerificationStatus) -> usize {
        self.claims.iter().filter(|c| c.status == status).count()
    }
}

/// Final verdict levels. The table in Stage 3 has no row producing a
/// "Likely Fake" outcome, so that level is not represented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    #[serde(rename = "Verified")]
    Verified,
    #[serde(rename = "Likely Verified")]
    LikelyVerified,
    #[serde(rename = "Uncertain")]
    Uncertain,
    #[serde(rename = "Fake")]
    Fake,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Verified => "Verified",
            Self::LikelyVerified => "Likely Verified",
            Self::Uncertain => "Uncertain",
            Self::Fake => "Fake",
        };
        f.write_str(label)
    }
}

/// Stage 3 output and the only value handed back to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalReport {
    pub verdict: Verdict,
    pub reasoning: String,
    pub citations: Vec<Citation>,
    pub total_sources: usize,
    pub recommendation: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TavilySearchRequest {
    pub query: String,
    pub max_results: usize,
    pub search_depth: String,
    pub include_raw_content: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TavilySearchResponse {
    #[serde(default)]
    pub results: Vec<TavilyResult>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TavilyResult {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub score: f64,
}
