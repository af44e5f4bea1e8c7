//! Pulls the structured answer out of a free-text model response.
//!
//! Models are asked to reply with a fenced ```` ```json ```` block. Anything
//! else (no block, an unterminated block, invalid JSON, a non-object value)
//! yields an empty [`Record`], which stages treat as "no usable output".

use crate::models::{Citation, SearchResult};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::HashMap;

pub type Record = Map<String, Value>;

const FENCE: &str = "```";

/// Parses the first fenced block tagged `json`. Later blocks are ignored even
/// when the first one fails to parse.
pub fn extract_record(response: &str) -> Record {
    first_json_block(response)
        .and_then(|body| serde_json::from_str::<Value>(body).ok())
        .and_then(|value| match value {
            Value::Object(map) => Some(map),
            _ => None,
        })
        .unwrap_or_default()
}

/// Fences only count at the start of a line, and an opening fence carries at
/// most a one-word tag. Anything else starting with backticks is prose.
fn first_json_block(text: &str) -> Option<&str> {
    let mut offset = 0;
    let lines: Vec<(usize, &str)> = text
        .split_inclusive('\n')
        .map(|line| {
            let start = offset;
            offset += line.len();
            (start, line)
        })
        .collect();

    let mut i = 0;
    while i < lines.len() {
        let Some(tag) = lines[i].1.trim_start().strip_prefix(FENCE) else {
            i += 1;
            continue;
        };
        let tag = tag.trim();
        if tag.contains(FENCE) || tag.contains(char::is_whitespace) {
            i += 1;
            continue;
        }
        let close = i + 1 + lines[i + 1..].iter().position(|(_, line)| line.trim() == FENCE)?;
        if tag.eq_ignore_ascii_case("json") {
            return Some(&text[lines[i + 1].0..lines[close].0]);
        }
        i = close + 1;
    }
    None
}

/// Reads a lowercase enum label, case-insensitively. Unknown or missing
/// labels come back as `None` so callers can substitute their fallback.
pub fn read_label<T: DeserializeOwned>(record: &Record, key: &str) -> Option<T> {
    let raw = record.get(key)?.as_str()?;
    serde_json::from_value(Value::String(raw.trim().to_ascii_lowercase())).ok()
}

pub fn read_bool(record: &Record, key: &str) -> Option<bool> {
    match record.get(key)? {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" => Some(true),
            "false" | "no" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

pub fn read_string(record: &Record, key: &str) -> Option<String> {
    record
        .get(key)?
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Non-empty trimmed strings from an array field, duplicates dropped.
pub fn read_strings(record: &Record, key: &str) -> Vec<String> {
    let Some(items) = record.get(key).and_then(Value::as_array) else {
        return Vec::new();
    };
    let mut out: Vec<String> = Vec::new();
    for item in items.iter().filter_map(Value::as_str).map(str::trim) {
        if !item.is_empty() && !out.iter().any(|seen| seen == item) {
            out.push(item.to_string());
        }
    }
    out
}

/// Cited sources, kept only when the url was actually returned by a search.
/// A blank cited title falls back to the search result title.
pub fn read_sources(record: &Record, key: &str, evidence: &[SearchResult]) -> Vec<Citation> {
    let known: HashMap<&str, &SearchResult> = evidence.iter().map(|r| (r.url.as_str(), r)).collect();
    let Some(items) = record.get(key).and_then(Value::as_array) else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| {
            let url = item.get("url")?.as_str()?.trim();
            let hit = known.get(url)?;
            let title = item
                .get("title")
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .unwrap_or(&hit.title);
            Some(Citation {
                title: title.to_string(),
                url: hit.url.clone(),
            })
        })
        .collect()
}
