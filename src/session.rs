//! Tracks which claims are being checked right now, so the same claim is not
//! run twice in parallel. The pipeline itself stays re-entrant.

use dashmap::DashMap;
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct ActiveRuns {
    inner: Arc<DashMap<String, ()>>,
}

/// Marks a claim as running until dropped.
#[derive(Debug)]
pub struct RunGuard {
    key: String,
    runs: Arc<DashMap<String, ()>>,
}

impl ActiveRuns {
    pub fn new() -> Self {
        Self::default()
    }

    /// `None` when the same claim (ignoring case and spacing) is already running.
    pub fn try_begin(&self, claim: &str) -> Option<RunGuard> {
        let key = normalize(claim);
        match self.inner.entry(key.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => None,
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(());
                Some(RunGuard {
                    key,
                    runs: self.inner.clone(),
                })
            }
        }
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.runs.remove(&self.key);
    }
}

fn normalize(claim: &str) -> String {
    claim.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}
