//! Queries, their normalized keys, and the session-wide execution ledger.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum QueryPriority {
    #[serde(alias = "alta")]
    High,
    #[default]
    #[serde(alias = "media")]
    Medium,
    #[serde(alias = "baja")]
    Low,
}

/// A search query with its priority and the reason it was proposed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    #[serde(alias = "query")]
    pub text: String,
    #[serde(default)]
    pub priority: QueryPriority,
    #[serde(default, alias = "reason")]
    pub rationale: String,
}

impl Query {
    pub fn new(text: impl Into<String>, priority: QueryPriority, rationale: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            priority,
            rationale: rationale.into(),
        }
    }

    pub fn high(text: impl Into<String>, rationale: impl Into<String>) -> Self {
        Self::new(text, QueryPriority::High, rationale)
    }

    /// Dedup key for this query.
    pub fn key(&self) -> String {
        normalize_query_key(&self.text)
    }
}

/// Lower-cased, trimmed, whitespace-collapsed form of a query.
pub fn normalize_query_key(query: &str) -> String {
    query
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Replace `{question}` in a query template.
pub fn render_template(template: &str, question: &str) -> String {
    template.replace("{question}", question.trim())
}

/// Normalized keys of every query executed in the session.
#[derive(Debug, Default, Clone)]
pub struct QueryLedger {
    executed: HashSet<String>,
}

impl QueryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, query: &str) -> bool {
        self.executed.contains(&normalize_query_key(query))
    }

    pub fn record(&mut self, queries: &[Query]) {
        for query in queries {
            self.executed.insert(query.key());
        }
    }

    pub fn len(&self) -> usize {
        self.executed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.executed.is_empty()
    }

    /// Drop blanks, already-executed queries and in-batch duplicates, keeping
    /// the first occurrence, then cut to `limit`. Does not record anything.
    pub fn select_fresh(&self, candidates: Vec<Query>, limit: usize) -> Vec<Query> {
        let mut seen = HashSet::new();
        candidates
            .into_iter()
            .map(|mut q| {
                q.text = q.text.trim().to_string();
                q
            })
            .filter(|q| !q.text.is_empty())
            .filter(|q| {
                let key = q.key();
                !self.executed.contains(&key) && seen.insert(key)
            })
            .take(limit)
            .collect()
    }
}
