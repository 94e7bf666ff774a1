//! The session's accumulated evidence: deduplicated, ranked and capped.

use serde::{Deserialize, Serialize};

use super::source::{SourceCategory, SourceRecord};

/// Quality at or above which a source counts as high quality.
pub const HIGH_QUALITY_THRESHOLD: f32 = 7.0;

/// Deduplicated source set kept sorted by descending quality.
#[derive(Debug, Clone)]
pub struct EvidenceSet {
    sources: Vec<SourceRecord>,
    cap: usize,
}

impl EvidenceSet {
    pub fn new(cap: usize) -> Self {
        Self {
            sources: Vec::new(),
            cap,
        }
    }

    pub fn sources(&self) -> &[SourceRecord] {
        &self.sources
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn into_sources(self) -> Vec<SourceRecord> {
        self.sources
    }

    /// Merge new records by exact URL, keeping the higher-quality copy, then
    /// re-rank and truncate. Returns how many URLs were new to the set.
    pub fn merge(&mut self, incoming: Vec<SourceRecord>) -> usize {
        let mut added = 0;
        for record in incoming {
            match self.sources.iter_mut().find(|s| s.url == record.url) {
                Some(existing) => {
                    if record.quality > existing.quality {
                        *existing = record;
                    }
                }
                None => {
                    self.sources.push(record);
                    added += 1;
                }
            }
        }
        // sort_by is stable: equal quality keeps arrival order.
        self.sources.sort_by(|a, b| b.quality.total_cmp(&a.quality));
        self.sources.truncate(self.cap);
        added
    }

    pub fn summary(&self) -> EvidenceSummary {
        EvidenceSummary::of(&self.sources)
    }
}

/// Aggregate view of a source list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvidenceSummary {
    pub total: usize,
    pub official: usize,
    pub academic: usize,
    pub news: usize,
    pub general: usize,
    pub high_quality: usize,
    pub average_quality: f32,
}

impl EvidenceSummary {
    pub fn of(sources: &[SourceRecord]) -> Self {
        let count = |category: SourceCategory| sources.iter().filter(|s| s.category == category).count();
        let average_quality = if sources.is_empty() {
            0.0
        } else {
            sources.iter().map(|s| s.quality).sum::<f32>() / sources.len() as f32
        };
        Self {
            total: sources.len(),
            official: count(SourceCategory::Official),
            academic: count(SourceCategory::Academic),
            news: count(SourceCategory::News),
            general: count(SourceCategory::General),
            high_quality: sources
                .iter()
                .filter(|s| s.quality >= HIGH_QUALITY_THRESHOLD)
                .count(),
            average_quality,
        }
    }
}
