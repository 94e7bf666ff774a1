//! Source records: the normalized unit of evidence.

use serde::{Deserialize, Serialize};

use super::provider::SearchHit;

/// Source class derived from the URL's domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SourceCategory {
    Official,
    Academic,
    News,
    #[default]
    General,
}

impl SourceCategory {
    /// Baseline quality on the 0-10 scale, assigned before any verification.
    pub fn baseline_quality(self) -> f32 {
        match self {
            Self::Official => 7.0,
            Self::Academic => 6.0,
            Self::News => 5.0,
            Self::General => 4.0,
        }
    }

    pub fn default_authority(self) -> Authority {
        match self {
            Self::Official => Authority::Maximal,
            Self::Academic => Authority::High,
            Self::News => Authority::Medium,
            Self::General => Authority::Low,
        }
    }

    pub fn default_use(self) -> RecommendedUse {
        match self {
            Self::Official => RecommendedUse::PrimaryCitation,
            Self::Academic => RecommendedUse::Secondary,
            Self::News | Self::General => RecommendedUse::Contextual,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Official => "official",
            Self::Academic => "academic",
            Self::News => "news",
            Self::General => "general",
        }
    }
}

impl std::fmt::Display for SourceCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Authority {
    #[serde(alias = "maxima")]
    Maximal,
    #[serde(alias = "alta")]
    High,
    #[serde(alias = "media")]
    Medium,
    #[serde(alias = "baja")]
    Low,
    #[serde(alias = "minima")]
    Minimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Currency {
    #[serde(alias = "actualizada")]
    Current,
    #[serde(alias = "desactualizada")]
    Outdated,
    #[default]
    #[serde(alias = "desconocida")]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecommendedUse {
    #[serde(alias = "cita_principal", alias = "primary_citation")]
    PrimaryCitation,
    #[serde(alias = "secundaria")]
    Secondary,
    Contextual,
    #[serde(alias = "no_usar", alias = "do_not_use")]
    DoNotUse,
}

/// One piece of retrieved evidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRecord {
    pub title: String,
    /// Unique key within a session. Compared exactly, case preserved.
    pub url: String,
    pub snippet: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_content: Option<String>,
    pub category: SourceCategory,
    /// Provider relevance, 0-1.
    pub relevance: f32,
    /// Orchestrator quality, 0-10.
    pub quality: f32,
    pub authority: Authority,
    pub currency: Currency,
    pub recommended_use: RecommendedUse,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification_notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin_query: Option<String>,
}

impl SourceRecord {
    /// Build a record from a raw hit with category-derived baseline scores.
    pub fn from_hit(hit: SearchHit, category: SourceCategory, relevance: f32, origin_query: &str) -> Self {
        Self {
            title: hit.title,
            url: hit.url,
            snippet: hit.snippet,
            full_content: None,
            category,
            relevance: relevance.clamp(0.0, 1.0),
            quality: category.baseline_quality(),
            authority: category.default_authority(),
            currency: Currency::Unknown,
            recommended_use: category.default_use(),
            verification_notes: None,
            origin_query: Some(origin_query.to_string()),
        }
    }

    /// Lower-cased title and snippet, used by keyword heuristics.
    pub fn searchable_text(&self) -> String {
        format!("{} {}", self.title, self.snippet).to_lowercase()
    }

    /// Full content when enrichment succeeded, otherwise the snippet.
    pub fn best_text(&self) -> &str {
        self.full_content
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .unwrap_or(&self.snippet)
    }
}
