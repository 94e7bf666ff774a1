//! Jurisdiction policy: domain allow-lists, mandatory authoritative queries
//! and follow-up templates.
//!
//! Everything here is configuration. The defaults target Colombian law; a
//! different jurisdiction supplies its own `[domains]` table.

use serde::{Deserialize, Serialize};

use super::query::{Query, QueryPriority, render_template};
use super::source::SourceCategory;

/// Extra authoritative domain queried when the question mentions a subject area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectRule {
    /// Any of these (lower-case) substrings in the question triggers the rule.
    pub keywords: Vec<String>,
    pub domain: String,
    /// Appended after the site filter, e.g. "derecho penal".
    #[serde(default)]
    pub suffix: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainPolicy {
    #[serde(default = "default_official_domains")]
    pub official: Vec<String>,

    #[serde(default = "default_academic_domains")]
    pub academic: Vec<String>,

    #[serde(default = "default_news_domains")]
    pub news: Vec<String>,

    /// Domains every session tries to cover.
    #[serde(default = "default_mandatory_domains")]
    pub mandatory: Vec<String>,

    #[serde(default = "default_subject_rules")]
    pub subject_rules: Vec<SubjectRule>,

    /// Site-filter syntax understood by the search backend.
    #[serde(default = "default_site_operator")]
    pub site_operator: String,

    /// Below this many official sources every pending mandatory query is forced.
    #[serde(default = "default_official_floor")]
    pub official_floor: usize,

    /// Mandatory queries forced per round once the official floor is met.
    #[serde(default = "default_forced_per_round")]
    pub forced_per_round: usize,

    /// Generic follow-ups used when the decision policy has nothing to offer.
    #[serde(default = "default_follow_up_templates")]
    pub follow_up_templates: Vec<String>,

    /// Terms that raise the keyword relevance estimate.
    #[serde(default = "default_relevance_terms")]
    pub relevance_terms: Vec<String>,
}

fn default_official_domains() -> Vec<String> {
    [
        "corteconstitucional.gov.co",
        "consejodeestado.gov.co",
        "cortesuprema.gov.co",
        "secretariasenado.gov.co",
        "suin-juriscol.gov.co",
        "imprenta.gov.co",
        "funcionpublica.gov.co",
        "ramajudicial.gov.co",
        "procuraduria.gov.co",
        "contraloria.gov.co",
        "fiscalia.gov.co",
        "defensoria.gov.co",
        "minjusticia.gov.co",
        "minhacienda.gov.co",
        "supersociedades.gov.co",
        "superfinanciera.gov.co",
        "dian.gov.co",
        "mincomercio.gov.co",
        "sic.gov.co",
        "gov.co",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_academic_domains() -> Vec<String> {
    [
        "uexternado.edu.co",
        "unal.edu.co",
        "javeriana.edu.co",
        "uniandes.edu.co",
        "icesi.edu.co",
        "edu.co",
        "scholar.google.com",
        "scielo.org",
        "scielo.org.co",
        "researchgate.net",
        "academia.edu",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_news_domains() -> Vec<String> {
    [
        "eltiempo.com",
        "elespectador.com",
        "semana.com",
        "portafolio.co",
        "larepublica.co",
        "ambitojuridico.com",
        "legis.com.co",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_mandatory_domains() -> Vec<String> {
    [
        "corteconstitucional.gov.co",
        "consejodeestado.gov.co",
        "suin-juriscol.gov.co",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn rule(keywords: &[&str], domain: &str, suffix: &str) -> SubjectRule {
    SubjectRule {
        keywords: keywords.iter().map(|s| s.to_string()).collect(),
        domain: domain.to_string(),
        suffix: suffix.to_string(),
    }
}

fn default_subject_rules() -> Vec<SubjectRule> {
    vec![
        rule(&["constitucional", "derechos", "tutela"], "corteconstitucional.gov.co", "derechos fundamentales"),
        rule(&["administrativo", "estado", "contratación"], "consejodeestado.gov.co", "derecho administrativo"),
        rule(&["civil", "comercial", "usucapion", "usucapión", "contrato"], "ramajudicial.gov.co", "derecho civil"),
        rule(&["penal", "criminal", "delito"], "fiscalia.gov.co", "derecho penal"),
        rule(&["laboral", "trabajo", "despido"], "cortesuprema.gov.co", "sala laboral"),
    ]
}

fn default_site_operator() -> String {
    "site:".to_string()
}

fn default_official_floor() -> usize {
    3
}

fn default_forced_per_round() -> usize {
    2
}

fn default_follow_up_templates() -> Vec<String> {
    [
        "{question} ley decreto artículo",
        "{question} jurisprudencia sentencia",
        "{question} doctrina análisis",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_relevance_terms() -> Vec<String> {
    [
        "artículo", "ley", "decreto", "sentencia", "jurisprudencia", "código", "norma",
        "reglamento", "resolución", "fallo", "tutela", "acción",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl Default for DomainPolicy {
    fn default() -> Self {
        Self {
            official: default_official_domains(),
            academic: default_academic_domains(),
            news: default_news_domains(),
            mandatory: default_mandatory_domains(),
            subject_rules: default_subject_rules(),
            site_operator: default_site_operator(),
            official_floor: default_official_floor(),
            forced_per_round: default_forced_per_round(),
            follow_up_templates: default_follow_up_templates(),
            relevance_terms: default_relevance_terms(),
        }
    }
}

/// Host part of a URL, lower-cased and without a leading `www.`.
pub fn url_host(url: &str) -> String {
    let without_scheme = url.split_once("://").map(|(_, rest)| rest).unwrap_or(url);
    let host = without_scheme
        .split(['/', '?', '#'])
        .next()
        .unwrap_or_default();
    let host = host.rsplit_once('@').map(|(_, h)| h).unwrap_or(host);
    let host = host.split(':').next().unwrap_or_default().to_lowercase();
    host.strip_prefix("www.").map(str::to_string).unwrap_or(host)
}

fn host_matches(host: &str, domain: &str) -> bool {
    let domain = domain.trim().trim_start_matches('.').to_lowercase();
    !domain.is_empty() && (host == domain || host.ends_with(&format!(".{}", domain)))
}

impl DomainPolicy {
    /// Classify a URL by its host. Official beats academic beats news.
    pub fn classify(&self, url: &str) -> SourceCategory {
        let host = url_host(url);
        if self.official.iter().any(|d| host_matches(&host, d)) {
            SourceCategory::Official
        } else if self.academic.iter().any(|d| host_matches(&host, d)) {
            SourceCategory::Academic
        } else if self.news.iter().any(|d| host_matches(&host, d)) {
            SourceCategory::News
        } else {
            SourceCategory::General
        }
    }

    /// Keyword relevance estimate in 0-1 for providers that report none.
    pub fn keyword_relevance(&self, category: SourceCategory, title: &str, snippet: &str) -> f32 {
        let mut score: u32 = match category {
            SourceCategory::Official => 10,
            SourceCategory::Academic => 8,
            SourceCategory::News => 6,
            SourceCategory::General => 4,
        };
        let text = format!("{} {}", title, snippet).to_lowercase();
        score += 2 * self
            .relevance_terms
            .iter()
            .filter(|term| text.contains(term.as_str()))
            .count() as u32;
        if text.chars().any(|c| c.is_ascii_digit()) {
            score += 1;
        }
        score.min(20) as f32 / 20.0
    }

    /// Query restricted to one domain.
    pub fn site_query(&self, question: &str, domain: &str, suffix: &str) -> String {
        let mut query = format!("{} {}{}", question.trim(), self.site_operator, domain);
        if !suffix.trim().is_empty() {
            query.push(' ');
            query.push_str(suffix.trim());
        }
        query
    }

    /// Authoritative-domain queries for this question, base domains first.
    pub fn mandatory_queries(&self, question: &str) -> Vec<Query> {
        let lowered = question.to_lowercase();
        let base = self.mandatory.iter().map(|domain| {
            Query::new(
                self.site_query(question, domain, ""),
                QueryPriority::High,
                format!("authoritative coverage: {}", domain),
            )
        });
        let subject = self
            .subject_rules
            .iter()
            .filter(|rule| rule.keywords.iter().any(|k| lowered.contains(&k.to_lowercase())))
            .map(|rule| {
                Query::new(
                    self.site_query(question, &rule.domain, &rule.suffix),
                    QueryPriority::High,
                    format!("subject-area coverage: {}", rule.domain),
                )
            });
        base.chain(subject).collect()
    }

    /// Generic follow-up queries derived from the question.
    pub fn follow_up_queries(&self, question: &str) -> Vec<Query> {
        self.follow_up_templates
            .iter()
            .map(|template| {
                Query::new(
                    render_template(template, question),
                    QueryPriority::Medium,
                    "generic follow-up",
                )
            })
            .collect()
    }
}
