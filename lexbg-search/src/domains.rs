//! Static registry of Bulgarian legal domains.
//!
//! Each [`DomainConfig`] carries an authority weight (how much the source
//! is trusted), ordered search patterns and the legal areas it covers.
//! The registry is built once at start-up and never mutated.

use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::SearchError;
use crate::legal::LegalArea;

/// Placeholder substituted with the user query in search patterns.
pub const QUERY_PLACEHOLDER: &str = "{query}";

/// Source category. Determines default search priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DomainTier {
    /// Commercial/primary legal databases (lex.bg, ciela.net, apis.bg).
    PrimaryDatabase,
    /// Court practice (ВКС, ВАС).
    Court,
    /// Official government and parliamentary sources.
    Government,
    /// Legal news portals.
    News,
}

/// Static metadata for one searchable legal domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainConfig {
    /// Registry key, e.g. `lex_bg`.
    pub key: String,
    /// Host used for site restriction, e.g. `lex.bg`.
    pub domain: String,
    /// Short human-readable description.
    #[serde(default)]
    pub description: String,
    /// Source category.
    pub tier: DomainTier,
    /// Trust multiplier in `[0, 1]`.
    pub authority_weight: f64,
    /// Query templates in preference order; `{query}` is substituted.
    #[serde(default)]
    pub search_patterns: Vec<String>,
    /// Legal areas this source is strong in.
    #[serde(default)]
    pub focus_areas: BTreeSet<LegalArea>,
}

impl DomainConfig {
    /// Create a domain with a single `{query}` pattern and no focus areas.
    pub fn new(
        key: impl Into<String>,
        domain: impl Into<String>,
        tier: DomainTier,
        authority_weight: f64,
    ) -> Self {
        Self {
            key: key.into(),
            domain: domain.into(),
            description: String::new(),
            tier,
            authority_weight,
            search_patterns: vec![QUERY_PLACEHOLDER.to_owned()],
            focus_areas: BTreeSet::new(),
        }
    }

    fn described(mut self, description: &str) -> Self {
        self.description = description.to_owned();
        self
    }

    fn patterns(mut self, patterns: &[&str]) -> Self {
        self.search_patterns = patterns.iter().map(|p| (*p).to_owned()).collect();
        self
    }

    fn areas(mut self, areas: &[LegalArea]) -> Self {
        self.focus_areas = areas.iter().copied().collect();
        self
    }

    /// Render the provider query from the first search pattern.
    ///
    /// Patterns without a placeholder get the query prepended; a domain
    /// without patterns searches the bare query.
    pub fn render_query(&self, query: &str) -> String {
        let query = query.trim();
        match self.search_patterns.first() {
            Some(pattern) if pattern.contains(QUERY_PLACEHOLDER) => {
                pattern.replace(QUERY_PLACEHOLDER, query).trim().to_owned()
            }
            Some(pattern) if !pattern.trim().is_empty() => format!("{query} {}", pattern.trim()),
            _ => query.to_owned(),
        }
    }

    /// Check the static invariants of a domain entry.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] for an empty key or host, or an
    /// authority weight outside `[0, 1]`.
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.key.trim().is_empty() {
            return Err(SearchError::Config("domain key must not be empty".into()));
        }
        if self.domain.trim().is_empty() {
            return Err(SearchError::Config(format!(
                "domain '{}' has an empty host",
                self.key
            )));
        }
        if !(0.0..=1.0).contains(&self.authority_weight) {
            return Err(SearchError::Config(format!(
                "domain '{}' authority_weight must lie in [0, 1], got {}",
                self.key, self.authority_weight
            )));
        }
        Ok(())
    }
}

/// Immutable registry of legal domains, in registration order.
#[derive(Debug, Clone)]
pub struct DomainRegistry {
    domains: Vec<DomainConfig>,
}

impl DomainRegistry {
    /// The built-in Bulgarian legal domains.
    pub fn builtin() -> Self {
        use DomainTier::{Court, Government, News, PrimaryDatabase};
        use LegalArea::{
            Administrative, Civil, Commercial, Constitutional, Criminal, DataProtection, Labour,
            Tax,
        };

        let domains = vec![
            DomainConfig::new("lex_bg", "lex.bg", PrimaryDatabase, 0.95)
                .described("LexBG - Bulgarian legal database")
                .patterns(&["{query}", "{query} закон"])
                .areas(&[Civil, Criminal, Commercial, Labour, Tax, DataProtection]),
            DomainConfig::new("ciela_net", "ciela.net", PrimaryDatabase, 0.95)
                .described("Ciela - legal information and publishing")
                .patterns(&["{query}", "{query} закон право"])
                .areas(&[Civil, Commercial, Labour, Tax]),
            DomainConfig::new("apis_bg", "apis.bg", PrimaryDatabase, 0.90)
                .described("Апис - legal information and publishing")
                .patterns(&["{query}", "{query} право"])
                .areas(&[Civil, Commercial, Labour, Tax]),
            DomainConfig::new("vks_bg", "vks.bg", Court, 0.85)
                .described("Supreme Court of Cassation (ВКС)")
                .patterns(&["{query} решение", "{query} съдебна практика"])
                .areas(&[Civil, Criminal, Commercial, Labour]),
            DomainConfig::new("vss_bg", "vss.bg", Court, 0.80)
                .described("Supreme Judicial Council / administrative practice")
                .patterns(&["{query} решение"])
                .areas(&[Administrative, Tax]),
            DomainConfig::new("justice_bg", "justice.government.bg", Government, 0.85)
                .described("Ministry of Justice")
                .areas(&[
                    Civil,
                    Criminal,
                    Administrative,
                    Constitutional,
                    Commercial,
                    Labour,
                    DataProtection,
                ]),
            DomainConfig::new("parliament_bg", "parliament.bg", Government, 0.80)
                .described("National Assembly")
                .patterns(&["{query} закон"])
                .areas(&[Administrative, Constitutional]),
            DomainConfig::new("dv_bg", "dv.parliament.bg", Government, 0.80)
                .described("State Gazette (Държавен вестник)")
                .areas(&[Tax]),
            DomainConfig::new("cpdp_bg", "cpdp.bg", Government, 0.75)
                .described("Commission for Personal Data Protection (КЗЛД)")
                .areas(&[DataProtection]),
            DomainConfig::new("lakorda_com", "lakorda.com", News, 0.75)
                .described("Лакорда - legal news portal")
                .areas(&[Civil, Criminal]),
        ];
        Self { domains }
    }

    /// Build a registry from explicit entries, validating each one.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] for an invalid entry, a duplicate
    /// key, or an empty list.
    pub fn from_configs(domains: Vec<DomainConfig>) -> Result<Self, SearchError> {
        if domains.is_empty() {
            return Err(SearchError::Config(
                "domain registry must not be empty".into(),
            ));
        }
        let mut seen = HashSet::new();
        for domain in &domains {
            domain.validate()?;
            if !seen.insert(domain.key.as_str()) {
                return Err(SearchError::Config(format!(
                    "duplicate domain key '{}'",
                    domain.key
                )));
            }
        }
        Ok(Self { domains })
    }

    /// Look up a domain by key.
    pub fn get(&self, key: &str) -> Option<&DomainConfig> {
        self.domains.iter().find(|d| d.key == key)
    }

    /// All domains in registration order.
    pub fn all(&self) -> &[DomainConfig] {
        &self.domains
    }

    /// Number of registered domains.
    pub fn len(&self) -> usize {
        self.domains.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }

    /// Resolve keys to domains, preserving the caller's order.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::InvalidRequest`] for an unknown key.
    pub fn resolve<S: AsRef<str>>(&self, keys: &[S]) -> Result<Vec<DomainConfig>, SearchError> {
        keys.iter()
            .map(|key| {
                let key = key.as_ref();
                self.get(key).cloned().ok_or_else(|| {
                    SearchError::InvalidRequest(format!("unknown domain '{key}'"))
                })
            })
            .collect()
    }

    /// All domains in search priority order: primary databases, then
    /// courts, then government sources, then news. Registration order
    /// breaks ties.
    pub fn prioritized(&self) -> Vec<DomainConfig> {
        let mut domains = self.domains.clone();
        domains.sort_by_key(|d| d.tier);
        domains
    }

    /// Domains covering `area`, in priority order.
    pub fn for_area(&self, area: LegalArea) -> Vec<DomainConfig> {
        self.prioritized()
            .into_iter()
            .filter(|d| d.focus_areas.contains(&area))
            .collect()
    }
}

impl Default for DomainRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_entries_are_valid() {
        let registry = DomainRegistry::builtin();
        assert_eq!(registry.len(), 10);
        for domain in registry.all() {
            assert!(domain.validate().is_ok(), "{} invalid", domain.key);
        }
    }

    #[test]
    fn builtin_weights() {
        let registry = DomainRegistry::builtin();
        let lex = registry.get("lex_bg").expect("lex_bg");
        let vks = registry.get("vks_bg").expect("vks_bg");
        assert!((lex.authority_weight - 0.95).abs() < f64::EPSILON);
        assert!((vks.authority_weight - 0.85).abs() < f64::EPSILON);
        assert_eq!(lex.domain, "lex.bg");
    }

    #[test]
    fn prioritized_puts_databases_first_and_news_last() {
        let ordered = DomainRegistry::builtin().prioritized();
        assert_eq!(ordered[0].key, "lex_bg");
        assert_eq!(ordered[1].key, "ciela_net");
        assert_eq!(ordered[2].key, "apis_bg");
        assert_eq!(ordered[3].tier, DomainTier::Court);
        assert_eq!(ordered.last().map(|d| d.key.as_str()), Some("lakorda_com"));
        for pair in ordered.windows(2) {
            assert!(pair[0].tier <= pair[1].tier);
        }
    }

    #[test]
    fn resolve_preserves_caller_order() {
        let registry = DomainRegistry::builtin();
        let resolved = registry.resolve(&["vks_bg", "lex_bg"]).expect("known keys");
        assert_eq!(resolved[0].key, "vks_bg");
        assert_eq!(resolved[1].key, "lex_bg");
    }

    #[test]
    fn resolve_unknown_key_is_invalid_request() {
        let err = DomainRegistry::builtin()
            .resolve(&["lex_bg", "nope_bg"])
            .unwrap_err();
        assert_eq!(err.code(), "INVALID_REQUEST");
        assert!(err.to_string().contains("nope_bg"));
    }

    #[test]
    fn for_area_filters_by_focus() {
        let registry = DomainRegistry::builtin();
        let keys: Vec<String> = registry
            .for_area(LegalArea::DataProtection)
            .into_iter()
            .map(|d| d.key)
            .collect();
        assert_eq!(keys, vec!["lex_bg", "justice_bg", "cpdp_bg"]);
    }

    #[test]
    fn render_query_uses_first_pattern() {
        let registry = DomainRegistry::builtin();
        let vks = registry.get("vks_bg").expect("vks_bg");
        assert_eq!(vks.render_query(" обезщетение "), "обезщетение решение");
        let justice = registry.get("justice_bg").expect("justice_bg");
        assert_eq!(justice.render_query("развод"), "развод");
    }

    #[test]
    fn render_query_without_placeholder_appends_pattern() {
        let mut domain = DomainConfig::new("x", "x.bg", DomainTier::News, 0.5);
        domain.search_patterns = vec!["съдебна практика".into()];
        assert_eq!(domain.render_query("наем"), "наем съдебна практика");
        domain.search_patterns.clear();
        assert_eq!(domain.render_query("наем"), "наем");
    }

    #[test]
    fn weight_outside_unit_interval_rejected() {
        let domain = DomainConfig::new("bad", "bad.bg", DomainTier::News, 1.2);
        assert!(domain.validate().unwrap_err().to_string().contains("authority_weight"));
        let domain = DomainConfig::new("bad", "bad.bg", DomainTier::News, -0.1);
        assert!(domain.validate().is_err());
    }

    #[test]
    fn from_configs_rejects_duplicates_and_empty() {
        let a = DomainConfig::new("a", "a.bg", DomainTier::News, 0.5);
        let err = DomainRegistry::from_configs(vec![a.clone(), a]).unwrap_err();
        assert!(err.to_string().contains("duplicate"));
        assert!(DomainRegistry::from_configs(vec![]).is_err());
    }

    #[test]
    fn domain_config_deserialises_with_defaults() {
        let json = r#"{"key":"sac_bg","domain":"sac.government.bg","tier":"court","authority_weight":0.8}"#;
        let domain: DomainConfig = serde_json::from_str(json).expect("deserialize");
        assert_eq!(domain.key, "sac_bg");
        assert!(domain.search_patterns.is_empty());
        assert!(domain.focus_areas.is_empty());
        assert_eq!(domain.render_query("такса"), "такса");
    }
}
