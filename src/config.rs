//! Host configuration, loaded from TOML with environment overrides.
//!
//! ```toml
//! [search]
//! providers = ["google_cse", "tavily", "duckduckgo"]
//! request_timeout_ms = 30000
//!
//! [search.google]
//! engine_id = "0123456789abcdef"
//!
//! [request]
//! max_results = 15
//! min_relevancy = 0.3
//! methodology = "enhanced"
//!
//! [semantic]
//! mode = "chat"
//! model = "gpt-4o-mini"
//!
//! [[domains]]
//! key = "lex_bg"
//! domain = "lex.bg"
//! tier = "primary_database"
//! authority_weight = 0.95
//! ```
//!
//! Secrets are normally supplied through the environment rather than the
//! file: `GOOGLE_CSE_API_KEY`, `GOOGLE_CSE_ID`, `TAVILY_API_KEY` and
//! `OPENAI_API_KEY` override whatever the file says.

use std::fmt;
use std::path::{Path, PathBuf};

use lexbg_search::{DomainConfig, DomainRegistry, EngineConfig, Methodology};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Environment variable holding the Google CSE API key.
pub const ENV_GOOGLE_CSE_API_KEY: &str = "GOOGLE_CSE_API_KEY";
/// Environment variable holding the Google CSE engine id.
pub const ENV_GOOGLE_CSE_ID: &str = "GOOGLE_CSE_ID";
/// Environment variable holding the Tavily API key.
pub const ENV_TAVILY_API_KEY: &str = "TAVILY_API_KEY";
/// Environment variable holding the OpenAI-compatible API key.
pub const ENV_OPENAI_API_KEY: &str = "OPENAI_API_KEY";

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Search engine settings.
    pub search: EngineConfig,
    /// Defaults for a search request.
    pub request: RequestDefaults,
    /// Semantic scorer settings.
    pub semantic: SemanticConfig,
    /// Replacement domain registry. Empty means the built-in domains.
    pub domains: Vec<DomainConfig>,
}

/// Defaults applied to requests built by the CLI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestDefaults {
    /// Maximum results per search.
    pub max_results: usize,
    /// Minimum relevance in `[0, 1]`.
    pub min_relevancy: f64,
    /// Scoring methodology.
    pub methodology: Methodology,
    /// Domain keys searched when none are given. Empty means every
    /// registered domain in priority order.
    pub domains: Vec<String>,
}

impl Default for RequestDefaults {
    fn default() -> Self {
        Self {
            max_results: 15,
            min_relevancy: 0.3,
            methodology: Methodology::Enhanced,
            domains: Vec::new(),
        }
    }
}

/// How the semantic scorer judges relevance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SemanticMode {
    /// Ask a chat model for a 0–1 relevance rating.
    #[default]
    Chat,
    /// Cosine similarity of query and document embeddings.
    Embedding,
}

/// Settings for the OpenAI-compatible semantic scorer.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SemanticConfig {
    /// Whether to score semantically at all.
    pub enabled: bool,
    /// Chat rating or embedding similarity.
    pub mode: SemanticMode,
    /// API key. Without one the scorer is not built.
    pub api_key: Option<String>,
    /// API base URL, without the `/v1` suffix.
    pub base_url: String,
    /// Chat model used in [`SemanticMode::Chat`].
    pub model: String,
    /// Embedding model used in [`SemanticMode::Embedding`].
    pub embedding_model: String,
    /// Characters of title and snippet sent per candidate.
    pub max_document_chars: usize,
}

impl Default for SemanticConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            mode: SemanticMode::default(),
            api_key: None,
            base_url: "https://api.openai.com".into(),
            model: "gpt-4o-mini".into(),
            embedding_model: "text-embedding-3-small".into(),
            max_document_chars: 1500,
        }
    }
}

impl fmt::Debug for SemanticConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SemanticConfig")
            .field("enabled", &self.enabled)
            .field("mode", &self.mode)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("embedding_model", &self.embedding_model)
            .field("max_document_chars", &self.max_document_chars)
            .finish()
    }
}

impl SemanticConfig {
    /// Whether a scorer can be built from these settings.
    pub fn is_usable(&self) -> bool {
        self.enabled && self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| AppError::Config(format!("{}: {e}", path.display())))
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot be serialized.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self).map_err(|e| AppError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Returns the default config file path: `~/.config/lexbg/config.toml`.
    pub fn default_config_path() -> PathBuf {
        if let Some(config) = std::env::var_os("XDG_CONFIG_HOME") {
            PathBuf::from(config).join("lexbg").join("config.toml")
        } else if let Some(home) = std::env::var_os("HOME") {
            PathBuf::from(home)
                .join(".config")
                .join("lexbg")
                .join("config.toml")
        } else {
            PathBuf::from("/tmp/lexbg-config/config.toml")
        }
    }

    /// Load the effective configuration.
    ///
    /// An explicit path must exist. Without one, the default path is used
    /// when present and built-in defaults otherwise. Environment overrides
    /// are applied last, then the result is validated.
    ///
    /// # Errors
    ///
    /// Returns an error if a file cannot be read or parsed, or the merged
    /// configuration is invalid.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default = Self::default_config_path();
                if default.is_file() {
                    tracing::debug!(path = %default.display(), "loading default config");
                    Self::from_file(&default)?
                } else {
                    Self::default()
                }
            }
        };
        config.apply_env_overrides(|name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    /// Override secrets from an environment lookup. Empty values are ignored.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        if let Some(key) = get(ENV_GOOGLE_CSE_API_KEY) {
            self.search.google.api_key = Some(key);
        }
        if let Some(id) = get(ENV_GOOGLE_CSE_ID) {
            self.search.google.engine_id = Some(id);
        }
        if let Some(key) = get(ENV_TAVILY_API_KEY) {
            self.search.tavily.api_key = Some(key);
        }
        if let Some(key) = get(ENV_OPENAI_API_KEY) {
            self.semantic.api_key = Some(key);
        }
    }

    /// Check every section.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Config`] or the engine's own config error.
    pub fn validate(&self) -> Result<()> {
        self.search.validate()?;
        if self.request.max_results == 0 {
            return Err(AppError::Config(
                "request.max_results must be greater than 0".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.request.min_relevancy) {
            return Err(AppError::Config(format!(
                "request.min_relevancy must lie in [0, 1], got {}",
                self.request.min_relevancy
            )));
        }
        if self.semantic.max_document_chars == 0 {
            return Err(AppError::Config(
                "semantic.max_document_chars must be greater than 0".into(),
            ));
        }
        let registry = self.registry()?;
        registry.resolve(&self.request.domains).map_err(|e| {
            AppError::Config(format!("request.domains: {e}"))
        })?;
        Ok(())
    }

    /// The domain registry: the `[[domains]]` list when given, otherwise
    /// the built-in Bulgarian legal domains.
    ///
    /// # Errors
    ///
    /// Returns an error if a configured domain is invalid.
    pub fn registry(&self) -> Result<DomainRegistry> {
        if self.domains.is_empty() {
            Ok(DomainRegistry::builtin())
        } else {
            Ok(DomainRegistry::from_configs(self.domains.clone())?)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.request.max_results, 15);
        assert!(!config.semantic.is_usable());
    }

    #[test]
    fn env_overrides_secrets() {
        let env: HashMap<&str, &str> = HashMap::from([
            (ENV_GOOGLE_CSE_API_KEY, "g-key"),
            (ENV_GOOGLE_CSE_ID, "cx"),
            (ENV_TAVILY_API_KEY, ""),
            (ENV_OPENAI_API_KEY, "sk-test"),
        ]);
        let mut config = AppConfig::default();
        config.apply_env_overrides(|name| env.get(name).map(|v| (*v).to_owned()));
        assert_eq!(config.search.google.api_key.as_deref(), Some("g-key"));
        assert_eq!(config.search.google.engine_id.as_deref(), Some("cx"));
        assert!(config.search.tavily.api_key.is_none());
        assert!(config.semantic.is_usable());
    }

    #[test]
    fn semantic_debug_redacts_key() {
        let config = SemanticConfig {
            api_key: Some("sk-secret".into()),
            ..Default::default()
        };
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("sk-secret"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn unknown_default_domain_is_rejected() {
        let mut config = AppConfig::default();
        config.request.domains = vec!["nope_bg".into()];
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("nope_bg"));
    }

    #[test]
    fn bad_relevancy_is_rejected() {
        let mut config = AppConfig::default();
        config.request.min_relevancy = 1.2;
        assert!(config.validate().is_err());
    }

    #[test]
    fn custom_domains_replace_builtin() {
        let toml = r#"
            [[domains]]
            key = "lex_bg"
            domain = "lex.bg"
            tier = "primary_database"
            authority_weight = 0.95
            focus_areas = ["civil", "labour"]

            [[domains]]
            key = "vks_bg"
            domain = "vks.bg"
            tier = "court"
            authority_weight = 0.85
        "#;
        let config: AppConfig = toml::from_str(toml).expect("parse");
        let registry = config.registry().expect("registry");
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.for_area(lexbg_search::LegalArea::Labour).len(), 1);
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [search]
            rrf_k = 30.0

            [request]
            methodology = "standard"
        "#,
        )
        .expect("parse");
        assert!((config.search.rrf_k - 30.0).abs() < f64::EPSILON);
        assert_eq!(config.request.methodology, Methodology::Standard);
        assert_eq!(config.request.max_results, 15);
        assert_eq!(config.search.per_domain_results, 10);
    }
}
