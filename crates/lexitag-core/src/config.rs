//! lexitag Configuration Management
//!
//! Handles configuration from environment variables and TOML files
//! with defaults matching the dataset layout the tools were built for.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Target language
    pub language: LanguageConfig,

    /// Regex-only pipeline
    pub local: LocalConfig,

    /// Remote-assisted pipeline
    pub remote: RemoteConfig,

    /// Completion service configuration
    pub llm: LlmConfig,

    /// Batch driver behaviour
    pub batch: BatchConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }

    /// Load from a TOML file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::FileReadError {
            path: path.clone(),
            source: e,
        })?;

        Self::from_toml_str(&content).map_err(|e| match e {
            ConfigError::ParseError { message, .. } => ConfigError::ParseError { path, message },
            other => other,
        })
    }

    /// Parse TOML text; missing sections fall back to defaults
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError {
            path: PathBuf::from("<inline>"),
            message: e.to_string(),
        })
    }

    /// Merge with environment variables (env takes precedence)
    pub fn with_env_override(mut self) -> Result<Self, ConfigError> {
        self.apply_env()?;
        Ok(self)
    }

    fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_vars(|name| std::env::var(name).ok())
    }

    /// Apply overrides from a variable lookup. Blank values are ignored;
    /// the first name of each list that is set wins.
    fn apply_vars(&mut self, var: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        let first_set = |names: &[&str]| {
            names
                .iter()
                .filter_map(|name| var(*name))
                .find(|value| !value.trim().is_empty())
        };

        // Completion service
        if let Some(provider) = first_set(&["DATASET_GEN_PROVIDER"]) {
            self.llm.provider = provider.parse()?;
        }
        if let Some(key) = first_set(&["DATASET_GEN_API_KEY", "DATASET_GEN_ANTHROPIC_KEY"]) {
            self.llm.api_key = Some(key);
        }
        if let Some(model) = first_set(&["DATASET_GEN_MODEL", "DATASET_GEN_CLAUDE_MODEL"]) {
            self.llm.model = model;
        }
        if let Some(url) = first_set(&["DATASET_GEN_BASE_URL"]) {
            self.llm.base_url = Some(url);
        }

        // Logging
        if let Some(level) = first_set(&["LOG_LEVEL"]) {
            self.logging.level = level;
        }

        Ok(())
    }
}

/// Target language settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LanguageConfig {
    /// Language name as it appears in questions (matched case-insensitively)
    pub name: String,
}

impl Default for LanguageConfig {
    fn default() -> Self {
        Self {
            name: "Yanomami".to_string(),
        }
    }
}

/// Regex-only pipeline settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalConfig {
    /// Directory holding the original dataset files
    pub input_dir: PathBuf,

    /// Directory receiving the tagged files
    pub output_dir: PathBuf,

    /// File names processed, in order; missing ones are skipped
    pub files: Vec<String>,
}

impl Default for LocalConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("yanomami_dataset"),
            output_dir: PathBuf::from("yanomami_dataset_with_tokens"),
            files: [
                "translations.jsonl",
                "phrases-yanomami-to-english.jsonl",
                "phrases-english-to-yanomami.jsonl",
                "comparison.jsonl",
                "how-to.jsonl",
                "how-to-p2.jsonl",
                "grammar.jsonl",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

/// Remote-assisted pipeline settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Directory scanned for `.jsonl` files
    pub input_dir: PathBuf,

    /// Directory receiving the tagged files
    pub output_dir: PathBuf,

    /// What to do with remote output whose spans are not well-formed
    pub span_policy: SpanPolicy,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("input/add_special_token"),
            output_dir: PathBuf::from("output/with_special_tokens"),
            span_policy: SpanPolicy::Trust,
        }
    }
}

/// Handling of malformed spans in remote completions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpanPolicy {
    /// Use the completion verbatim
    #[default]
    Trust,
    /// Treat malformed spans as a failed attempt
    Reject,
}

impl std::str::FromStr for SpanPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trust" => Ok(Self::Trust),
            "reject" => Ok(Self::Reject),
            _ => Err(ConfigError::InvalidValue {
                key: "remote.span_policy".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// Completion service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Provider to use
    pub provider: LlmProvider,

    /// API credential
    pub api_key: Option<String>,

    /// API base URL (for proxies or compatible APIs)
    pub base_url: Option<String>,

    /// Model name to use
    pub model: String,

    /// Maximum tokens for completion
    pub max_tokens: u32,

    /// Temperature for generation
    pub temperature: f32,
}

impl LlmConfig {
    /// The credential, or an error naming the variable to set
    pub fn require_api_key(&self) -> Result<&str, ConfigError> {
        self.api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingRequired("DATASET_GEN_API_KEY".to_string()))
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::Anthropic,
            api_key: None,
            base_url: None,
            model: "claude-3-sonnet-20240229".to_string(),
            max_tokens: 4096,
            temperature: 0.1,
        }
    }
}

/// Supported completion providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    Anthropic,
    OpenAI,
}

impl std::str::FromStr for LlmProvider {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "anthropic" => Ok(Self::Anthropic),
            "openai" => Ok(Self::OpenAI),
            _ => Err(ConfigError::InvalidValue {
                key: "DATASET_GEN_PROVIDER".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// Batch driver configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Minimum seconds between progress log lines
    pub progress_interval_secs: u64,

    /// Call `sync_data` after every written line
    pub sync_each_line: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            progress_interval_secs: 5,
            sync_each_line: false,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// JSON format for logs
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.language.name, "Yanomami");
        assert_eq!(config.local.files.len(), 7);
        assert_eq!(config.llm.max_tokens, 4096);
        assert_eq!(config.remote.span_policy, SpanPolicy::Trust);
        assert_eq!(config.batch.progress_interval_secs, 5);
    }

    #[test]
    fn test_llm_provider_parse() {
        assert_eq!(
            "anthropic".parse::<LlmProvider>().unwrap(),
            LlmProvider::Anthropic
        );
        assert_eq!("OpenAI".parse::<LlmProvider>().unwrap(), LlmProvider::OpenAI);
        assert!("invalid".parse::<LlmProvider>().is_err());
    }

    #[test]
    fn test_span_policy_parse() {
        assert_eq!("reject".parse::<SpanPolicy>().unwrap(), SpanPolicy::Reject);
        assert!("sometimes".parse::<SpanPolicy>().is_err());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = AppConfig::from_toml_str(
            r#"
            [language]
            name = "Sanumá"

            [remote]
            span_policy = "reject"
            "#,
        )
        .unwrap();

        assert_eq!(config.language.name, "Sanumá");
        assert_eq!(config.remote.span_policy, SpanPolicy::Reject);
        assert_eq!(config.remote.input_dir, PathBuf::from("input/add_special_token"));
        assert_eq!(config.llm.model, "claude-3-sonnet-20240229");
    }

    #[test]
    fn test_invalid_toml() {
        assert!(matches!(
            AppConfig::from_toml_str("[language\nname="),
            Err(ConfigError::ParseError { .. })
        ));
    }

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: std::collections::HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_env_fallback_names() {
        let mut config = AppConfig::default();
        config
            .apply_vars(vars(&[
                ("DATASET_GEN_ANTHROPIC_KEY", "sk-old"),
                ("DATASET_GEN_CLAUDE_MODEL", "claude-old"),
            ]))
            .unwrap();
        assert_eq!(config.llm.api_key.as_deref(), Some("sk-old"));
        assert_eq!(config.llm.model, "claude-old");

        let mut config = AppConfig::default();
        config
            .apply_vars(vars(&[
                ("DATASET_GEN_API_KEY", "sk-new"),
                ("DATASET_GEN_ANTHROPIC_KEY", "sk-old"),
                ("DATASET_GEN_MODEL", " "),
                ("DATASET_GEN_CLAUDE_MODEL", "claude-old"),
            ]))
            .unwrap();
        assert_eq!(config.llm.api_key.as_deref(), Some("sk-new"));
        assert_eq!(config.llm.model, "claude-old");
    }

    #[test]
    fn test_blank_env_values_ignored() {
        let mut config = AppConfig::default();
        config.llm.base_url = Some("http://proxy".to_string());
        config
            .apply_vars(vars(&[
                ("DATASET_GEN_BASE_URL", ""),
                ("DATASET_GEN_API_KEY", "  "),
                ("LOG_LEVEL", ""),
            ]))
            .unwrap();
        assert_eq!(config.llm.base_url.as_deref(), Some("http://proxy"));
        assert!(config.llm.api_key.is_none());
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_invalid_env_provider() {
        let mut config = AppConfig::default();
        let result = config.apply_vars(vars(&[("DATASET_GEN_PROVIDER", "gemini")]));
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_require_api_key() {
        let mut llm = LlmConfig::default();
        assert!(matches!(
            llm.require_api_key(),
            Err(ConfigError::MissingRequired(_))
        ));

        llm.api_key = Some("   ".to_string());
        assert!(llm.require_api_key().is_err());

        llm.api_key = Some("sk-test".to_string());
        assert_eq!(llm.require_api_key().unwrap(), "sk-test");
    }
}
