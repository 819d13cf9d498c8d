//! lexitag Core - Domain models, traits, and shared types
//!
//! This crate defines the core abstractions used throughout lexitag:
//! - Dataset records (user/assistant turn pairs)
//! - Tag kinds and tag spans of the canonical vocabulary
//! - Common error types
//! - The completion-client trait consumed by the remote tagger
//! - Configuration management

pub mod config;
pub mod record;
pub mod tags;

pub use config::{
    AppConfig, BatchConfig, ConfigError, LanguageConfig, LlmConfig, LlmProvider, LocalConfig,
    LoggingConfig, RemoteConfig, SpanPolicy,
};
pub use record::{Message, Record, Role};
pub use tags::{TagKind, TagSpan};

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Core error types for lexitag operations
#[derive(Error, Debug)]
pub enum LexitagError {
    #[error("Malformed record: {0}")]
    MalformedRecord(String),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Completion error: {0}")]
    Completion(String),

    #[error("Completion timed out after {0:?}")]
    Timeout(Duration),

    #[error("Invalid spans: {0}")]
    InvalidSpans(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Missing prerequisite: {0}")]
    MissingPrerequisite(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl LexitagError {
    /// Wrap an I/O error with the path it happened on
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, LexitagError>;

// ============================================================================
// Traits
// ============================================================================

/// Trait for remote text-completion services
///
/// Implementations send one prompt and return the raw completion text.
/// A missing or malformed response body must surface as an error, never
/// as an empty string.
#[async_trait::async_trait]
pub trait CompletionClient: Send + Sync {
    /// Request a completion for the prompt
    async fn complete(&self, prompt: &str) -> Result<String>;

    /// Model name, for logging
    fn model(&self) -> &str;
}

// ============================================================================
// Tests
// ============================================================================
