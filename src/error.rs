//! Error types for the butler core.
//!
//! Only construction-time APIs (config loading, registry compilation, model
//! training) return these to callers. Everything raised while a command is
//! being dispatched is folded into a response string by the dispatcher.

use std::path::PathBuf;

/// A collaborator (process launcher, task store, file mover, ...) failed.
#[derive(Debug, thiserror::Error)]
pub enum CollabError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("{action} failed: {reason}")]
    Failed { action: String, reason: String },

    #[error("{0} is not supported on this system")]
    Unsupported(&'static str),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CollabError {
    pub fn failed(action: impl Into<String>, reason: impl ToString) -> Self {
        Self::Failed {
            action: action.into(),
            reason: reason.to_string(),
        }
    }
}

/// A handler could not complete its side effect.
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    #[error(transparent)]
    Collaborator(#[from] CollabError),

    #[error("missing {0}")]
    MissingParameter(&'static str),
}

/// Classifier loading, training, or inference failed.
#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
    #[error("model not found: {0}")]
    ModelNotFound(String),

    #[error("text has no known tokens")]
    Unvectorizable,

    #[error("model `{model}` is inconsistent: {reason}")]
    Corrupt { model: String, reason: String },

    #[error("model `{0}` panicked during prediction")]
    Panicked(String),

    #[error("dataset `{0}` has no samples")]
    EmptyDataset(String),

    #[error("dataset not found: {}", .0.display())]
    DatasetNotFound(PathBuf),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// The rule table could not be compiled.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("invalid pattern `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("unknown intent label `{0}`")]
    UnknownIntent(String),
}

/// Configuration could not be read, parsed, or written.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to write {}: {reason}", path.display())]
    Write { path: PathBuf, reason: String },

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// The command intake could not start or has been shut down.
#[derive(Debug, thiserror::Error)]
pub enum IntakeError {
    #[error("command intake is closed")]
    Closed,

    #[error("failed to start intake worker: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Top-level error for building a butler from configuration.
#[derive(Debug, thiserror::Error)]
pub enum ButlerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Classifier(#[from] ClassifierError),
}
