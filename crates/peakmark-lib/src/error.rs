use std::path::PathBuf;
use thiserror::Error;

/// Failures of the storage backend. These indicate a misconfigured dataset
/// rather than an idle UI state, so they always reach the caller.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("subject '{0}' not found")]
    SubjectNotFound(String),
    #[error("channel '{channel}' not found for subject '{subject}'")]
    ChannelNotFound { subject: String, channel: String },
    #[error("window {index} is out of range for subject '{subject}' ({available} samples available)")]
    WindowOutOfRange {
        subject: String,
        index: usize,
        available: usize,
    },
    #[error("failed to access {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {}: {reason}", path.display())]
    Parse { path: PathBuf, reason: String },
}

#[derive(Debug, Error)]
pub enum SerializeError {
    #[error("cannot serialize {what}")]
    Unsupported { what: String },
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config syntax")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("data unavailable")]
    DataUnavailable(#[from] DataError),
    #[error("serialization failed")]
    Serialization(#[from] SerializeError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("click at local index {local_index} lies outside a {window_samples}-sample window")]
    InvalidClick {
        local_index: usize,
        window_samples: usize,
    },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
