use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading conversion configurations and dictionaries.
#[derive(Error, Debug)]
pub enum OpenccError {
    #[error("IO error: {path}: {source}")]
    Io {
        source: std::io::Error,
        path: PathBuf,
    },

    #[error("JSON error in {path}: {source}")]
    Json {
        source: serde_json::Error,
        path: PathBuf,
    },

    /// Binary dictionary formats are not supported
    #[error("Unsupported dictionary type: {0}")]
    UnsupportedDict(String),

    #[error("Unsupported segmentation type: {0}")]
    UnsupportedSegmentation(String),

    #[error("Malformed dictionary {path} at line {line}: {message}")]
    MalformedDict {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("FST error: {0}")]
    Fst(#[from] fst::Error),

    #[error("Conversion chain is empty")]
    EmptyChain,

    /// Pre-1.0 `.ini` configurations
    #[error("Legacy config {0} is not supported, use a JSON config")]
    LegacyConfig(String),
}

pub type Result<T> = std::result::Result<T, OpenccError>;
