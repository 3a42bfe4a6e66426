use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while reading schemas and building filter chains.
#[derive(Error, Debug)]
pub enum Error {
    /// Schema file could not be read
    #[error("IO error: {path}: {source}")]
    Io {
        source: std::io::Error,
        path: PathBuf,
    },

    /// Schema is not valid TOML
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A namespace table does not match the expected option struct
    #[error("Invalid options in [{namespace}]: {source}")]
    InvalidOptions {
        namespace: String,
        source: toml::de::Error,
    },

    /// Comment formatter formula could not be parsed
    #[error("Invalid projection formula {formula:?}: {message}")]
    Projection { formula: String, message: String },

    /// No factory registered under this filter name
    #[error("Unknown filter: {0}")]
    UnknownFilter(String),

    /// A factory failed to build its filter
    #[error("Cannot create filter {name}: {message}")]
    Component { name: String, message: String },
}

pub type Result<T> = std::result::Result<T, Error>;
