//! Error results that can be returned from the harness

use thiserror::Error;

/// Serious errors and errors from third-party libraries
#[derive(Debug, Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    IO(#[from] std::io::Error),

    /// A fixture file could not be parsed, or one of its tests lacks a required field
    #[error("malformed fixture {path}: {reason}")]
    MalformedFixture { path: String, reason: String },

    #[error("executable not found: {0}")]
    ExecutableNotFound(String),
}

/// Result that can be returned which holds either T or an Error
pub type Result<T> = std::result::Result<T, anyhow::Error>;
