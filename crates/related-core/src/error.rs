// related-core/src/error.rs
//! 错误类型

use std::path::PathBuf;

use thiserror::Error;

/// Failures callers may want to match on. Everything else travels as
/// `anyhow::Error` with context attached.
#[derive(Debug, Error)]
pub enum RelatedError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to load embedding model `{model}`: {message}")]
    ModelLoad { model: String, message: String },

    #[error("invalid metadata block in {path:?}: {message}")]
    FrontMatter { path: PathBuf, message: String },

    #[error("vector {row} has dimension {actual}, expected {expected}")]
    DimensionMismatch {
        row: usize,
        expected: usize,
        actual: usize,
    },

    #[error("embedding backend returned {actual} vectors for {expected} texts")]
    EmbeddingCount { expected: usize, actual: usize },
}
