use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("corpus file not found: {0}")]
    CorpusNotFound(PathBuf),

    #[error("malformed corpus {path}: {reason}")]
    MalformedCorpus { path: PathBuf, reason: String },

    #[error("semantic index file not found: {0}")]
    IndexFileNotFound(PathBuf),

    #[error("semantic index mismatch: {0}")]
    IndexMismatch(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),
}
