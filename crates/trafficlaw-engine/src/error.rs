use thiserror::Error;

use trafficlaw_store::StoreError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("corpus has no valid records ({skipped} skipped)")]
    EmptyCorpus { skipped: usize },
}
