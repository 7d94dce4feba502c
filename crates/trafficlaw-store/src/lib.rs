//! Storage layer: the clause corpus (JSON / JSONL) and the precomputed
//! semantic index (Parquet embeddings plus JSON sidecars).

mod corpus;
mod error;
mod index;

pub use corpus::read_corpus;
pub use error::StoreError;
pub use index::{SemanticIndexFiles, read_parquet, read_semantic_index};
