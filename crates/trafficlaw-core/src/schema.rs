//! On-disk layout of the precomputed semantic index.
//!
//! An index directory holds:
//! - `embeddings.parquet`: one row per clause, single `embedding` column
//! - `metadata.json`: array of [`IndexEntry`], parallel to the rows
//! - `config.json`: [`IndexConfig`]

use serde::{Deserialize, Serialize};

pub const EMBEDDINGS_FILE: &str = "embeddings.parquet";
pub const METADATA_FILE: &str = "metadata.json";
pub const CONFIG_FILE: &str = "config.json";
pub const EMBEDDING_COLUMN: &str = "embedding";

/// Arrow schema definitions for the semantic index.
pub mod semantic {
    use arrow::datatypes::{DataType, Field, Schema};
    use std::sync::Arc;

    use super::EMBEDDING_COLUMN;

    pub fn embedding_type(dim: i32) -> DataType {
        DataType::FixedSizeList(Arc::new(Field::new("item", DataType::Float32, true)), dim)
    }

    /// Schema of `embeddings.parquet`.
    pub fn embeddings_schema(dim: i32) -> Schema {
        Schema::new(vec![Field::new(EMBEDDING_COLUMN, embedding_type(dim), false)])
    }
}

/// How the index was built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexConfig {
    pub model_name: String,
    #[serde(default = "default_true")]
    pub normalize_embeddings: bool,
    #[serde(default)]
    pub chunk_count: Option<usize>,
}

fn default_true() -> bool {
    true
}

/// Row metadata; `doc_id` links the row back to a corpus record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub doc_id: String,
    #[serde(default)]
    pub article: Option<u32>,
    #[serde(default)]
    pub khoan: Option<u32>,
    #[serde(default)]
    pub diem: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}
