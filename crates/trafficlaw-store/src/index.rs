use std::path::Path;

use arrow::array::{Array, FixedSizeListArray, Float32Array};
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use tracing::{info, warn};

use trafficlaw_core::schema::{
    CONFIG_FILE, EMBEDDING_COLUMN, EMBEDDINGS_FILE, IndexConfig, IndexEntry, METADATA_FILE,
};

use crate::StoreError;

/// The three files of a semantic index directory, validated against each other.
#[derive(Debug, Clone)]
pub struct SemanticIndexFiles {
    pub config: IndexConfig,
    pub entries: Vec<IndexEntry>,
    pub dim: usize,
    /// Row-major `entries.len() × dim` matrix.
    pub embeddings: Vec<f32>,
}

impl SemanticIndexFiles {
    pub fn rows(&self) -> usize {
        self.entries.len()
    }

    pub fn row(&self, i: usize) -> &[f32] {
        &self.embeddings[i * self.dim..(i + 1) * self.dim]
    }
}

/// Read and cross-check an index directory.
///
/// Fails when a file is missing, when the embedding rows and metadata
/// entries disagree in number, or when any embedding row is null.
pub fn read_semantic_index(dir: &Path) -> Result<SemanticIndexFiles, StoreError> {
    let embeddings_path = dir.join(EMBEDDINGS_FILE);
    let metadata_path = dir.join(METADATA_FILE);
    let config_path = dir.join(CONFIG_FILE);
    for path in [&embeddings_path, &metadata_path, &config_path] {
        if !path.exists() {
            return Err(StoreError::IndexFileNotFound(path.clone()));
        }
    }

    let config: IndexConfig = serde_json::from_slice(&std::fs::read(&config_path)?)?;
    let entries: Vec<IndexEntry> = serde_json::from_slice(&std::fs::read(&metadata_path)?)?;
    let (dim, embeddings) = embedding_matrix(&read_parquet(&embeddings_path)?)?;

    let rows = if dim == 0 { 0 } else { embeddings.len() / dim };
    if rows != entries.len() {
        return Err(StoreError::IndexMismatch(format!(
            "{rows} embedding rows but {} metadata entries",
            entries.len()
        )));
    }
    if let Some(expected) = config.chunk_count
        && expected != rows
    {
        warn!(expected, rows, "config chunk_count disagrees with index rows");
    }

    info!(rows, dim, model = %config.model_name, "loaded semantic index");
    Ok(SemanticIndexFiles {
        config,
        entries,
        dim,
        embeddings,
    })
}

/// Read a Parquet file into Arrow RecordBatches.
pub fn read_parquet(path: &Path) -> Result<Vec<RecordBatch>, StoreError> {
    let file = std::fs::File::open(path)?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;
    let batches: Result<Vec<RecordBatch>, _> = reader.collect();
    Ok(batches?)
}

/// Flatten the `embedding` column of every batch into one row-major matrix.
fn embedding_matrix(batches: &[RecordBatch]) -> Result<(usize, Vec<f32>), StoreError> {
    let mut dim = 0usize;
    let mut matrix = Vec::new();

    for batch in batches {
        let column = batch.column_by_name(EMBEDDING_COLUMN).ok_or_else(|| {
            StoreError::IndexMismatch(format!("missing '{EMBEDDING_COLUMN}' column"))
        })?;
        let fsl = column
            .as_any()
            .downcast_ref::<FixedSizeListArray>()
            .ok_or_else(|| StoreError::IndexMismatch("embedding column is not FixedSizeList".into()))?;

        let batch_dim = fsl.value_length() as usize;
        if dim != 0 && batch_dim != dim {
            return Err(StoreError::IndexMismatch(format!(
                "embedding width changes from {dim} to {batch_dim}"
            )));
        }
        dim = batch_dim;

        // The underlying values are a single flat Float32Array.
        let flat_values = fsl
            .values()
            .as_any()
            .downcast_ref::<Float32Array>()
            .ok_or_else(|| StoreError::IndexMismatch("embedding values are not Float32".into()))?;

        for row in 0..batch.num_rows() {
            if fsl.is_null(row) {
                return Err(StoreError::IndexMismatch(format!("null embedding at row {row}")));
            }
            let offset = row * dim;
            matrix.extend_from_slice(&flat_values.values()[offset..offset + dim]);
        }
    }

    Ok((dim, matrix))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use arrow::array::{FixedSizeListBuilder, Float32Builder};
    use parquet::arrow::ArrowWriter;
    use tempfile::TempDir;
    use trafficlaw_core::schema::semantic;

    const DIM: i32 = 3;

    fn write_embeddings(dir: &Path, rows: &[[f32; 3]]) {
        let mut builder = FixedSizeListBuilder::new(Float32Builder::new(), DIM);
        for row in rows {
            builder.values().append_slice(row);
            builder.append(true);
        }
        let schema = Arc::new(semantic::embeddings_schema(DIM));
        let batch = RecordBatch::try_new(schema.clone(), vec![Arc::new(builder.finish())]).unwrap();

        let file = std::fs::File::create(dir.join(EMBEDDINGS_FILE)).unwrap();
        let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();
    }

    fn write_sidecars(dir: &Path, ids: &[&str]) {
        let entries: Vec<serde_json::Value> = ids
            .iter()
            .map(|id| serde_json::json!({"doc_id": id}))
            .collect();
        std::fs::write(
            dir.join(METADATA_FILE),
            serde_json::to_vec(&entries).unwrap(),
        )
        .unwrap();
        std::fs::write(
            dir.join(CONFIG_FILE),
            r#"{"model_name": "test-model", "normalize_embeddings": true, "chunk_count": 2}"#,
        )
        .unwrap();
    }

    #[test]
    fn reads_matching_index() {
        let tmp = TempDir::new().unwrap();
        write_embeddings(tmp.path(), &[[1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]);
        write_sidecars(tmp.path(), &["a", "b"]);

        let index = read_semantic_index(tmp.path()).unwrap();
        assert_eq!(index.rows(), 2);
        assert_eq!(index.dim, 3);
        assert_eq!(index.row(1), &[0.0, 1.0, 0.0]);
        assert_eq!(index.entries[0].doc_id, "a");
        assert_eq!(index.config.model_name, "test-model");
    }

    #[test]
    fn row_count_mismatch_is_rejected() {
        let tmp = TempDir::new().unwrap();
        write_embeddings(tmp.path(), &[[1.0, 0.0, 0.0]]);
        write_sidecars(tmp.path(), &["a", "b"]);

        let err = read_semantic_index(tmp.path()).unwrap_err();
        assert!(matches!(err, StoreError::IndexMismatch(_)), "{err}");
    }

    #[test]
    fn missing_file_is_reported() {
        let tmp = TempDir::new().unwrap();
        write_sidecars(tmp.path(), &["a"]);
        assert!(matches!(
            read_semantic_index(tmp.path()),
            Err(StoreError::IndexFileNotFound(_))
        ));
    }
}
