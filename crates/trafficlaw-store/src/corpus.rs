use std::path::Path;

use serde_json::Value;
use tracing::info;

use crate::StoreError;

/// Read the raw corpus rows from a JSON array file or a `.jsonl` file.
///
/// Rows are returned undecoded so one bad record can be skipped later
/// without rejecting the file. A file that is not valid JSON, or a JSON
/// document that is not an array, is an error.
pub fn read_corpus(path: &Path) -> Result<Vec<Value>, StoreError> {
    if !path.exists() {
        return Err(StoreError::CorpusNotFound(path.to_path_buf()));
    }
    let text = std::fs::read_to_string(path)?;
    let malformed = |reason: String| StoreError::MalformedCorpus {
        path: path.to_path_buf(),
        reason,
    };

    let is_jsonl = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("jsonl"));

    let rows = if is_jsonl {
        let mut rows = Vec::new();
        for (n, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let row = serde_json::from_str(line)
                .map_err(|e| malformed(format!("line {}: {e}", n + 1)))?;
            rows.push(row);
        }
        rows
    } else {
        match serde_json::from_str::<Value>(&text).map_err(|e| malformed(e.to_string()))? {
            Value::Array(rows) => rows,
            other => {
                return Err(malformed(format!(
                    "expected an array of records, found {}",
                    json_kind(&other)
                )));
            }
        }
    };

    info!(rows = rows.len(), path = %path.display(), "read corpus file");
    Ok(rows)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
