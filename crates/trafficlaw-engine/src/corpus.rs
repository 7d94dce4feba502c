//! The loaded clause corpus and its lookup indexes.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::ops::Index;
use std::path::Path;

use serde_json::Value;
use tracing::{info, warn};
use trafficlaw_core::{ClauseRecord, ClauseRef, RawRecord, RecordKind};

use crate::EngineError;

/// Immutable after construction. Record positions are stable and used as ids
/// by every index.
#[derive(Debug)]
pub struct Corpus {
    records: Vec<ClauseRecord>,
    by_tag: HashMap<String, Vec<usize>>,
    by_reference: HashMap<ClauseRef, Vec<usize>>,
    escalations: Vec<usize>,
    by_id: HashMap<String, usize>,
    skipped: usize,
}

impl Corpus {
    /// Read and index a corpus file (JSON array or `.jsonl`).
    pub fn load(path: &Path) -> Result<Self, EngineError> {
        let rows = trafficlaw_store::read_corpus(path)?;
        Self::from_values(rows)
    }

    /// Decode raw rows, skipping malformed ones with a warning.
    pub fn from_values(rows: Vec<Value>) -> Result<Self, EngineError> {
        let mut records = Vec::with_capacity(rows.len());
        let mut skipped = 0usize;

        for (index, row) in rows.into_iter().enumerate() {
            match RawRecord::from_value(row).and_then(|raw| ClauseRecord::from_raw(raw, index)) {
                Ok(record) => records.push(record),
                Err(e) => {
                    warn!(index, error = %e, "skipping corpus record");
                    skipped += 1;
                }
            }
        }

        if records.is_empty() {
            return Err(EngineError::EmptyCorpus { skipped });
        }
        let mut corpus = Self::from_records(records)?;
        corpus.skipped = skipped;
        Ok(corpus)
    }

    pub fn from_records(records: Vec<ClauseRecord>) -> Result<Self, EngineError> {
        if records.is_empty() {
            return Err(EngineError::EmptyCorpus { skipped: 0 });
        }

        let mut by_tag: HashMap<String, Vec<usize>> = HashMap::new();
        let mut by_reference: HashMap<ClauseRef, Vec<usize>> = HashMap::new();
        let mut escalations = Vec::new();
        let mut by_id = HashMap::new();

        for (i, record) in records.iter().enumerate() {
            for tag in &record.tags {
                by_tag.entry(tag.clone()).or_default().push(i);
            }
            by_reference.entry(record.reference).or_default().push(i);
            if record.is_escalation {
                escalations.push(i);
            }
            match by_id.entry(record.id.clone()) {
                Entry::Vacant(slot) => {
                    slot.insert(i);
                }
                Entry::Occupied(_) => {
                    warn!(id = %record.id, "duplicate record id; keeping first occurrence");
                }
            }
        }

        info!(
            records = records.len(),
            tags = by_tag.len(),
            escalations = escalations.len(),
            "indexed corpus"
        );
        Ok(Self {
            records,
            by_tag,
            by_reference,
            escalations,
            by_id,
            skipped: 0,
        })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[ClauseRecord] {
        &self.records
    }

    /// Records carrying `tag`, in corpus order.
    pub fn tagged(&self, tag: &str) -> &[usize] {
        self.by_tag.get(tag).map_or(&[], Vec::as_slice)
    }

    /// Records at exactly this address.
    pub fn at(&self, reference: &ClauseRef) -> &[usize] {
        self.by_reference.get(reference).map_or(&[], Vec::as_slice)
    }

    /// Escalation records, in corpus order.
    pub fn escalations(&self) -> &[usize] {
        &self.escalations
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.by_id.get(id).copied()
    }

    pub fn tag_count(&self) -> usize {
        self.by_tag.len()
    }

    /// Rows dropped while loading.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn count_kind(&self, kind: RecordKind) -> usize {
        self.records.iter().filter(|r| r.kind == kind).count()
    }

    /// The ids whose record satisfies `keep`, order preserved.
    pub fn filter(&self, ids: &[usize], keep: impl Fn(&ClauseRecord) -> bool) -> Vec<usize> {
        ids.iter().copied().filter(|&i| keep(&self[i])).collect()
    }

    /// Narrow `ids` to the records satisfying `keep`, unless that would leave
    /// nothing. Returns whether the narrowing took effect.
    pub fn narrow(&self, ids: &mut Vec<usize>, keep: impl Fn(&ClauseRecord) -> bool) -> bool {
        let kept = self.filter(ids, keep);
        if kept.is_empty() {
            return false;
        }
        *ids = kept;
        true
    }
}

impl Index<usize> for Corpus {
    type Output = ClauseRecord;

    fn index(&self, i: usize) -> &ClauseRecord {
        &self.records[i]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rows() -> Vec<Value> {
        vec![
            json!({
                "doc_id": "nd168_7_7_c",
                "content": "Không chấp hành hiệu lệnh của đèn tín hiệu giao thông",
                "article": 7, "khoan": 7, "diem": "c",
                "is_escalation": false
            }),
            json!({"content": "thiếu điều", "khoan": 2}),
            json!({
                "content": "Thực hiện một trong các hành vi quy định tại điểm c khoản 7 Điều này mà gây tai nạn giao thông",
                "article": 7, "clause": 10, "subpoint": "b"
            }),
            json!({"content": "x", "article": 6, "subpoint": "zz"}),
            json!("not an object"),
        ]
    }

    #[test]
    fn malformed_rows_are_skipped() {
        let corpus = Corpus::from_values(rows()).unwrap();
        assert_eq!(corpus.len(), 2);
        assert_eq!(corpus.skipped(), 3);
    }

    #[test]
    fn indexes_by_tag_reference_and_id() {
        let corpus = Corpus::from_values(rows()).unwrap();
        assert_eq!(corpus.tagged("red-light"), &[0]);
        assert!(corpus.tagged("racing").is_empty());
        assert_eq!(corpus.at(&ClauseRef::new(7, Some(7), Some('c'))), &[0]);
        assert_eq!(corpus.escalations(), &[1]);
        assert_eq!(corpus.position("nd168_7_7_c"), Some(0));
        // Missing id falls back to the row position in the file.
        assert_eq!(corpus.position("chunk_2"), Some(1));
    }

    #[test]
    fn duplicate_ids_resolve_to_first() {
        let corpus = Corpus::from_values(vec![
            json!({"id": "dup", "content": "một", "article": 6}),
            json!({"id": "dup", "content": "hai", "article": 7}),
        ])
        .unwrap();
        assert_eq!(corpus.position("dup"), Some(0));
    }

    #[test]
    fn narrow_falls_back_when_nothing_survives() {
        let corpus = Corpus::from_values(rows()).unwrap();
        let mut ids = vec![0, 1];
        assert!(!corpus.narrow(&mut ids, |r| r.article() == 99));
        assert_eq!(ids, vec![0, 1]);
        assert!(corpus.narrow(&mut ids, |r| r.is_escalation));
        assert_eq!(ids, vec![1]);
    }

    #[test]
    fn empty_corpus_is_an_error() {
        let err = Corpus::from_values(vec![json!({"content": "no article"})]).unwrap_err();
        assert!(matches!(err, EngineError::EmptyCorpus { .. }));
    }
}
