//! Statute clause records: the raw corpus row and its canonical form.

use std::collections::BTreeSet;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::bands;
use crate::extract;
use crate::keywords::canonical_tag;
use crate::reference::{ClauseRef, CrossRef, RefPattern, parse_subpoint};

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("record is not a JSON object")]
    NotAnObject,

    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    #[error("invalid subpoint {0:?}")]
    InvalidSubpoint(String),

    #[error("invalid field: {0}")]
    Json(#[from] serde_json::Error),
}

/// What a record is for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    /// Sanctions for a violation (Nghị định 168).
    #[default]
    Penalty,
    /// Definitions and scope of the road traffic law.
    Concept,
    /// Obligations and prohibitions of the road traffic law.
    Rule,
}

/// Fine bounds in đồng.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PenaltyRange {
    pub min: Option<u64>,
    pub max: Option<u64>,
}

impl PenaltyRange {
    pub fn new(min: Option<u64>, max: Option<u64>) -> Self {
        Self { min, max }
    }

    pub fn is_known(&self) -> bool {
        self.min.is_some() || self.max.is_some()
    }

    /// Upper bound for ordering; unknown counts as zero.
    pub fn max_or_zero(&self) -> u64 {
        self.max.unwrap_or(0)
    }

    /// Explicit bounds take precedence per field; gaps are filled from `derived`.
    /// Inverted bounds are swapped.
    fn merged(self, derived: PenaltyRange) -> (Self, bool) {
        let mut min = self.min.or(derived.min);
        let mut max = self.max.or(derived.max);
        let mut swapped = false;
        if let (Some(lo), Some(hi)) = (min, max)
            && lo > hi
        {
            (min, max) = (Some(hi), Some(lo));
            swapped = true;
        }
        (Self { min, max }, swapped)
    }
}

/// Licence suspension in months.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suspension {
    pub min_months: u8,
    pub max_months: u8,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum SuspensionInput {
    Pair([u8; 2]),
    Months { min_months: u8, max_months: u8 },
}

impl From<SuspensionInput> for Suspension {
    fn from(input: SuspensionInput) -> Self {
        let (a, b) = match input {
            SuspensionInput::Pair([a, b]) => (a, b),
            SuspensionInput::Months {
                min_months,
                max_months,
            } => (min_months, max_months),
        };
        Suspension {
            min_months: a.min(b),
            max_months: a.max(b),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct RawCrossRef {
    #[serde(default, alias = "khoan", deserialize_with = "lenient_u32")]
    clause: Option<u32>,
    #[serde(default, alias = "diem")]
    subpoint: Option<String>,
}

/// One corpus row as exported by the chunking pipeline.
///
/// Field names follow the current export; older exports are accepted through
/// [`RawRecord::from_value`], which maps their column names first.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawRecord {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub article: Option<u32>,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub clause: Option<u32>,
    #[serde(default)]
    pub subpoint: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub is_escalation: Option<bool>,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub penalty_min: Option<u64>,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub penalty_max: Option<u64>,
    #[serde(default)]
    pub point_deduction: Option<u8>,
    #[serde(default, deserialize_with = "suspension")]
    pub license_suspension: Option<Suspension>,
    #[serde(default, deserialize_with = "cross_refs")]
    pub references: Vec<CrossRef>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub kind: Option<RecordKind>,
}

/// (canonical name, older export names)
const FIELD_ALIASES: &[(&str, &[&str])] = &[
    ("id", &["doc_id"]),
    ("content", &["text", "diem_text"]),
    ("article", &["article_num"]),
    ("clause", &["khoan", "khoan_num"]),
    ("subpoint", &["diem", "diem_letter"]),
    ("kind", &["record_type"]),
];

impl RawRecord {
    /// Decode one JSON row, accepting older column names.
    pub fn from_value(value: Value) -> Result<Self, RecordError> {
        let Value::Object(mut map) = value else {
            return Err(RecordError::NotAnObject);
        };
        for (canonical, aliases) in FIELD_ALIASES {
            if map.get(*canonical).is_some_and(|v| !v.is_null()) {
                continue;
            }
            if let Some(v) = aliases
                .iter()
                .find_map(|a| map.get(*a).filter(|v| !v.is_null()).cloned())
            {
                map.insert((*canonical).to_string(), v);
            }
        }
        Ok(serde_json::from_value(Value::Object(map))?)
    }
}

/// A statute excerpt with all derived metadata filled in.
#[derive(Debug, Clone)]
pub struct ClauseRecord {
    pub id: String,
    pub reference: ClauseRef,
    pub source: String,
    pub kind: RecordKind,
    pub content: String,
    pub tags: BTreeSet<String>,
    pub is_escalation: bool,
    pub escalation_refs: Vec<RefPattern>,
    pub penalty: PenaltyRange,
    pub point_deduction: Option<u8>,
    pub license_suspension: Option<Suspension>,
    pub priority: u32,
    pub cross_references: Vec<CrossRef>,
    lowered: String,
}

pub const DEFAULT_SOURCE: &str = "nd168";

impl ClauseRecord {
    /// Build the canonical record for corpus row `index`.
    pub fn from_raw(raw: RawRecord, index: usize) -> Result<Self, RecordError> {
        let content = raw
            .content
            .filter(|c| !c.trim().is_empty())
            .ok_or(RecordError::MissingField("content"))?;
        let article = raw.article.ok_or(RecordError::MissingField("article"))?;
        let subpoint = match raw.subpoint.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(s) => Some(parse_subpoint(s).ok_or_else(|| RecordError::InvalidSubpoint(s.into()))?),
        };
        let reference = ClauseRef::new(article, raw.clause, subpoint);
        let lowered = content.to_lowercase();

        let mut tags: BTreeSet<String> = raw.tags.iter().map(|t| canonical_tag(t)).collect();
        tags.extend(extract::derive_tags(&lowered));

        let (penalty, swapped) = PenaltyRange::new(raw.penalty_min, raw.penalty_max)
            .merged(if raw.penalty_min.is_some() && raw.penalty_max.is_some() {
                PenaltyRange::default()
            } else {
                extract::extract_penalty(&lowered)
            });
        if swapped {
            tracing::warn!(%reference, "penalty bounds were inverted; swapped");
        }

        let explicit_points = raw.point_deduction.filter(|&points| {
            let valid = bands::POINT_BANDS.contains(&points);
            if !valid {
                tracing::warn!(%reference, points, "unknown point deduction; dropped");
            }
            valid
        });

        let is_escalation = raw
            .is_escalation
            .unwrap_or_else(|| extract::is_escalation_text(&content));
        let escalation_refs = if is_escalation {
            extract::escalation_refs(&content, &reference)
        } else {
            Vec::new()
        };
        let priority = extract::priority(is_escalation, &lowered, !escalation_refs.is_empty());

        let cross_references = if raw.references.is_empty() {
            escalation_refs
                .iter()
                .filter(|p| p.clause.is_some() && p.subpoint.is_some())
                .map(|p| CrossRef {
                    clause: p.clause,
                    subpoint: p.subpoint,
                })
                .collect()
        } else {
            raw.references
        };

        Ok(Self {
            id: raw
                .id
                .filter(|id| !id.is_empty())
                .unwrap_or_else(|| format!("chunk_{index}")),
            point_deduction: explicit_points.or_else(|| bands::point_deduction(&reference)),
            license_suspension: raw
                .license_suspension
                .or_else(|| bands::license_suspension(&reference)),
            source: raw.source.unwrap_or_else(|| DEFAULT_SOURCE.to_string()),
            kind: raw.kind.unwrap_or_default(),
            reference,
            content,
            tags,
            is_escalation,
            escalation_refs,
            penalty,
            priority,
            cross_references,
            lowered,
        })
    }

    /// Content lower-cased once at load time.
    pub fn lowered(&self) -> &str {
        &self.lowered
    }

    pub fn article(&self) -> u32 {
        self.reference.article
    }

    pub fn clause(&self) -> Option<u32> {
        self.reference.clause
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    pub fn mentions(&self, phrase: &str) -> bool {
        self.lowered.contains(phrase)
    }

    pub fn mentions_any(&self, phrases: &[&str]) -> bool {
        phrases.iter().any(|p| self.lowered.contains(p))
    }
}

// ── Lenient field decoding ──

#[derive(Deserialize)]
#[serde(untagged)]
enum Number {
    Int(u64),
    Float(f64),
    Text(String),
}

fn lenient_u64<'de, D: Deserializer<'de>>(de: D) -> Result<Option<u64>, D::Error> {
    let value: Option<Number> = Option::deserialize(de)?;
    Ok(match value {
        None => None,
        Some(Number::Int(n)) => Some(n),
        Some(Number::Float(f)) if f >= 0.0 && f.is_finite() => Some(f.round() as u64),
        Some(Number::Float(_)) => None,
        Some(Number::Text(s)) => {
            let digits: String = s.chars().filter(char::is_ascii_digit).collect();
            digits.parse().ok()
        }
    })
}

fn lenient_u32<'de, D: Deserializer<'de>>(de: D) -> Result<Option<u32>, D::Error> {
    Ok(lenient_u64(de)?.and_then(|n| u32::try_from(n).ok()))
}

fn suspension<'de, D: Deserializer<'de>>(de: D) -> Result<Option<Suspension>, D::Error> {
    let value: Option<SuspensionInput> = Option::deserialize(de)?;
    Ok(value.map(Suspension::from))
}

fn cross_refs<'de, D: Deserializer<'de>>(de: D) -> Result<Vec<CrossRef>, D::Error> {
    let raw: Option<Vec<RawCrossRef>> = Option::deserialize(de)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .map(|r| CrossRef {
            clause: r.clause,
            subpoint: r.subpoint.as_deref().and_then(parse_subpoint),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use serde_json::json;

    use super::*;

    fn build(value: Value) -> ClauseRecord {
        ClauseRecord::from_raw(RawRecord::from_value(value).unwrap(), 0).unwrap()
    }

    #[test]
    fn current_field_names() {
        let rec = build(json!({
            "id": "nd168_7_7_c",
            "content": "Phạt tiền từ 4.000.000 đồng đến 6.000.000 đồng đối với người điều khiển xe mô tô không chấp hành hiệu lệnh của đèn tín hiệu giao thông",
            "article": 7, "clause": 7, "subpoint": "c",
            "tags": ["red-light"],
            "is_escalation": false
        }));
        assert_eq!(rec.id, "nd168_7_7_c");
        assert_eq!(rec.reference.to_string(), "Điều 7 khoản 7 điểm c");
        assert_eq!(rec.penalty, PenaltyRange::new(Some(4_000_000), Some(6_000_000)));
        assert_eq!(rec.point_deduction, Some(4));
        assert_eq!(rec.license_suspension.map(|s| s.max_months), Some(4));
        assert_eq!(rec.priority, extract::BASE_PRIORITY);
        assert_eq!(rec.source, DEFAULT_SOURCE);
        assert_eq!(rec.kind, RecordKind::Penalty);
    }

    #[test]
    fn older_export_names() {
        let rec = build(json!({
            "doc_id": "x",
            "diem_text": "Không đội mũ bảo hiểm",
            "article_num": "7", "khoan_num": 2, "diem_letter": "h",
            "tags": ["khong_doi_mu"],
            "record_type": "penalty"
        }));
        assert_eq!(rec.id, "x");
        assert_eq!(rec.reference, ClauseRef::new(7, Some(2), Some('h')));
        assert!(rec.has_tag("no-helmet"));
    }

    #[test]
    fn missing_content_is_rejected() {
        let raw = RawRecord::from_value(json!({"article": 6})).unwrap();
        assert!(matches!(
            ClauseRecord::from_raw(raw, 0),
            Err(RecordError::MissingField("content"))
        ));
    }

    #[test]
    fn missing_article_is_rejected() {
        let raw = RawRecord::from_value(json!({"content": "x"})).unwrap();
        assert!(matches!(
            ClauseRecord::from_raw(raw, 0),
            Err(RecordError::MissingField("article"))
        ));
    }

    #[test]
    fn bad_subpoint_is_rejected() {
        let raw = RawRecord::from_value(json!({"content": "x", "article": 6, "subpoint": "zz"}))
            .unwrap();
        assert!(matches!(
            ClauseRecord::from_raw(raw, 0),
            Err(RecordError::InvalidSubpoint(_))
        ));
    }

    #[test]
    fn non_object_is_rejected() {
        assert!(matches!(
            RawRecord::from_value(json!([1, 2])),
            Err(RecordError::NotAnObject)
        ));
    }

    #[test]
    fn default_id_uses_row_index() {
        let raw = RawRecord::from_value(json!({"content": "x", "article": 6})).unwrap();
        assert_eq!(ClauseRecord::from_raw(raw, 12).unwrap().id, "chunk_12");
    }

    #[test]
    fn explicit_escalation_flag_wins() {
        let rec = build(json!({
            "content": "Thực hiện hành vi quy định tại điểm c khoản 7 Điều này mà gây tai nạn giao thông",
            "article": 7, "clause": 10, "subpoint": "b",
            "is_escalation": false
        }));
        assert!(!rec.is_escalation);
        assert!(rec.escalation_refs.is_empty());
    }

    #[test]
    fn escalation_detected_from_text() {
        let rec = build(json!({
            "content": "Thực hiện một trong các hành vi quy định tại điểm c khoản 7 Điều này mà gây tai nạn giao thông",
            "article": 7, "clause": 10, "subpoint": "b"
        }));
        assert!(rec.is_escalation);
        assert_eq!(
            rec.escalation_refs,
            vec![RefPattern::new(Some(7), Some(7), Some('c'))]
        );
        assert_eq!(
            rec.cross_references,
            vec![CrossRef { clause: Some(7), subpoint: Some('c') }]
        );
        assert_eq!(rec.priority, extract::ACCIDENT_PRIORITY);
    }

    #[test]
    fn explicit_values_override_tables() {
        let rec = build(json!({
            "content": "Phạt tiền từ 1.000.000 đồng đến 2.000.000 đồng",
            "article": 6, "clause": 10, "subpoint": "a",
            "is_escalation": false,
            "penalty_max": 3_000_000,
            "point_deduction": 2,
            "license_suspension": {"min_months": 3, "max_months": 1},
            "references": [{"khoan": 5, "diem": "a"}]
        }));
        assert_eq!(rec.penalty, PenaltyRange::new(Some(1_000_000), Some(3_000_000)));
        assert_eq!(rec.point_deduction, Some(2));
        assert_eq!(
            rec.license_suspension,
            Some(Suspension { min_months: 1, max_months: 3 })
        );
        assert_eq!(
            rec.cross_references,
            vec![CrossRef { clause: Some(5), subpoint: Some('a') }]
        );
    }

    #[test]
    fn unknown_point_deduction_is_dropped() {
        let rec = build(json!({
            "content": "x", "article": 6, "clause": 10, "subpoint": "a",
            "point_deduction": 3
        }));
        assert_eq!(rec.point_deduction, Some(10));

        let rec = build(json!({"content": "x", "article": 6, "clause": 1, "point_deduction": 12}));
        assert_eq!(rec.point_deduction, None);
    }

    #[test]
    fn inverted_explicit_bounds_are_swapped() {
        let rec = build(json!({
            "content": "x", "article": 6,
            "penalty_min": 6_000_000, "penalty_max": 4_000_000
        }));
        assert_eq!(rec.penalty, PenaltyRange::new(Some(4_000_000), Some(6_000_000)));
    }

    #[test]
    fn legacy_seatbelt_tag_is_normalised() {
        let rec = build(json!({"content": "x", "article": 6, "tags": ["khong_day_an_toan"]}));
        assert!(rec.has_tag("seatbelt"));
        assert!(!rec.has_tag("khong-day-an-toan"));
    }

    proptest! {
        #[test]
        fn penalty_bounds_are_ordered(min in 0u64..50_000_000, max in 0u64..50_000_000) {
            let rec = build(json!({
                "content": "x", "article": 6,
                "penalty_min": min, "penalty_max": max
            }));
            prop_assert!(rec.penalty.min <= rec.penalty.max);
        }

        #[test]
        fn extracted_bounds_are_ordered(a in 1u32..100, b in 1u32..100) {
            let text = format!("Phạt tiền từ {a}.000.000 đồng đến {b}.000.000 đồng");
            let rec = build(json!({"content": text, "article": 6}));
            prop_assert!(rec.penalty.min.is_some() && rec.penalty.max.is_some());
            prop_assert!(rec.penalty.min <= rec.penalty.max);
        }
    }
}
