//! Retrieval results as returned to callers and serialized for `--json`.

use std::collections::BTreeSet;

use serde::Serialize;
use trafficlaw_core::{ClauseRecord, PenaltyRange, RecordKind, Suspension};

/// Related-clause content is cut to this many characters.
pub const RELATED_CONTENT_CHARS: usize = 200;

pub const NO_TAGS_MESSAGE: &str = "Không phát hiện hành vi cụ thể trong câu hỏi";
pub const NO_CHUNKS_MESSAGE: &str = "Không tìm thấy điều luật liên quan";
pub const NO_CONCEPT_MESSAGE: &str = "Không tìm thấy định nghĩa hoặc giải thích liên quan";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Success,
    NoTags,
    NoChunks,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievalResult {
    pub status: Status,
    pub kind: RecordKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub primary_clause: Option<ClauseSummary>,
    pub related_clauses: Vec<ClauseSummary>,
    pub escalations_applied: usize,
}

impl RetrievalResult {
    pub fn success(
        kind: RecordKind,
        primary: ClauseSummary,
        related: Vec<ClauseSummary>,
        escalations_applied: usize,
    ) -> Self {
        Self {
            status: Status::Success,
            kind,
            message: None,
            primary_clause: Some(primary),
            related_clauses: related,
            escalations_applied,
        }
    }

    pub fn no_tags() -> Self {
        Self::empty(Status::NoTags, RecordKind::Penalty, NO_TAGS_MESSAGE)
    }

    pub fn no_chunks(kind: RecordKind) -> Self {
        let message = match kind {
            RecordKind::Penalty => NO_CHUNKS_MESSAGE,
            RecordKind::Concept | RecordKind::Rule => NO_CONCEPT_MESSAGE,
        };
        Self::empty(Status::NoChunks, kind, message)
    }

    fn empty(status: Status, kind: RecordKind, message: &str) -> Self {
        Self {
            status,
            kind,
            message: Some(message.to_string()),
            primary_clause: None,
            related_clauses: Vec::new(),
            escalations_applied: 0,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }

    /// Reference string of the primary clause, if any.
    pub fn primary_reference(&self) -> Option<&str> {
        self.primary_clause.as_ref().map(|c| c.reference.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClauseSummary {
    pub id: String,
    pub reference: String,
    pub content: String,
    pub tags: BTreeSet<String>,
    pub is_escalation: bool,
    pub priority: u32,
    pub penalty: Option<PenaltyInfo>,
    pub point_deduction: Option<u8>,
    pub license_suspension: Option<SuspensionInfo>,
    pub source: String,
}

impl ClauseSummary {
    pub fn primary(record: &ClauseRecord) -> Self {
        Self::with_reference(record, record.reference.to_string())
    }

    /// Same as [`ClauseSummary::primary`] with the content shortened.
    pub fn related(record: &ClauseRecord) -> Self {
        let mut summary = Self::primary(record);
        summary.content = truncate_chars(&summary.content, RELATED_CONTENT_CHARS);
        summary
    }

    pub fn with_reference(record: &ClauseRecord, reference: String) -> Self {
        Self {
            id: record.id.clone(),
            reference,
            content: record.content.clone(),
            tags: record.tags.clone(),
            is_escalation: record.is_escalation,
            priority: record.priority,
            penalty: PenaltyInfo::from_range(&record.penalty),
            point_deduction: record.point_deduction,
            license_suspension: record.license_suspension.map(SuspensionInfo::from),
            source: record.source.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PenaltyInfo {
    pub min: Option<u64>,
    pub max: Option<u64>,
    pub text: String,
}

impl PenaltyInfo {
    /// `None` when neither bound is known.
    pub fn from_range(range: &PenaltyRange) -> Option<Self> {
        let text = match (range.min, range.max) {
            (Some(min), Some(max)) => format!("{} - {}", dong(min), dong(max)),
            (Some(min), None) => format!("Từ {}", dong(min)),
            (None, Some(max)) => format!("Đến {}", dong(max)),
            (None, None) => return None,
        };
        Some(Self {
            min: range.min,
            max: range.max,
            text,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SuspensionInfo {
    pub min_months: u8,
    pub max_months: u8,
    pub text: String,
}

impl From<Suspension> for SuspensionInfo {
    fn from(s: Suspension) -> Self {
        Self {
            min_months: s.min_months,
            max_months: s.max_months,
            text: format!("Tước GPLX từ {} đến {} tháng", s.min_months, s.max_months),
        }
    }
}

/// `4000000` → `4.000.000đ`.
pub fn dong(amount: u64) -> String {
    let digits = amount.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 2);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push('.');
        }
        out.push(ch);
    }
    out.push('đ');
    out
}

fn truncate_chars(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}
