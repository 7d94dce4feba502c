//! Clause retrieval for Vietnamese traffic-violation questions: candidate
//! selection, escalation resolution, and disambiguation over an in-memory
//! corpus, with an optional semantic fallback.

pub mod concept;
pub mod corpus;
mod engine;
mod error;
pub mod format;
pub mod ranker;
pub mod resolver;
pub mod rules;
pub mod selector;

pub use corpus::Corpus;
pub use engine::{Engine, EngineStats, RetrievalConfig, variations};
pub use error::EngineError;
pub use format::{ClauseSummary, PenaltyInfo, RetrievalResult, Status, SuspensionInfo};
