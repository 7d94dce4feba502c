pub mod analyzer;
pub mod bands;
pub mod extract;
pub mod keywords;
pub mod record;
pub mod reference;
pub mod schema;

pub use analyzer::{EngineSize, QuerySignals, VehicleArticle, analyze};
pub use record::{ClauseRecord, PenaltyRange, RawRecord, RecordError, RecordKind, Suspension};
pub use reference::{ClauseRef, CrossRef, RefPattern};
pub use schema::{IndexConfig, IndexEntry};
