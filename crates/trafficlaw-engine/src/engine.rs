//! The retrieval engine: one immutable value built at startup and shared by
//! reference for the life of the process.

use std::collections::HashSet;
use std::path::Path;

use serde::Serialize;
use tracing::{debug, info, warn};
use trafficlaw_ai::{EncoderLoader, SemanticSearch};
use trafficlaw_core::{RecordKind, analyze};
use trafficlaw_store::SemanticIndexFiles;

use crate::concept;
use crate::corpus::Corpus;
use crate::format::{ClauseSummary, RetrievalResult};
use crate::ranker::rank;
use crate::resolver::resolve;
use crate::rules::SYNONYMS;
use crate::selector::{Selection, select};
use crate::EngineError;

/// Tunables for one engine instance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RetrievalConfig {
    pub semantic_top_k: usize,
    pub semantic_min_score: f32,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            semantic_top_k: trafficlaw_ai::DEFAULT_TOP_K,
            semantic_min_score: trafficlaw_ai::DEFAULT_MIN_SCORE,
        }
    }
}

/// Corpus and index sizes, for `trafficlaw stats`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineStats {
    pub records: usize,
    pub skipped: usize,
    pub penalties: usize,
    pub concepts: usize,
    pub rules: usize,
    pub escalations: usize,
    pub tags: usize,
    pub semantic_rows: usize,
    pub semantic_enabled: bool,
    pub config: RetrievalConfig,
}

pub struct Engine {
    corpus: Corpus,
    semantic: Option<SemanticSearch>,
    config: RetrievalConfig,
}

impl Engine {
    /// Tag-only engine. Attach semantic search with [`Engine::with_semantic`].
    pub fn new(corpus: Corpus, config: RetrievalConfig) -> Self {
        Self {
            corpus,
            semantic: None,
            config,
        }
    }

    /// Load the corpus file and build a tag-only engine.
    pub fn open(corpus_path: &Path, config: RetrievalConfig) -> Result<Self, EngineError> {
        let corpus = Corpus::load(corpus_path)?;
        info!(
            path = %corpus_path.display(),
            records = corpus.len(),
            skipped = corpus.skipped(),
            "loaded corpus"
        );
        Ok(Self::new(corpus, config))
    }

    /// Attach a semantic index. Rows whose `doc_id` is not in the corpus are
    /// dropped; an index sharing no ids with the corpus leaves the engine
    /// tag-only.
    pub fn with_semantic(mut self, index: SemanticIndexFiles, loader: EncoderLoader) -> Self {
        let mut matrix = Vec::with_capacity(index.embeddings.len());
        let mut targets = Vec::with_capacity(index.rows());
        let mut unknown = 0usize;

        for (row, entry) in index.entries.iter().enumerate() {
            match self.corpus.position(&entry.doc_id) {
                Some(position) => {
                    matrix.extend_from_slice(index.row(row));
                    targets.push(position);
                }
                None => unknown += 1,
            }
        }
        if unknown > 0 {
            warn!(unknown, "semantic index rows not found in corpus; dropped");
        }

        let normalize_query = !index.config.normalize_embeddings;
        match SemanticSearch::new(matrix, index.dim, targets, normalize_query, loader) {
            Ok(search) => {
                info!(
                    rows = search.rows(),
                    model = %index.config.model_name,
                    "semantic search attached"
                );
                self.semantic = Some(search.with_limits(
                    self.config.semantic_top_k,
                    self.config.semantic_min_score,
                ));
            }
            Err(e) => warn!(error = %format!("{e:#}"), "semantic search unavailable"),
        }
        self
    }

    /// Read the index directory and attach it; on any error log and stay tag-only.
    pub fn with_semantic_dir(self, dir: &Path, loader: EncoderLoader) -> Self {
        match trafficlaw_store::read_semantic_index(dir) {
            Ok(index) => self.with_semantic(index, loader),
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "semantic index not loaded");
                self
            }
        }
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    pub fn semantic_enabled(&self) -> bool {
        self.semantic.as_ref().is_some_and(SemanticSearch::is_enabled)
    }

    /// Answer a penalty question. Never fails; misses are reported through
    /// the result status.
    pub fn retrieve(&self, query: &str) -> RetrievalResult {
        let signals = analyze(query);
        debug!(
            tags = ?signals.behavior_tags,
            vehicle = signals.vehicle.article(),
            accident = signals.has_accident,
            target_clause = ?signals.target_clause,
            "analyzed query"
        );

        let semantic = self
            .semantic
            .as_ref()
            .map(|s| s.search(query))
            .unwrap_or_default();

        let candidates = match select(&self.corpus, &signals, &semantic) {
            Selection::NoTags => return RetrievalResult::no_tags(),
            Selection::NoChunks => return RetrievalResult::no_chunks(RecordKind::Penalty),
            Selection::Candidates(candidates) => candidates,
        };

        let matched = resolve(&self.corpus, &signals, &candidates);
        let Some(ranking) = rank(&self.corpus, &signals, &candidates, &matched) else {
            return RetrievalResult::no_chunks(RecordKind::Penalty);
        };

        let escalations_applied = matched
            .iter()
            .filter(|&&i| self.corpus[i].is_escalation)
            .count();
        RetrievalResult::success(
            RecordKind::Penalty,
            ClauseSummary::primary(&self.corpus[ranking.primary]),
            ranking
                .related
                .iter()
                .map(|&i| ClauseSummary::related(&self.corpus[i]))
                .collect(),
            escalations_applied,
        )
    }

    /// Answer a definition or obligation question from the statute texts.
    pub fn retrieve_concept(&self, query: &str) -> RetrievalResult {
        let kind = match concept::classify(query) {
            RecordKind::Penalty => RecordKind::Concept,
            kind => kind,
        };
        match concept::best_match(&self.corpus, query) {
            Some(hit) => RetrievalResult::success(
                kind,
                ClauseSummary::with_reference(&self.corpus[hit.position], hit.reference),
                Vec::new(),
                0,
            ),
            None => RetrievalResult::no_chunks(kind),
        }
    }

    /// Route the question to concept lookup or the penalty pipeline.
    pub fn lookup(&self, query: &str) -> RetrievalResult {
        match concept::classify(query) {
            RecordKind::Penalty => self.retrieve(query),
            _ => self.retrieve_concept(query),
        }
    }

    /// Try the question, then its synonym rewrites, until one succeeds.
    pub fn retrieve_with_variations(&self, query: &str) -> RetrievalResult {
        let mut last = None;
        for variation in variations(query) {
            let result = self.retrieve(&variation);
            if result.is_success() {
                if variation != query {
                    debug!(%variation, "variation matched");
                }
                return result;
            }
            last = Some(result);
        }
        last.unwrap_or_else(RetrievalResult::no_tags)
    }

    pub fn stats(&self) -> EngineStats {
        EngineStats {
            records: self.corpus.len(),
            skipped: self.corpus.skipped(),
            penalties: self.corpus.count_kind(RecordKind::Penalty),
            concepts: self.corpus.count_kind(RecordKind::Concept),
            rules: self.corpus.count_kind(RecordKind::Rule),
            escalations: self.corpus.escalations().len(),
            tags: self.corpus.tag_count(),
            semantic_rows: self.semantic.as_ref().map_or(0, SemanticSearch::rows),
            semantic_enabled: self.semantic_enabled(),
            config: self.config,
        }
    }
}

/// The query itself, then one rewrite per synonym of each phrase it
/// contains. Case-insensitive duplicates are dropped.
pub fn variations(query: &str) -> Vec<String> {
    let lowered = query.to_lowercase();
    let mut seen = HashSet::from([lowered.clone()]);
    let mut out = vec![query.to_string()];

    for (phrase, alternatives) in SYNONYMS {
        if !lowered.contains(phrase) {
            continue;
        }
        for alternative in *alternatives {
            let rewrite = lowered.replace(phrase, alternative);
            if seen.insert(rewrite.clone()) {
                out.push(rewrite);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn engine_is_shareable() {
        assert_send_sync::<Engine>();
    }

    #[test]
    fn variations_start_with_query() {
        let v = variations("Xe máy vượt đèn đỏ");
        assert_eq!(
            v,
            vec![
                "Xe máy vượt đèn đỏ".to_string(),
                "xe máy vượt tín hiệu".to_string(),
                "xe máy không dừng đèn đỏ".to_string(),
            ]
        );
    }

    #[test]
    fn variations_without_synonyms() {
        assert_eq!(variations("đua xe"), vec!["đua xe".to_string()]);
    }

    #[test]
    fn default_config() {
        let config = RetrievalConfig::default();
        assert_eq!(config.semantic_top_k, 15);
        assert!((config.semantic_min_score - 0.35).abs() < f32::EPSILON);
    }
}
