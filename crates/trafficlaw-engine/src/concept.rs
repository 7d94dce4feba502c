//! Definition and obligation questions, answered from the statute texts
//! instead of the sanctions decree.

use tracing::debug;
use trafficlaw_core::keywords::{SEATBELT_PHRASES, contains_any};
use trafficlaw_core::{ClauseRecord, RecordKind};

use crate::corpus::Corpus;
use crate::rules::{
    CONCEPT_CUES, CONCEPT_STOPWORDS, CUE_PHRASES, DEFINITION_ARTICLES, GENERAL_RULES_ARTICLE,
    PENALTY_CUE, RULE_CUES, SEATBELT_TEXT, STATUTE_SOURCES, source_title,
};

const TERM_HIT: i64 = 50;
const VERBATIM: i64 = 100;
const SEATBELT_RULE: i64 = 200;
const SEATBELT_GENERAL_RULES: i64 = 100;
const RULE_QUERY_CONCEPT_PENALTY: i64 = -300;
const RULE_QUERY_RULE_BONUS: i64 = 300;
const CONCEPT_QUERY_BONUS: i64 = 200;
const STATUTE_BONUS: i64 = 150;
const DEFINITION_ARTICLE_BONUS: i64 = 100;

/// Which lookup a question calls for.
pub fn classify(query: &str) -> RecordKind {
    let lowered = query.to_lowercase();
    if contains_any(&lowered, CONCEPT_CUES) {
        RecordKind::Concept
    } else if is_rule_question(&lowered) {
        RecordKind::Rule
    } else {
        RecordKind::Penalty
    }
}

/// Obligation wording, unless the question is really about the fine.
/// A definition question can be a rule question too; scoring follows this.
fn is_rule_question(lowered: &str) -> bool {
    contains_any(lowered, RULE_CUES) && !lowered.contains(PENALTY_CUE)
}

/// A scored lookup hit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConceptMatch {
    pub position: usize,
    pub score: i64,
    /// e.g. `Luật TTATGTĐB 2024 - Điều 3 khoản 1`.
    pub reference: String,
}

/// Best-scoring record for a definition or rule question, if any scores
/// above zero. Earlier records win ties.
pub fn best_match(corpus: &Corpus, query: &str) -> Option<ConceptMatch> {
    let terms = SearchTerms::new(query);
    let (position, score) = corpus
        .records()
        .iter()
        .enumerate()
        .map(|(i, record)| (i, terms.score(record)))
        .filter(|&(_, score)| score > 0)
        .fold(None, |best: Option<(usize, i64)>, (i, score)| match best {
            Some((_, top)) if top >= score => best,
            _ => Some((i, score)),
        })?;

    let record = &corpus[position];
    debug!(
        reference = %record.reference,
        score,
        rule_question = terms.is_rule,
        "concept lookup match"
    );
    Some(ConceptMatch {
        position,
        score,
        reference: format!("{} - {}", source_title(&record.source), record.reference),
    })
}

struct SearchTerms {
    stripped: String,
    key_terms: Vec<String>,
    is_rule: bool,
    about_seatbelt: bool,
}

impl SearchTerms {
    fn new(query: &str) -> Self {
        let lowered = query.to_lowercase();
        let mut stripped = lowered.clone();
        for cue in CUE_PHRASES {
            if stripped.contains(cue) {
                stripped = stripped
                    .replace(cue, "")
                    .trim_matches(|c| c == '?' || c == ' ')
                    .to_string();
            }
        }
        let key_terms = stripped
            .split_whitespace()
            .filter(|w| w.chars().count() > 3 && !CONCEPT_STOPWORDS.contains(w))
            .map(str::to_string)
            .collect();

        Self {
            key_terms,
            is_rule: is_rule_question(&lowered),
            about_seatbelt: contains_any(&lowered, SEATBELT_TEXT)
                || contains_any(&lowered, SEATBELT_PHRASES),
            stripped,
        }
    }

    fn score(&self, record: &ClauseRecord) -> i64 {
        let hits = self
            .key_terms
            .iter()
            .filter(|t| record.mentions(t))
            .count() as i64;
        let mut score = hits * TERM_HIT;

        if !self.stripped.is_empty() && record.mentions(&self.stripped) {
            score += VERBATIM;
        }

        if self.about_seatbelt
            && record.kind == RecordKind::Rule
            && record.mentions_any(SEATBELT_TEXT)
        {
            score += SEATBELT_RULE;
            if record.article() == GENERAL_RULES_ARTICLE {
                score += SEATBELT_GENERAL_RULES;
            }
        }

        if self.is_rule {
            match record.kind {
                RecordKind::Concept => score += RULE_QUERY_CONCEPT_PENALTY,
                RecordKind::Rule if hits >= 2 => score += RULE_QUERY_RULE_BONUS,
                _ => {}
            }
        } else if record.kind == RecordKind::Concept {
            score += CONCEPT_QUERY_BONUS;
        }

        if STATUTE_SOURCES.contains(&record.source.as_str()) {
            score += STATUTE_BONUS;
            if !self.is_rule && DEFINITION_ARTICLES.contains(&record.article()) {
                score += DEFINITION_ARTICLE_BONUS;
            }
        }

        score
    }
}
