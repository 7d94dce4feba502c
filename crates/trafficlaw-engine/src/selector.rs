//! Candidate selection: which penalty clauses could answer the query.
//!
//! Tag hits and semantic hits are unioned, then narrowed by subject, vehicle
//! and content context. Every narrowing step falls back to its input when it
//! would leave nothing.

use std::cmp::Reverse;
use std::collections::{BTreeSet, HashSet};

use tracing::debug;
use trafficlaw_ai::SemanticHit;
use trafficlaw_core::keywords::{contains_any, tag};
use trafficlaw_core::{QuerySignals, RecordKind};

use crate::corpus::Corpus;
use crate::rules::{
    BANNED_ROAD_QUERY, BANNED_ROAD_TEXT, CROSS_VEHICLE_TAGS, LOAD_TEXT, ORGANIZATION_MIN_ARTICLE,
    PHONE_TEXT, TRAFFIC_LIGHT_TEXT, TUNNEL_QUERY, TUNNEL_TEXT, WRONG_WAY_TEXT,
    is_individual_article, keyword_rule, vehicle_text,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Nothing in the query to go on.
    NoTags,
    /// Signals found, but no clause matched them.
    NoChunks,
    /// Candidate record ids, best first.
    Candidates(Vec<usize>),
}

pub fn select(corpus: &Corpus, signals: &QuerySignals, semantic: &[SemanticHit]) -> Selection {
    if signals.behavior_tags.is_empty() && semantic.is_empty() {
        return Selection::NoTags;
    }

    let mut pool = union(corpus, signals, semantic);
    if pool.is_empty() {
        return Selection::NoChunks;
    }
    debug!(candidates = pool.len(), semantic = semantic.len(), "initial candidates");

    subject_filter(corpus, signals, &mut pool);
    vehicle_article_filter(corpus, signals, &mut pool);
    content_filters(corpus, signals, &mut pool);
    tunnel_context(corpus, signals, &mut pool);
    keyword_rules(corpus, signals, &mut pool);

    if let Some(clause) = signals.target_clause {
        let article = signals.vehicle.article();
        if corpus.narrow(&mut pool, |r| r.article() == article && r.clause() == Some(clause)) {
            debug!(article, clause, remaining = pool.len(), "narrowed to speed band");
        }
    }

    Selection::Candidates(pool)
}

/// Tag hits in corpus order, then semantic hits by score. Penalty records only.
fn union(corpus: &Corpus, signals: &QuerySignals, semantic: &[SemanticHit]) -> Vec<usize> {
    let tagged: BTreeSet<usize> = signals
        .behavior_tags
        .iter()
        .flat_map(|t| corpus.tagged(t))
        .copied()
        .collect();

    let mut seen = HashSet::new();
    tagged
        .into_iter()
        .chain(semantic.iter().map(|hit| hit.target))
        .filter(|&i| {
            corpus
                .records()
                .get(i)
                .is_some_and(|r| r.kind == RecordKind::Penalty)
        })
        .filter(|&i| seen.insert(i))
        .collect()
}

fn subject_filter(corpus: &Corpus, signals: &QuerySignals, pool: &mut Vec<usize>) {
    let narrowed = if signals.is_organization {
        corpus.narrow(pool, |r| r.article() >= ORGANIZATION_MIN_ARTICLE)
    } else {
        corpus.narrow(pool, |r| is_individual_article(r.article()))
    };
    if narrowed {
        debug!(
            organization = signals.is_organization,
            remaining = pool.len(),
            "narrowed by subject"
        );
    }
}

fn vehicle_article_filter(corpus: &Corpus, signals: &QuerySignals, pool: &mut Vec<usize>) {
    if signals.is_load_query
        || CROSS_VEHICLE_TAGS.iter().any(|t| signals.has_tag(t))
    {
        debug!("vehicle article filter skipped");
        return;
    }
    let article = signals.vehicle.article();
    if corpus.narrow(pool, |r| r.article() == article) {
        debug!(article, remaining = pool.len(), "narrowed by vehicle article");
    }
}

fn content_filters(corpus: &Corpus, signals: &QuerySignals, pool: &mut Vec<usize>) {
    let skip_vehicle_text = signals
        .behavior_tags
        .iter()
        .filter_map(|t| keyword_rule(t))
        .any(|rule| rule.skip_vehicle_text);

    let filters: [(&str, bool, &[&str]); 6] = [
        ("vehicle-text", !skip_vehicle_text, vehicle_text(signals.vehicle)),
        ("load", signals.is_load_query, LOAD_TEXT),
        ("wrong-way", signals.mentions_any(WRONG_WAY_TEXT), WRONG_WAY_TEXT),
        ("banned-road", signals.mentions_any(BANNED_ROAD_QUERY), BANNED_ROAD_TEXT),
        ("traffic-light", signals.has_tag(tag::RED_LIGHT), TRAFFIC_LIGHT_TEXT),
        ("phone", signals.has_tag(tag::PHONE_USE), PHONE_TEXT),
    ];

    let unfiltered = pool.clone();
    let mut applied = false;
    for (name, triggered, phrases) in filters {
        if !triggered {
            continue;
        }
        if corpus.narrow(pool, |r| r.mentions_any(phrases)) {
            debug!(filter = name, remaining = pool.len(), "narrowed by content");
            applied = true;
        } else if name == "load" {
            // No load clause among the vehicle-text matches: undo that narrowing too.
            pool.clone_from(&unfiltered);
            applied = false;
            debug!(remaining = pool.len(), "no load clause; content filters reverted");
        }
    }

    if applied {
        pool.sort_by_key(|&i| {
            let r = &corpus[i];
            Reverse((r.penalty.max_or_zero(), r.priority))
        });
    }
}

/// Tunnel clauses only for tunnel questions; never otherwise.
pub(crate) fn tunnel_context(corpus: &Corpus, signals: &QuerySignals, pool: &mut Vec<usize>) {
    let in_tunnel = contains_any(&signals.lowered, TUNNEL_QUERY);
    corpus.narrow(pool, |r| r.mentions(TUNNEL_TEXT) == in_tunnel);
}

/// Keep the best-scoring records under each curated tag rule.
fn keyword_rules(corpus: &Corpus, signals: &QuerySignals, pool: &mut Vec<usize>) {
    for rule in signals.behavior_tags.iter().filter_map(|t| keyword_rule(t)) {
        let score = |i: usize| {
            let r = &corpus[i];
            let positive = rule.positive.iter().filter(|k| r.mentions(k)).count();
            let negative = rule.negative.iter().filter(|k| r.mentions(k)).count();
            (positive as i64 - negative as i64, positive)
        };
        let Some(best) = pool.iter().map(|&i| score(i).0).max() else {
            return;
        };
        if best <= 0 {
            continue;
        }
        pool.retain(|&i| {
            let (total, positive) = score(i);
            total == best && positive > 0
        });
        debug!(tag = rule.tag, remaining = pool.len(), "applied keyword rule");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use trafficlaw_core::analyze;

    fn corpus() -> Corpus {
        Corpus::from_values(vec![
            json!({
                "id": "car-light", "article": 6, "clause": 9, "subpoint": "b",
                "content": "Không chấp hành hiệu lệnh của đèn tín hiệu giao thông",
                "is_escalation": false, "penalty_min": 18000000, "penalty_max": 20000000
            }),
            json!({
                "id": "moto-light", "article": 7, "clause": 7, "subpoint": "c",
                "content": "Không chấp hành hiệu lệnh của đèn tín hiệu giao thông",
                "is_escalation": false, "penalty_min": 4000000, "penalty_max": 6000000
            }),
            json!({
                "id": "moto-stop", "article": 7, "clause": 2, "subpoint": "a",
                "content": "Dừng xe, đỗ xe trước đèn tín hiệu giao thông sai quy định",
                "is_escalation": false, "penalty_min": 400000, "penalty_max": 600000
            }),
            json!({
                "id": "car-turn", "article": 6, "clause": 2, "subpoint": "b",
                "content": "Điều khiển xe ô tô quay đầu xe trái quy định",
                "is_escalation": false, "penalty_min": 2000000, "penalty_max": 3000000
            }),
            json!({
                "id": "car-turn-tunnel", "article": 6, "clause": 4, "subpoint": "a",
                "content": "Điều khiển xe ô tô quay đầu xe trong hầm đường bộ",
                "is_escalation": false, "penalty_min": 4000000, "penalty_max": 6000000
            }),
            json!({
                "id": "concept", "article": 3, "kind": "concept",
                "content": "Đèn tín hiệu giao thông là thiết bị điều khiển giao thông"
            }),
        ])
        .unwrap()
    }

    fn ids(corpus: &Corpus, selection: Selection) -> Vec<&str> {
        match selection {
            Selection::Candidates(pool) => pool.iter().map(|&i| corpus[i].id.as_str()).collect(),
            other => panic!("expected candidates, got {other:?}"),
        }
    }

    #[test]
    fn no_tags_without_semantic_hits() {
        let corpus = corpus();
        assert_eq!(select(&corpus, &analyze("xin chào"), &[]), Selection::NoTags);
    }

    #[test]
    fn no_chunks_when_tags_match_nothing() {
        let corpus = corpus();
        assert_eq!(select(&corpus, &analyze("đua xe trái phép"), &[]), Selection::NoChunks);
    }

    #[test]
    fn vehicle_and_keyword_rules_narrow_red_light() {
        let corpus = corpus();
        let selection = select(&corpus, &analyze("xe máy vượt đèn đỏ"), &[]);
        // The stopping clause loses on the negative "dừng xe"/"đỗ xe" keywords.
        assert_eq!(ids(&corpus, selection), vec!["moto-light"]);
    }

    #[test]
    fn concept_records_never_become_candidates() {
        let corpus = corpus();
        let selection = select(&corpus, &analyze("ô tô vượt đèn đỏ"), &[]);
        assert_eq!(ids(&corpus, selection), vec!["car-light"]);
    }

    #[test]
    fn tunnel_context_both_ways() {
        let corpus = corpus();
        let general = select(&corpus, &analyze("ô tô quay đầu xe"), &[]);
        assert_eq!(ids(&corpus, general), vec!["car-turn"]);
        let tunnel = select(&corpus, &analyze("ô tô quay đầu xe trong hầm đường bộ"), &[]);
        assert_eq!(ids(&corpus, tunnel), vec!["car-turn-tunnel"]);
    }

    #[test]
    fn load_query_without_load_clause_keeps_unfiltered_pool() {
        let corpus = Corpus::from_values(vec![
            json!({
                "id": "car-cargo", "article": 6, "clause": 3, "subpoint": "a",
                "content": "Điều khiển xe ô tô chở hàng vượt quá chiều cao xếp hàng",
                "tags": ["cargo-load"], "is_escalation": false,
                "penalty_min": 800000, "penalty_max": 1000000
            }),
            json!({
                "id": "truck-cargo", "article": 20, "clause": 2, "subpoint": "a",
                "content": "Chở hàng vượt quá chiều cao xếp hàng cho phép",
                "tags": ["cargo-load"], "is_escalation": false,
                "penalty_min": 2000000, "penalty_max": 3000000
            }),
        ])
        .unwrap();
        let signals = analyze("ô tô chở quá tải trọng");
        assert!(signals.is_load_query);
        assert!(signals.has_tag(tag::CARGO_LOAD));
        let selection = select(&corpus, &signals, &[]);
        // Neither text names a load limit, so the vehicle-text narrowing to
        // the car clause is dropped as well.
        assert_eq!(ids(&corpus, selection), vec!["car-cargo", "truck-cargo"]);
    }

    #[test]
    fn semantic_hits_follow_tag_hits() {
        let corpus = corpus();
        let hits = [
            SemanticHit { target: 3, score: 0.9 },
            SemanticHit { target: 5, score: 0.8 },
        ];
        let selection = select(&corpus, &analyze("chuyện gì đó"), &hits);
        // The concept record is dropped; the turn clause survives.
        assert_eq!(ids(&corpus, selection), vec!["car-turn"]);
    }
}
