//! Disambiguation: pick one primary clause from the matched set.
//!
//! The ranker is an ordered list of stages. Each stage either names the
//! primary clause or defers to the next one. The first decision wins.

use std::cmp::Reverse;
use std::collections::HashSet;

use tracing::debug;
use trafficlaw_core::keywords::tag;
use trafficlaw_core::{CrossRef, QuerySignals, VehicleArticle};

use crate::corpus::Corpus;
use crate::rules::{
    CROSS_VEHICLE_ARTICLES, EXACT_PHRASE_RULES, RECKLESS_ACCIDENT_CLAUSE, RECKLESS_CLAUSE,
    SPECIFIC_TAG_ORDER, equipment_article, strict_vehicle_text,
};
use crate::selector::tunnel_context;

/// Related clauses shown next to the primary one.
pub const MAX_RELATED: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ranking {
    pub primary: usize,
    /// Other matched clauses, highest fine first.
    pub related: Vec<usize>,
}

struct RankContext<'a> {
    corpus: &'a Corpus,
    signals: &'a QuerySignals,
    matched: &'a [usize],
    /// Matched clauses with a known fine, in the right location context.
    pool: Vec<usize>,
}

type Stage = fn(&RankContext<'_>) -> Option<usize>;

const STAGES: &[(&str, Stage)] = &[
    ("exact-phrase", exact_phrase),
    ("accident", accident_escalation),
    ("speed-band", speed_band),
    ("specific-tag", specific_tag),
];

/// `None` only when there is nothing at all to choose from.
pub fn rank(
    corpus: &Corpus,
    signals: &QuerySignals,
    candidates: &[usize],
    matched: &[usize],
) -> Option<Ranking> {
    let mut pool: Vec<usize> = matched
        .iter()
        .copied()
        .filter(|&i| corpus[i].penalty.max.is_some_and(|m| m > 0))
        .collect();
    tunnel_context(corpus, signals, &mut pool);

    let ctx = RankContext {
        corpus,
        signals,
        matched,
        pool,
    };

    let primary = STAGES
        .iter()
        .find_map(|(name, stage)| {
            let pick = stage(&ctx)?;
            debug!(stage = name, reference = %corpus[pick].reference, "primary selected");
            Some(pick)
        })
        .or_else(|| first_max_by(matched.iter().copied(), |i| corpus[i].priority))
        .or_else(|| candidates.first().copied())?;

    let mut related: Vec<usize> = matched.iter().copied().filter(|&i| i != primary).collect();
    related.sort_by_key(|&i| Reverse(corpus[i].penalty.max_or_zero()));
    related.truncate(MAX_RELATED);

    Some(Ranking { primary, related })
}

/// Query wording that names the exact offence, e.g. no plate against a
/// wrong plate. Not used when an accident raises the stakes.
fn exact_phrase(ctx: &RankContext<'_>) -> Option<usize> {
    if ctx.signals.has_accident {
        return None;
    }
    let rule = EXACT_PHRASE_RULES
        .iter()
        .find(|rule| ctx.signals.mentions_any(rule.triggers))?;

    let hits = ctx.corpus.filter(&ctx.pool, |r| r.mentions_any(rule.texts));
    let preferred = equipment_article(ctx.signals.vehicle);
    let on_vehicle = ctx.corpus.filter(&hits, |r| r.article() == preferred);

    lowest_fine(ctx.corpus, &on_vehicle).or_else(|| lowest_fine(ctx.corpus, &hits))
}

fn accident_escalation(ctx: &RankContext<'_>) -> Option<usize> {
    if !ctx.signals.has_accident || ctx.pool.is_empty() {
        return None;
    }
    let corpus = ctx.corpus;

    let in_clause = |clause: u32| {
        ctx.pool
            .iter()
            .copied()
            .find(|&i| corpus[i].clause() == Some(clause))
    };
    if in_clause(RECKLESS_CLAUSE).is_some()
        && let Some(reckless_accident) = in_clause(RECKLESS_ACCIDENT_CLAUSE)
    {
        return Some(reckless_accident);
    }

    let escalations = corpus.filter(&ctx.pool, |r| r.is_escalation);
    let Some(winner) = first_max_by(escalations.iter().copied(), |i| {
        (corpus[i].priority, corpus[i].penalty.max_or_zero())
    }) else {
        let base = corpus.filter(&ctx.pool, |r| !r.is_escalation);
        return highest_fine(corpus, &base);
    };

    // Several escalation points of one clause: prefer the one citing a
    // matched base clause.
    let (article, clause) = (corpus[winner].article(), corpus[winner].clause());
    let siblings = corpus.filter(&escalations, |r| r.article() == article && r.clause() == clause);
    if siblings.len() > 1 {
        let base_pairs: HashSet<CrossRef> = ctx
            .pool
            .iter()
            .map(|&i| &corpus[i])
            .filter(|r| !r.is_escalation && r.reference.subpoint.is_some())
            .map(|r| CrossRef {
                clause: r.clause(),
                subpoint: r.reference.subpoint,
            })
            .collect();
        if let Some(cited) = siblings.iter().copied().find(|&i| {
            corpus[i]
                .cross_references
                .iter()
                .any(|c| base_pairs.contains(c))
        }) {
            return Some(cited);
        }
    }

    Some(winner)
}

fn speed_band(ctx: &RankContext<'_>) -> Option<usize> {
    let target = ctx.signals.target_clause?;
    let article = ctx.signals.vehicle.article();
    let at_target = ctx
        .corpus
        .filter(&ctx.pool, |r| r.article() == article && r.clause() == Some(target));
    let base = ctx.corpus.filter(&at_target, |r| !r.is_escalation);

    highest_fine(ctx.corpus, &base).or_else(|| highest_fine(ctx.corpus, &at_target))
}

fn specific_tag(ctx: &RankContext<'_>) -> Option<usize> {
    let (corpus, signals) = (ctx.corpus, ctx.signals);

    let mut narrowed = ctx.pool.clone();
    for &name in SPECIFIC_TAG_ORDER {
        if !signals.has_tag(name) {
            continue;
        }
        let tagged = corpus.filter(&ctx.pool, |r| r.has_tag(name));
        if !tagged.is_empty() {
            debug!(tag = name, remaining = tagged.len(), "narrowed by specific tag");
            narrowed = corroborate_vehicle(corpus, signals.vehicle, tagged);
            break;
        }
    }

    // Individuals not carrying a licence are judged as having none; the
    // lighter "not carried" clauses only cover commercial transport.
    let individual_not_carried =
        signals.has_tag(tag::LICENSE_NOT_CARRIED) && !signals.has_tag(tag::COMMERCIAL_TRANSPORT);
    if individual_not_carried
        && !narrowed.is_empty()
        && narrowed
            .iter()
            .all(|&i| corpus[i].has_tag(tag::COMMERCIAL_TRANSPORT))
    {
        let no_license = corpus.filter(ctx.matched, |r| r.has_tag(tag::NO_LICENSE));
        if !no_license.is_empty() {
            narrowed = corroborate_vehicle(corpus, signals.vehicle, no_license);
        }
    }

    if let Some(size) = signals.engine_size {
        corpus.narrow(&mut narrowed, |r| r.has_tag(size.tag()));
    }

    if signals.has_tag(tag::COMMERCIAL_TRANSPORT) {
        let transport = corpus.filter(&narrowed, |r| r.has_tag(tag::COMMERCIAL_TRANSPORT));
        if !transport.is_empty() {
            return lowest_fine(corpus, &transport);
        }
    }

    if individual_not_carried {
        lowest_fine(corpus, &narrowed)
    } else {
        highest_fine(corpus, &narrowed)
    }
}

/// Keep the clauses naming the vehicle, unless a cross-vehicle article is involved.
fn corroborate_vehicle(corpus: &Corpus, vehicle: VehicleArticle, mut ids: Vec<usize>) -> Vec<usize> {
    if ids
        .iter()
        .any(|&i| CROSS_VEHICLE_ARTICLES.contains(&corpus[i].article()))
    {
        return ids;
    }
    corpus.narrow(&mut ids, |r| r.mentions_any(strict_vehicle_text(vehicle)));
    ids
}

fn highest_fine(corpus: &Corpus, ids: &[usize]) -> Option<usize> {
    first_max_by(ids.iter().copied(), |i| corpus[i].penalty.max_or_zero())
}

fn lowest_fine(corpus: &Corpus, ids: &[usize]) -> Option<usize> {
    ids.iter()
        .copied()
        .min_by_key(|&i| corpus[i].penalty.max_or_zero())
}

/// Like `max_by_key`, but the first of equal maxima wins.
fn first_max_by<K: Ord>(ids: impl Iterator<Item = usize>, key: impl Fn(usize) -> K) -> Option<usize> {
    ids.min_by_key(|&i| Reverse(key(i)))
}
