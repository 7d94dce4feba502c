//! Escalation resolution: which aggravated clauses apply on top of the
//! selected base clauses.

use std::collections::{BTreeSet, HashSet};

use tracing::debug;
use trafficlaw_core::extract::ACCIDENT_PRIORITY;
use trafficlaw_core::{ClauseRef, QuerySignals, RecordKind, RefPattern};

use crate::corpus::Corpus;

/// Base candidates that share a query tag, followed by every escalation
/// clause of the vehicle's article that applies to them.
pub fn resolve(corpus: &Corpus, signals: &QuerySignals, candidates: &[usize]) -> Vec<usize> {
    let base: HashSet<ClauseRef> = candidates.iter().map(|&i| corpus[i].reference).collect();
    let candidate_ids: HashSet<usize> = candidates.iter().copied().collect();
    let cites_base = |pattern: &RefPattern| match pattern.exact() {
        Some(address) => corpus.at(&address).iter().any(|i| candidate_ids.contains(i)),
        None => base.iter().any(|r| pattern.matches(r)),
    };

    let mut matched: Vec<usize> = candidates
        .iter()
        .copied()
        .filter(|&i| !corpus[i].is_escalation && shares_tag(&corpus[i].tags, signals))
        .collect();

    let article = signals.vehicle.article();
    for &i in corpus.escalations() {
        let record = &corpus[i];
        if record.kind != RecordKind::Penalty || record.article() != article {
            continue;
        }
        if let Some(target) = signals.target_clause
            && record.clause() != Some(target)
        {
            continue;
        }

        let by_reference = record.escalation_refs.iter().any(cites_base);
        let by_tag = shares_tag(&record.tags, signals);
        let by_accident = signals.has_accident && record.priority == ACCIDENT_PRIORITY;

        if by_reference || by_tag || by_accident {
            debug!(
                reference = %record.reference,
                by_reference,
                by_tag,
                by_accident,
                "escalation applies"
            );
            matched.push(i);
        }
    }

    matched
}

fn shares_tag(tags: &BTreeSet<String>, signals: &QuerySignals) -> bool {
    !tags.is_disjoint(&signals.behavior_tags)
}
