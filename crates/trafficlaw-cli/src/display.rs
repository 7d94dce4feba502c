//! Human-readable rendering of retrieval results and engine statistics.

use trafficlaw_core::RecordKind;
use trafficlaw_engine::{ClauseSummary, EngineStats, RetrievalResult, Status};

const LABEL_WIDTH: usize = 18;

// ── Public API ──

/// Print a result as a card: the primary clause, its sanctions, then related clauses.
pub fn print_result(result: &RetrievalResult) {
    let Some(primary) = result.primary_clause.as_ref().filter(|_| result.status == Status::Success)
    else {
        println!("{}", result.message.as_deref().unwrap_or("Không có kết quả"));
        println!();
        return;
    };

    println!("=== {} ===", primary.reference);
    println!("{}", primary.content);
    println!();

    match result.kind {
        RecordKind::Penalty => {
            print_sanctions(primary);
            print_related(&result.related_clauses);
            if result.escalations_applied > 0 {
                println!("{:<LABEL_WIDTH$} {}", "escalations", result.escalations_applied);
                println!();
            }
        }
        RecordKind::Concept | RecordKind::Rule => {
            println!("{:<LABEL_WIDTH$} {}", "source", primary.source);
            println!();
        }
    }
}

pub fn print_stats(stats: &EngineStats) {
    println!("Corpus");
    row("records", stats.records);
    row("skipped", stats.skipped);
    row("penalties", stats.penalties);
    row("concepts", stats.concepts);
    row("rules", stats.rules);
    row("escalations", stats.escalations);
    row("tags", stats.tags);
    println!();

    println!("Semantic");
    row("enabled", if stats.semantic_enabled { "yes" } else { "no" });
    row("rows", stats.semantic_rows);
    row("top_k", stats.config.semantic_top_k);
    row("min_score", stats.config.semantic_min_score);
    println!();
}

// ── Sections ──

fn print_sanctions(clause: &ClauseSummary) {
    println!("Sanctions");
    match &clause.penalty {
        Some(penalty) => row("fine", &penalty.text),
        None => row("fine", "(not stated)"),
    }
    if let Some(points) = clause.point_deduction {
        row("points", points);
    }
    if let Some(suspension) = &clause.license_suspension {
        row("suspension", &suspension.text);
    }
    if clause.is_escalation {
        row("escalation", "yes");
    }
    if !clause.tags.is_empty() {
        let tags: Vec<&str> = clause.tags.iter().map(String::as_str).collect();
        row("tags", tags.join(", "));
    }
    println!();
}

fn print_related(related: &[ClauseSummary]) {
    if related.is_empty() {
        return;
    }
    println!("Related ({})", related.len());
    for clause in related {
        let fine = clause
            .penalty
            .as_ref()
            .map_or("", |p| p.text.as_str());
        println!("  {:<30} {}", clause.reference, fine);
        println!("      {}", clause.content);
    }
    println!();
}

fn row(label: &str, value: impl std::fmt::Display) {
    println!("  {label:<LABEL_WIDTH$} {value}");
}
