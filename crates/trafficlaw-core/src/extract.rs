//! Pattern extraction over statute text: behavior tags, fine amounts,
//! escalation markers, and citations of other provisions.

use std::collections::BTreeSet;
use std::ops::Range;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::keywords::{ACCIDENT_INDICATORS, BEHAVIOR_TAGS, contains_any};
use crate::record::PenaltyRange;
use crate::reference::{ClauseRef, RefPattern, parse_subpoint};

/// Priority of an ordinary (non-escalation) clause.
pub const BASE_PRIORITY: u32 = 50;
/// Escalation clause with neither accident wording nor citations.
pub const ESCALATION_PRIORITY: u32 = 80;
/// Escalation clause that cites the clauses it aggravates.
pub const REFERENCED_ESCALATION_PRIORITY: u32 = 90;
/// Escalation clause triggered by an accident. Highest tier.
pub const ACCIDENT_PRIORITY: u32 = 100;

const ONE_MILLION: u64 = 1_000_000;

/// Subpoint letters as a regex class (Vietnamese alphabet).
const LETTER: &str = r"[abcdđeghiklmnopqrstuvxy]\b";

static DONG_AMOUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{1,3}(?:\.\d{3})+|\d+)\s*đồng").expect("dong amount regex is valid")
});

static MILLION_AMOUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+(?:[.,]\d+)?)\s*triệu").expect("million amount regex is valid")
});

static MILLION_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+(?:[.,]\d+)?)\s*(?:triệu\s*(?:đồng\s*)?)?đến\s*(\d+(?:[.,]\d+)?)\s*triệu")
        .expect("million range regex is valid")
});

static ESCALATION_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)nâng mức|tăng mức|phạt cao hơn|cao hơn mức|quy định tại\s+điều\s+\d+\s+khoản\s+\d+|các hành vi.*điểm\s+{LETTER}|một trong các hành vi"
    ))
    .expect("escalation marker regex is valid")
});

// ── Citation shapes, most specific first ──

static CITE_FORWARD_FULL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)điều\s+(\d+)\s*,?\s*khoản\s+(\d+)\s*,?\s*điểm\s+({LETTER})"
    ))
    .expect("forward citation regex is valid")
});

static CITE_REVERSE_FULL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)điểm\s+({LETTER}(?:\s*(?:,|và)\s*(?:điểm\s+)?{LETTER})*)\s*,?\s+khoản\s+(\d+)(?:\s*,?\s+điều\s+(\d+|này))?"
    ))
    .expect("reverse citation regex is valid")
});

static CITE_ARTICLE_CLAUSE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)điều\s+(\d+)\s*,?\s*khoản\s+(\d+)").expect("article clause regex is valid")
});

static CITE_CLAUSE_ARTICLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)khoản\s+(\d+)\s*,?\s+điều\s+(\d+|này)").expect("clause article regex is valid")
});

static CITE_CLAUSE_SUBPOINT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)khoản\s+(\d+)\s*,?\s*điểm\s+({LETTER})"))
        .expect("clause subpoint regex is valid")
});

static CITE_SUBPOINTS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)điểm\s+({LETTER}(?:\s*(?:,|và)\s*(?:điểm\s+)?{LETTER})*)"
    ))
    .expect("subpoint list regex is valid")
});

static SINGLE_LETTER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)\b({LETTER})")).expect("letter regex is valid")
});

/// Behavior tags whose phrases occur in `lowered`.
pub fn derive_tags(lowered: &str) -> BTreeSet<String> {
    BEHAVIOR_TAGS
        .iter()
        .filter(|entry| contains_any(lowered, entry.phrases))
        .map(|entry| entry.tag.to_string())
        .collect()
}

pub fn has_accident_indicator(lowered: &str) -> bool {
    contains_any(lowered, ACCIDENT_INDICATORS)
}

/// Fine range stated in the text, in đồng.
///
/// A `X đến Y triệu` range wins outright. Otherwise every amount found is
/// collected: two or more give (min, max); a lone amount after `đến` is an
/// upper bound, after `từ` a lower bound, and otherwise both.
pub fn extract_penalty(lowered: &str) -> PenaltyRange {
    if let Some(caps) = MILLION_RANGE.captures(lowered)
        && let (Some(min), Some(max)) = (parse_millions(&caps[1]), parse_millions(&caps[2]))
    {
        return PenaltyRange::new(Some(min), Some(max));
    }

    let mut amounts: Vec<(usize, u64)> = Vec::new();
    for caps in DONG_AMOUNT.captures_iter(lowered) {
        if let Ok(value) = caps[1].replace('.', "").parse::<u64>() {
            amounts.push((caps.get(0).map_or(0, |m| m.start()), value));
        }
    }
    for caps in MILLION_AMOUNT.captures_iter(lowered) {
        if let Some(value) = parse_millions(&caps[1]) {
            amounts.push((caps.get(0).map_or(0, |m| m.start()), value));
        }
    }

    match amounts.as_slice() {
        [] => PenaltyRange::default(),
        [(start, value)] => {
            let before = lowered[..*start].trim_end();
            if before.ends_with("đến") {
                PenaltyRange::new(None, Some(*value))
            } else if before.ends_with("từ") {
                PenaltyRange::new(Some(*value), None)
            } else {
                PenaltyRange::new(Some(*value), Some(*value))
            }
        }
        many => {
            let min = many.iter().map(|(_, v)| *v).min();
            let max = many.iter().map(|(_, v)| *v).max();
            PenaltyRange::new(min, max)
        }
    }
}

/// "4", "1,5", "2.5" millions into đồng.
fn parse_millions(raw: &str) -> Option<u64> {
    let (whole, frac) = match raw.split_once(['.', ',']) {
        Some((w, f)) => (w, f),
        None => (raw, ""),
    };
    let whole: u64 = whole.parse().ok()?;
    if frac.len() > 6 {
        return None;
    }
    let frac_value = if frac.is_empty() {
        0
    } else {
        frac.parse::<u64>().ok()? * 10u64.pow(6 - frac.len() as u32)
    };
    whole.checked_mul(ONE_MILLION)?.checked_add(frac_value)
}

/// Whether the text reads as an aggravated-penalty clause.
pub fn is_escalation_text(text: &str) -> bool {
    ESCALATION_MARKER.is_match(text)
}

/// Provisions cited by an escalation clause located at `current`.
///
/// Longer citation shapes claim their span first, so `điểm a khoản 6` is not
/// also read as a bare `điểm a` of the current clause. `Điều này` means the
/// current article.
pub fn escalation_refs(text: &str, current: &ClauseRef) -> Vec<RefPattern> {
    let mut scan = CitationScan {
        taken: Vec::new(),
        refs: Vec::new(),
    };
    let here = Some(current.article);

    scan.each(&CITE_FORWARD_FULL, text, |caps| {
        vec![RefPattern::new(
            num(&caps[1]),
            num(&caps[2]),
            parse_subpoint(&caps[3]),
        )]
    });
    scan.each(&CITE_REVERSE_FULL, text, |caps| {
        let article = caps.get(3).map_or(here, |m| article_or_here(m.as_str(), current));
        let clause = num(&caps[2]);
        letters(&caps[1])
            .map(|s| RefPattern::new(article, clause, Some(s)))
            .collect()
    });
    scan.each(&CITE_ARTICLE_CLAUSE, text, |caps| {
        vec![RefPattern::new(num(&caps[1]), num(&caps[2]), None)]
    });
    scan.each(&CITE_CLAUSE_ARTICLE, text, |caps| {
        vec![RefPattern::new(
            article_or_here(&caps[2], current),
            num(&caps[1]),
            None,
        )]
    });
    scan.each(&CITE_CLAUSE_SUBPOINT, text, |caps| {
        vec![RefPattern::new(here, num(&caps[1]), parse_subpoint(&caps[2]))]
    });
    scan.each(&CITE_SUBPOINTS, text, |caps| {
        letters(&caps[1])
            .map(|s| RefPattern::new(here, current.clause, Some(s)))
            .collect()
    });

    scan.refs
}

/// Priority tier of a clause.
pub fn priority(is_escalation: bool, lowered: &str, has_refs: bool) -> u32 {
    match (is_escalation, has_accident_indicator(lowered), has_refs) {
        (false, _, _) => BASE_PRIORITY,
        (true, true, _) => ACCIDENT_PRIORITY,
        (true, false, true) => REFERENCED_ESCALATION_PRIORITY,
        (true, false, false) => ESCALATION_PRIORITY,
    }
}

struct CitationScan {
    taken: Vec<Range<usize>>,
    refs: Vec<RefPattern>,
}

impl CitationScan {
    fn each(&mut self, re: &Regex, text: &str, read: impl Fn(&Captures<'_>) -> Vec<RefPattern>) {
        for caps in re.captures_iter(text) {
            let Some(whole) = caps.get(0) else { continue };
            let span = whole.range();
            if self
                .taken
                .iter()
                .any(|t| t.start < span.end && span.start < t.end)
            {
                continue;
            }
            let found = read(&caps);
            if found.is_empty() {
                continue;
            }
            self.taken.push(span);
            for pattern in found {
                if !self.refs.contains(&pattern) {
                    self.refs.push(pattern);
                }
            }
        }
    }
}

fn num(raw: &str) -> Option<u32> {
    raw.parse().ok()
}

fn article_or_here(raw: &str, current: &ClauseRef) -> Option<u32> {
    if raw.to_lowercase() == "này" {
        Some(current.article)
    } else {
        num(raw)
    }
}

fn letters(list: &str) -> impl Iterator<Item = char> + '_ {
    SINGLE_LETTER
        .captures_iter(list)
        .filter_map(|caps| parse_subpoint(&caps[1]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn here(article: u32, clause: u32) -> ClauseRef {
        ClauseRef::new(article, Some(clause), None)
    }

    fn p(article: u32, clause: Option<u32>, subpoint: Option<char>) -> RefPattern {
        RefPattern::new(Some(article), clause, subpoint)
    }

    // ── Penalty amounts ──

    #[test]
    fn dotted_dong_range() {
        let text = "phạt tiền từ 800.000 đồng đến 1.000.000 đồng đối với người điều khiển xe";
        assert_eq!(
            extract_penalty(text),
            PenaltyRange::new(Some(800_000), Some(1_000_000))
        );
    }

    #[test]
    fn million_range_wins() {
        let text = "phạt tiền từ 4 đến 6 triệu đồng, phạt bổ sung 1.000.000 đồng";
        assert_eq!(
            extract_penalty(text),
            PenaltyRange::new(Some(4_000_000), Some(6_000_000))
        );
    }

    #[test]
    fn decimal_millions() {
        let text = "phạt từ 1,5 triệu đến 2,5 triệu";
        assert_eq!(
            extract_penalty(text),
            PenaltyRange::new(Some(1_500_000), Some(2_500_000))
        );
    }

    #[test]
    fn single_amount_upper_bound() {
        assert_eq!(
            extract_penalty("phạt tiền đến 5.000.000 đồng"),
            PenaltyRange::new(None, Some(5_000_000))
        );
        assert_eq!(
            extract_penalty("phạt tiền từ 2.000.000 đồng"),
            PenaltyRange::new(Some(2_000_000), None)
        );
        assert_eq!(
            extract_penalty("phạt 300.000 đồng"),
            PenaltyRange::new(Some(300_000), Some(300_000))
        );
    }

    #[test]
    fn no_amount() {
        assert_eq!(extract_penalty("tước quyền sử dụng giấy phép"), PenaltyRange::default());
    }

    // ── Escalation markers ──

    #[test]
    fn escalation_markers() {
        assert!(is_escalation_text(
            "thực hiện một trong các hành vi quy định tại khoản 5 Điều này"
        ));
        assert!(is_escalation_text("các hành vi quy định tại điểm a, điểm b khoản 6"));
        assert!(is_escalation_text("áp dụng mức phạt cao hơn"));
        assert!(is_escalation_text("vi phạm quy định tại Điều 6 khoản 5"));
        assert!(!is_escalation_text(
            "không chấp hành hiệu lệnh của đèn tín hiệu giao thông"
        ));
    }

    #[test]
    fn priority_tiers() {
        assert_eq!(priority(false, "gây tai nạn", true), BASE_PRIORITY);
        assert_eq!(priority(true, "mà gây tai nạn giao thông", false), ACCIDENT_PRIORITY);
        assert_eq!(priority(true, "quy định tại điểm a", true), REFERENCED_ESCALATION_PRIORITY);
        assert_eq!(priority(true, "nâng mức phạt", false), ESCALATION_PRIORITY);
    }

    // ── Citations ──

    #[test]
    fn forward_full_citation() {
        let refs = escalation_refs("vi phạm Điều 6 khoản 5 điểm a", &here(6, 10));
        assert_eq!(refs, vec![p(6, Some(5), Some('a'))]);
    }

    #[test]
    fn article_clause_citation_is_subpoint_wildcard() {
        let refs = escalation_refs("quy định tại Điều 7 khoản 4", &here(7, 10));
        assert_eq!(refs, vec![p(7, Some(4), None)]);
    }

    #[test]
    fn vietnamese_order_with_this_article() {
        let refs = escalation_refs(
            "thực hiện hành vi quy định tại điểm a, điểm b khoản 6, điểm c khoản 7 Điều này mà gây tai nạn",
            &here(6, 10),
        );
        assert_eq!(
            refs,
            vec![
                p(6, Some(6), Some('a')),
                p(6, Some(6), Some('b')),
                p(6, Some(7), Some('c')),
            ]
        );
    }

    #[test]
    fn subpoint_only_scoped_to_current_clause() {
        let refs = escalation_refs("các hành vi tại điểm a, b và đ", &here(7, 9));
        assert_eq!(
            refs,
            vec![
                p(7, Some(9), Some('a')),
                p(7, Some(9), Some('b')),
                p(7, Some(9), Some('đ')),
            ]
        );
    }

    #[test]
    fn clause_then_subpoint() {
        let refs = escalation_refs("vi phạm khoản 5 điểm h", &here(6, 11));
        assert_eq!(refs, vec![p(6, Some(5), Some('h'))]);
    }

    #[test]
    fn cross_article_citation() {
        let refs = escalation_refs("hành vi quy định tại khoản 2 Điều 35", &here(7, 10));
        assert_eq!(refs, vec![p(35, Some(2), None)]);
    }

    #[test]
    fn accident_wording_alone_is_not_a_marker() {
        assert!(!is_escalation_text(
            "thực hiện hành vi quy định tại điểm a khoản 6 điều này mà gây tai nạn giao thông"
        ));
    }

    #[test]
    fn one_of_the_acts_cites_clause_of_this_article() {
        let refs = escalation_refs(
            "thực hiện một trong các hành vi quy định tại khoản 5 Điều này",
            &here(6, 10),
        );
        assert_eq!(refs, vec![p(6, Some(5), None)]);
    }

    #[test]
    fn bare_clause_number_is_not_a_citation() {
        assert!(escalation_refs("bị tước quyền theo khoản 3", &here(6, 11)).is_empty());
    }

    #[test]
    fn no_citation() {
        assert!(escalation_refs("gây tai nạn giao thông", &here(7, 10)).is_empty());
    }

    #[test]
    fn derive_tags_from_content() {
        let tags = derive_tags("không chấp hành hiệu lệnh của đèn tín hiệu giao thông");
        assert!(tags.contains("red-light"));
        assert!(!tags.contains("speeding"));
    }
}
