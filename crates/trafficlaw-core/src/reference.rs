//! Clause addressing for Vietnamese statutes.
//!
//! A provision is cited as `Điều A khoản K điểm S` (article, clause,
//! subpoint). Subpoints follow the Vietnamese alphabet, so `đ` sorts between
//! `d` and `e`, and the letters f, j, w and z are never used.
//!
//! [`ClauseRef::sort_key`] renders a reference into a lexicographically
//! sortable string so listings recover document order:
//!
//! - `Điều 6` → `006.000.000`
//! - `Điều 6 khoản 7` → `006.007.000`
//! - `Điều 6 khoản 7 điểm đ` → `006.007.050`

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Subpoint letters in document order.
pub const SUBPOINT_LETTERS: &[char] = &[
    'a', 'b', 'c', 'd', 'đ', 'e', 'g', 'h', 'i', 'k', 'l', 'm', 'n', 'o', 'p', 'q', 'r', 's',
    't', 'u', 'v', 'x', 'y',
];

/// Position of a subpoint letter, counted from 1. Gaps of 10 between letters.
pub fn subpoint_rank(letter: char) -> u32 {
    SUBPOINT_LETTERS
        .iter()
        .position(|&l| l == letter)
        .map_or(0, |p| (p as u32 + 1) * 10)
}

/// Parse a raw subpoint label ("c", "Đ", " e) ") into a canonical letter.
pub fn parse_subpoint(raw: &str) -> Option<char> {
    let trimmed = raw.trim().trim_end_matches(')').trim_end_matches('.');
    let mut chars = trimmed.chars().flat_map(char::to_lowercase);
    let letter = chars.next()?;
    if chars.next().is_some() || !SUBPOINT_LETTERS.contains(&letter) {
        return None;
    }
    Some(letter)
}

/// Fully or partially specified address of a provision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClauseRef {
    pub article: u32,
    pub clause: Option<u32>,
    pub subpoint: Option<char>,
}

impl ClauseRef {
    pub fn new(article: u32, clause: Option<u32>, subpoint: Option<char>) -> Self {
        Self {
            article,
            clause,
            subpoint,
        }
    }

    /// Document-order key, e.g. `006.007.030` for `Điều 6 khoản 7 điểm c`.
    pub fn sort_key(&self) -> String {
        format!(
            "{:03}.{:03}.{:03}",
            self.article,
            self.clause.unwrap_or(0),
            self.subpoint.map_or(0, subpoint_rank)
        )
    }

    fn order_tuple(&self) -> (u32, u32, u32) {
        (
            self.article,
            self.clause.unwrap_or(0),
            self.subpoint.map_or(0, subpoint_rank),
        )
    }
}

impl Ord for ClauseRef {
    fn cmp(&self, other: &Self) -> Ordering {
        self.order_tuple().cmp(&other.order_tuple())
    }
}

impl PartialOrd for ClauseRef {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for ClauseRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Điều {}", self.article)?;
        if let Some(clause) = self.clause {
            write!(f, " khoản {clause}")?;
        }
        if let Some(subpoint) = self.subpoint {
            write!(f, " điểm {subpoint}")?;
        }
        Ok(())
    }
}

/// A citation pattern found in escalation text. `None` matches anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RefPattern {
    pub article: Option<u32>,
    pub clause: Option<u32>,
    pub subpoint: Option<char>,
}

impl RefPattern {
    pub fn new(article: Option<u32>, clause: Option<u32>, subpoint: Option<char>) -> Self {
        Self {
            article,
            clause,
            subpoint,
        }
    }

    /// The single address this pattern matches, when no part is a wildcard.
    pub fn exact(&self) -> Option<ClauseRef> {
        match (self.article, self.clause, self.subpoint) {
            (Some(article), Some(clause), Some(subpoint)) => {
                Some(ClauseRef::new(article, Some(clause), Some(subpoint)))
            }
            _ => None,
        }
    }

    pub fn matches(&self, target: &ClauseRef) -> bool {
        self.article.is_none_or(|a| a == target.article)
            && self.clause.is_none_or(|k| Some(k) == target.clause)
            && self.subpoint.is_none_or(|s| Some(s) == target.subpoint)
    }
}

/// A raw `(khoản, điểm)` pair cited by a clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CrossRef {
    pub clause: Option<u32>,
    pub subpoint: Option<char>,
}
