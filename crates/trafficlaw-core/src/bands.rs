//! Fixed lookup tables from Nghị định 168/2024: driving-licence point
//! deductions, licence suspension lengths, and speed bands.
//!
//! Article 6 covers cars, article 7 motorcycles. Rules are listed from the
//! heaviest band down and the first match wins.

use crate::analyzer::VehicleArticle;
use crate::record::Suspension;
use crate::reference::ClauseRef;

use Subpoints::{Any, Only};

#[derive(Debug, Clone, Copy)]
enum Subpoints {
    Any,
    Only(&'static [char]),
}

#[derive(Debug, Clone, Copy)]
struct PointRule {
    article: u32,
    clause: u32,
    subpoints: Subpoints,
    points: u8,
}

const fn pts(article: u32, clause: u32, subpoints: Subpoints, points: u8) -> PointRule {
    PointRule {
        article,
        clause,
        subpoints,
        points,
    }
}

/// The only deductions the decree uses.
pub const POINT_BANDS: &[u8] = &[2, 4, 6, 10];

const POINT_RULES: &[PointRule] = &[
    // Article 6
    pts(6, 9, Only(&['a']), 10),
    pts(6, 10, Any, 10),
    pts(6, 11, Only(&['đ']), 10),
    pts(6, 5, Only(&['p']), 6),
    pts(6, 7, Only(&['a', 'c']), 6),
    pts(6, 8, Any, 6),
    pts(6, 5, Only(&['h']), 4),
    pts(6, 6, Any, 4),
    pts(6, 7, Only(&['b']), 4),
    pts(6, 9, Only(&['b', 'c', 'd']), 4),
    pts(6, 3, Only(&['h', 'i']), 2),
    pts(6, 4, Only(&['a', 'b', 'c', 'd', 'đ', 'g']), 2),
    pts(
        6,
        5,
        Only(&['a', 'b', 'c', 'd', 'đ', 'e', 'g', 'i', 'k', 'n', 'o']),
        2,
    ),
    // Article 7
    pts(7, 8, Only(&['b']), 10),
    pts(7, 10, Any, 10),
    pts(7, 7, Only(&['b']), 6),
    pts(7, 9, Only(&['c']), 6),
    pts(7, 4, Only(&['đ']), 4),
    pts(7, 6, Only(&['a']), 4),
    pts(7, 7, Only(&['c', 'd', 'đ']), 4),
    pts(7, 8, Only(&['a']), 4),
    pts(7, 3, Only(&['b']), 2),
    pts(7, 5, Any, 2),
    pts(7, 6, Only(&['b', 'c', 'd']), 2),
];

/// (article, clause, min months, max months)
const SUSPENSION_RULES: &[(u32, u32, u8, u8)] = &[
    (6, 5, 1, 3),
    (6, 6, 2, 4),
    (6, 7, 2, 4),
    (6, 8, 3, 5),
    (6, 9, 4, 6),
    (6, 10, 5, 7),
    (6, 11, 6, 8),
    (7, 4, 1, 3),
    (7, 5, 1, 3),
    (7, 6, 2, 4),
    (7, 7, 2, 4),
    (7, 8, 3, 5),
    (7, 9, 4, 6),
    (7, 10, 5, 7),
    (7, 11, 22, 24),
];

/// Clause that escalates a speeding violation once it causes an accident.
pub const SPEEDING_ACCIDENT_CLAUSE: u32 = 10;

/// Points deducted from the driving licence for a provision, if any.
pub fn point_deduction(reference: &ClauseRef) -> Option<u8> {
    let clause = reference.clause?;
    POINT_RULES
        .iter()
        .find(|rule| {
            rule.article == reference.article
                && rule.clause == clause
                && match rule.subpoints {
                    Any => true,
                    Only(letters) => reference.subpoint.is_some_and(|s| letters.contains(&s)),
                }
        })
        .map(|rule| rule.points)
}

/// Licence suspension attached to a clause, if any.
pub fn license_suspension(reference: &ClauseRef) -> Option<Suspension> {
    let clause = reference.clause?;
    SUSPENSION_RULES
        .iter()
        .find(|(article, k, _, _)| *article == reference.article && *k == clause)
        .map(|&(_, _, min_months, max_months)| Suspension {
            min_months,
            max_months,
        })
}

/// Clause of the vehicle article that punishes exceeding the limit by `speed_kmh`.
pub fn speed_band_clause(vehicle: VehicleArticle, speed_kmh: u32, has_accident: bool) -> u32 {
    if has_accident {
        return SPEEDING_ACCIDENT_CLAUSE;
    }
    match vehicle {
        VehicleArticle::Car => match speed_kmh {
            0..=10 => 4,
            11..=20 => 5,
            21..=35 => 6,
            _ => 7,
        },
        VehicleArticle::Motorcycle => match speed_kmh {
            0..=20 => 4,
            _ => 8,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn r(article: u32, clause: u32, subpoint: Option<char>) -> ClauseRef {
        ClauseRef::new(article, Some(clause), subpoint)
    }

    #[test]
    fn car_point_bands() {
        assert_eq!(point_deduction(&r(6, 9, Some('a'))), Some(10));
        assert_eq!(point_deduction(&r(6, 10, Some('b'))), Some(10));
        assert_eq!(point_deduction(&r(6, 11, Some('đ'))), Some(10));
        assert_eq!(point_deduction(&r(6, 7, Some('c'))), Some(6));
        assert_eq!(point_deduction(&r(6, 8, None)), Some(6));
        assert_eq!(point_deduction(&r(6, 5, Some('h'))), Some(4));
        assert_eq!(point_deduction(&r(6, 6, Some('a'))), Some(4));
        assert_eq!(point_deduction(&r(6, 9, Some('d'))), Some(4));
        assert_eq!(point_deduction(&r(6, 4, Some('đ'))), Some(2));
        assert_eq!(point_deduction(&r(6, 5, Some('o'))), Some(2));
    }

    #[test]
    fn motorcycle_point_bands() {
        assert_eq!(point_deduction(&r(7, 8, Some('b'))), Some(10));
        assert_eq!(point_deduction(&r(7, 10, None)), Some(10));
        assert_eq!(point_deduction(&r(7, 9, Some('c'))), Some(6));
        assert_eq!(point_deduction(&r(7, 7, Some('đ'))), Some(4));
        assert_eq!(point_deduction(&r(7, 8, Some('a'))), Some(4));
        assert_eq!(point_deduction(&r(7, 5, Some('x'))), Some(2));
        assert_eq!(point_deduction(&r(7, 6, Some('d'))), Some(2));
    }

    #[test]
    fn unlisted_provisions_have_no_points() {
        assert_eq!(point_deduction(&r(6, 5, Some('l'))), None);
        assert_eq!(point_deduction(&r(6, 7, None)), None);
        assert_eq!(point_deduction(&r(13, 3, Some('a'))), None);
        assert_eq!(point_deduction(&ClauseRef::new(6, None, None)), None);
    }

    #[test]
    fn suspension_tables() {
        let s = license_suspension(&r(6, 10, Some('a'))).unwrap();
        assert_eq!((s.min_months, s.max_months), (5, 7));
        let s = license_suspension(&r(7, 11, None)).unwrap();
        assert_eq!((s.min_months, s.max_months), (22, 24));
        let s = license_suspension(&r(7, 4, Some('a'))).unwrap();
        assert_eq!((s.min_months, s.max_months), (1, 3));
        assert!(license_suspension(&r(6, 4, Some('a'))).is_none());
        assert!(license_suspension(&r(18, 5, None)).is_none());
    }

    #[test]
    fn car_speed_bands() {
        assert_eq!(speed_band_clause(VehicleArticle::Car, 8, false), 4);
        assert_eq!(speed_band_clause(VehicleArticle::Car, 10, false), 4);
        assert_eq!(speed_band_clause(VehicleArticle::Car, 15, false), 5);
        assert_eq!(speed_band_clause(VehicleArticle::Car, 25, false), 6);
        assert_eq!(speed_band_clause(VehicleArticle::Car, 35, false), 6);
        assert_eq!(speed_band_clause(VehicleArticle::Car, 40, false), 7);
    }

    #[test]
    fn motorcycle_speed_bands() {
        assert_eq!(speed_band_clause(VehicleArticle::Motorcycle, 20, false), 4);
        assert_eq!(speed_band_clause(VehicleArticle::Motorcycle, 21, false), 8);
    }

    #[test]
    fn accident_always_escalates_speeding() {
        for vehicle in [VehicleArticle::Car, VehicleArticle::Motorcycle] {
            for speed in [0, 5, 25, 60, 120] {
                assert_eq!(speed_band_clause(vehicle, speed, true), 10);
            }
        }
    }
}
