//! Query analysis: turns a free-text question into structured signals.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::bands::speed_band_clause;
use crate::extract::{derive_tags, has_accident_indicator};
use crate::keywords::{
    CAR_PHRASES, HELMET_PHRASES, LOAD_MARKERS, MOTORCYCLE_PHRASES, ORGANIZATION_MARKERS,
    SEATBELT_PHRASES, contains_any, tag,
};

/// Decree article that governs the vehicle being driven.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VehicleArticle {
    /// Article 6: cars and car-like vehicles.
    #[default]
    Car,
    /// Article 7: motorcycles and mopeds.
    Motorcycle,
}

impl VehicleArticle {
    pub fn article(self) -> u32 {
        match self {
            Self::Car => 6,
            Self::Motorcycle => 7,
        }
    }
}

/// Engine displacement bucket stated in the query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EngineSize {
    UpTo125cc,
    Over125cc,
}

impl EngineSize {
    pub const SMALL_LIMIT_CC: u32 = 125;

    pub fn from_cc(cc: u32) -> Self {
        if cc <= Self::SMALL_LIMIT_CC {
            Self::UpTo125cc
        } else {
            Self::Over125cc
        }
    }

    /// Corpus tag carried by clauses specific to this bucket.
    pub fn tag(self) -> &'static str {
        match self {
            Self::UpTo125cc => tag::ENGINE_SMALL,
            Self::Over125cc => tag::ENGINE_LARGE,
        }
    }
}

/// Everything the selector and ranker need to know about one query.
#[derive(Debug, Clone, Default, Serialize)]
pub struct QuerySignals {
    pub lowered: String,
    pub behavior_tags: BTreeSet<String>,
    pub vehicle: VehicleArticle,
    pub speed_kmh: Option<u32>,
    pub has_accident: bool,
    pub is_organization: bool,
    pub engine_size: Option<EngineSize>,
    pub target_clause: Option<u32>,
    pub is_load_query: bool,
}

impl QuerySignals {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.behavior_tags.contains(tag)
    }

    pub fn mentions(&self, phrase: &str) -> bool {
        self.lowered.contains(phrase)
    }

    pub fn mentions_any(&self, phrases: &[&str]) -> bool {
        contains_any(&self.lowered, phrases)
    }
}

static SPEED_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"quá tốc độ\s+(\d+)\s*km",
        r"vượt tốc độ\s+(\d+)\s*km",
        r"chạy quá tốc\s*(?:độ)?\s+(\d+)\s*km",
        r"tốc độ\s+(\d+)\s*km",
        r"nhanh hơn(?:\s+quy định)?\s+(\d+)\s*km",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("speed regex is valid"))
    .collect()
});

static ENGINE_CC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\s*cc").expect("engine cc regex is valid"));

/// Analyze a query. Pure; the same input always yields the same signals.
pub fn analyze(query: &str) -> QuerySignals {
    let lowered = query.trim().to_lowercase();

    let mut behavior_tags = derive_tags(&lowered);
    // An individual who left the licence at home is judged as having none.
    if behavior_tags.contains(tag::LICENSE_NOT_CARRIED)
        && !behavior_tags.contains(tag::COMMERCIAL_TRANSPORT)
    {
        behavior_tags.insert(tag::NO_LICENSE.to_string());
    }

    let vehicle = detect_vehicle(&lowered);
    let speed_kmh = extract_speed(&lowered);
    let has_accident = has_accident_indicator(&lowered);
    let engine_size = ENGINE_CC
        .captures(&lowered)
        .and_then(|caps| caps[1].parse::<u32>().ok())
        .map(EngineSize::from_cc);
    let target_clause = speed_kmh
        .filter(|_| behavior_tags.contains(tag::SPEEDING))
        .map(|speed| speed_band_clause(vehicle, speed, has_accident));

    QuerySignals {
        behavior_tags,
        vehicle,
        speed_kmh,
        has_accident,
        is_organization: contains_any(&lowered, ORGANIZATION_MARKERS),
        engine_size,
        target_clause,
        is_load_query: contains_any(&lowered, LOAD_MARKERS),
        lowered,
    }
}

/// Helmet wording implies a motorcycle and seatbelt wording a car, before any
/// explicit vehicle name is considered.
pub fn detect_vehicle(lowered: &str) -> VehicleArticle {
    if contains_any(lowered, HELMET_PHRASES) {
        VehicleArticle::Motorcycle
    } else if contains_any(lowered, SEATBELT_PHRASES) {
        VehicleArticle::Car
    } else if contains_any(lowered, MOTORCYCLE_PHRASES) {
        VehicleArticle::Motorcycle
    } else if contains_any(lowered, CAR_PHRASES) {
        VehicleArticle::Car
    } else {
        VehicleArticle::default()
    }
}

pub fn extract_speed(lowered: &str) -> Option<u32> {
    SPEED_PATTERNS
        .iter()
        .find_map(|re| re.captures(lowered))
        .and_then(|caps| caps[1].parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn motorcycle_red_light() {
        let s = analyze("Xe máy vượt đèn đỏ bị phạt bao nhiêu?");
        assert!(s.has_tag(tag::RED_LIGHT));
        assert_eq!(s.vehicle, VehicleArticle::Motorcycle);
        assert!(!s.has_accident);
        assert!(!s.is_organization);
        assert_eq!(s.target_clause, None);
    }

    #[test]
    fn helmet_implies_motorcycle() {
        assert_eq!(detect_vehicle("không đội mũ bảo hiểm"), VehicleArticle::Motorcycle);
    }

    #[test]
    fn seatbelt_implies_car_even_with_motorcycle_words() {
        assert_eq!(
            detect_vehicle("người ngồi sau xe máy hỏi về dây an toàn"),
            VehicleArticle::Car
        );
    }

    #[test]
    fn default_vehicle_is_car() {
        assert_eq!(detect_vehicle("vượt đèn đỏ"), VehicleArticle::Car);
    }

    #[test]
    fn speed_target_for_car() {
        let s = analyze("Ô tô chạy quá tốc độ 25 km/h bị phạt gì");
        assert_eq!(s.speed_kmh, Some(25));
        assert_eq!(s.target_clause, Some(6));
    }

    #[test]
    fn speed_target_with_accident() {
        let s = analyze("xe máy vượt tốc độ 15 km/h gây tai nạn");
        assert_eq!(s.vehicle, VehicleArticle::Motorcycle);
        assert!(s.has_accident);
        assert_eq!(s.target_clause, Some(10));
    }

    #[test]
    fn speed_without_speeding_tag_sets_no_target() {
        let s = analyze("đường giới hạn tốc độ 60 km");
        assert_eq!(s.speed_kmh, Some(60));
        assert_eq!(s.target_clause, None);
    }

    #[test]
    fn organization_and_load() {
        let s = analyze("Công ty vận tải chở hàng vượt quá tải trọng");
        assert!(s.is_organization);
        assert!(s.is_load_query);
        assert!(s.has_tag(tag::CARGO_LOAD));
    }

    #[test]
    fn engine_size_bucket() {
        assert_eq!(analyze("xe 110cc").engine_size, Some(EngineSize::UpTo125cc));
        assert_eq!(analyze("xe 150 cc").engine_size, Some(EngineSize::Over125cc));
        assert_eq!(analyze("xe máy").engine_size, None);
    }

    #[test]
    fn not_carrying_licence_implies_no_licence() {
        let s = analyze("lái ô tô không mang theo giấy phép lái xe");
        assert!(s.has_tag(tag::LICENSE_NOT_CARRIED));
        assert!(s.has_tag(tag::NO_LICENSE));

        let s = analyze("tài xế kinh doanh vận tải không mang theo giấy phép lái xe");
        assert!(!s.has_tag(tag::NO_LICENSE));
    }

    #[test]
    fn empty_query_has_no_signals() {
        let s = analyze("   ");
        assert!(s.behavior_tags.is_empty());
        assert_eq!(s.vehicle, VehicleArticle::Car);
        assert_eq!(s.speed_kmh, None);
    }

    #[test]
    fn analysis_is_deterministic() {
        let q = "Ô tô vượt đèn đỏ gây tai nạn";
        let a = analyze(q);
        let b = analyze(q);
        assert_eq!(a.behavior_tags, b.behavior_tags);
        assert_eq!(a.vehicle, b.vehicle);
        assert_eq!(a.has_accident, b.has_accident);
    }
}
