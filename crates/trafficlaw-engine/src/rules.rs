//! Tuned disambiguation rules, kept as data so they can be reviewed and
//! tested apart from the pipeline that applies them.

use std::ops::RangeInclusive;

use trafficlaw_core::VehicleArticle;
use trafficlaw_core::keywords::tag;

// ── Subject scope ──

/// Articles sanctioning individual road users.
pub const INDIVIDUAL_ARTICLES: RangeInclusive<u32> = 6..=21;

/// Articles from here on sanction organisations.
pub const ORGANIZATION_MIN_ARTICLE: u32 = 30;

/// Articles that apply whatever the vehicle (racing).
pub const CROSS_VEHICLE_ARTICLES: &[u32] = &[35];

/// Query tags that switch off the vehicle-article filter.
pub const CROSS_VEHICLE_TAGS: &[&str] = &[tag::RACING, tag::RACING_SUPPORT];

pub fn is_individual_article(article: u32) -> bool {
    INDIVIDUAL_ARTICLES.contains(&article) || CROSS_VEHICLE_ARTICLES.contains(&article)
}

// ── Content filters used by the selector ──

pub const MOTORCYCLE_TEXT: &[&str] = &["xe mô tô", "xe gắn máy", "xe máy", "mô tô", "xe hai bánh"];

pub const CAR_TEXT: &[&str] = &["xe ô tô", "ô tô", "xe hơi", "xe tải", "xe khách"];

/// Vehicle words a clause must contain to be kept for the vehicle's subject.
pub fn vehicle_text(vehicle: VehicleArticle) -> &'static [&'static str] {
    match vehicle {
        VehicleArticle::Car => CAR_TEXT,
        VehicleArticle::Motorcycle => MOTORCYCLE_TEXT,
    }
}

/// Narrower vehicle words used when a specific tag already picked the clauses.
pub fn strict_vehicle_text(vehicle: VehicleArticle) -> &'static [&'static str] {
    match vehicle {
        VehicleArticle::Car => &["xe ô tô", "ô tô"],
        VehicleArticle::Motorcycle => &["xe mô tô", "mô tô"],
    }
}

pub const LOAD_TEXT: &[&str] = &["tải trọng", "trọng tải", "khối lượng", "quá tải", "quá khổ"];

pub const WRONG_WAY_TEXT: &[&str] = &["ngược chiều"];

pub const BANNED_ROAD_QUERY: &[&str] = &["đường cấm", "khu cấm", "cấm đường"];
pub const BANNED_ROAD_TEXT: &[&str] = &["đường cấm", "khu vực cấm", "cấm đi", "khu cấm"];

pub const TRAFFIC_LIGHT_TEXT: &[&str] = &["đèn tín hiệu", "tín hiệu giao thông", "đèn đỏ"];

pub const PHONE_TEXT: &[&str] = &[
    "điện thoại",
    "thiết bị điện tử",
    "thiết bị phát tín hiệu",
    "thiết bị liên lạc",
    "dùng điện thoại",
];

/// A query naming one of these is about a tunnel.
pub const TUNNEL_QUERY: &[&str] = &["trong hầm", "hầm đường"];

/// Clauses mentioning this are tunnel-specific.
pub const TUNNEL_TEXT: &str = "hầm";

// ── Tag keyword rules ──

/// Scores clauses for one query tag: positive hits minus negative hits.
#[derive(Debug)]
pub struct TagKeywordRule {
    pub tag: &'static str,
    pub positive: &'static [&'static str],
    pub negative: &'static [&'static str],
    /// Clauses for this behaviour rarely name the vehicle.
    pub skip_vehicle_text: bool,
}

pub const TAG_KEYWORD_RULES: &[TagKeywordRule] = &[
    TagKeywordRule {
        tag: tag::RED_LIGHT,
        positive: &[
            "không chấp hành",
            "đèn tín hiệu",
            "tín hiệu giao thông",
            "vượt đèn",
        ],
        negative: &["dừng xe", "đỗ xe", "che khuất", "dải phân cách"],
        skip_vehicle_text: true,
    },
    TagKeywordRule {
        tag: tag::PHONE_USE,
        positive: &[
            "điện thoại",
            "thiết bị điện tử",
            "thiết bị viễn thông",
            "thiết bị liên lạc",
        ],
        negative: &["trẻ em", "ghế", "dây đai", "an toàn cho trẻ"],
        skip_vehicle_text: true,
    },
    TagKeywordRule {
        tag: tag::CARGO_LOAD,
        positive: &["tải trọng", "trọng tải", "khối lượng", "50%", "vượt quá tải"],
        negative: &[],
        skip_vehicle_text: false,
    },
];

pub fn keyword_rule(tag: &str) -> Option<&'static TagKeywordRule> {
    TAG_KEYWORD_RULES.iter().find(|rule| rule.tag == tag)
}

// ── Ranker ──

/// Query wording that pins the clause text, e.g. "no plate" against
/// "wrong plate".
#[derive(Debug)]
pub struct ExactPhraseRule {
    pub triggers: &'static [&'static str],
    pub texts: &'static [&'static str],
}

/// First rule whose trigger occurs in the query applies.
pub const EXACT_PHRASE_RULES: &[ExactPhraseRule] = &[
    ExactPhraseRule {
        triggers: &["không gắn biển số", "không có biển số"],
        texts: &["không gắn biển số"],
    },
    ExactPhraseRule {
        triggers: &["gắn biển số không đúng", "biển số giả"],
        texts: &["gắn biển số không đúng", "không do cơ quan"],
    },
];

/// Equipment article for the vehicle (13 cars, 14 motorcycles).
pub fn equipment_article(vehicle: VehicleArticle) -> u32 {
    match vehicle {
        VehicleArticle::Car => 13,
        VehicleArticle::Motorcycle => 14,
    }
}

/// Most specific first. The first tag present in both query and pool wins.
pub const SPECIFIC_TAG_ORDER: &[&str] = &[
    tag::RACING_SUPPORT,
    tag::LICENSE_NOT_CARRIED,
    tag::NO_LICENSE,
    tag::NO_PLATE,
    tag::RACING,
    tag::NO_REGISTRATION,
];

/// Reckless driving and its accident-causing escalation.
pub const RECKLESS_CLAUSE: u32 = 12;
pub const RECKLESS_ACCIDENT_CLAUSE: u32 = 13;

// ── Concept and rule lookup ──

pub const CONCEPT_CUES: &[&str] = &[
    "là gì",
    "định nghĩa",
    "khái niệm",
    "nghĩa là",
    "ý nghĩa",
    "giải thích",
    "phạm vi",
    "đối tượng áp dụng",
    "hiểu như thế nào",
    "được hiểu là",
    "bao gồm những",
    "gồm những gì",
];

pub const RULE_CUES: &[&str] = &[
    "có phải",
    "phải không",
    "có cần",
    "cần không",
    "có được",
    "được không",
    "có bắt buộc",
    "bắt buộc không",
    "quy định",
    "có quy định",
    "luật có",
    "pháp luật có",
];

/// A rule cue is ignored when the question is about the fine.
pub const PENALTY_CUE: &str = "bị phạt";

/// Removed from the question before key terms are taken.
pub const CUE_PHRASES: &[&str] = &[
    "là gì",
    "định nghĩa",
    "khái niệm",
    "giải thích",
    "có phải",
    "phải không",
];

pub const CONCEPT_STOPWORDS: &[&str] = &["phải", "không", "được", "có", "cần", "bắt", "buộc"];

pub const SEATBELT_TEXT: &[&str] = &["thắt dây", "dây đai an toàn"];

/// Article of the road traffic law holding the general driving rules.
pub const GENERAL_RULES_ARTICLE: u32 = 10;

/// Sources that are statutes rather than the sanctions decree.
pub const STATUTE_SOURCES: &[&str] = &["luat_ttatgtdb", "luat_duong_bo"];

/// Definition articles of the statutes.
pub const DEFINITION_ARTICLES: &[u32] = &[2, 3];

pub fn source_title(source: &str) -> &'static str {
    match source {
        "luat_ttatgtdb" => "Luật TTATGTĐB 2024",
        "luat_duong_bo" => "Luật Đường bộ 2024",
        "nd168" => "Nghị định 168/2024/NĐ-CP",
        _ => "Văn bản",
    }
}

// ── Query variations ──

/// Alternative wordings tried when the original question finds nothing.
pub const SYNONYMS: &[(&str, &[&str])] = &[
    ("vượt đèn đỏ", &["vượt tín hiệu", "không dừng đèn đỏ"]),
    ("không đội mũ", &["không đội nón", "không đội helmet"]),
    ("nồng độ cồn", &["uống rượu lái xe", "cồn vượt mức"]),
    ("lấn làn", &["đi sai làn", "đi nhầm làn"]),
    ("đi ngược chiều", &["chạy ngược chiều", "lưu thông ngược chiều"]),
];
