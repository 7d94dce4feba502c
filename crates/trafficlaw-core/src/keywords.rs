//! Static Vietnamese lexicon shared by the corpus loader and the query analyzer.
//!
//! All phrases are lower-case; callers match them against lower-cased text.

/// Behavior tags referenced by name in selection and ranking logic.
pub mod tag {
    pub const RED_LIGHT: &str = "red-light";
    pub const WRONG_WAY: &str = "wrong-way";
    pub const SPEEDING: &str = "speeding";
    pub const NO_HELMET: &str = "no-helmet";
    pub const PHONE_USE: &str = "phone-use";
    pub const NO_LICENSE: &str = "no-license";
    pub const ACCIDENT: &str = "accident";
    pub const CARGO_LOAD: &str = "cargo-load";
    pub const NO_PLATE: &str = "no-plate";
    pub const NO_REGISTRATION: &str = "no-registration";
    pub const SEATBELT: &str = "seatbelt";
    pub const LICENSE_NOT_CARRIED: &str = "license-not-carried";
    pub const TUNNEL: &str = "tunnel";
    pub const COMMERCIAL_TRANSPORT: &str = "commercial-transport";
    pub const RACING: &str = "racing";
    pub const RACING_SUPPORT: &str = "racing-support";
    pub const ENGINE_SMALL: &str = "engine-125cc-or-less";
    pub const ENGINE_LARGE: &str = "engine-over-125cc";
}

/// One behavior tag and the phrases that signal it.
#[derive(Debug, Clone, Copy)]
pub struct TagPhrases {
    pub tag: &'static str,
    pub phrases: &'static [&'static str],
}

const fn t(tag: &'static str, phrases: &'static [&'static str]) -> TagPhrases {
    TagPhrases { tag, phrases }
}

/// Tag dictionary used for both corpus enrichment and query analysis.
pub const BEHAVIOR_TAGS: &[TagPhrases] = &[
    t(
        tag::RED_LIGHT,
        &[
            "vượt đèn",
            "vượt đèn đỏ",
            "không chấp hành hiệu lệnh của đèn",
            "không chấp hành tín hiệu đèn",
            "không dừng đèn đỏ",
            "đèn tín hiệu",
            "đèn giao thông",
            "đèn đỏ",
            "đèn vàng",
            "đi thẳng khi đèn đỏ",
            "tín hiệu đèn giao thông",
        ],
    ),
    t(
        "turning",
        &["rẽ phải", "rẽ trái", "quay đầu xe", "quay đầu", "chuyển hướng"],
    ),
    t(
        "lane-marking",
        &["cán vạch", "vạch phân làn", "vạch kẻ đường", "cán lên vạch"],
    ),
    t("lane-change", &["chuyển làn", "đổi làn", "sang làn"]),
    t(
        tag::WRONG_WAY,
        &[
            "lấn làn",
            "đi ngược chiều",
            "vượt ẩu",
            "đi không đúng làn",
            "đường ngược chiều",
            "ngược chiều",
            "đi vào đường ngược chiều",
        ],
    ),
    t(
        tag::SPEEDING,
        &[
            "quá tốc độ",
            "vượt tốc độ",
            "chạy quá tốc độ",
            "chạy nhanh hơn",
            "đi nhanh hơn",
        ],
    ),
    t(
        tag::NO_HELMET,
        &[
            "không đội mũ",
            "mũ bảo hiểm",
            "không đội nón",
            "chỉ có một mũ",
            "thiếu mũ",
        ],
    ),
    t(
        "illegal-stopping",
        &[
            "dừng xe",
            "đỗ xe",
            "đậu xe sai quy định",
            "làn khẩn cấp",
            "dải dừng khẩn cấp",
            "chắn cửa nhà",
        ],
    ),
    t(
        "restricted-zone",
        &[
            "khu vực cấm",
            "nơi cấm dừng",
            "nơi cấm đỗ",
            "đường cấm",
            "đi vào đường cấm",
            "cấm đường",
            "khu vực hạn chế",
            "làn buýt",
            "brt",
        ],
    ),
    t(
        tag::PHONE_USE,
        &[
            "điện thoại",
            "nghe điện thoại",
            "dùng điện thoại",
            "sử dụng điện thoại",
            "thiết bị điện tử",
            "laptop",
            "máy tính bảng",
        ],
    ),
    t(
        "no-lights",
        &[
            "không bật đèn",
            "không bật xi-nhan",
            "không có đèn",
            "không sử dụng đèn",
        ],
    ),
    t(
        "high-beam",
        &["đèn pha", "đèn chiếu xa", "đèn chiếu sáng gây chói"],
    ),
    t(
        "door-opening",
        &["mở cửa xe", "mở cửa ô tô", "để cửa xe mở"],
    ),
    t(
        "overcapacity",
        &[
            "chở quá người",
            "quá số người",
            "vượt quá số lượng",
            "tống 3",
            "tống ba",
            "chở 3",
            "chở ba người",
            "đi 3 người",
            "đi ba người",
            "chở quá số người",
            "vượt quá số người",
            "chở quá",
        ],
    ),
    t(
        tag::NO_LICENSE,
        &[
            "không có giấy phép lái xe",
            "không có bằng lái",
            "giấy phép giả",
            "bằng lái hết hạn",
            "giấy phép lái xe giả",
            "giấy phép lái xe hết hạn",
        ],
    ),
    t(
        tag::ACCIDENT,
        &[
            "gây tai nạn",
            "tai nạn giao thông",
            "va chạm gây thương tích",
            "đâm người",
            "đâm phải",
            "tông người",
            "va chạm",
            "đụng người",
        ],
    ),
    t(
        "alcohol",
        &[
            "nồng độ cồn",
            "uống rượu",
            "uống bia",
            "say rượu",
            "có cồn",
            "mg/l",
            "mg/100ml",
        ],
    ),
    t(
        "reckless-weaving",
        &["lạng lách", "đánh võng", "drift", "biểu diễn"],
    ),
    t(
        "wheelie",
        &[
            "bốc đầu",
            "chạy bằng một bánh",
            "nâng bánh trước",
            "wheelie",
            "chạy một bánh",
        ],
    ),
    t(
        "failure-to-yield",
        &[
            "không nhường đường",
            "cản trở xe ưu tiên",
            "không giảm tốc",
            "biển nhường đường",
        ],
    ),
    t(
        "improper-overtaking",
        &["vượt xe", "vượt bên phải", "vượt không đúng"],
    ),
    t(
        "noise",
        &["cầm máy", "không tắt máy", "để máy nổ", "còi", "rú ga", "nẹt pô"],
    ),
    t(
        "expressway",
        &[
            "cao tốc",
            "đường cao tốc",
            "làn khẩn cấp",
            "dải khẩn cấp",
            "làn dừng khẩn cấp",
        ],
    ),
    t(
        tag::CARGO_LOAD,
        &[
            "chở hàng",
            "quá tải",
            "chở quá khổ",
            "vượt quá tải trọng",
            "tải trọng",
            "trọng tải",
            "vượt trọng tải",
            "tụt bạt",
            "rơi vãi",
            "không phủ bạt",
        ],
    ),
    t(
        "dangerous-handling",
        &[
            "buông cả hai tay",
            "dùng chân điều khiển",
            "ngồi về một bên",
            "nằm trên yên",
            "thay người điều khiển",
            "quay người về phía sau",
            "bịt mắt điều khiển",
            "buông tay",
            "không cầm tay lái",
            "điều khiển bằng chân",
        ],
    ),
    t(
        tag::NO_PLATE,
        &[
            "không gắn biển số",
            "biển số xe",
            "biển kiểm soát",
            "không có biển số",
            "gắn biển số không đúng",
            "che biển số",
            "che mờ biển số",
            "che mờ",
        ],
    ),
    t(
        "missing-equipment",
        &[
            "gương chiếu hậu",
            "camera hành trình",
            "thiết bị giám sát hành trình",
            "bình chữa cháy",
            "thiết bị bắt buộc",
        ],
    ),
    t(
        tag::NO_REGISTRATION,
        &[
            "không mang giấy",
            "giấy chứng nhận",
            "chứng nhận đăng ký",
            "không có giấy tờ",
            "đăng ký xe",
        ],
    ),
    t(
        tag::SEATBELT,
        &[
            "không thắt dây an toàn",
            "không thắt dây đai",
            "không cài dây an toàn",
            "không cài dây đai",
            "không đeo dây an toàn",
            "không sử dụng dây an toàn",
            "không mang dây an toàn",
            "ghế an toàn",
            "ghế trẻ em",
            "khách không thắt dây",
        ],
    ),
    t(
        tag::LICENSE_NOT_CARRIED,
        &[
            "không mang theo giấy phép lái xe",
            "không mang theo bằng lái",
            "không mang giấy phép",
            "không mang bằng lái",
        ],
    ),
    t(
        "towing",
        &[
            "kéo xe",
            "kéo rơ moóc",
            "kéo theo xe khác",
            "kéo theo người",
            "ván trượt",
        ],
    ),
    t(
        "riding-abreast",
        &["dàn hàng ngang", "chạy dàn hàng", "đi song song", "đi thành đoàn"],
    ),
    t(tag::TUNNEL, &["chạy trong hầm", "hầm đường bộ"]),
    t(
        "toll",
        &["không thu phí", "không dừng thu phí", "thu phí điện tử"],
    ),
    t(
        "railway",
        &["đường sắt", "rào chắn", "giao cắt đường sắt"],
    ),
    t(
        "priority-signal",
        &[
            "đèn ưu tiên",
            "thiết bị ưu tiên",
            "thiết bị phát tín hiệu ưu tiên",
        ],
    ),
    t(
        "emissions",
        &["khói đen", "khí thải vượt chuẩn", "khí thải", "giảm khói"],
    ),
    t(
        tag::COMMERCIAL_TRANSPORT,
        &[
            "vận tải",
            "kinh doanh vận tải",
            "hoạt động vận tải",
            "đồng hồ tính tiền",
            "giám sát hành trình",
            "camera hành trình",
        ],
    ),
    t(
        "repeat-offence",
        &["tái phạm", "vi phạm lần 2", "vi phạm lại"],
    ),
    t(
        tag::RACING,
        &["đua xe", "đua xe trái phép", "chạy đua", "đua tốc độ"],
    ),
    t(
        tag::RACING_SUPPORT,
        &[
            "cổ vũ đua xe",
            "tụ tập đua xe",
            "cổ vũ",
            "tụ tập để cổ vũ",
            "giúp sức đua xe",
            "xúi giục đua xe",
        ],
    ),
];

/// Slugs used by older corpus exports, mapped to current tag names.
pub const LEGACY_TAG_ALIASES: &[(&str, &str)] = &[
    ("den_tin_hieu", tag::RED_LIGHT),
    ("re_phai", "turning"),
    ("can_vach", "lane-marking"),
    ("chuyen_lan", "lane-change"),
    ("luot_trai_pha_cam", tag::WRONG_WAY),
    ("qua_toc_do", tag::SPEEDING),
    ("khong_doi_mu", tag::NO_HELMET),
    ("dung_do_sai", "illegal-stopping"),
    ("chay_khu_cam", "restricted-zone"),
    ("dien_thoai", tag::PHONE_USE),
    ("khong_bat_den", "no-lights"),
    ("den_pha", "high-beam"),
    ("mo_cua", "door-opening"),
    ("cho_qua_nguoi", "overcapacity"),
    ("khong_bang_lai", tag::NO_LICENSE),
    ("gay_tai_nan", tag::ACCIDENT),
    ("uong_ruou_bia", "alcohol"),
    ("lang_lach", "reckless-weaving"),
    ("boc_dau", "wheelie"),
    ("khong_nhuong_duong", "failure-to-yield"),
    ("vuot_xe_sai", "improper-overtaking"),
    ("tram_cam", "noise"),
    ("cao_toc", "expressway"),
    ("cho_hang", tag::CARGO_LOAD),
    ("dieu_khien_nguy_hiem", "dangerous-handling"),
    ("khong_bien_so", tag::NO_PLATE),
    ("thiet_bi", "missing-equipment"),
    ("khong_giay_to", tag::NO_REGISTRATION),
    ("day_an_toan", tag::SEATBELT),
    ("khong_day_an_toan", tag::SEATBELT),
    ("khong_mang_bang_lai", tag::LICENSE_NOT_CARRIED),
    ("keo_xe", "towing"),
    ("dan_hang_ngang", "riding-abreast"),
    ("chay_trong_ham", tag::TUNNEL),
    ("khong_thu_phi", "toll"),
    ("duong_sat", "railway"),
    ("den_uu_tien", "priority-signal"),
    ("moi_truong", "emissions"),
    ("van_tai", tag::COMMERCIAL_TRANSPORT),
    ("tai_pham", "repeat-offence"),
    ("dua_xe", tag::RACING),
    ("co_vu_dua_xe", tag::RACING_SUPPORT),
];

/// Phrases meaning a traffic accident happened.
pub const ACCIDENT_INDICATORS: &[&str] = &[
    "gây tai nạn",
    "làm chết người",
    "gây thương tích",
    "tai nạn giao thông",
    "đâm",
    "tông",
    "va chạm",
    "đụng",
];

pub const ORGANIZATION_MARKERS: &[&str] =
    &["tổ chức", "doanh nghiệp", "công ty", "cơ sở", "đơn vị"];

pub const LOAD_MARKERS: &[&str] = &["tải trọng", "trọng tải", "quá tải", "vượt tải"];

// ── Vehicle detection, checked in this order ──

pub const HELMET_PHRASES: &[&str] = &[
    "mũ bảo hiểm",
    "không đội mũ",
    "không đội nón",
    "không đội mũ bảo hiểm",
];

pub const SEATBELT_PHRASES: &[&str] = &[
    "dây an toàn",
    "dây đai an toàn",
    "cài dây an toàn",
    "không thắt dây an toàn",
    "không cài dây an toàn",
];

pub const MOTORCYCLE_PHRASES: &[&str] = &["xe mô tô", "xe máy", "mô tô", "xe gắn máy"];

pub const CAR_PHRASES: &[&str] = &["xe ô tô", "ô tô", "xe hơi"];

/// Canonical tag for a raw corpus label.
///
/// Legacy slugs are mapped through [`LEGACY_TAG_ALIASES`]; anything else is
/// lower-cased with underscores turned into hyphens.
pub fn canonical_tag(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase();
    LEGACY_TAG_ALIASES
        .iter()
        .find(|(legacy, _)| *legacy == lowered)
        .map_or_else(|| lowered.replace('_', "-"), |(_, tag)| (*tag).to_string())
}

pub fn contains_any(text: &str, phrases: &[&str]) -> bool {
    phrases.iter().any(|p| text.contains(p))
}
