use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::{dated, sanitize};
use crate::config::Language;

/// Camera and OS default prefixes that say nothing about the picture.
const GENERIC_PREFIXES: &[&str] = &["screenshot", "image", "photo", "img", "pic"];

/// Coarse size class used when the original filename is not worth keeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeBucket {
    Small,
    Medium,
    Large,
    XLarge,
}

impl SizeBucket {
    pub fn from_bytes(size_bytes: u64) -> Self {
        let mib = size_bytes as f64 / (1024.0 * 1024.0);
        if mib < 0.5 {
            Self::Small
        } else if mib < 2.0 {
            Self::Medium
        } else if mib < 5.0 {
            Self::Large
        } else {
            Self::XLarge
        }
    }

    pub fn label(self, language: Language) -> &'static str {
        match (self, language) {
            (Self::Small, Language::En) => "small",
            (Self::Medium, Language::En) => "medium",
            (Self::Large, Language::En) => "large",
            (Self::XLarge, Language::En) => "xlarge",
            (Self::Small, Language::Zh) => "小",
            (Self::Medium, Language::Zh) => "中",
            (Self::Large, Language::Zh) => "大",
            (Self::XLarge, Language::Zh) => "超大",
        }
    }
}

/// Whether a file stem is a camera/OS default such as `IMG_0001`,
/// `photo-12` or `Screenshot 2024-01-01`.
///
/// A generic prefix only counts when a number follows it (after optional
/// `_`, `-` or space separators); a bare `photo` is a real name.
pub fn is_generic_stem(stem: &str) -> bool {
    let lower = stem.to_lowercase();
    GENERIC_PREFIXES.iter().any(|prefix| {
        lower
            .strip_prefix(prefix)
            .map(|rest| {
                rest.trim_start_matches(['_', '-', ' '])
                    .starts_with(|c: char| c.is_ascii_digit())
            })
            .unwrap_or(false)
    })
}

/// Drop a leading `YYYY-MM-DD_` left by a previous run.
pub fn strip_date_prefix(stem: &str) -> &str {
    let b = stem.as_bytes();
    let dated = b.len() > 11
        && b[..4].iter().all(u8::is_ascii_digit)
        && b[4] == b'-'
        && b[5..7].iter().all(u8::is_ascii_digit)
        && b[7] == b'-'
        && b[8..10].iter().all(u8::is_ascii_digit)
        && b[10] == b'_';
    if dated { &stem[11..] } else { stem }
}

/// Name an image from its filename and size alone, without any network call.
///
/// The original stem is kept (sanitized) when it is longer than three
/// characters and not a generic camera name; otherwise the name is built
/// from the size bucket, e.g. `xlarge_image` or `超大_图像`. The result is
/// always date-prefixed.
pub fn offline_name(
    path: &Path,
    size_bytes: u64,
    language: Language,
    now: &DateTime<Local>,
) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = strip_date_prefix(&stem);

    let cleaned = sanitize(stem, language);
    let body = if cleaned.chars().count() > 3 && !is_generic_stem(stem) {
        cleaned
    } else {
        let noun = match language {
            Language::En => "image",
            Language::Zh => "图像",
        };
        format!("{}_{noun}", SizeBucket::from_bytes(size_bytes).label(language))
    };

    dated(&body, now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const MIB: u64 = 1024 * 1024;

    fn now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap()
    }

    // ── SizeBucket ───────────────────────────────────────────────────

    #[test]
    fn bucket_boundaries() {
        assert_eq!(SizeBucket::from_bytes(0), SizeBucket::Small);
        assert_eq!(SizeBucket::from_bytes(MIB / 2 - 1), SizeBucket::Small);
        assert_eq!(SizeBucket::from_bytes(MIB / 2), SizeBucket::Medium);
        assert_eq!(SizeBucket::from_bytes(2 * MIB - 1), SizeBucket::Medium);
        assert_eq!(SizeBucket::from_bytes(2 * MIB), SizeBucket::Large);
        assert_eq!(SizeBucket::from_bytes(5 * MIB), SizeBucket::XLarge);
    }

    #[test]
    fn bucket_labels() {
        assert_eq!(SizeBucket::Large.label(Language::En), "large");
        assert_eq!(SizeBucket::XLarge.label(Language::Zh), "超大");
    }

    // ── is_generic_stem ──────────────────────────────────────────────

    #[test]
    fn generic_stems() {
        assert!(is_generic_stem("IMG_0001"));
        assert!(is_generic_stem("img0001"));
        assert!(is_generic_stem("Screenshot 2024-01-01 at 10.00.00"));
        assert!(is_generic_stem("photo-12"));
        assert!(is_generic_stem("PIC_9"));
        assert!(is_generic_stem("image_20240101120000"));
    }

    #[test]
    fn non_generic_stems() {
        assert!(!is_generic_stem("photo"));
        assert!(!is_generic_stem("picnic_in_park"));
        assert!(!is_generic_stem("beach_sunset"));
        assert!(!is_generic_stem("imagine"));
    }

    // ── strip_date_prefix ────────────────────────────────────────────

    #[test]
    fn strips_only_well_formed_dates() {
        assert_eq!(strip_date_prefix("2024-05-06_cat"), "cat");
        assert_eq!(strip_date_prefix("2024-05-06"), "2024-05-06");
        assert_eq!(strip_date_prefix("2024-5-06_cat"), "2024-5-06_cat");
        assert_eq!(strip_date_prefix("猫咪"), "猫咪");
    }

    // ── offline_name ─────────────────────────────────────────────────

    #[test]
    fn keeps_descriptive_stem() {
        let name = offline_name(Path::new("/x/photo.JPG"), MIB + MIB / 5, Language::En, &now());
        assert_eq!(name, "2025-01-02_photo");
    }

    #[test]
    fn generic_stem_uses_bucket() {
        let name = offline_name(Path::new("/x/IMG_0001.png"), 6 * MIB, Language::En, &now());
        assert_eq!(name, "2025-01-02_xlarge_image");
    }

    #[test]
    fn short_stem_uses_bucket() {
        let name = offline_name(Path::new("a.jpg"), 10, Language::En, &now());
        assert_eq!(name, "2025-01-02_small_image");
    }

    #[test]
    fn chinese_bucket_name() {
        let name = offline_name(Path::new("IMG_1234.jpg"), 3 * MIB, Language::Zh, &now());
        assert_eq!(name, "2025-01-02_大_图像");
    }

    #[test]
    fn chinese_keeps_cjk_stem() {
        let name = offline_name(Path::new("海边日落.jpg"), MIB, Language::Zh, &now());
        assert_eq!(name, "2025-01-02_海边日落");
    }

    #[test]
    fn rerun_on_dated_name_is_stable() {
        let first = offline_name(Path::new("Beach Sunset.jpg"), MIB, Language::En, &now());
        assert_eq!(first, "2025-01-02_beach_sunset");
        let again = offline_name(Path::new(&format!("{first}.jpg")), MIB, Language::En, &now());
        assert_eq!(again, first);
    }

    #[test]
    fn deterministic_for_same_input() {
        let a = offline_name(Path::new("holiday.webp"), 42, Language::En, &now());
        let b = offline_name(Path::new("holiday.webp"), 42, Language::En, &now());
        assert_eq!(a, b);
    }
}
