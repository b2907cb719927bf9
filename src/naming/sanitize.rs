use crate::config::Language;

/// Length cap for English names, in characters.
pub const MAX_LEN_EN: usize = 50;
/// Length cap for Chinese names, in characters.
pub const MAX_LEN_ZH: usize = 30;

/// Maximum sanitized length for `language`.
pub fn max_len(language: Language) -> usize {
    match language {
        Language::En => MAX_LEN_EN,
        Language::Zh => MAX_LEN_ZH,
    }
}

/// Turn a raw model response into a filesystem-safe token.
///
/// English text is lowercased and restricted to `[a-z0-9_-]`; Chinese text
/// keeps its case and additionally allows CJK ideographs. Characters outside
/// the allow-set are dropped, runs of whitespace and underscores become a
/// single `_`, and the result never starts or ends with `_`.
///
/// The output is a fixed point: `sanitize(&sanitize(x, l), l) == sanitize(x, l)`.
pub fn sanitize(text: &str, language: Language) -> String {
    let lowered;
    let text = match language {
        Language::En => {
            lowered = text.to_lowercase();
            lowered.as_str()
        }
        Language::Zh => text,
    };

    let mut out = String::with_capacity(text.len());
    let mut pending_sep = false;
    for c in text.chars() {
        if c.is_whitespace() || c == '_' {
            pending_sep = true;
        } else if is_allowed(c, language) {
            if pending_sep && !out.is_empty() {
                out.push('_');
            }
            pending_sep = false;
            out.push(c);
        }
    }

    let cap = max_len(language);
    if out.chars().count() > cap {
        out = out.chars().take(cap).collect();
    }
    while out.ends_with('_') {
        out.pop();
    }
    out
}

fn is_allowed(c: char, language: Language) -> bool {
    match language {
        Language::En => c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-',
        Language::Zh => c.is_ascii_alphanumeric() || c == '-' || is_cjk_ideograph(c),
    }
}

fn is_cjk_ideograph(c: char) -> bool {
    matches!(c, '\u{4E00}'..='\u{9FFF}' | '\u{3400}'..='\u{4DBF}')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn english_basic() {
        assert_eq!(sanitize("Cat on Windowsill!!", Language::En), "cat_on_windowsill");
    }

    #[test]
    fn english_collapses_separators() {
        assert_eq!(sanitize("  a __ b\t\nc  ", Language::En), "a_b_c");
        assert_eq!(sanitize("a_!_b", Language::En), "a_b");
        assert_eq!(sanitize("__lead_and_trail__", Language::En), "lead_and_trail");
    }

    #[test]
    fn english_keeps_hyphens_and_digits() {
        assert_eq!(sanitize("Route-66 sign 2", Language::En), "route-66_sign_2");
    }

    #[test]
    fn english_drops_cjk() {
        assert_eq!(sanitize("猫 cat", Language::En), "cat");
        assert_eq!(sanitize("猫咪", Language::En), "");
    }

    #[test]
    fn chinese_keeps_ideographs_and_case() {
        assert_eq!(sanitize("猫咪 在 窗台", Language::Zh), "猫咪_在_窗台");
        assert_eq!(sanitize("iPhone 截图！", Language::Zh), "iPhone_截图");
    }

    #[test]
    fn chinese_strips_fullwidth_punctuation() {
        assert_eq!(sanitize("「猫咪」，窗台。", Language::Zh), "猫咪窗台");
    }

    #[test]
    fn english_cap() {
        let long = "word ".repeat(30);
        let out = sanitize(&long, Language::En);
        assert!(out.chars().count() <= MAX_LEN_EN);
        assert!(!out.ends_with('_'));
    }

    #[test]
    fn chinese_cap_counts_characters() {
        let long = "猫".repeat(40);
        let out = sanitize(&long, Language::Zh);
        assert_eq!(out.chars().count(), MAX_LEN_ZH);
    }

    #[test]
    fn cap_does_not_leave_trailing_underscore() {
        // 49 chars then a separator lands the 50th char on '_'
        let input = format!("{} tail", "a".repeat(49));
        let out = sanitize(&input, Language::En);
        assert_eq!(out, "a".repeat(49));
    }

    #[test]
    fn idempotent_and_within_allow_set() {
        let inputs = [
            "Cat on Windowsill!!",
            "  ___  ",
            "MiXeD-Case_and  spaces",
            "猫咪 在 窗台 sunny Day",
            "Ünïcödé stüff",
            &"x y ".repeat(40),
            &"中 文 ".repeat(40),
            "",
        ];
        for lang in [Language::En, Language::Zh] {
            for input in inputs {
                let once = sanitize(input, lang);
                assert_eq!(sanitize(&once, lang), once, "not idempotent for {input:?}");
                assert!(once.chars().count() <= max_len(lang));
                assert!(!once.starts_with('_') && !once.ends_with('_'));
                assert!(once.chars().all(|c| c == '_' || is_allowed(c, lang)));
            }
        }
    }

    #[test]
    fn empty_and_symbol_only_inputs() {
        assert_eq!(sanitize("", Language::En), "");
        assert_eq!(sanitize("!!! ??? ...", Language::En), "");
        assert_eq!(sanitize("!!! ??? ...", Language::Zh), "");
    }
}
