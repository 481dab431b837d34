use std::sync::LazyLock;

use regex::Regex;

use crate::config::CodeConfig;

static LABEL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^plu\s*(?:no\.?|nr\.?)?\s*[:#\-]?\s*").expect("static pattern")
});

static FLOAT_SUFFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.0+$").expect("static pattern"));

/// Fixed-length numeric product code (PLU) pattern.
///
/// Raw cells arrive decorated in many ways: `"PLU: 4011"`, `"#04011"`,
/// `4011.0` from a float-typed cell, `" 4 011 "`. Normalization strips the
/// decoration and left-pads short numerics to `length` digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodePattern {
    pub length: usize,
    pub min_digits: usize,
}

impl Default for CodePattern {
    fn default() -> Self {
        Self::from(&CodeConfig::default())
    }
}

impl From<&CodeConfig> for CodePattern {
    fn from(cfg: &CodeConfig) -> Self {
        Self {
            length: cfg.length,
            min_digits: cfg.min_digits,
        }
    }
}

impl CodePattern {
    /// Normalize a raw cell into a code, or `None` if it is not one.
    pub fn normalize(&self, raw: &str) -> Option<String> {
        let trimmed = raw
            .trim()
            .trim_matches(|c| matches!(c, '"' | '\'' | '[' | ']' | '(' | ')'))
            .trim();
        let unlabeled = LABEL_RE.replace(trimmed, "");
        let unhashed = unlabeled.trim_start_matches('#');
        let compact: String = unhashed.chars().filter(|c| !c.is_whitespace()).collect();
        let digits = FLOAT_SUFFIX_RE.replace(&compact, "");

        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        if digits.len() < self.min_digits {
            return None;
        }

        if digits.len() > self.length {
            // Over-long values are accepted only when the excess is zero padding.
            let excess = digits.len() - self.length;
            if digits[..excess].bytes().all(|b| b == b'0') {
                return Some(digits[excess..].to_string());
            }
            return None;
        }

        Some(format!("{:0>width$}", digits, width = self.length))
    }

    /// Whether a raw cell normalizes to a valid code.
    pub fn is_code(&self, raw: &str) -> bool {
        self.normalize(raw).is_some()
    }

    /// Whether a normalized value matches the fixed-length form exactly.
    pub fn is_normalized(&self, code: &str) -> bool {
        code.len() == self.length && code.bytes().all(|b| b.is_ascii_digit())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pat() -> CodePattern {
        CodePattern { length: 5, min_digits: 3 }
    }

    #[test]
    fn plain_and_padded() {
        assert_eq!(pat().normalize("10000").as_deref(), Some("10000"));
        assert_eq!(pat().normalize("4011").as_deref(), Some("04011"));
        assert_eq!(pat().normalize("123").as_deref(), Some("00123"));
    }

    #[test]
    fn strips_decoration() {
        assert_eq!(pat().normalize("PLU: 4011").as_deref(), Some("04011"));
        assert_eq!(pat().normalize("plu-4011").as_deref(), Some("04011"));
        assert_eq!(pat().normalize("PLU Nr. 4011").as_deref(), Some("04011"));
        assert_eq!(pat().normalize("#4011").as_deref(), Some("04011"));
        assert_eq!(pat().normalize("\"4011\"").as_deref(), Some("04011"));
        assert_eq!(pat().normalize(" 4 011 ").as_deref(), Some("04011"));
        assert_eq!(pat().normalize("4011.0").as_deref(), Some("04011"));
        assert_eq!(pat().normalize("0004011").as_deref(), Some("04011"));
    }

    #[test]
    fn rejects_non_codes() {
        assert_eq!(pat().normalize(""), None);
        assert_eq!(pat().normalize("12"), None);
        assert_eq!(pat().normalize("2.50"), None);
        assert_eq!(pat().normalize("123456"), None);
        assert_eq!(pat().normalize("Apple"), None);
        assert_eq!(pat().normalize("40a1"), None);
        assert_eq!(pat().normalize("-4011"), None);
    }

    #[test]
    fn normalized_form_check() {
        assert!(pat().is_normalized("04011"));
        assert!(!pat().is_normalized("4011"));
        assert!(!pat().is_normalized("0401a"));
    }
}
