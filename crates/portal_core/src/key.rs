use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Two digits, two letters, three digits, one whitespace, variant A-C.
/// Digits and letters are ASCII only; the separator may be any Unicode space.
static ROLL_VARIANT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)((?-u:[0-9]{2}[a-z]{2}[0-9]{3}))\s((?-u:[a-c]))")
        .expect("roll variant pattern")
});

/// A bare roll number with no variant, matched against the whole string.
static ROLL_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i-u)^[0-9]{2}[a-z]{2}[0-9]{3}$").expect("roll number pattern"));

/// Normalized roll-number-and-variant identifier, e.g. `24BC581 A`.
///
/// Always uppercase. Only constructed through [`RollKey::find`] so every value
/// satisfies the identifier pattern.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RollKey(String);

impl RollKey {
    /// Searches `text` for the first identifier and returns it uppercased,
    /// with the separator normalized to a plain space.
    pub fn find(text: &str) -> Option<Self> {
        let caps = ROLL_VARIANT.captures(text)?;
        let (number, variant) = (caps.get(1)?, caps.get(2)?);
        Some(Self(format!(
            "{} {}",
            number.as_str().to_ascii_uppercase(),
            variant.as_str().to_ascii_uppercase()
        )))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RollKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for RollKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// True when `text` is exactly a roll number such as `24BC581` (any case).
pub fn is_roll_number(text: &str) -> bool {
    ROLL_NUMBER.is_match(text)
}

/// Drops a trailing `.ext` from a file name. Names without an extension are
/// returned unchanged.
pub fn strip_extension(file_name: &str) -> &str {
    match file_name.rsplit_once('.') {
        Some((stem, ext))
            if !stem.is_empty()
                && !ext.is_empty()
                && ext.len() <= 5
                && ext.chars().all(|c| c.is_ascii_alphanumeric()) =>
        {
            stem
        }
        _ => file_name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_key_anywhere_and_uppercases() {
        let key = RollKey::find("resume - 24bc581 a final").unwrap();
        assert_eq!(key.as_str(), "24BC581 A");
    }

    #[test]
    fn unicode_space_separator_normalizes_to_plain_space() {
        let key = RollKey::find("24bc581\u{00A0}b.pdf").unwrap();
        assert_eq!(key.as_str(), "24BC581 B");
        assert_eq!(RollKey::find("24BC581\u{2009}C").unwrap().as_str(), "24BC581 C");
        assert_eq!(RollKey::find("24BC581\tA").unwrap().as_str(), "24BC581 A");
    }

    #[test]
    fn letters_stay_ascii_under_case_folding() {
        // U+212A KELVIN SIGN folds to 'k' in Unicode mode.
        assert!(RollKey::find("24\u{212A}C581 A").is_none());
        assert!(RollKey::find("24BC581 \u{0430}").is_none());
    }

    #[test]
    fn rejects_variant_outside_a_to_c() {
        assert!(RollKey::find("24BC581 D").is_none());
        assert!(RollKey::find("24BC581A").is_none());
        assert!(RollKey::find("2BC581 A").is_none());
    }

    #[test]
    fn roll_number_must_match_whole_string() {
        assert!(is_roll_number("24bc581"));
        assert!(!is_roll_number("24BC581 A"));
        assert!(!is_roll_number(" 24BC581"));
    }

    #[test]
    fn strips_only_plausible_extensions() {
        assert_eq!(strip_extension("24BC581 A.pdf"), "24BC581 A");
        assert_eq!(strip_extension("24BC581 A.PDF"), "24BC581 A");
        assert_eq!(strip_extension("24BC581 A"), "24BC581 A");
        assert_eq!(strip_extension(".hidden"), ".hidden");
        assert_eq!(strip_extension("name.with space"), "name.with space");
    }
}
