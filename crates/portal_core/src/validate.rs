use std::collections::HashSet;

use indexmap::IndexSet;

use crate::key::RollKey;
use crate::manifest::ManifestIndex;

/// Classification of pasted identifiers against a manifest index.
///
/// Sets keep first-seen order so the valid keys can be submitted in the
/// order the user pasted them.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationResult {
    pub valid_keys: IndexSet<RollKey>,
    pub invalid_inputs: IndexSet<String>,
    pub duplicate_lines: IndexSet<String>,
    pub not_found_keys: IndexSet<RollKey>,
}

impl ValidationResult {
    pub fn has_valid_keys(&self) -> bool {
        !self.valid_keys.is_empty()
    }
}

/// Classifies each non-empty trimmed line of `text`. Runs on every edit, so it
/// stays a single pass with no allocation beyond the result sets.
///
/// Line duplicates compare the trimmed text verbatim (case-sensitive), while
/// key matching is case-insensitive: `24bc581 a` and `24BC581 A` are two
/// distinct lines that resolve to one valid key.
pub fn validate_selection(text: &str, index: &ManifestIndex) -> ValidationResult {
    let mut result = ValidationResult::default();
    let mut seen_lines = HashSet::new();

    for line in text.lines().map(str::trim).filter(|line| !line.is_empty()) {
        if !seen_lines.insert(line) {
            result.duplicate_lines.insert(line.to_string());
        }

        match RollKey::find(line) {
            Some(key) if index.contains(&key) => {
                result.valid_keys.insert(key);
            }
            Some(key) => {
                result.not_found_keys.insert(key);
                result.invalid_inputs.insert(line.to_string());
            }
            None => {
                result.invalid_inputs.insert(line.to_string());
            }
        }
    }

    result
}
