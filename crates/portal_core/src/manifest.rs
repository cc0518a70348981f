use std::collections::btree_map;
use std::collections::BTreeMap;

use thiserror::Error;

use crate::key::{strip_extension, RollKey};
use crate::links::{parse_links, LinksLayout};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    pub key: RollKey,
    pub file_name: String,
    pub external_link: Option<String>,
}

/// Keyed view of the manifest. Built once per load and never mutated;
/// a refresh replaces the whole index.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ManifestIndex {
    entries: BTreeMap<RollKey, ManifestEntry>,
}

impl ManifestIndex {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, key: &RollKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn get(&self, key: &RollKey) -> Option<&ManifestEntry> {
        self.entries.get(key)
    }

    /// Entries in ascending key order.
    pub fn iter(&self) -> btree_map::Values<'_, RollKey, ManifestEntry> {
        self.entries.values()
    }

    /// Entries whose key or file name contains `query`, ignoring case.
    /// A blank query matches everything.
    pub fn filter<'a>(&'a self, query: &str) -> impl Iterator<Item = &'a ManifestEntry> + 'a {
        let needle = query.trim().to_lowercase();
        self.entries.values().filter(move |entry| {
            needle.is_empty()
                || entry.key.as_str().to_lowercase().contains(&needle)
                || entry.file_name.to_lowercase().contains(&needle)
        })
    }
}

/// A manifest line dropped because its key was already taken.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IgnoredLine {
    pub file_name: String,
    pub key: RollKey,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestLoad {
    pub index: ManifestIndex,
    pub ignored: Vec<IgnoredLine>,
    pub unmatched_lines: usize,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ManifestError {
    #[error("manifest is empty or contains no valid roll number/variant keys")]
    NoValidEntries,
}

/// Builds the index from manifest text and an optional links file.
///
/// The first file name for a key wins; later ones land in
/// [`ManifestLoad::ignored`]. Zero entries is an error, never an empty index.
pub fn build_index(
    manifest_text: &str,
    links_text: Option<&str>,
    layout: LinksLayout,
) -> Result<ManifestLoad, ManifestError> {
    let links = links_text
        .map(|text| parse_links(text, layout))
        .unwrap_or_default();

    let mut entries = BTreeMap::new();
    let mut ignored = Vec::new();
    let mut unmatched_lines = 0;

    for line in manifest_text.lines() {
        let file_name = line.trim();
        if file_name.is_empty() {
            continue;
        }
        let Some(key) = RollKey::find(strip_extension(file_name)) else {
            unmatched_lines += 1;
            continue;
        };
        match entries.entry(key) {
            btree_map::Entry::Occupied(slot) => ignored.push(IgnoredLine {
                file_name: file_name.to_string(),
                key: slot.key().clone(),
            }),
            btree_map::Entry::Vacant(slot) => {
                let entry = ManifestEntry {
                    key: slot.key().clone(),
                    file_name: file_name.to_string(),
                    external_link: links.get(&file_name.to_lowercase()).cloned(),
                };
                slot.insert(entry);
            }
        }
    }

    if entries.is_empty() {
        return Err(ManifestError::NoValidEntries);
    }

    Ok(ManifestLoad {
        index: ManifestIndex { entries },
        ignored,
        unmatched_lines,
    })
}
