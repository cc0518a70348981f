use indexmap::IndexSet;

use crate::key::RollKey;
use crate::manifest::ManifestIndex;
use crate::validate::ValidationResult;

/// How the user is choosing keys: ticking rows or pasting text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionMode {
    #[default]
    List,
    Paste,
}

/// Tri-state of the "select all" box over the currently visible rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectAllState {
    #[default]
    Unchecked,
    Checked,
    Indeterminate,
}

/// Keys ticked in list mode, in the order they were ticked.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Selection {
    keys: IndexSet<RollKey>,
}

impl Selection {
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn contains(&self, key: &RollKey) -> bool {
        self.keys.contains(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &RollKey> {
        self.keys.iter()
    }

    pub fn clear(&mut self) {
        self.keys.clear();
    }

    /// Flips one key. Keys absent from `index` are never selectable; returns
    /// false for those and leaves the selection alone.
    pub fn toggle(&mut self, key: &RollKey, index: &ManifestIndex) -> bool {
        if !index.contains(key) {
            return false;
        }
        if !self.keys.shift_remove(key) {
            self.keys.insert(key.clone());
        }
        true
    }

    /// Checks or unchecks every row visible under `query`.
    pub fn set_visible(&mut self, index: &ManifestIndex, query: &str, checked: bool) {
        for entry in index.filter(query) {
            if checked {
                self.keys.insert(entry.key.clone());
            } else {
                self.keys.shift_remove(&entry.key);
            }
        }
    }

    pub fn select_all_state(&self, index: &ManifestIndex, query: &str) -> SelectAllState {
        let (visible, checked) = index.filter(query).fold((0usize, 0usize), |(v, c), entry| {
            (v + 1, c + usize::from(self.keys.contains(&entry.key)))
        });
        match (visible, checked) {
            (0, _) | (_, 0) => SelectAllState::Unchecked,
            (v, c) if v == c => SelectAllState::Checked,
            _ => SelectAllState::Indeterminate,
        }
    }

    /// Drops keys that a refreshed index no longer contains.
    pub fn retain_present(&mut self, index: &ManifestIndex) {
        self.keys.retain(|key| index.contains(key));
    }
}

/// The keys a submission would send in `mode`.
pub fn resolve_keys(
    mode: SelectionMode,
    selection: &Selection,
    validation: &ValidationResult,
) -> Vec<RollKey> {
    match mode {
        SelectionMode::List => selection.keys().cloned().collect(),
        SelectionMode::Paste => validation.valid_keys.iter().cloned().collect(),
    }
}
