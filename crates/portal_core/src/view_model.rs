use std::time::Duration;

use crate::{JobPhase, RollKey, SelectAllState, SelectionMode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackKind {
    Info,
    Success,
    Error,
}

/// Inline message shown next to the submit control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feedback {
    pub kind: FeedbackKind,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ValidationCounts {
    pub valid: usize,
    pub duplicates: usize,
    pub invalid: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub phase: JobPhase,
    pub manifest_loading: bool,
    pub manifest_error: Option<String>,
    pub manifest_size: usize,
    pub mode: SelectionMode,
    /// Rows visible under the current search.
    pub entries: Vec<EntryRow>,
    pub select_all: SelectAllState,
    pub selected_count: usize,
    pub validation: ValidationCounts,
    pub submit_enabled: bool,
    pub watch_active: bool,
    /// Advisory; `None` renders as an indeterminate progress indicator.
    pub estimate: Option<Duration>,
    pub feedback: Option<Feedback>,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryRow {
    pub key: RollKey,
    pub file_name: String,
    pub has_link: bool,
    pub selected: bool,
}
