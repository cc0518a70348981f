use std::time::Duration;

use crate::selection::resolve_keys;
use crate::view_model::{AppViewModel, EntryRow, Feedback, FeedbackKind, ValidationCounts};
use crate::{
    validate_selection, JobPhase, ManifestIndex, OutputType, RollKey, SelectAllState, Selection,
    SelectionMode, ValidationResult,
};

/// The job the client is currently tracking, kept for audit messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveJob {
    pub output_name: String,
    pub output_type: OutputType,
    pub key_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    requester_email: String,
    index: Option<ManifestIndex>,
    manifest_loading: bool,
    manifest_error: Option<String>,
    status_checked: bool,
    mode: SelectionMode,
    search: String,
    selection: Selection,
    paste_text: String,
    validation: ValidationResult,
    output_name: String,
    output_type: OutputType,
    phase: JobPhase,
    watch_active: bool,
    active_job: Option<ActiveJob>,
    estimate: Option<Duration>,
    feedback: Option<Feedback>,
    dirty: bool,
}

impl AppState {
    pub fn new(requester_email: impl Into<String>) -> Self {
        Self {
            requester_email: requester_email.into(),
            ..Self::default()
        }
    }

    pub fn view(&self) -> AppViewModel {
        let (entries, select_all): (Vec<EntryRow>, SelectAllState) = match &self.index {
            Some(index) => (
                index
                    .filter(&self.search)
                    .map(|entry| EntryRow {
                        key: entry.key.clone(),
                        file_name: entry.file_name.clone(),
                        has_link: entry.external_link.is_some(),
                        selected: self.selection.contains(&entry.key),
                    })
                    .collect(),
                self.selection.select_all_state(index, &self.search),
            ),
            None => (Vec::new(), SelectAllState::Unchecked),
        };
        AppViewModel {
            phase: self.phase,
            manifest_loading: self.manifest_loading,
            manifest_error: self.manifest_error.clone(),
            manifest_size: self.index.as_ref().map_or(0, ManifestIndex::len),
            mode: self.mode,
            entries,
            select_all,
            selected_count: self.selection.len(),
            validation: ValidationCounts {
                valid: self.validation.valid_keys.len(),
                duplicates: self.validation.duplicate_lines.len(),
                invalid: self.validation.invalid_inputs.len(),
            },
            submit_enabled: self.can_submit(),
            watch_active: self.watch_active,
            estimate: self.estimate,
            feedback: self.feedback.clone(),
            dirty: self.dirty,
        }
    }

    /// Returns whether the view changed since the last call, and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub fn phase(&self) -> JobPhase {
        self.phase
    }

    pub fn is_watch_active(&self) -> bool {
        self.watch_active
    }

    pub fn is_manifest_loading(&self) -> bool {
        self.manifest_loading
    }

    /// Message from the most recent failed load, cleared by a successful one.
    pub fn manifest_error(&self) -> Option<&str> {
        self.manifest_error.as_deref()
    }

    pub fn feedback(&self) -> Option<&Feedback> {
        self.feedback.as_ref()
    }

    pub fn index(&self) -> Option<&ManifestIndex> {
        self.index.as_ref()
    }

    pub fn validation(&self) -> &ValidationResult {
        &self.validation
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn active_job(&self) -> Option<&ActiveJob> {
        self.active_job.as_ref()
    }

    pub fn requester_email(&self) -> &str {
        &self.requester_email
    }

    pub fn output_name(&self) -> &str {
        self.output_name.trim()
    }

    pub fn output_type(&self) -> OutputType {
        self.output_type
    }

    /// Keys a submission would send right now.
    pub fn resolved_keys(&self) -> Vec<RollKey> {
        resolve_keys(self.mode, &self.selection, &self.validation)
    }

    pub fn can_submit(&self) -> bool {
        !self.phase.is_busy() && !self.output_name().is_empty() && !self.resolved_keys().is_empty()
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn begin_manifest_load(&mut self) {
        self.manifest_loading = true;
        self.mark_dirty();
    }

    pub(crate) fn apply_manifest(&mut self, index: ManifestIndex) {
        self.selection.retain_present(&index);
        self.validation = validate_selection(&self.paste_text, &index);
        self.index = Some(index);
        self.manifest_loading = false;
        self.manifest_error = None;
        self.mark_dirty();
    }

    pub(crate) fn apply_manifest_error(&mut self, message: String) {
        self.manifest_loading = false;
        self.manifest_error = Some(message);
        self.mark_dirty();
    }

    /// Marks the startup probe as issued; true only the first time.
    pub(crate) fn take_status_check(&mut self) -> bool {
        !std::mem::replace(&mut self.status_checked, true)
    }

    pub(crate) fn set_mode(&mut self, mode: SelectionMode) {
        self.mode = mode;
        self.mark_dirty();
    }

    pub(crate) fn set_search(&mut self, query: String) {
        self.search = query;
        self.mark_dirty();
    }

    pub(crate) fn toggle_key(&mut self, key: &RollKey) {
        if let Some(index) = &self.index {
            if self.selection.toggle(key, index) {
                self.mark_dirty();
            }
        }
    }

    pub(crate) fn set_visible_selection(&mut self, checked: bool) {
        if let Some(index) = &self.index {
            self.selection.set_visible(index, &self.search, checked);
            self.mark_dirty();
        }
    }

    pub(crate) fn set_paste_text(&mut self, text: String) {
        self.validation = match &self.index {
            Some(index) => validate_selection(&text, index),
            None => ValidationResult::default(),
        };
        self.paste_text = text;
        self.mark_dirty();
    }

    pub(crate) fn set_output_name(&mut self, name: String) {
        self.output_name = name;
        self.mark_dirty();
    }

    pub(crate) fn set_output_type(&mut self, output_type: OutputType) {
        self.output_type = output_type;
        self.mark_dirty();
    }

    pub(crate) fn set_feedback(&mut self, kind: FeedbackKind, message: impl Into<String>) {
        self.feedback = Some(Feedback {
            kind,
            message: message.into(),
        });
        self.mark_dirty();
    }

    pub(crate) fn start_submission(&mut self, job: ActiveJob, estimate: Duration) {
        self.phase = JobPhase::Submitting;
        self.active_job = Some(job);
        self.estimate = Some(estimate);
        self.mark_dirty();
    }

    pub(crate) fn start_polling(&mut self) {
        self.phase = JobPhase::Polling;
        self.watch_active = true;
        self.mark_dirty();
    }

    /// Ends the current job. Returns whether a watch was running.
    pub(crate) fn finish_job(&mut self, phase: JobPhase) -> bool {
        self.phase = phase;
        self.estimate = None;
        self.mark_dirty();
        std::mem::take(&mut self.watch_active)
    }

    pub(crate) fn take_active_job(&mut self) -> Option<ActiveJob> {
        self.active_job.take()
    }

    pub(crate) fn release_watch(&mut self) -> bool {
        let was_active = std::mem::take(&mut self.watch_active);
        if was_active {
            self.phase = JobPhase::Idle;
            self.estimate = None;
            self.mark_dirty();
        }
        was_active
    }
}
