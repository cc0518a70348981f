use crate::state::ActiveJob;
use crate::view_model::FeedbackKind;
use crate::{estimate_duration, AppState, Effect, JobPhase, JobRequest, JobStatus, Msg};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::RefreshRequested => {
            state.begin_manifest_load();
            vec![Effect::LoadManifest]
        }
        Msg::ManifestLoaded(index) => {
            state.apply_manifest(index);
            // Only the first load checks for a job started elsewhere.
            if state.phase() == JobPhase::Idle && state.take_status_check() {
                vec![Effect::CheckJobStatus]
            } else {
                Vec::new()
            }
        }
        Msg::ManifestFailed(message) => {
            state.apply_manifest_error(message);
            Vec::new()
        }
        Msg::InitialStatus(result) => match result {
            Ok(JobStatus::Processing) if state.phase() == JobPhase::Idle => {
                state.start_polling();
                state.set_feedback(FeedbackKind::Info, "A job is already processing.");
                vec![Effect::StartWatch]
            }
            _ => Vec::new(),
        },
        Msg::ModeChanged(mode) => {
            state.set_mode(mode);
            Vec::new()
        }
        Msg::SearchChanged(query) => {
            state.set_search(query);
            Vec::new()
        }
        Msg::KeyToggled(key) => {
            state.toggle_key(&key);
            Vec::new()
        }
        Msg::VisibleSelectionSet(checked) => {
            state.set_visible_selection(checked);
            Vec::new()
        }
        Msg::PasteChanged(text) => {
            state.set_paste_text(text);
            Vec::new()
        }
        Msg::OutputNameChanged(name) => {
            state.set_output_name(name);
            Vec::new()
        }
        Msg::OutputTypeChanged(output_type) => {
            state.set_output_type(output_type);
            Vec::new()
        }
        Msg::SubmitClicked => submit(&mut state),
        Msg::SubmitAccepted => {
            if state.phase() != JobPhase::Submitting {
                return (state, Vec::new());
            }
            state.start_polling();
            match state.active_job() {
                Some(job) => vec![
                    Effect::StartWatch,
                    Effect::RecordActivity {
                        action: format!(
                            "CV Sort started: {} ({} CVs, {})",
                            job.output_name, job.key_count, job.output_type
                        ),
                    },
                ],
                None => vec![Effect::StartWatch],
            }
        }
        Msg::SubmitFailed { message } => {
            if state.phase() != JobPhase::Submitting {
                return (state, Vec::new());
            }
            state.finish_job(JobPhase::Failed);
            state.set_feedback(FeedbackKind::Error, format!("Error: {message}"));
            match state.take_active_job() {
                Some(job) => vec![Effect::RecordActivity {
                    action: format!("CV Sort failed: {} - {}", job.output_name, message),
                }],
                None => Vec::new(),
            }
        }
        Msg::StatusProbed(status) => {
            if state.phase() != JobPhase::Polling {
                return (state, Vec::new());
            }
            match status {
                JobStatus::Processing => Vec::new(),
                JobStatus::Idle => {
                    let had_watch = state.finish_job(JobPhase::Complete);
                    state.take_active_job();
                    state.set_feedback(FeedbackKind::Success, "Processing complete.");
                    stop_if(had_watch)
                }
                JobStatus::Error { message } => {
                    let had_watch = state.finish_job(JobPhase::Failed);
                    state.take_active_job();
                    state.set_feedback(
                        FeedbackKind::Error,
                        format!("Error during processing: {message}"),
                    );
                    stop_if(had_watch)
                }
            }
        }
        Msg::WatchAborted { message } => {
            if state.phase() != JobPhase::Polling {
                return (state, Vec::new());
            }
            let had_watch = state.finish_job(JobPhase::Failed);
            state.take_active_job();
            state.set_feedback(FeedbackKind::Error, format!("Error during processing: {message}"));
            stop_if(had_watch)
        }
        Msg::ToolClosed => stop_if(state.release_watch()),
        Msg::Tick | Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn submit(state: &mut AppState) -> Vec<Effect> {
    if state.phase().is_busy() {
        return Vec::new();
    }
    let output_name = state.output_name().to_string();
    if output_name.is_empty() {
        state.set_feedback(
            FeedbackKind::Error,
            "Please enter an output file/folder name.",
        );
        return Vec::new();
    }
    let keys = state.resolved_keys();
    if keys.is_empty() {
        state.set_feedback(FeedbackKind::Error, "No valid CV keys selected or provided.");
        return Vec::new();
    }
    if state.requester_email().trim().is_empty() {
        state.set_feedback(FeedbackKind::Error, "No requester email configured.");
        return Vec::new();
    }

    let estimate = estimate_duration(keys.len());
    let request = JobRequest {
        keys,
        output_name: output_name.clone(),
        output_type: state.output_type(),
        requester_email: state.requester_email().trim().to_string(),
    };
    state.start_submission(
        ActiveJob {
            output_name,
            output_type: request.output_type,
            key_count: request.keys.len(),
        },
        estimate,
    );
    state.set_feedback(FeedbackKind::Info, "Processing...");
    // Any earlier watch is released before the new job is sent.
    vec![Effect::StopWatch, Effect::SubmitJob { request, estimate }]
}

fn stop_if(watch_was_active: bool) -> Vec<Effect> {
    if watch_was_active {
        vec![Effect::StopWatch]
    } else {
        Vec::new()
    }
}
