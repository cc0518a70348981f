//! Plain-text rendering of the view model and command results.

use std::fmt::Display;
use std::time::Duration;

use chrono::{DateTime, Local, TimeZone};
use portal_core::{
    ActivitySummary, AppViewModel, Feedback, FeedbackKind, JobPhase, RollCheck, ValidationResult,
};

/// Prints view changes as they happen: feedback lines and the wait banner.
#[derive(Default)]
pub struct TerminalRenderer {
    last_phase: JobPhase,
    last_feedback: Option<Feedback>,
}

impl TerminalRenderer {
    pub fn render(&mut self, view: &AppViewModel) {
        for line in self.changes(view, Local::now()) {
            println!("{line}");
        }
    }

    fn changes<Tz: TimeZone>(&mut self, view: &AppViewModel, now: DateTime<Tz>) -> Vec<String>
    where
        Tz::Offset: Display,
    {
        let mut lines = Vec::new();
        if view.feedback != self.last_feedback {
            if let Some(feedback) = &view.feedback {
                lines.push(feedback_line(feedback));
            }
            self.last_feedback = view.feedback.clone();
        }
        if view.phase != self.last_phase {
            if view.phase == JobPhase::Polling {
                lines.push(match view.estimate {
                    Some(estimate) => format!(
                        "Waiting for the server (estimated completion {}).",
                        eta_label(now, estimate)
                    ),
                    None => "Waiting for the server...".to_string(),
                });
            }
            self.last_phase = view.phase;
        }
        lines
    }
}

pub fn feedback_line(feedback: &Feedback) -> String {
    let tag = match feedback.kind {
        FeedbackKind::Info => "info",
        FeedbackKind::Success => "done",
        FeedbackKind::Error => "error",
    };
    format!("[{tag}] {}", feedback.message)
}

/// Wall-clock time `estimate` from `now`.
pub fn eta_label<Tz: TimeZone>(now: DateTime<Tz>, estimate: Duration) -> String
where
    Tz::Offset: Display,
{
    match chrono::Duration::from_std(estimate) {
        Ok(delta) => (now + delta).format("%H:%M:%S").to_string(),
        Err(_) => "unknown".to_string(),
    }
}

pub fn entry_lines(view: &AppViewModel) -> Vec<String> {
    let mut lines: Vec<String> = view
        .entries
        .iter()
        .map(|row| {
            format!(
                "[{}] {}  {}{}",
                if row.selected { "x" } else { " " },
                row.key,
                row.file_name,
                if row.has_link { "  (link)" } else { "" }
            )
        })
        .collect();
    lines.push(format!(
        "{} of {} entries shown",
        view.entries.len(),
        view.manifest_size
    ));
    lines
}

pub fn validation_lines(result: &ValidationResult) -> Vec<String> {
    let mut lines = Vec::new();
    push_section(&mut lines, "Valid", result.valid_keys.iter());
    push_section(&mut lines, "Not found", result.not_found_keys.iter());
    push_section(&mut lines, "Invalid", result.invalid_inputs.iter());
    push_section(&mut lines, "Duplicate lines", result.duplicate_lines.iter());
    lines
}

pub fn roll_check_lines(check: &RollCheck) -> Vec<String> {
    let mut lines = Vec::new();
    push_section(
        &mut lines,
        "Contacts",
        check.valid.iter().map(|student| format!("{} ({})", student.name, student.roll)),
    );
    push_section(&mut lines, "Invalid or not found", check.invalid_or_not_found.iter());
    push_section(&mut lines, "Duplicate lines", check.duplicate_lines.iter());
    lines
}

pub fn summary_lines(summary: &ActivitySummary) -> Vec<String> {
    let mut lines = vec![
        format!("Total records: {}", summary.total),
        format!("Distinct users: {}", summary.distinct_users),
    ];
    match &summary.most_common {
        Some(most) => lines.push(format!("Most common: {} ({})", most.action, most.count)),
        None => lines.push("Most common: none".to_string()),
    }
    for count in &summary.action_counts {
        lines.push(format!("  {:>5}  {}", count.count, count.action));
    }
    if !summary.recent.is_empty() {
        lines.push("Recent:".to_string());
        for record in &summary.recent {
            lines.push(format!(
                "  {}  {}  {}",
                record.timestamp.with_timezone(&Local).format("%Y-%m-%d %H:%M"),
                record.user_email,
                record.action
            ));
        }
    }
    lines
}

fn push_section<T: Display>(lines: &mut Vec<String>, title: &str, items: impl Iterator<Item = T>) {
    let items: Vec<String> = items.map(|item| item.to_string()).collect();
    if items.is_empty() {
        return;
    }
    lines.push(format!("{title} ({}):", items.len()));
    lines.extend(items.into_iter().map(|item| format!("  {item}")));
}

#[cfg(test)]
mod tests {
    use chrono::{FixedOffset, TimeZone};
    use portal_core::{build_index, validate_selection, LinksLayout};
    use pretty_assertions::assert_eq;

    use super::*;

    fn noon() -> DateTime<FixedOffset> {
        FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2025, 3, 9, 12, 0, 0)
            .unwrap()
    }

    #[test]
    fn eta_is_wall_clock_time() {
        assert_eq!(eta_label(noon(), Duration::from_secs(4 * 10 + 20)), "12:01:00");
    }

    #[test]
    fn renderer_reports_each_change_once() {
        let mut renderer = TerminalRenderer::default();
        let mut view = AppViewModel {
            phase: JobPhase::Polling,
            estimate: Some(Duration::from_secs(30)),
            feedback: Some(Feedback {
                kind: FeedbackKind::Info,
                message: "Processing...".to_string(),
            }),
            ..AppViewModel::default()
        };
        assert_eq!(
            renderer.changes(&view, noon()),
            vec![
                "[info] Processing...".to_string(),
                "Waiting for the server (estimated completion 12:00:30).".to_string(),
            ]
        );
        assert!(renderer.changes(&view, noon()).is_empty());

        view.phase = JobPhase::Complete;
        view.feedback = Some(Feedback {
            kind: FeedbackKind::Success,
            message: "Processing complete.".to_string(),
        });
        assert_eq!(
            renderer.changes(&view, noon()),
            vec!["[done] Processing complete.".to_string()]
        );
    }

    #[test]
    fn validation_sections_skip_empty_sets() {
        let load = build_index("24BC581 A.pdf\n", None, LinksLayout::default()).unwrap();
        let result = validate_selection("24bc581 a\nbadline\n24bc581 a\n", &load.index);
        assert_eq!(
            validation_lines(&result),
            vec![
                "Valid (1):",
                "  24BC581 A",
                "Invalid (1):",
                "  badline",
                "Duplicate lines (1):",
                "  24bc581 a",
            ]
        );
    }
}
