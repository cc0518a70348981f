use std::fs;
use std::io::{self, Read};
use std::path::Path;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{bail, Context};
use chrono::Local;
use portal_core::{
    check_pasted_rolls, render_vcards, summarize, vcard_filename, JobPhase, JobStatus, Msg,
    RollKey, SelectionMode, Student,
};
use portal_engine::{write_atomic, JsonlActivityLog};
use portal_logging::portal_info;

use super::app::Session;
use super::config::PortalConfig;
use super::render::{entry_lines, roll_check_lines, summary_lines, validation_lines};
use crate::cli::{SortArgs, VcfArgs};

fn print_lines(lines: Vec<String>) {
    for line in lines {
        println!("{line}");
    }
}

/// Reads a file, or stdin for `-`.
fn read_input(path: &Path) -> anyhow::Result<String> {
    if path.as_os_str() == "-" {
        let mut text = String::new();
        io::stdin()
            .read_to_string(&mut text)
            .context("reading stdin")?;
        return Ok(text);
    }
    fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

pub fn list(session: &mut Session, search: Option<String>) -> anyhow::Result<ExitCode> {
    session.load_manifest()?;
    if let Some(query) = search {
        session.dispatch(Msg::SearchChanged(query));
    }
    print_lines(entry_lines(&session.state().view()));
    Ok(ExitCode::SUCCESS)
}

pub fn check(session: &mut Session, input: &Path) -> anyhow::Result<ExitCode> {
    let text = read_input(input)?;
    session.load_manifest()?;
    session.dispatch(Msg::ModeChanged(SelectionMode::Paste));
    session.dispatch(Msg::PasteChanged(text));
    print_lines(validation_lines(session.state().validation()));
    Ok(ExitCode::SUCCESS)
}

pub fn sort(session: &mut Session, args: SortArgs) -> anyhow::Result<ExitCode> {
    let pasted = args.paste.as_deref().map(read_input).transpose()?;
    session.load_manifest()?;
    if session.state().phase().is_busy() {
        bail!("A job is already processing on the server. Use `portal watch` to follow it.");
    }

    match pasted {
        Some(text) => {
            session.dispatch(Msg::ModeChanged(SelectionMode::Paste));
            session.dispatch(Msg::PasteChanged(text));
            print_lines(validation_lines(session.state().validation()));
        }
        None => {
            session.dispatch(Msg::ModeChanged(SelectionMode::List));
            for raw in &args.key {
                let key = RollKey::find(raw)
                    .filter(|key| session.state().index().is_some_and(|index| index.contains(key)));
                let Some(key) = key else {
                    bail!("'{raw}' is not a key in the manifest.");
                };
                if !session.state().selection().contains(&key) {
                    session.dispatch(Msg::KeyToggled(key));
                }
            }
        }
    }

    session.dispatch(Msg::OutputNameChanged(args.name));
    session.dispatch(Msg::OutputTypeChanged(args.output_type));
    session.dispatch(Msg::SubmitClicked);
    if !session.state().phase().is_busy() {
        // Rejected before any network call; the reason is already printed.
        return Ok(ExitCode::FAILURE);
    }

    session.pump_until(None, |state| !state.phase().is_busy())?;
    Ok(exit_for(session.state().phase()))
}

pub fn status(session: &mut Session) -> anyhow::Result<ExitCode> {
    match session.probe_status()? {
        JobStatus::Idle => println!("idle"),
        JobStatus::Processing => println!("processing"),
        JobStatus::Error { message } => println!("error: {message}"),
    }
    Ok(ExitCode::SUCCESS)
}

/// Follows a job started elsewhere until the remote leaves `processing`.
pub fn watch(session: &mut Session) -> anyhow::Result<ExitCode> {
    let status = session.probe_status()?;
    if status != JobStatus::Processing {
        println!("No job is processing.");
        return Ok(ExitCode::SUCCESS);
    }
    session.dispatch(Msg::InitialStatus(Ok(status)));
    session.pump_until(None, |state| !state.phase().is_busy())?;
    Ok(exit_for(session.state().phase()))
}

pub fn vcf(session: &mut Session, config: &PortalConfig, args: VcfArgs) -> anyhow::Result<ExitCode> {
    let pasted = args.paste.as_deref().map(read_input).transpose()?;
    let timeout = Duration::from_secs(config.source_timeout_secs + 5);
    let roster = session
        .runner()
        .load_roster(config.roster_source.clone(), timeout)?;

    let (students, mode): (Vec<Student>, &str) = match pasted {
        Some(text) => {
            let check = check_pasted_rolls(&text, &roster);
            print_lines(roll_check_lines(&check));
            (check.valid, "Paste")
        }
        None => (roster.students().to_vec(), "List"),
    };
    if students.is_empty() {
        bail!("No valid students selected.");
    }

    let suffix = args
        .suffix
        .as_deref()
        .map(str::trim)
        .filter(|suffix| !suffix.is_empty());
    let content = render_vcards(&students, suffix);
    let file_name = vcard_filename(Local::now().date_naive(), suffix);
    let path = write_atomic(&config.output_dir, &file_name, content.as_bytes())
        .with_context(|| format!("writing {file_name}"))?;

    portal_info!("Wrote {} contacts to {:?}", students.len(), path);
    println!("Wrote {} contacts to {}", students.len(), path.display());
    session.runner().record_activity(&format!(
        "Generated VCF ({mode}) ({} contacts, suffix: {})",
        students.len(),
        suffix.unwrap_or("none")
    ));
    Ok(ExitCode::SUCCESS)
}

pub fn activity(config: &PortalConfig, recent: usize) -> anyhow::Result<ExitCode> {
    let log = JsonlActivityLog::new(config.activity_log_path.clone());
    let records = log
        .read_all()
        .with_context(|| format!("reading {}", log.path().display()))?;
    print_lines(summary_lines(&summarize(&records, recent)));
    Ok(ExitCode::SUCCESS)
}

fn exit_for(phase: JobPhase) -> ExitCode {
    if phase == JobPhase::Complete {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
