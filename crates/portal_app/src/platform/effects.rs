use std::time::Duration;

use chrono::Local;
use portal_core::{Effect, Msg, Roster};
use portal_engine::{
    record_best_effort, ActivitySink, EngineError, EngineEvent, EngineHandle, LoadError,
    TextSource,
};
use portal_logging::{portal_info, portal_warn};

use super::render::eta_label;

/// Executes core effects against the engine and turns engine events back
/// into messages.
pub struct EffectRunner {
    engine: EngineHandle,
    activity: Box<dyn ActivitySink>,
    requester_email: String,
}

impl EffectRunner {
    pub fn new(
        engine: EngineHandle,
        activity: Box<dyn ActivitySink>,
        requester_email: impl Into<String>,
    ) -> Self {
        Self {
            engine,
            activity,
            requester_email: requester_email.into(),
        }
    }

    pub fn run(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::LoadManifest => self.engine.load_manifest(),
                Effect::CheckJobStatus => self.engine.check_status(),
                Effect::SubmitJob { request, estimate } => {
                    portal_info!(
                        "SubmitJob output_name={} keys={} eta={}",
                        request.output_name,
                        request.keys.len(),
                        eta_label(Local::now(), estimate)
                    );
                    self.engine.submit(request);
                }
                Effect::StartWatch => self.engine.start_watch(),
                Effect::StopWatch => self.engine.stop_watch(),
                Effect::RecordActivity { action } => {
                    record_best_effort(self.activity.as_ref(), &self.requester_email, &action);
                }
            }
        }
    }

    /// Next message from the engine, or `None` when nothing arrived in time.
    pub fn next_msg(&self, timeout: Duration) -> Result<Option<Msg>, EngineError> {
        Ok(self.engine.recv_timeout(timeout)?.map(map_event))
    }

    /// Loads the roster outside the state machine. Other engine events that
    /// arrive meanwhile are dropped.
    pub fn load_roster(&self, source: TextSource, timeout: Duration) -> Result<Roster, LoadError> {
        self.engine.load_roster(source.clone());
        loop {
            let message = match self.engine.recv_timeout(timeout) {
                Ok(Some(EngineEvent::RosterLoaded(result))) => return result,
                Ok(Some(other)) => {
                    portal_warn!("Ignoring engine event while loading roster: {:?}", other);
                    continue;
                }
                Ok(None) => "timed out".to_string(),
                Err(err) => err.to_string(),
            };
            return Err(LoadError::Unreachable {
                source_label: source.to_string(),
                message,
            });
        }
    }

    /// Stops any watch and joins the engine thread.
    pub fn shutdown(&mut self) {
        self.engine.shutdown();
    }

    pub fn record_activity(&self, action: &str) {
        record_best_effort(self.activity.as_ref(), &self.requester_email, action);
    }
}

pub fn map_event(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::ManifestLoaded(Ok(load)) => Msg::ManifestLoaded(load.index),
        EngineEvent::ManifestLoaded(Err(err)) => Msg::ManifestFailed(err.to_string()),
        EngineEvent::InitialStatus(result) => Msg::InitialStatus(result.map_err(|err| err.message)),
        EngineEvent::SubmitCompleted(Ok(())) => Msg::SubmitAccepted,
        EngineEvent::SubmitCompleted(Err(err)) => Msg::SubmitFailed {
            message: err.message,
        },
        EngineEvent::StatusProbed(status) => Msg::StatusProbed(status),
        EngineEvent::WatchAborted { message } => Msg::WatchAborted { message },
        EngineEvent::RosterLoaded(_) => Msg::NoOp,
    }
}
