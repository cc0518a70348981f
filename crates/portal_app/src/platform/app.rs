use std::time::{Duration, Instant};

use anyhow::{anyhow, bail, Context};
use portal_core::{update, AppState, Effect, JobStatus, Msg};
use portal_engine::{EngineHandle, JsonlActivityLog};
use portal_logging::{portal_debug, portal_warn};

use super::config::PortalConfig;
use super::effects::EffectRunner;
use super::render::TerminalRenderer;

const WAIT_SLICE: Duration = Duration::from_millis(250);

/// One tool session: the core state, the engine behind it, and the terminal.
///
/// Dropping the session closes the tool, which stops any running watch.
pub struct Session {
    state: AppState,
    runner: EffectRunner,
    renderer: TerminalRenderer,
    status_check_pending: bool,
    load_timeout: Duration,
}

impl Session {
    pub fn start(config: &PortalConfig) -> anyhow::Result<Self> {
        let engine = EngineHandle::new(config.engine_config()).context("starting engine")?;
        let activity = Box::new(JsonlActivityLog::new(config.activity_log_path.clone()));
        let runner = EffectRunner::new(engine, activity, config.requester_email.clone());
        Ok(Self {
            state: AppState::new(config.requester_email.clone()),
            runner,
            renderer: TerminalRenderer::default(),
            status_check_pending: false,
            load_timeout: Duration::from_secs(config.source_timeout_secs + 5),
        })
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn runner(&self) -> &EffectRunner {
        &self.runner
    }

    pub fn dispatch(&mut self, msg: Msg) {
        if matches!(msg, Msg::InitialStatus(_)) {
            self.status_check_pending = false;
        }
        let state = std::mem::take(&mut self.state);
        let (mut state, effects) = update(state, msg);
        if effects.contains(&Effect::CheckJobStatus) {
            self.status_check_pending = true;
        }
        if state.consume_dirty() {
            self.renderer.render(&state.view());
        }
        self.state = state;
        self.runner.run(effects);
    }

    /// Feeds engine messages into the state machine until `done` holds.
    /// Returns false if `timeout` ran out first, and fails if the engine
    /// thread is gone.
    pub fn pump_until(
        &mut self,
        timeout: Option<Duration>,
        done: impl Fn(&AppState) -> bool,
    ) -> anyhow::Result<bool> {
        let deadline = timeout.map(|timeout| Instant::now() + timeout);
        loop {
            if done(&self.state) {
                return Ok(true);
            }
            if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                return Ok(false);
            }
            self.pump_once()?;
        }
    }

    fn pump_once(&mut self) -> anyhow::Result<()> {
        let msg = self
            .runner
            .next_msg(WAIT_SLICE)
            .context("waiting for the engine")?
            .unwrap_or(Msg::Tick);
        self.dispatch(msg);
        Ok(())
    }

    /// Loads the manifest and waits for the startup status check it triggers.
    pub fn load_manifest(&mut self) -> anyhow::Result<()> {
        self.dispatch(Msg::RefreshRequested);
        if !self.pump_until(Some(self.load_timeout), |state| !state.is_manifest_loading())? {
            bail!("Timed out loading the manifest.");
        }
        if let Some(message) = self.state.manifest_error() {
            bail!("{message}");
        }
        let start = Instant::now();
        while self.status_check_pending && start.elapsed() < self.load_timeout {
            self.pump_once()?;
        }
        if self.status_check_pending {
            portal_warn!("Startup status check did not answer in time");
        }
        Ok(())
    }

    /// One status probe outside the state machine.
    pub fn probe_status(&mut self) -> anyhow::Result<JobStatus> {
        self.runner.run(vec![Effect::CheckJobStatus]);
        let start = Instant::now();
        while start.elapsed() < self.load_timeout {
            match self
                .runner
                .next_msg(WAIT_SLICE)
                .context("waiting for the job status")?
            {
                Some(Msg::InitialStatus(result)) => return result.map_err(|message| anyhow!(message)),
                Some(other) => self.dispatch(other),
                None => {}
            }
        }
        bail!("Timed out waiting for the job status.")
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        portal_debug!("Closing session");
        self.dispatch(Msg::ToolClosed);
        self.runner.shutdown();
    }
}
