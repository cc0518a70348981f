use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use portal_core::{JobRequest, JobStatus};
use portal_logging::{portal_debug, portal_info, portal_warn};

use crate::client::{ClientSettings, JobClient, ReqwestJobClient};
use crate::source::{ManifestSources, SourceFetcher, TextSource};
use crate::watch::{ChannelSink, JobWatch, WatchPolicy, WatchSink};
use crate::{ClientError, EngineError, EngineEvent, FailureKind};

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Job processor URL. Without one, loads still work and every job call
    /// fails with [`FailureKind::InvalidUrl`].
    pub endpoint_url: Option<String>,
    pub sources: ManifestSources,
    pub client: ClientSettings,
    pub watch: WatchPolicy,
    pub source_timeout: Duration,
}

enum EngineCommand {
    LoadManifest,
    LoadRoster(TextSource),
    CheckStatus,
    Submit(JobRequest),
    StartWatch,
    StopWatch,
    Shutdown,
}

/// Runs all network and disk work on a background tokio runtime. Commands go
/// in through the handle; results come back as [`EngineEvent`]s.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
    thread: Option<thread::JoinHandle<()>>,
}

impl EngineHandle {
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        let client: Arc<dyn JobClient> = match config.endpoint_url.as_deref() {
            Some(url) => Arc::new(ReqwestJobClient::new(url, config.client.clone())?),
            None => Arc::new(UnconfiguredClient),
        };
        Self::with_client(config, client)
    }

    /// Same as [`EngineHandle::new`] with a caller-provided job client.
    pub fn with_client(
        config: EngineConfig,
        client: Arc<dyn JobClient>,
    ) -> Result<Self, EngineError> {
        let fetcher = Arc::new(SourceFetcher::new(config.source_timeout)?);
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()?;

        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let worker = Worker {
            client,
            fetcher,
            sources: Arc::new(config.sources),
            policy: config.watch,
            sink: Arc::new(ChannelSink::new(event_tx.clone())),
            event_tx,
            watch: None,
        };

        let thread = thread::Builder::new()
            .name("portal-engine".to_string())
            .spawn(move || worker.run(runtime, cmd_rx))?;

        Ok(Self {
            cmd_tx,
            event_rx,
            thread: Some(thread),
        })
    }

    pub fn load_manifest(&self) {
        self.send(EngineCommand::LoadManifest);
    }

    pub fn load_roster(&self, source: TextSource) {
        self.send(EngineCommand::LoadRoster(source));
    }

    pub fn check_status(&self) {
        self.send(EngineCommand::CheckStatus);
    }

    pub fn submit(&self, request: JobRequest) {
        self.send(EngineCommand::Submit(request));
    }

    /// Starts polling. A watch already running is stopped first so only one
    /// poller ever talks to the remote.
    pub fn start_watch(&self) {
        self.send(EngineCommand::StartWatch);
    }

    pub fn stop_watch(&self) {
        self.send(EngineCommand::StopWatch);
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    /// Waits up to `timeout` for the next event. `Ok(None)` means nothing
    /// arrived in time; [`EngineError::Stopped`] means nothing ever will.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Option<EngineEvent>, EngineError> {
        match self.event_rx.recv_timeout(timeout) {
            Ok(event) => Ok(Some(event)),
            Err(mpsc::RecvTimeoutError::Timeout) => Ok(None),
            Err(mpsc::RecvTimeoutError::Disconnected) => Err(EngineError::Stopped),
        }
    }

    /// Stops any watch and joins the engine thread. Later calls do nothing.
    pub fn shutdown(&mut self) {
        let _ = self.cmd_tx.send(EngineCommand::Shutdown);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                portal_warn!("Engine thread panicked");
            }
        }
    }

    fn send(&self, command: EngineCommand) {
        if self.cmd_tx.send(command).is_err() {
            portal_warn!("Engine thread is gone; command dropped");
        }
    }
}

impl Drop for EngineHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

struct UnconfiguredClient;

impl UnconfiguredClient {
    fn error() -> ClientError {
        ClientError::new(FailureKind::InvalidUrl, "No job endpoint configured.")
    }
}

#[async_trait::async_trait]
impl JobClient for UnconfiguredClient {
    async fn submit(&self, _request: &JobRequest) -> Result<(), ClientError> {
        Err(Self::error())
    }

    async fn probe_status(&self) -> Result<JobStatus, ClientError> {
        Err(Self::error())
    }
}

struct Worker {
    client: Arc<dyn JobClient>,
    fetcher: Arc<SourceFetcher>,
    sources: Arc<ManifestSources>,
    policy: WatchPolicy,
    sink: Arc<dyn WatchSink>,
    event_tx: mpsc::Sender<EngineEvent>,
    watch: Option<JobWatch>,
}

impl Worker {
    fn run(mut self, runtime: tokio::runtime::Runtime, cmd_rx: mpsc::Receiver<EngineCommand>) {
        while let Ok(command) = cmd_rx.recv() {
            match command {
                EngineCommand::LoadManifest => {
                    let fetcher = self.fetcher.clone();
                    let sources = self.sources.clone();
                    let event_tx = self.event_tx.clone();
                    runtime.spawn(async move {
                        let result = fetcher.load_manifest(&sources).await;
                        let _ = event_tx.send(EngineEvent::ManifestLoaded(result));
                    });
                }
                EngineCommand::LoadRoster(source) => {
                    let fetcher = self.fetcher.clone();
                    let event_tx = self.event_tx.clone();
                    runtime.spawn(async move {
                        let result = fetcher.load_roster(&source).await;
                        let _ = event_tx.send(EngineEvent::RosterLoaded(result));
                    });
                }
                EngineCommand::CheckStatus => {
                    let client = self.client.clone();
                    let event_tx = self.event_tx.clone();
                    runtime.spawn(async move {
                        let result = client.probe_status().await;
                        if let Err(err) = &result {
                            portal_warn!("Startup status check failed: {}", err);
                        }
                        let _ = event_tx.send(EngineEvent::InitialStatus(result));
                    });
                }
                EngineCommand::Submit(request) => {
                    let client = self.client.clone();
                    let event_tx = self.event_tx.clone();
                    runtime.spawn(async move {
                        let result = client.submit(&request).await;
                        match &result {
                            Ok(()) => portal_info!("Job accepted: {}", request.output_name),
                            Err(err) => portal_warn!(
                                "Job submission failed ({}): {}",
                                err.kind,
                                err.message
                            ),
                        }
                        let _ = event_tx.send(EngineEvent::SubmitCompleted(result));
                    });
                }
                EngineCommand::StartWatch => {
                    self.stop_watch();
                    self.watch = Some(JobWatch::start(
                        runtime.handle(),
                        self.client.clone(),
                        self.policy.clone(),
                        self.sink.clone(),
                    ));
                }
                EngineCommand::StopWatch => self.stop_watch(),
                EngineCommand::Shutdown => break,
            }
        }
        self.stop_watch();
        portal_debug!("Engine thread shutting down");
        runtime.shutdown_timeout(Duration::from_millis(500));
    }

    fn stop_watch(&mut self) {
        if let Some(mut watch) = self.watch.take() {
            watch.stop();
        }
    }
}
