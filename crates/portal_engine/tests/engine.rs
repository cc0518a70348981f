use std::collections::VecDeque;
use std::fs;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use portal_core::{JobRequest, JobStatus, LinksLayout, OutputType, RollKey};
use portal_engine::{
    ClientError, ClientSettings, EngineConfig, EngineError, EngineEvent, EngineHandle,
    FailureKind, JobClient, ManifestSources, ReqwestJobClient, TextSource, WatchPolicy,
};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

/// Answers probes from a script, then `idle` forever.
struct ScriptedClient {
    probes: Mutex<VecDeque<JobStatus>>,
    submitted: Mutex<Vec<JobRequest>>,
}

impl ScriptedClient {
    fn new(probes: impl IntoIterator<Item = JobStatus>) -> Self {
        Self {
            probes: Mutex::new(probes.into_iter().collect()),
            submitted: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait::async_trait]
impl JobClient for ScriptedClient {
    async fn submit(&self, request: &JobRequest) -> Result<(), ClientError> {
        self.submitted.lock().unwrap().push(request.clone());
        Ok(())
    }

    async fn probe_status(&self) -> Result<JobStatus, ClientError> {
        Ok(self
            .probes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(JobStatus::Idle))
    }
}

fn config(temp: &TempDir) -> EngineConfig {
    let manifest = temp.path().join("cv_list.txt");
    fs::write(&manifest, "24BC581 A.pdf\n23XY123 B.pdf\n").unwrap();
    EngineConfig {
        endpoint_url: Some("http://127.0.0.1:9/exec".to_string()),
        sources: ManifestSources {
            manifest: TextSource::File(manifest),
            links: None,
            layout: LinksLayout::default(),
        },
        client: ClientSettings::default(),
        watch: WatchPolicy {
            interval: Duration::from_millis(20),
            max_consecutive_failures: None,
        },
        source_timeout: Duration::from_secs(5),
    }
}

fn next_event(engine: &EngineHandle) -> EngineEvent {
    engine
        .recv_timeout(Duration::from_secs(5))
        .expect("engine running")
        .expect("engine event")
}

#[test]
fn loads_manifest_and_checks_status() {
    let temp = TempDir::new().unwrap();
    let client = Arc::new(ScriptedClient::new([JobStatus::Processing]));
    let engine = EngineHandle::with_client(config(&temp), client).unwrap();

    engine.load_manifest();
    match next_event(&engine) {
        EngineEvent::ManifestLoaded(Ok(load)) => assert_eq!(load.index.len(), 2),
        other => panic!("unexpected event {other:?}"),
    }

    engine.check_status();
    assert_eq!(
        next_event(&engine),
        EngineEvent::InitialStatus(Ok(JobStatus::Processing))
    );
}

#[test]
fn submit_then_watch_until_idle() {
    let temp = TempDir::new().unwrap();
    let client = Arc::new(ScriptedClient::new([
        JobStatus::Processing,
        JobStatus::Processing,
    ]));
    let engine = EngineHandle::with_client(config(&temp), client.clone()).unwrap();

    let request = JobRequest {
        keys: vec![RollKey::find("24BC581 A").unwrap()],
        output_name: "Batch".to_string(),
        output_type: OutputType::Zip,
        requester_email: "a@x.edu".to_string(),
    };
    engine.submit(request.clone());
    assert_eq!(next_event(&engine), EngineEvent::SubmitCompleted(Ok(())));
    assert_eq!(*client.submitted.lock().unwrap(), vec![request]);

    engine.start_watch();
    let mut statuses = Vec::new();
    loop {
        match next_event(&engine) {
            EngineEvent::StatusProbed(JobStatus::Idle) => {
                statuses.push(JobStatus::Idle);
                break;
            }
            EngineEvent::StatusProbed(status) => statuses.push(status),
            other => panic!("unexpected event {other:?}"),
        }
    }
    assert_eq!(
        statuses,
        vec![JobStatus::Processing, JobStatus::Processing, JobStatus::Idle]
    );

    // Watch has ended; stopping is harmless and nothing else arrives.
    engine.stop_watch();
    assert!(engine
        .recv_timeout(Duration::from_millis(100))
        .expect("engine running")
        .is_none());
}

#[test]
fn restarting_a_watch_keeps_a_single_poller() {
    let temp = TempDir::new().unwrap();
    let client = Arc::new(ScriptedClient::new(
        std::iter::repeat(JobStatus::Processing).take(1000),
    ));
    let engine = EngineHandle::with_client(config(&temp), client.clone()).unwrap();

    engine.start_watch();
    engine.start_watch();
    std::thread::sleep(Duration::from_millis(110));
    engine.stop_watch();
    std::thread::sleep(Duration::from_millis(50));
    while engine.try_recv().is_some() {}

    let remaining = client.probes.lock().unwrap().len();
    // Five or so ticks from one poller; two pollers would consume about ten.
    assert!(1000 - remaining <= 7, "consumed {}", 1000 - remaining);

    std::thread::sleep(Duration::from_millis(60));
    assert_eq!(client.probes.lock().unwrap().len(), remaining);
}

#[test]
fn invalid_endpoint_fails_engine_start() {
    let temp = TempDir::new().unwrap();
    let mut config = config(&temp);
    config.endpoint_url = Some("::not a url".to_string());
    assert!(EngineHandle::new(config).is_err());
}

#[test]
fn missing_endpoint_fails_job_calls_only() {
    let temp = TempDir::new().unwrap();
    let mut config = config(&temp);
    config.endpoint_url = None;
    let engine = EngineHandle::new(config).unwrap();

    engine.check_status();
    match next_event(&engine) {
        EngineEvent::InitialStatus(Err(err)) => {
            assert_eq!(err.kind, FailureKind::InvalidUrl);
            assert_eq!(err.message, "No job endpoint configured.");
        }
        other => panic!("unexpected event {other:?}"),
    }
    engine.load_manifest();
    assert!(matches!(
        next_event(&engine),
        EngineEvent::ManifestLoaded(Ok(_))
    ));
}

#[test]
fn stopped_engine_is_reported_instead_of_a_timeout() {
    let temp = TempDir::new().unwrap();
    let client = Arc::new(ScriptedClient::new(vec![JobStatus::Processing; 1000]));
    let mut engine = EngineHandle::with_client(config(&temp), client).unwrap();
    engine.start_watch();
    std::thread::sleep(Duration::from_millis(60));

    engine.shutdown();
    engine.shutdown();

    // Events sent before shutdown may still be queued; after them the
    // channel reports the engine as gone.
    let mut outcome = None;
    for _ in 0..100 {
        match engine.recv_timeout(Duration::from_millis(50)) {
            Ok(Some(_)) => continue,
            other => {
                outcome = Some(other);
                break;
            }
        }
    }
    assert!(matches!(outcome, Some(Err(EngineError::Stopped))));
}

#[test]
fn real_client_engine_starts_and_shuts_down() {
    let temp = TempDir::new().unwrap();
    let config = config(&temp);
    let url = config.endpoint_url.clone().unwrap();
    let client = ReqwestJobClient::new(&url, config.client.clone()).unwrap();
    let engine = EngineHandle::with_client(config, Arc::new(client)).unwrap();
    engine.load_manifest();
    assert!(matches!(
        next_event(&engine),
        EngineEvent::ManifestLoaded(Ok(_))
    ));
    drop(engine);
}
