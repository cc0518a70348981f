//! Portal engine: network and disk IO, the job watch and effect execution.
mod activity_log;
mod client;
mod engine;
mod persist;
mod source;
mod types;
mod watch;
mod wire;

pub use activity_log::{record_best_effort, ActivityLogError, ActivitySink, JsonlActivityLog};
pub use client::{ClientSettings, JobClient, ReqwestJobClient};
pub use engine::{EngineConfig, EngineHandle};
pub use persist::{append_line, ensure_dir, write_atomic, PersistError};
pub use source::{ManifestSources, SourceFetcher, TextSource};
pub use types::{ClientError, EngineError, EngineEvent, FailureKind, LoadError};
pub use watch::{ChannelSink, JobWatch, WatchOutcome, WatchPolicy, WatchSink};
pub use wire::{decode_job_status, decode_submit_ack, is_json_content_type, SubmitAck};
