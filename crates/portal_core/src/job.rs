use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::key::RollKey;

/// Advisory cost of one key on the remote processor.
pub const SECONDS_PER_KEY: u64 = 4;
/// Advisory fixed cost of a job (packaging, upload).
pub const FIXED_OVERHEAD: Duration = Duration::from_secs(20);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputType {
    #[default]
    Zip,
    Gdrive,
}

impl OutputType {
    pub fn as_str(self) -> &'static str {
        match self {
            OutputType::Zip => "zip",
            OutputType::Gdrive => "gdrive",
        }
    }
}

impl fmt::Display for OutputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "zip" => Ok(OutputType::Zip),
            "gdrive" => Ok(OutputType::Gdrive),
            other => Err(format!("unknown output type `{other}` (expected zip or gdrive)")),
        }
    }
}

/// One batch request. Serializes to the payload the remote processor expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobRequest {
    pub keys: Vec<RollKey>,
    #[serde(rename = "outputName")]
    pub output_name: String,
    #[serde(rename = "outputType")]
    pub output_type: OutputType,
    #[serde(rename = "userEmail")]
    pub requester_email: String,
}

/// Remote job state as observed by a status probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    Idle,
    Processing,
    Error { message: String },
}

/// Lifecycle of the current submission on this client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JobPhase {
    #[default]
    Idle,
    Submitting,
    Polling,
    Complete,
    Failed,
}

impl JobPhase {
    /// Submitting and Polling block a new submission.
    pub fn is_busy(self) -> bool {
        matches!(self, JobPhase::Submitting | JobPhase::Polling)
    }
}

/// Advisory time until the remote finishes `key_count` keys.
pub fn estimate_duration(key_count: usize) -> Duration {
    Duration::from_secs(SECONDS_PER_KEY * key_count as u64) + FIXED_OVERHEAD
}
