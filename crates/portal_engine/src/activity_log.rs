//! Append-only activity log kept as JSON lines.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::Utc;
use portal_core::ActivityRecord;
use portal_logging::{portal_debug, portal_warn};
use thiserror::Error;

use crate::persist::{append_line, PersistError};

#[derive(Debug, Error)]
pub enum ActivityLogError {
    #[error("refusing to record activity without a user email")]
    MissingEmail,
    #[error("could not encode activity record: {0}")]
    Encode(#[from] serde_json::Error),
    #[error(transparent)]
    Persist(#[from] PersistError),
    #[error("could not read activity log: {0}")]
    Read(#[from] io::Error),
}

/// Destination for audit lines. The sink stamps the time.
pub trait ActivitySink: Send + Sync {
    fn record(&self, user_email: &str, action: &str) -> Result<ActivityRecord, ActivityLogError>;
}

pub struct JsonlActivityLog {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonlActivityLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every record in file order. A missing file is an empty log; lines that
    /// do not parse are skipped.
    pub fn read_all(&self) -> Result<Vec<ActivityRecord>, ActivityLogError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };
        let mut records = Vec::new();
        for (number, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<ActivityRecord>(line) {
                Ok(record) => records.push(record),
                Err(err) => portal_warn!(
                    "Skipping malformed activity line {} in {:?}: {}",
                    number + 1,
                    self.path,
                    err
                ),
            }
        }
        Ok(records)
    }
}

impl ActivitySink for JsonlActivityLog {
    fn record(&self, user_email: &str, action: &str) -> Result<ActivityRecord, ActivityLogError> {
        if user_email.trim().is_empty() {
            return Err(ActivityLogError::MissingEmail);
        }
        let record = ActivityRecord {
            user_email: user_email.to_string(),
            action: action.to_string(),
            timestamp: Utc::now(),
        };
        let line = serde_json::to_string(&record)?;
        // Poisoning only means another writer panicked mid-append.
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        append_line(&self.path, &line)?;
        portal_debug!("Activity recorded: {}", action);
        Ok(record)
    }
}

/// Records an audit line, logging instead of failing.
pub fn record_best_effort(sink: &dyn ActivitySink, user_email: &str, action: &str) {
    if let Err(err) = sink.record(user_email, action) {
        portal_warn!("Could not record activity '{}': {}", action, err);
    }
}
