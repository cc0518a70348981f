use std::fmt;

use portal_core::{JobStatus, ManifestError, ManifestLoad, Roster, RosterError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    ManifestLoaded(Result<ManifestLoad, LoadError>),
    RosterLoaded(Result<Roster, LoadError>),
    /// Answer to the one-off probe issued at startup.
    InitialStatus(Result<JobStatus, ClientError>),
    SubmitCompleted(Result<(), ClientError>),
    /// A poll tick decoded a status.
    StatusProbed(JobStatus),
    /// The watch gave up without an idle/error status from the remote.
    WatchAborted { message: String },
}

/// Failure talking to the remote processor. `message` is user-facing; for
/// [`FailureKind::Remote`] it is the remote's text verbatim.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ClientError {
    pub kind: FailureKind,
    pub message: String,
}

impl ClientError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    RedirectLimitExceeded,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    UnexpectedContentType { content_type: Option<String> },
    /// Body was not the JSON object the endpoint promises.
    Decode,
    /// Well-formed reply carrying a status this client does not know.
    UnexpectedStatus { status: String },
    /// The remote answered `status: "error"`.
    Remote,
    Network,
}

impl FailureKind {
    /// Failures that end a watch at once instead of being retried next tick.
    pub fn is_terminal_for_watch(&self) -> bool {
        matches!(self, FailureKind::UnexpectedStatus { .. })
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::RedirectLimitExceeded => write!(f, "redirect limit exceeded"),
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            FailureKind::UnexpectedContentType { content_type } => {
                write!(f, "unexpected content type {content_type:?}")
            }
            FailureKind::Decode => write!(f, "malformed response"),
            FailureKind::UnexpectedStatus { status } => write!(f, "unexpected status {status}"),
            FailureKind::Remote => write!(f, "remote error"),
            FailureKind::Network => write!(f, "network error"),
        }
    }
}

/// Failure loading one of the static text sources.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoadError {
    #[error("Could not load '{source_label}'. Status: {status}")]
    HttpStatus { source_label: String, status: u16 },
    #[error("Could not load '{source_label}': {message}")]
    Unreachable {
        source_label: String,
        message: String,
    },
    #[error(transparent)]
    Manifest(#[from] ManifestError),
    #[error(transparent)]
    Roster(#[from] RosterError),
}

/// Failure starting the engine, or the engine thread going away.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("invalid job endpoint: {0}")]
    Client(#[from] ClientError),
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error("could not start engine runtime: {0}")]
    Runtime(#[from] std::io::Error),
    #[error("engine thread has stopped")]
    Stopped,
}
