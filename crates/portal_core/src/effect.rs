use std::time::Duration;

use crate::JobRequest;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    LoadManifest,
    CheckJobStatus,
    SubmitJob {
        request: JobRequest,
        estimate: Duration,
    },
    StartWatch,
    StopWatch,
    RecordActivity {
        action: String,
    },
}
