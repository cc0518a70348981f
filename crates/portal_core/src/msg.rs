use crate::{JobStatus, ManifestIndex, OutputType, RollKey, SelectionMode};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User asked for the manifest to be (re)loaded.
    RefreshRequested,
    /// Engine finished loading and parsing the manifest.
    ManifestLoaded(ManifestIndex),
    /// Manifest load or parse failed; the message is shown verbatim.
    ManifestFailed(String),
    /// Result of the one-off status probe issued after the first load.
    InitialStatus(Result<JobStatus, String>),
    /// User switched between list and paste mode.
    ModeChanged(SelectionMode),
    /// User edited the list-mode search box.
    SearchChanged(String),
    /// User ticked or unticked one row.
    KeyToggled(RollKey),
    /// User ticked or unticked the "select all" box.
    VisibleSelectionSet(bool),
    /// User edited the paste box.
    PasteChanged(String),
    /// User edited the output name.
    OutputNameChanged(String),
    /// User picked zip or gdrive output.
    OutputTypeChanged(OutputType),
    /// User pressed Generate.
    SubmitClicked,
    /// Remote acknowledged with `processing_started`.
    SubmitAccepted,
    /// Submission failed before acknowledgment.
    SubmitFailed { message: String },
    /// A poll tick returned a decoded status.
    StatusProbed(JobStatus),
    /// The watch ended on its own without an idle/error status, e.g. the
    /// remote answered with an unknown status or the failure cap was hit.
    WatchAborted { message: String },
    /// The tool is going away; release the watch.
    ToolClosed,
    /// Render tick.
    Tick,
    /// Fallback for placeholder wiring.
    NoOp,
}
