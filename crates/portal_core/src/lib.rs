//! Portal core: identifier matching, selection validation and the pure job
//! state machine. No IO lives here.
mod activity;
mod effect;
mod fields;
mod job;
mod key;
mod links;
mod manifest;
mod msg;
mod roster;
mod selection;
mod state;
mod update;
mod validate;
mod vcard;
mod view_model;

pub use activity::{summarize, ActionCount, ActivityRecord, ActivitySummary};
pub use effect::Effect;
pub use fields::{clean_field, split_quoted};
pub use job::{
    estimate_duration, JobPhase, JobRequest, JobStatus, OutputType, FIXED_OVERHEAD,
    SECONDS_PER_KEY,
};
pub use key::{is_roll_number, strip_extension, RollKey};
pub use links::{parse_links, LinksLayout};
pub use manifest::{
    build_index, IgnoredLine, ManifestEntry, ManifestError, ManifestIndex, ManifestLoad,
};
pub use msg::Msg;
pub use roster::{check_pasted_rolls, parse_roster, RollCheck, Roster, RosterError, Student};
pub use selection::{resolve_keys, SelectAllState, Selection, SelectionMode};
pub use state::{ActiveJob, AppState};
pub use update::update;
pub use validate::{validate_selection, ValidationResult};
pub use vcard::{escape_value, render_vcards, vcard_filename};
pub use view_model::{AppViewModel, EntryRow, Feedback, FeedbackKind, ValidationCounts};
