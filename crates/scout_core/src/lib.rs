//! Scout core: pure job-session state machine and view-model helpers.
mod decode;
mod effect;
mod msg;
pub mod password;
mod state;
mod update;
mod view_model;

pub use decode::{
    decode_message, DecodeError, ProgressUpdate, StageUpdate, StreamMessage, TerminalStatus,
};
pub use effect::Effect;
pub use msg::Msg;
pub use state::{AppState, JobId, JobStatus, SearchQuery, SessionId, StageId, StageProgress};
pub use update::{
    update, CONNECTION_ERROR_MESSAGE, STARTING_MESSAGE, STREAM_LOST_MESSAGE,
    SUBMISSION_REJECTED_MESSAGE,
};
pub use view_model::{AppViewModel, StageView, CONTACTS_STAGE_LABEL, LISTING_STAGE_LABEL};
