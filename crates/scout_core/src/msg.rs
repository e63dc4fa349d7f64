use crate::{JobId, SessionId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User edited the search term input.
    TermChanged(String),
    /// User edited the city input.
    CityChanged(String),
    /// User asked to start a job with the current inputs.
    StartClicked,
    /// Server accepted the submission and issued a job id.
    SubmissionAccepted { session: SessionId, job_id: JobId },
    /// Server answered the submission with a non-success status.
    SubmissionRejected {
        session: SessionId,
        error: Option<String>,
    },
    /// Submission never got an answer (connection refused, timeout, bad body).
    SubmissionFailed { session: SessionId },
    /// One raw payload from the progress stream, in arrival order.
    StreamPayload { session: SessionId, data: String },
    /// The progress stream dropped or ended before a terminal message.
    StreamFailed { session: SessionId },
    /// User asked for the produced artifact.
    DownloadClicked,
    /// UI/render tick.
    Tick,
    /// Fallback for placeholder wiring.
    NoOp,
}
