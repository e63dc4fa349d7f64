use crate::{JobId, SearchQuery, SessionId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    SubmitJob {
        session: SessionId,
        query: SearchQuery,
    },
    OpenStream {
        session: SessionId,
        job_id: JobId,
    },
    /// Closing an already closed stream is a no-op.
    CloseStream { session: SessionId },
    DownloadArtifact { job_id: JobId },
}
