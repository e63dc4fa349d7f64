use std::path::PathBuf;

use bytes::Bytes;
use scout_core::{JobId, SessionId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    Submitted {
        session: SessionId,
        result: Result<JobId, ApiError>,
    },
    /// One raw `data` payload from the progress stream.
    StreamPayload { session: SessionId, data: String },
    /// The stream could not be opened, dropped, or ended on its own.
    StreamFailed { session: SessionId, error: ApiError },
    Authenticated {
        result: Result<AuthSession, ApiError>,
    },
    DownloadFinished {
        job_id: JobId,
        result: Result<PathBuf, DownloadError>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// Non-success status; `message` is the server's `error` text, if any.
    #[error("server answered {status}: {}", .message.as_deref().unwrap_or("no details"))]
    Rejected { status: u16, message: Option<String> },
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("timeout: {0}")]
    Timeout(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("unexpected response body: {0}")]
    InvalidBody(String),
    #[error("stream closed by server")]
    Disconnected,
}

impl ApiError {
    /// Server-provided text for a rejected request.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::Rejected { message, .. } => message.as_deref(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DownloadError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("could not save artifact: {0}")]
    Save(String),
}

/// A retrieved artifact, before it is written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Name suggested by the server's `Content-Disposition`, unsanitized.
    pub filename: Option<String>,
    pub bytes: Bytes,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSession {
    pub token: String,
    pub username: String,
}
