//! Scout engine: HTTP job API, progress stream subscription and effect execution.
mod api;
mod engine;
mod filename;
mod persist;
mod sse;
mod subscription;
mod types;

pub use api::{EngineSettings, JobApi, PayloadStream, ReqwestJobApi};
pub use engine::{download_to, EngineError, EngineHandle};
pub use filename::{artifact_filename, content_disposition_filename};
pub use persist::{prepare_download_dir, ArtifactStore, PersistError};
pub use sse::SseDecoder;
pub use subscription::{ChannelProgressSink, ProgressSink, ProgressSubscription};
pub use types::{
    ApiError, Artifact, AuthSession, Credentials, DownloadError, EngineEvent, Registration,
};
