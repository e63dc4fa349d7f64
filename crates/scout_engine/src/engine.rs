use std::path::{Path, PathBuf};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use scout_core::{JobId, SearchQuery, SessionId};
use scout_logging::{scout_debug, scout_error, scout_info, scout_warn};

use crate::api::{EngineSettings, JobApi, ReqwestJobApi};
use crate::persist::ArtifactStore;
use crate::subscription::{ChannelProgressSink, ProgressSink, ProgressSubscription};
use crate::{ApiError, Credentials, DownloadError, EngineEvent, Registration};

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("invalid engine settings: {0}")]
    Settings(#[from] ApiError),
    #[error("could not start async runtime: {0}")]
    Runtime(#[from] std::io::Error),
    #[error("engine thread stopped")]
    Stopped,
}

enum EngineCommand {
    OpenStream { session: SessionId, job_id: JobId },
    CloseStream { session: SessionId },
    Request(Request),
    Shutdown,
}

enum Request {
    Submit {
        session: SessionId,
        query: SearchQuery,
    },
    Download {
        job_id: JobId,
    },
    Login(Credentials),
    Register(Registration),
}

/// Runs requests and the progress subscription on a background runtime.
///
/// At most one subscription is live: opening a stream closes the previous one
/// first. Events come back through `recv_timeout` in the order the engine
/// produced them.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
}

impl EngineHandle {
    pub fn new(settings: EngineSettings) -> Result<Self, EngineError> {
        let api = Arc::new(ReqwestJobApi::new(&settings)?);
        Self::with_api(api, settings.output_dir)
    }

    pub fn with_api(api: Arc<dyn JobApi>, output_dir: PathBuf) -> Result<Self, EngineError> {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let sink: Arc<dyn ProgressSink> = Arc::new(ChannelProgressSink::new(event_tx));
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()?;

        thread::spawn(move || {
            let mut active: Option<ProgressSubscription> = None;
            while let Ok(command) = cmd_rx.recv() {
                match command {
                    EngineCommand::OpenStream { session, job_id } => {
                        if let Some(previous) = active.take() {
                            previous.close();
                        }
                        active = Some(ProgressSubscription::open(
                            runtime.handle(),
                            api.clone(),
                            session,
                            job_id,
                            sink.clone(),
                        ));
                    }
                    EngineCommand::CloseStream { session } => {
                        let matches = active
                            .as_ref()
                            .is_some_and(|subscription| subscription.session() == session);
                        if matches {
                            if let Some(subscription) = active.take() {
                                subscription.close();
                            }
                        } else {
                            scout_debug!("Stream for session {} already closed", session);
                        }
                    }
                    EngineCommand::Shutdown => break,
                    EngineCommand::Request(request) => {
                        let api = api.clone();
                        let sink = sink.clone();
                        let output_dir = output_dir.clone();
                        runtime.spawn(async move {
                            handle_request(api.as_ref(), &output_dir, request, sink.as_ref()).await;
                        });
                    }
                }
            }
            drop(active);
            scout_debug!("Engine shutting down");
        });

        Ok(Self { cmd_tx, event_rx })
    }

    pub fn submit(&self, session: SessionId, query: SearchQuery) {
        self.send(EngineCommand::Request(Request::Submit { session, query }));
    }

    pub fn open_stream(&self, session: SessionId, job_id: JobId) {
        self.send(EngineCommand::OpenStream { session, job_id });
    }

    /// No-op unless `session` owns the live subscription.
    pub fn close_stream(&self, session: SessionId) {
        self.send(EngineCommand::CloseStream { session });
    }

    pub fn download(&self, job_id: JobId) {
        self.send(EngineCommand::Request(Request::Download { job_id }));
    }

    pub fn login(&self, credentials: Credentials) {
        self.send(EngineCommand::Request(Request::Login(credentials)));
    }

    pub fn register(&self, registration: Registration) {
        self.send(EngineCommand::Request(Request::Register(registration)));
    }

    /// Stops the engine thread; in-flight requests and the live subscription
    /// are dropped with its runtime.
    pub fn shutdown(&self) {
        self.send(EngineCommand::Shutdown);
    }

    /// `Ok(None)` on timeout. Once the engine thread is gone and every queued
    /// event has been read, returns `EngineError::Stopped`.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Option<EngineEvent>, EngineError> {
        match self.event_rx.recv_timeout(timeout) {
            Ok(event) => Ok(Some(event)),
            Err(mpsc::RecvTimeoutError::Timeout) => Ok(None),
            Err(mpsc::RecvTimeoutError::Disconnected) => Err(EngineError::Stopped),
        }
    }

    fn send(&self, command: EngineCommand) {
        if self.cmd_tx.send(command).is_err() {
            scout_error!("Engine thread is gone; command dropped");
        }
    }
}

async fn handle_request(
    api: &dyn JobApi,
    output_dir: &Path,
    request: Request,
    sink: &dyn ProgressSink,
) {
    match request {
        Request::Submit { session, query } => {
            scout_info!(
                "Submitting job term={:?} city={:?} (session {})",
                query.term,
                query.city,
                session
            );
            let result = api.submit_job(&query).await;
            match &result {
                Ok(job_id) => scout_info!("Job {} accepted (session {})", job_id, session),
                Err(err) => scout_warn!("Submission failed (session {}): {}", session, err),
            }
            sink.emit(EngineEvent::Submitted { session, result });
        }
        Request::Download { job_id } => {
            let result = download_to(api, output_dir, &job_id).await;
            match &result {
                Ok(path) => scout_info!("Artifact of job {} saved to {:?}", job_id, path),
                Err(err) => scout_warn!("Download of job {} failed: {}", job_id, err),
            }
            sink.emit(EngineEvent::DownloadFinished { job_id, result });
        }
        Request::Login(credentials) => {
            let result = api.login(&credentials).await;
            sink.emit(EngineEvent::Authenticated { result });
        }
        Request::Register(registration) => {
            let result = api.register(&registration).await;
            sink.emit(EngineEvent::Authenticated { result });
        }
    }
}

/// Retrieves the artifact of `job_id` and writes it under `output_dir`.
pub async fn download_to(
    api: &dyn JobApi,
    output_dir: &Path,
    job_id: &JobId,
) -> Result<PathBuf, DownloadError> {
    let artifact = api.download_artifact(job_id).await?;
    let store = ArtifactStore::new(output_dir.to_path_buf());
    let job_id = job_id.clone();
    tokio::task::spawn_blocking(move || store.save(&job_id, &artifact))
        .await
        .map_err(|err| DownloadError::Save(err.to_string()))?
        .map_err(|err| DownloadError::Save(err.to_string()))
}
