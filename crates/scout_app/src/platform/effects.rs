use std::path::PathBuf;
use std::time::Duration;

use scout_core::{Effect, JobId, Msg};
use scout_engine::{ApiError, DownloadError, EngineError, EngineEvent, EngineHandle};
use scout_logging::{scout_debug, scout_info, scout_warn};

/// What the controller receives from the engine side.
#[derive(Debug)]
pub enum Inbound {
    Msg(Msg),
    Downloaded {
        job_id: JobId,
        result: Result<PathBuf, DownloadError>,
    },
}

/// Executes core effects on the engine and turns engine events back into
/// messages for `update`.
pub struct EffectRunner<'a> {
    engine: &'a EngineHandle,
}

impl<'a> EffectRunner<'a> {
    pub fn new(engine: &'a EngineHandle) -> Self {
        Self { engine }
    }

    pub fn run(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::SubmitJob { session, query } => {
                    scout_debug!("SubmitJob session={} term={:?}", session, query.term);
                    self.engine.submit(session, query);
                }
                Effect::OpenStream { session, job_id } => {
                    scout_debug!("OpenStream session={} job={}", session, job_id);
                    self.engine.open_stream(session, job_id);
                }
                Effect::CloseStream { session } => {
                    scout_debug!("CloseStream session={}", session);
                    self.engine.close_stream(session);
                }
                Effect::DownloadArtifact { job_id } => {
                    scout_info!("Downloading artifact of job {}", job_id);
                    self.engine.download(job_id);
                }
            }
        }
    }

    /// Waits up to `timeout` for the next engine event the controller cares
    /// about. Fails once the engine has stopped.
    pub fn next(&self, timeout: Duration) -> Result<Option<Inbound>, EngineError> {
        Ok(self.engine.recv_timeout(timeout)?.and_then(translate))
    }
}

fn translate(event: EngineEvent) -> Option<Inbound> {
    let msg = match event {
        EngineEvent::Submitted { session, result } => match result {
            Ok(job_id) => Msg::SubmissionAccepted { session, job_id },
            Err(ApiError::Rejected { status, message }) => {
                scout_warn!("Submission rejected with status {}", status);
                Msg::SubmissionRejected {
                    session,
                    error: message,
                }
            }
            Err(_) => Msg::SubmissionFailed { session },
        },
        EngineEvent::StreamPayload { session, data } => Msg::StreamPayload { session, data },
        EngineEvent::StreamFailed { session, error } => {
            scout_debug!("Stream of session {} ended: {}", session, error);
            Msg::StreamFailed { session }
        }
        EngineEvent::DownloadFinished { job_id, result } => {
            return Some(Inbound::Downloaded { job_id, result });
        }
        EngineEvent::Authenticated { .. } => {
            scout_debug!("Ignoring late authentication answer");
            return None;
        }
    };
    Some(Inbound::Msg(msg))
}
