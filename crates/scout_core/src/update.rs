use scout_logging::{scout_debug, scout_trace, scout_warn};

use crate::decode::{decode_message, ProgressUpdate, StreamMessage, TerminalStatus};
use crate::{AppState, Effect, JobStatus, Msg, SearchQuery, SessionId};

pub const STARTING_MESSAGE: &str = "Iniciando busca...";
pub const SUBMISSION_REJECTED_MESSAGE: &str = "Erro ao iniciar busca.";
pub const CONNECTION_ERROR_MESSAGE: &str = "Erro de conexão com o servidor.";
pub const STREAM_LOST_MESSAGE: &str = "Conexão com o servidor perdida.";

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::TermChanged(text) => {
            state.set_term(text);
            Vec::new()
        }
        Msg::CityChanged(text) => {
            state.set_city(text);
            Vec::new()
        }
        Msg::StartClicked => start(&mut state),
        Msg::SubmissionAccepted { session, job_id } => {
            if !state.is_awaiting_submission(session) {
                scout_debug!("Ignoring submission answer for stale session {}", session);
                return (state, Vec::new());
            }
            state.accept_submission(job_id.clone());
            vec![Effect::OpenStream { session, job_id }]
        }
        Msg::SubmissionRejected { session, error } => {
            if !state.is_awaiting_submission(session) {
                scout_debug!("Ignoring submission answer for stale session {}", session);
                return (state, Vec::new());
            }
            let message = error
                .filter(|text| !text.trim().is_empty())
                .unwrap_or_else(|| SUBMISSION_REJECTED_MESSAGE.to_string());
            state.fail(&message);
            Vec::new()
        }
        Msg::SubmissionFailed { session } => {
            if !state.is_awaiting_submission(session) {
                scout_debug!("Ignoring submission answer for stale session {}", session);
                return (state, Vec::new());
            }
            state.fail(CONNECTION_ERROR_MESSAGE);
            Vec::new()
        }
        Msg::StreamPayload { session, data } => {
            if !accepts_stream(&state, session, StreamTraffic::Payload) {
                return (state, Vec::new());
            }
            match decode_message(&data) {
                Ok(StreamMessage::Keepalive) => {
                    scout_trace!("Keepalive on session {}", session);
                    Vec::new()
                }
                Ok(StreamMessage::Update(progress)) => apply_progress(&mut state, session, progress),
                Err(err) => {
                    scout_warn!("Malformed stream message on session {}: {}", session, err);
                    close_on_failure(&mut state, session)
                }
            }
        }
        Msg::StreamFailed { session } => {
            if !accepts_stream(&state, session, StreamTraffic::Failure) {
                return (state, Vec::new());
            }
            scout_warn!("Progress stream for session {} failed", session);
            close_on_failure(&mut state, session)
        }
        Msg::DownloadClicked => match state.downloadable_job() {
            Some(job_id) => vec![Effect::DownloadArtifact { job_id }],
            None => Vec::new(),
        },
        Msg::Tick | Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn start(state: &mut AppState) -> Vec<Effect> {
    // A running job gates the start action; requests are not queued.
    if state.status() == JobStatus::Running {
        return Vec::new();
    }
    let Some(query) = SearchQuery::new(state.term(), state.city()) else {
        return Vec::new();
    };

    // A finished job's stream is already closed; an unfinished one still
    // open at the engine is replaced when the new session opens its own.
    let session = state.begin_session(STARTING_MESSAGE);
    vec![Effect::SubmitJob { session, query }]
}

#[derive(Clone, Copy)]
enum StreamTraffic {
    Payload,
    Failure,
}

fn accepts_stream(state: &AppState, session: SessionId, traffic: StreamTraffic) -> bool {
    if state.accepts_stream(session) {
        return true;
    }
    let current = state.current_session() == Some(session);
    match traffic {
        // The server hangs up right after its terminal message.
        StreamTraffic::Failure if current && state.status().is_terminal() => {
            scout_debug!("Stream of session {} closed after terminal status", session);
        }
        StreamTraffic::Payload if current && state.status().is_terminal() => {
            scout_warn!(
                "Protocol violation: stream traffic after terminal status on session {}",
                session
            );
        }
        _ => scout_debug!("Ignoring stream traffic for stale session {}", session),
    }
    false
}

/// Message text first, then the stage counters, then the terminal status, so
/// a completing message leaves its own counters on display.
fn apply_progress(state: &mut AppState, session: SessionId, progress: ProgressUpdate) -> Vec<Effect> {
    if let Some(text) = progress.message {
        state.set_message(text);
    }
    if let Some(stage) = progress.stage {
        state.apply_stage(stage.stage, stage.progress);
    }
    let status = match progress.status {
        Some(TerminalStatus::Completed) => JobStatus::Completed,
        Some(TerminalStatus::Error) => JobStatus::Error,
        None => return Vec::new(),
    };
    if state.finish(status) {
        vec![Effect::CloseStream { session }]
    } else {
        Vec::new()
    }
}

fn close_on_failure(state: &mut AppState, session: SessionId) -> Vec<Effect> {
    if state.fail(STREAM_LOST_MESSAGE) {
        vec![Effect::CloseStream { session }]
    } else {
        Vec::new()
    }
}
