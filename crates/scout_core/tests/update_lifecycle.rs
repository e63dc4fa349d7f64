use std::sync::Once;

use pretty_assertions::assert_eq;
use scout_core::{
    update, AppState, Effect, JobId, JobStatus, Msg, SearchQuery, SessionId, StageId,
    StageProgress, CONNECTION_ERROR_MESSAGE, STARTING_MESSAGE, STREAM_LOST_MESSAGE,
    SUBMISSION_REJECTED_MESSAGE,
};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(scout_logging::initialize_for_tests);
}

fn start_job(state: AppState, term: &str, city: &str) -> (AppState, Vec<Effect>) {
    let (state, _) = update(state, Msg::TermChanged(term.to_string()));
    let (state, _) = update(state, Msg::CityChanged(city.to_string()));
    update(state, Msg::StartClicked)
}

fn submitted_session(effects: &[Effect]) -> SessionId {
    effects
        .iter()
        .find_map(|effect| match effect {
            Effect::SubmitJob { session, .. } => Some(*session),
            _ => None,
        })
        .expect("submit effect")
}

/// Starts a job and lets the server accept it, leaving the stream open.
fn streaming_job(state: AppState, job_id: &str) -> (AppState, SessionId) {
    let (state, effects) = start_job(state, "padarias", "Niterói");
    let session = submitted_session(&effects);
    let (state, _) = update(
        state,
        Msg::SubmissionAccepted {
            session,
            job_id: JobId::new(job_id),
        },
    );
    (state, session)
}

fn payload(state: AppState, session: SessionId, data: &str) -> (AppState, Vec<Effect>) {
    update(
        state,
        Msg::StreamPayload {
            session,
            data: data.to_string(),
        },
    )
}

#[test]
fn start_resets_progress_and_runs_before_any_response() {
    init_logging();
    let (state, session) = streaming_job(AppState::new(), "job-1");
    let (state, _) = payload(state, session, r#"{"stage":1,"current":4,"total":9}"#);
    let (state, _) = payload(
        state,
        session,
        r#"{"stage":2,"current":9,"total":9,"status":"completed"}"#,
    );
    assert_eq!(state.status(), JobStatus::Completed);

    let (state, effects) = start_job(state, "  confecções ", " Nova Friburgo");

    assert_eq!(state.status(), JobStatus::Running);
    assert_eq!(state.stage(StageId::ListingScrape), StageProgress::default());
    assert_eq!(state.stage(StageId::ContactExtraction), StageProgress::default());
    assert_eq!(state.message(), STARTING_MESSAGE);
    assert_eq!(state.job_id(), None);
    assert_eq!(
        effects,
        vec![Effect::SubmitJob {
            session: SessionId(2),
            query: SearchQuery {
                term: "confecções".to_string(),
                city: "Nova Friburgo".to_string(),
            },
        }]
    );
    assert!(!state.view().can_download);
}

#[test]
fn start_with_blank_input_is_noop() {
    init_logging();
    let (state, effects) = start_job(AppState::new(), "   ", "Niterói");
    assert!(effects.is_empty());
    assert_eq!(state.status(), JobStatus::Idle);
    assert!(!state.view().can_start);

    let (state, effects) = start_job(state, "padarias", "");
    assert!(effects.is_empty());
    assert_eq!(state.status(), JobStatus::Idle);
}

#[test]
fn start_is_gated_while_running() {
    init_logging();
    let (state, effects) = start_job(AppState::new(), "padarias", "Niterói");
    assert_eq!(effects.len(), 1);
    assert!(!state.view().can_start);
    assert!(!state.view().inputs_enabled);

    let (state, effects) = update(state, Msg::StartClicked);
    assert!(effects.is_empty());
    assert_eq!(state.current_session(), Some(SessionId(1)));

    let (state, _session) = streaming_job(AppState::new(), "job-1");
    let (_state, effects) = update(state, Msg::StartClicked);
    assert!(effects.is_empty());
}

#[test]
fn keepalive_changes_nothing() {
    init_logging();
    let (state, session) = streaming_job(AppState::new(), "job-1");
    let (mut state, _) = payload(
        state,
        session,
        r#"{"stage":1,"current":3,"total":7,"message":"Extraindo empresa 3/7"}"#,
    );
    assert!(state.consume_dirty());

    let before = state.clone();
    let (mut state, effects) = payload(state, session, r#"{"keepalive":true}"#);
    assert_eq!(state, before);
    assert!(effects.is_empty());
    assert!(!state.consume_dirty());

    // The flag wins over any other field riding along.
    let (state, effects) = payload(
        state,
        session,
        r#"{"keepalive":true,"stage":2,"current":1,"total":1,"status":"completed","message":"x"}"#,
    );
    assert_eq!(state, before);
    assert!(effects.is_empty());
}

#[test]
fn keepalive_before_first_update_keeps_stages_indeterminate() {
    init_logging();
    let (state, session) = streaming_job(AppState::new(), "job-1");
    let (state, _) = payload(state, session, r#"{"keepalive":true}"#);

    let view = state.view();
    assert_eq!(view.listing.percent, None);
    assert_eq!(view.contacts.percent, None);
    assert_eq!(view.message, STARTING_MESSAGE);
}

#[test]
fn stage_updates_never_reset_the_other_stage() {
    init_logging();
    let (state, session) = streaming_job(AppState::new(), "job-1");
    let (state, _) = payload(state, session, r#"{"stage":1,"current":5,"total":12}"#);
    let (state, _) = payload(state, session, r#"{"stage":2,"current":1,"total":1}"#);

    assert_eq!(state.stage(StageId::ListingScrape), StageProgress::new(5, 12));
    assert_eq!(state.stage(StageId::ContactExtraction), StageProgress::new(1, 1));
    assert_eq!(state.status(), JobStatus::Running);
}

#[test]
fn happy_path_completes_and_enables_download() {
    init_logging();
    let (state, effects) = start_job(AppState::new(), "padarias", "Niterói");
    assert_eq!(state.status(), JobStatus::Running);
    let session = submitted_session(&effects);

    let (state, effects) = update(
        state,
        Msg::SubmissionAccepted {
            session,
            job_id: JobId::new("job-1"),
        },
    );
    assert_eq!(
        effects,
        vec![Effect::OpenStream {
            session,
            job_id: JobId::new("job-1"),
        }]
    );
    assert!(state.is_stream_open());

    let (state, effects) = payload(state, session, r#"{"stage":1,"current":10,"total":10}"#);
    assert!(effects.is_empty());

    let (state, effects) = payload(
        state,
        session,
        r#"{"stage":2,"current":10,"total":10,"status":"completed","message":"Concluído"}"#,
    );
    assert_eq!(effects, vec![Effect::CloseStream { session }]);
    assert_eq!(state.status(), JobStatus::Completed);
    assert_eq!(state.message(), "Concluído");
    assert_eq!(state.stage(StageId::ListingScrape), StageProgress::new(10, 10));
    assert_eq!(state.stage(StageId::ContactExtraction), StageProgress::new(10, 10));
    assert!(!state.is_stream_open());

    let view = state.view();
    assert!(view.can_download);
    assert!(view.can_start);
    assert_eq!(view.job_id, Some(JobId::new("job-1")));

    // Each click is its own retrieval.
    let (state, effects) = update(state, Msg::DownloadClicked);
    assert_eq!(
        effects,
        vec![Effect::DownloadArtifact {
            job_id: JobId::new("job-1")
        }]
    );
    let (_state, effects) = update(state, Msg::DownloadClicked);
    assert_eq!(effects.len(), 1);
}

#[test]
fn rejected_submission_surfaces_server_text_without_stream() {
    init_logging();
    let (state, effects) = start_job(AppState::new(), "padarias", "Niterói");
    let session = submitted_session(&effects);

    let (state, effects) = update(
        state,
        Msg::SubmissionRejected {
            session,
            error: Some("Cidade inválida".to_string()),
        },
    );
    assert!(effects.is_empty());
    assert_eq!(state.status(), JobStatus::Error);
    assert_eq!(state.message(), "Cidade inválida");
    assert!(!state.is_stream_open());
    assert!(state.view().can_start);

    // A late acceptance for the failed session must not open a stream.
    let (state, effects) = update(
        state,
        Msg::SubmissionAccepted {
            session,
            job_id: JobId::new("job-late"),
        },
    );
    assert!(effects.is_empty());
    assert_eq!(state.status(), JobStatus::Error);
    assert_eq!(state.job_id(), None);
}

#[test]
fn rejected_submission_without_text_uses_generic_message() {
    init_logging();
    let (state, effects) = start_job(AppState::new(), "padarias", "Niterói");
    let session = submitted_session(&effects);

    let (state, _) = update(
        state,
        Msg::SubmissionRejected {
            session,
            error: None,
        },
    );
    assert_eq!(state.message(), SUBMISSION_REJECTED_MESSAGE);
}

#[test]
fn unreachable_server_fails_the_submission() {
    init_logging();
    let (state, effects) = start_job(AppState::new(), "padarias", "Niterói");
    let session = submitted_session(&effects);

    let (state, effects) = update(state, Msg::SubmissionFailed { session });
    assert!(effects.is_empty());
    assert_eq!(state.status(), JobStatus::Error);
    assert_eq!(state.message(), CONNECTION_ERROR_MESSAGE);
}

#[test]
fn stream_failure_mid_job_ends_session_in_error() {
    init_logging();
    let (state, session) = streaming_job(AppState::new(), "job-1");
    let (state, _) = payload(state, session, r#"{"stage":1,"current":2,"total":8}"#);

    let (state, effects) = update(state, Msg::StreamFailed { session });
    assert_eq!(effects, vec![Effect::CloseStream { session }]);
    assert_eq!(state.status(), JobStatus::Error);
    assert_eq!(state.message(), STREAM_LOST_MESSAGE);
    assert!(!state.is_stream_open());
    assert_eq!(state.stage(StageId::ListingScrape), StageProgress::new(2, 8));

    let view = state.view();
    assert!(!view.can_download);
    let (_state, effects) = update(state, Msg::DownloadClicked);
    assert!(effects.is_empty());
}

#[test]
fn malformed_payload_is_fatal_like_a_transport_error() {
    init_logging();
    for bad in [
        "not json",
        "[1,2,3]",
        r#"{"stage":3,"current":1,"total":1}"#,
        r#"{"stage":1,"current":-1,"total":4}"#,
        r#"{"stage":1}"#,
        r#"{"status":"paused"}"#,
    ] {
        let (state, session) = streaming_job(AppState::new(), "job-1");
        let (state, effects) = payload(state, session, bad);
        assert_eq!(effects, vec![Effect::CloseStream { session }], "{bad}");
        assert_eq!(state.status(), JobStatus::Error, "{bad}");
        assert_eq!(state.message(), STREAM_LOST_MESSAGE, "{bad}");
    }
}

#[test]
fn server_side_error_status_is_terminal() {
    init_logging();
    let (state, session) = streaming_job(AppState::new(), "job-1");
    let (state, effects) = payload(
        state,
        session,
        r#"{"stage":1,"current":0,"total":0,"status":"error","message":"Nenhum dado encontrado no Google Maps."}"#,
    );
    assert_eq!(effects, vec![Effect::CloseStream { session }]);
    assert_eq!(state.status(), JobStatus::Error);
    assert_eq!(state.message(), "Nenhum dado encontrado no Google Maps.");
    assert!(!state.view().can_download);
}

#[test]
fn messages_after_terminal_status_are_ignored() {
    init_logging();
    let (state, session) = streaming_job(AppState::new(), "job-1");
    let (state, _) = payload(
        state,
        session,
        r#"{"stage":2,"current":4,"total":4,"status":"completed","message":"Concluído"}"#,
    );
    let before = state.clone();

    let (state, effects) = payload(
        state,
        session,
        r#"{"stage":1,"current":1,"total":9,"message":"late"}"#,
    );
    assert!(effects.is_empty());
    assert_eq!(state, before);

    let (state, effects) = payload(state, session, r#"{"status":"error","message":"dup"}"#);
    assert!(effects.is_empty());
    assert_eq!(state, before);

    let (state, effects) = payload(state, session, "garbage");
    assert!(effects.is_empty());
    assert_eq!(state, before);

    // The stream is already closed; another close request is not issued.
    let (state, effects) = update(state, Msg::StreamFailed { session });
    assert!(effects.is_empty());
    assert_eq!(state, before);
}

#[test]
fn traffic_from_a_replaced_session_is_ignored() {
    init_logging();
    let (state, first) = streaming_job(AppState::new(), "job-1");
    let (state, _) = update(state, Msg::StreamFailed { session: first });

    let (state, second) = streaming_job(state, "job-2");
    assert_ne!(first, second);
    let (state, _) = payload(state, second, r#"{"stage":1,"current":1,"total":3}"#);
    let before = state.clone();

    let (state, effects) = payload(
        state,
        first,
        r#"{"stage":1,"current":9,"total":9,"status":"completed"}"#,
    );
    assert!(effects.is_empty());
    assert_eq!(state, before);

    let (state, effects) = update(state, Msg::StreamFailed { session: first });
    assert!(effects.is_empty());
    assert_eq!(state.status(), JobStatus::Running);
    assert_eq!(state.job_id(), Some(&JobId::new("job-2")));
}

#[test]
fn restart_after_a_failed_job_only_submits() {
    init_logging();
    let (state, session) = streaming_job(AppState::new(), "job-1");
    let (state, effects) = update(state, Msg::StreamFailed { session });
    assert_eq!(effects, vec![Effect::CloseStream { session }]);

    let (state, effects) = update(state, Msg::StartClicked);
    let next = submitted_session(&effects);
    assert_eq!(effects.len(), 1);
    assert_ne!(next, session);
    assert_eq!(state.status(), JobStatus::Running);
}

#[test]
fn message_text_always_overwrites_status_line() {
    init_logging();
    let (state, session) = streaming_job(AppState::new(), "job-1");
    let (state, _) = payload(state, session, r#"{"message":"Iniciando busca no Google Maps..."}"#);
    assert_eq!(state.message(), "Iniciando busca no Google Maps...");

    let (state, _) = payload(
        state,
        session,
        r#"{"stage":1,"current":1,"total":2,"status":"running","message":"Extraindo empresa 1/2"}"#,
    );
    assert_eq!(state.message(), "Extraindo empresa 1/2");
    assert_eq!(state.status(), JobStatus::Running);

    // Empty text is treated as absent.
    let (state, _) = payload(state, session, r#"{"stage":1,"current":2,"total":2,"message":""}"#);
    assert_eq!(state.message(), "Extraindo empresa 1/2");
    assert_eq!(state.stage(StageId::ListingScrape), StageProgress::new(2, 2));
}

#[test]
fn download_requires_completion() {
    init_logging();
    let (state, effects) = update(AppState::new(), Msg::DownloadClicked);
    assert!(effects.is_empty());

    let (state, _session) = streaming_job(state, "job-1");
    let (_state, effects) = update(state, Msg::DownloadClicked);
    assert!(effects.is_empty());
}
