use std::sync::Mutex;

use log::{Level, LevelFilter, Log, Metadata, Record};
use scout_core::{update, AppState, Effect, JobId, Msg, SessionId};

/// Keeps every scout record so tests can assert on levels.
struct Capture {
    records: Mutex<Vec<(Level, String)>>,
}

impl Log for Capture {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        if record.target().starts_with("scout") {
            self.records
                .lock()
                .unwrap()
                .push((record.level(), record.args().to_string()));
        }
    }

    fn flush(&self) {}
}

static CAPTURE: Capture = Capture {
    records: Mutex::new(Vec::new()),
};

fn take_records() -> Vec<(Level, String)> {
    std::mem::take(&mut *CAPTURE.records.lock().unwrap())
}

fn completed_job() -> (AppState, SessionId) {
    let (state, _) = update(AppState::new(), Msg::TermChanged("padarias".into()));
    let (state, _) = update(state, Msg::CityChanged("Niterói".into()));
    let (state, effects) = update(state, Msg::StartClicked);
    let session = match effects.as_slice() {
        [Effect::SubmitJob { session, .. }] => *session,
        other => panic!("unexpected effects {other:?}"),
    };
    let (state, _) = update(
        state,
        Msg::SubmissionAccepted {
            session,
            job_id: JobId::new("job-1"),
        },
    );
    let (state, _) = update(
        state,
        Msg::StreamPayload {
            session,
            data: r#"{"stage":2,"current":3,"total":3,"status":"completed"}"#.into(),
        },
    );
    (state, session)
}

// One test per binary: the logger is process-global.
#[test]
fn traffic_after_terminal_status_is_logged_by_kind() {
    log::set_logger(&CAPTURE).expect("first logger");
    log::set_max_level(LevelFilter::Trace);

    let (state, session) = completed_job();
    take_records();

    // Normal hang-up after the final message.
    let (state, _) = update(state, Msg::StreamFailed { session });
    let records = take_records();
    assert!(!records.is_empty());
    assert!(records.iter().all(|(level, _)| *level == Level::Debug), "{records:?}");

    // A payload after the final message is a server bug.
    let (state, _) = update(
        state,
        Msg::StreamPayload {
            session,
            data: r#"{"message":"late"}"#.into(),
        },
    );
    let records = take_records();
    assert!(
        records
            .iter()
            .any(|(level, text)| *level == Level::Warn && text.contains("Protocol violation")),
        "{records:?}"
    );

    // Traffic from a session that is not current stays at debug.
    let (_, _) = update(state, Msg::StreamFailed { session: SessionId(99) });
    let records = take_records();
    assert!(records.iter().all(|(level, _)| *level == Level::Debug), "{records:?}");
}
