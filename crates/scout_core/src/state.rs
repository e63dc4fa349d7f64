use std::fmt;

use crate::view_model::{AppViewModel, StageView};

/// Opaque job identifier issued by the server on submission.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JobId(String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Client-local generation number; one per `start`.
///
/// Every submission response and stream message is tagged with the session it
/// belongs to, so anything addressed to a replaced session is recognizably stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageId {
    /// Stage 1: Google Maps listing scrape.
    ListingScrape,
    /// Stage 2: contact extraction from the scraped listings.
    ContactExtraction,
}

impl StageId {
    pub const ALL: [StageId; 2] = [StageId::ListingScrape, StageId::ContactExtraction];

    /// Wire number of the stage (`1` or `2`).
    pub fn number(self) -> u8 {
        match self {
            StageId::ListingScrape => 1,
            StageId::ContactExtraction => 2,
        }
    }

    pub fn from_number(number: u8) -> Option<Self> {
        match number {
            1 => Some(StageId::ListingScrape),
            2 => Some(StageId::ContactExtraction),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StageProgress {
    pub current: u64,
    pub total: u64,
}

impl StageProgress {
    pub fn new(current: u64, total: u64) -> Self {
        Self { current, total }
    }

    /// No total known yet; must not be shown as `0%`.
    pub fn is_indeterminate(&self) -> bool {
        self.total == 0
    }

    /// Rounded completion percentage, `None` while indeterminate.
    pub fn percent(&self) -> Option<u8> {
        if self.is_indeterminate() {
            return None;
        }
        let current = u128::from(self.current.min(self.total));
        let total = u128::from(self.total);
        let rounded = (current * 100 + total / 2) / total;
        Some(rounded.min(100) as u8)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JobStatus {
    #[default]
    Idle,
    Running,
    Completed,
    Error,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Error)
    }
}

/// A validated search request: both fields trimmed and non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub term: String,
    pub city: String,
}

impl SearchQuery {
    pub fn new(term: &str, city: &str) -> Option<Self> {
        let term = term.trim();
        let city = city.trim();
        if term.is_empty() || city.is_empty() {
            return None;
        }
        Some(Self {
            term: term.to_string(),
            city: city.to_string(),
        })
    }
}

/// Canonical client state: form inputs plus the single active job session.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    term: String,
    city: String,
    status: JobStatus,
    listing: StageProgress,
    contacts: StageProgress,
    message: String,
    job_id: Option<JobId>,
    session: Option<SessionId>,
    sessions_started: u64,
    awaiting_submission: bool,
    stream_open: bool,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> AppViewModel {
        let running = self.status == JobStatus::Running;
        AppViewModel {
            status: self.status,
            message: self.message.clone(),
            listing: StageView::new(StageId::ListingScrape, self.listing),
            contacts: StageView::new(StageId::ContactExtraction, self.contacts),
            job_id: self.job_id.clone(),
            show_results: self.status != JobStatus::Idle,
            inputs_enabled: !running,
            can_start: !running && SearchQuery::new(&self.term, &self.city).is_some(),
            can_download: self.downloadable_job().is_some(),
        }
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    pub fn stage(&self, stage: StageId) -> StageProgress {
        match stage {
            StageId::ListingScrape => self.listing,
            StageId::ContactExtraction => self.contacts,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn job_id(&self) -> Option<&JobId> {
        self.job_id.as_ref()
    }

    pub fn term(&self) -> &str {
        &self.term
    }

    pub fn city(&self) -> &str {
        &self.city
    }

    pub fn current_session(&self) -> Option<SessionId> {
        self.session
    }

    pub fn is_stream_open(&self) -> bool {
        self.stream_open
    }

    /// Returns whether anything visible changed since the last call.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// The job whose artifact may be fetched; only set once completed.
    pub fn downloadable_job(&self) -> Option<JobId> {
        match self.status {
            JobStatus::Completed => self.job_id.clone(),
            _ => None,
        }
    }

    pub(crate) fn set_term(&mut self, term: String) {
        if self.term != term {
            self.term = term;
            self.dirty = true;
        }
    }

    pub(crate) fn set_city(&mut self, city: String) {
        if self.city != city {
            self.city = city;
            self.dirty = true;
        }
    }

    /// Starts a fresh session and returns its id.
    pub(crate) fn begin_session(&mut self, message: &str) -> SessionId {
        self.sessions_started += 1;
        let session = SessionId(self.sessions_started);

        self.session = Some(session);
        self.status = JobStatus::Running;
        self.listing = StageProgress::default();
        self.contacts = StageProgress::default();
        self.message = message.to_string();
        self.job_id = None;
        self.awaiting_submission = true;
        self.stream_open = false;
        self.dirty = true;
        session
    }

    pub(crate) fn is_awaiting_submission(&self, session: SessionId) -> bool {
        self.session == Some(session) && self.awaiting_submission
    }

    /// Whether stream traffic for `session` may still mutate state.
    pub(crate) fn accepts_stream(&self, session: SessionId) -> bool {
        self.session == Some(session) && self.stream_open && self.status == JobStatus::Running
    }

    pub(crate) fn accept_submission(&mut self, job_id: JobId) {
        self.job_id = Some(job_id);
        self.awaiting_submission = false;
        self.stream_open = true;
        self.dirty = true;
    }

    pub(crate) fn set_message(&mut self, message: String) {
        self.message = message;
        self.dirty = true;
    }

    pub(crate) fn apply_stage(&mut self, stage: StageId, progress: StageProgress) {
        match stage {
            StageId::ListingScrape => self.listing = progress,
            StageId::ContactExtraction => self.contacts = progress,
        }
        self.dirty = true;
    }

    /// Moves to a terminal status and marks the stream closed.
    /// Returns whether a stream was open for the caller to close.
    pub(crate) fn finish(&mut self, status: JobStatus) -> bool {
        debug_assert!(status.is_terminal());
        self.status = status;
        self.awaiting_submission = false;
        self.dirty = true;
        std::mem::take(&mut self.stream_open)
    }

    pub(crate) fn fail(&mut self, message: &str) -> bool {
        self.message = message.to_string();
        self.finish(JobStatus::Error)
    }
}
