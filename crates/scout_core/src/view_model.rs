use crate::{JobId, JobStatus, StageId, StageProgress};

pub const LISTING_STAGE_LABEL: &str = "Etapa 1 — Scraping Google Maps";
pub const CONTACTS_STAGE_LABEL: &str = "Etapa 2 — Extração de Contatos";

/// Read-only snapshot for the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppViewModel {
    pub status: JobStatus,
    pub message: String,
    pub listing: StageView,
    pub contacts: StageView,
    pub job_id: Option<JobId>,
    /// Progress section is hidden until the first job starts.
    pub show_results: bool,
    pub inputs_enabled: bool,
    pub can_start: bool,
    pub can_download: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageView {
    pub stage: StageId,
    pub label: &'static str,
    pub current: u64,
    pub total: u64,
    /// `None` while the stage total is unknown.
    pub percent: Option<u8>,
}

impl StageView {
    pub fn new(stage: StageId, progress: StageProgress) -> Self {
        let label = match stage {
            StageId::ListingScrape => LISTING_STAGE_LABEL,
            StageId::ContactExtraction => CONTACTS_STAGE_LABEL,
        };
        Self {
            stage,
            label,
            current: progress.current,
            total: progress.total,
            percent: progress.percent(),
        }
    }

    /// `current/total (pct%)`, or `---` while indeterminate.
    pub fn progress_text(&self) -> String {
        match self.percent {
            Some(percent) => format!("{}/{} ({}%)", self.current, self.total, percent),
            None => "---".to_string(),
        }
    }
}
