use std::io::{self, Write};

use scout_core::password::RuleCheck;
use scout_core::{AppViewModel, JobStatus, StageView};

const BAR_WIDTH: usize = 30;

/// Writes view snapshots to stdout, skipping snapshots that render identically.
#[derive(Default)]
pub struct TerminalRenderer {
    last: Vec<String>,
}

impl TerminalRenderer {
    pub fn new() -> Self {
        Self { last: Vec::new() }
    }

    pub fn render(&mut self, view: &AppViewModel) -> io::Result<()> {
        let lines = render_lines(view);
        if lines.is_empty() || lines == self.last {
            return Ok(());
        }
        let mut out = io::stdout().lock();
        for line in &lines {
            writeln!(out, "{line}")?;
        }
        writeln!(out)?;
        out.flush()?;
        self.last = lines;
        Ok(())
    }
}

/// Text rows for one view snapshot; empty before the first job starts.
pub fn render_lines(view: &AppViewModel) -> Vec<String> {
    if !view.show_results {
        return Vec::new();
    }
    let mut lines = vec![
        format!("[{}] {}", status_label(view.status), view.message),
        stage_line(&view.listing),
        stage_line(&view.contacts),
    ];
    if view.can_download {
        if let Some(job_id) = &view.job_id {
            lines.push(format!("Planilha pronta (job {job_id})"));
        }
    }
    lines
}

pub fn status_label(status: JobStatus) -> &'static str {
    match status {
        JobStatus::Idle => "aguardando",
        JobStatus::Running => "em andamento",
        JobStatus::Completed => "concluído",
        JobStatus::Error => "erro",
    }
}

fn stage_line(stage: &StageView) -> String {
    format!(
        "{:<32} {} {}",
        stage.label,
        progress_bar(stage.percent, BAR_WIDTH),
        stage.progress_text()
    )
}

/// `[#####-----]`; an unknown percentage draws an empty bar.
pub fn progress_bar(percent: Option<u8>, width: usize) -> String {
    let filled = percent
        .map(|p| (usize::from(p.min(100)) * width + 50) / 100)
        .unwrap_or(0);
    format!("[{}{}]", "#".repeat(filled), "-".repeat(width - filled))
}

/// One `[x]`/`[ ]` row per password rule.
pub fn password_checklist(checks: &[RuleCheck]) -> Vec<String> {
    checks
        .iter()
        .map(|check| {
            let mark = if check.passed { 'x' } else { ' ' };
            format!("  [{mark}] {}", check.rule.label())
        })
        .collect()
}
