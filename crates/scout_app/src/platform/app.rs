use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{bail, Context};
use scout_core::{update, AppState, JobStatus, Msg};
use scout_engine::EngineHandle;
use scout_logging::{level_from_verbosity, scout_info, scout_warn};

use super::auth;
use super::cli::Args;
use super::effects::{EffectRunner, Inbound};
use super::logging;
use super::ui::render::TerminalRenderer;

const TICK_INTERVAL: Duration = Duration::from_millis(250);
const ENGINE_LOST: &str = "o processamento em segundo plano parou inesperadamente";

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Job completed; carries the saved artifact unless downloading was skipped.
    Completed(Option<PathBuf>),
    /// Job ended in the error state.
    Failed,
    /// Job completed but its artifact could not be retrieved.
    DownloadFailed,
}

impl Outcome {
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Outcome::Completed(_) => ExitCode::SUCCESS,
            Outcome::Failed => ExitCode::from(1),
            Outcome::DownloadFailed => ExitCode::from(2),
        }
    }
}

pub fn run_app(args: Args) -> anyhow::Result<Outcome> {
    logging::initialize(args.log, level_from_verbosity(args.verbose));

    let engine = EngineHandle::new(args.engine_settings())
        .with_context(|| format!("could not start the engine for {}", args.server))?;

    if let Some(session) = auth::authenticate(&engine, &args)? {
        println!("Conectado como {}.", session.username);
    }

    let mut controller = Controller::new(&engine);
    controller.dispatch(Msg::TermChanged(args.term.clone()));
    controller.dispatch(Msg::CityChanged(args.city.clone()));
    controller.dispatch(Msg::StartClicked);
    if controller.state.status() == JobStatus::Idle {
        bail!("informe o termo de busca e a cidade");
    }

    let status = controller.run_until_terminal()?;
    let outcome = match status {
        JobStatus::Completed if args.no_download => Outcome::Completed(None),
        JobStatus::Completed => controller.download()?,
        _ => Outcome::Failed,
    };
    engine.shutdown();
    Ok(outcome)
}

/// Owns the state and feeds every message through `update`.
struct Controller<'a> {
    state: AppState,
    effects: EffectRunner<'a>,
    renderer: TerminalRenderer,
}

impl<'a> Controller<'a> {
    fn new(engine: &'a EngineHandle) -> Self {
        Self {
            state: AppState::new(),
            effects: EffectRunner::new(engine),
            renderer: TerminalRenderer::new(),
        }
    }

    fn dispatch(&mut self, msg: Msg) {
        let state = std::mem::take(&mut self.state);
        let (mut state, effects) = update(state, msg);
        if state.consume_dirty() {
            if let Err(err) = self.renderer.render(&state.view()) {
                scout_warn!("Could not write progress to stdout: {}", err);
            }
        }
        self.state = state;
        self.effects.run(effects);
    }

    fn run_until_terminal(&mut self) -> anyhow::Result<JobStatus> {
        while !self.state.status().is_terminal() {
            match self.effects.next(TICK_INTERVAL).context(ENGINE_LOST)? {
                Some(Inbound::Msg(msg)) => self.dispatch(msg),
                Some(Inbound::Downloaded { job_id, .. }) => {
                    scout_warn!("Unexpected download result for job {}", job_id);
                }
                None => self.dispatch(Msg::Tick),
            }
        }
        Ok(self.state.status())
    }

    fn download(&mut self) -> anyhow::Result<Outcome> {
        let Some(expected) = self.state.downloadable_job() else {
            return Ok(Outcome::Completed(None));
        };
        self.dispatch(Msg::DownloadClicked);
        loop {
            match self.effects.next(TICK_INTERVAL).context(ENGINE_LOST)? {
                Some(Inbound::Downloaded { job_id, result }) if job_id == expected => {
                    return match result {
                        Ok(path) => {
                            scout_info!("Artifact saved to {:?}", path);
                            println!("Planilha salva em {}", path.display());
                            Ok(Outcome::Completed(Some(path)))
                        }
                        Err(err) => {
                            eprintln!("Erro ao baixar planilha: {err}");
                            Ok(Outcome::DownloadFailed)
                        }
                    };
                }
                // Late stream traffic is absorbed by the terminal state.
                Some(Inbound::Msg(msg)) => self.dispatch(msg),
                Some(Inbound::Downloaded { .. }) | None => {}
            }
        }
    }
}
