use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use scout_engine::EngineSettings;

use super::logging::LogDestination;

#[derive(Debug, Parser)]
#[command(name = "scout")]
#[command(
    about = "Run a Google Maps listing scrape plus contact extraction and download the spreadsheet",
    long_about = None
)]
pub struct Args {
    /// Search term, e.g. "confecções"
    #[arg(long)]
    pub term: String,

    /// City to search in, e.g. "Nova Friburgo"
    #[arg(long)]
    pub city: String,

    /// Base URL of the scraper server
    #[arg(long, env = "SCOUT_SERVER", default_value = "http://127.0.0.1:5001")]
    pub server: String,

    /// Directory the produced spreadsheet is saved into
    #[arg(long, env = "SCOUT_OUTPUT_DIR", default_value = "downloads")]
    pub output_dir: PathBuf,

    /// Account e-mail; when set, the client logs in before submitting
    #[arg(long, env = "SCOUT_EMAIL")]
    pub email: Option<String>,

    /// Account password
    #[arg(long, env = "SCOUT_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Create the account instead of logging in
    #[arg(long, requires = "email")]
    pub register: bool,

    /// Display name for a new account
    #[arg(long)]
    pub name: Option<String>,

    /// Password confirmation for a new account
    #[arg(long, hide_env_values = true, env = "SCOUT_CONFIRM_PASSWORD")]
    pub confirm_password: Option<String>,

    /// Leave the artifact on the server after the job completes
    #[arg(long)]
    pub no_download: bool,

    /// Connect timeout in seconds
    #[arg(long, default_value_t = 10)]
    pub connect_timeout: u64,

    /// Request timeout in seconds (the progress stream is not bounded)
    #[arg(long, default_value_t = 30)]
    pub request_timeout: u64,

    /// Where log lines go
    #[arg(long, value_enum, default_value_t = LogDestination::Terminal)]
    pub log: LogDestination,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            base_url: self.server.clone(),
            connect_timeout: Duration::from_secs(self.connect_timeout),
            request_timeout: Duration::from_secs(self.request_timeout),
            output_dir: self.output_dir.clone(),
        }
    }
}
