mod platform;

use std::process::ExitCode;

use clap::Parser;

fn main() -> ExitCode {
    let args = platform::cli::Args::parse();
    match platform::run_app(args) {
        Ok(outcome) => outcome.exit_code(),
        Err(err) => {
            eprintln!("Erro: {err:#}");
            ExitCode::FAILURE
        }
    }
}
