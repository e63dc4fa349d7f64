//! Terminal front end: argument parsing, logging setup, and the loop that
//! feeds engine events through the core `update` function.
mod app;
mod auth;
pub mod cli;
mod effects;
mod logging;
mod ui;

pub use app::{run_app, Outcome};
