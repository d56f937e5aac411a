//! Command handler layer.
//!
//! This module owns CLI-oriented orchestration and output wiring.
//!
//! ## Files
//! - `runtime.rs` — run/checks.
//! - `serve.rs` — reference backend server.
//!
//! ## Principles
//! - Parse/match CLI inputs here.
//! - Delegate business logic to `services/*`.
//! - Keep behavior and output schema stable.

pub mod runtime;
pub mod serve;

pub use runtime::handle_runtime_commands;
pub use serve::handle_serve_commands;

use crate::cli::Cli;
use crate::services::config::ConfigError;
use crate::services::output::print_error;
use crate::services::suite::SmokeError;

/// A command outcome that maps to a specific exit code. `reported` means the
/// user has already seen it and nothing more should be printed.
#[derive(thiserror::Error, Debug)]
#[error("{message}")]
pub struct CommandFailure {
    pub code: &'static str,
    pub message: String,
    pub exit: i32,
    pub reported: bool,
}

impl CommandFailure {
    pub fn config(message: impl Into<String>) -> Self {
        Self {
            code: "CONFIG_INVALID",
            message: message.into(),
            exit: 1,
            reported: false,
        }
    }
}

pub fn dispatch(cli: &Cli) -> anyhow::Result<()> {
    if handle_runtime_commands(cli)? {
        return Ok(());
    }
    if handle_serve_commands(cli)? {
        return Ok(());
    }
    anyhow::bail!("unhandled command")
}

/// Prints `err` unless already shown and returns the process exit code.
pub fn report_failure(json: bool, err: &anyhow::Error) -> i32 {
    if let Some(f) = err.downcast_ref::<CommandFailure>() {
        if !f.reported {
            print_error(json, f.code, &f.message);
        }
        return f.exit;
    }
    let code = if err.downcast_ref::<ConfigError>().is_some() {
        "CONFIG_INVALID"
    } else if let Some(e) = err.downcast_ref::<SmokeError>() {
        e.code()
    } else {
        "INTERNAL"
    };
    print_error(json, code, &format!("{:#}", err));
    1
}
