use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "clm-smoke",
    version,
    about = "Smoke-test a contract lifecycle management API"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Output machine-readable JSON")]
    pub json: bool,
    #[arg(
        long,
        global = true,
        help = "Config file (defaults to $HOME/.config/clm-smoke/config.toml)"
    )]
    pub config: Option<PathBuf>,
    #[arg(
        long,
        global = true,
        help = "Backend base URL, e.g. http://127.0.0.1:8000"
    )]
    pub base_url: Option<String>,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Register, log in and run every endpoint check against the backend.
    Run {
        #[arg(long, help = "Run against an in-process reference backend")]
        local: bool,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        password: Option<String>,
        #[arg(long)]
        full_name: Option<String>,
        #[arg(long = "only", value_name = "GROUP", help = "Restrict to a check group (repeatable)")]
        only: Vec<String>,
        #[arg(long, default_value_t = false, help = "Exit 2 when any check fails")]
        strict: bool,
    },
    /// Serve the reference backend.
    Serve {
        #[arg(long)]
        bind: Option<String>,
    },
    /// List the checks a run executes, in order.
    Checks,
}
