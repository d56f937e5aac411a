use clap::Parser;
use clm_smoke::cli::{Cli, Commands};
use clm_smoke::commands::{dispatch, report_failure};
use clm_smoke::services::logging::init_tracing;

fn main() {
    let cli = Cli::parse();
    let level = match cli.command {
        Commands::Serve { .. } => "info",
        _ => "warn",
    };
    init_tracing(level);

    if let Err(e) = dispatch(&cli) {
        std::process::exit(report_failure(cli.json, &e));
    }
}
