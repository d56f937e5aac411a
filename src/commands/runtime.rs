use super::CommandFailure;
use crate::cli::{Cli, Commands};
use crate::domain::models::{JsonOut, PlanEntry, RunReport};
use crate::services::backend::LocalBackend;
use crate::services::catalog::{select, smoke_plan, Check};
use crate::services::client::HttpTransport;
use crate::services::config::{self, Overrides};
use crate::services::history::record_run;
use crate::services::output::{print_out, TextProgress};
use crate::services::suite::{Credentials, Silent, SmokeError, SuiteRunner};
use tracing::info;

pub fn handle_runtime_commands(cli: &Cli) -> anyhow::Result<bool> {
    match &cli.command {
        Commands::Checks => {
            let plan: Vec<PlanEntry> = smoke_plan().iter().map(Check::plan_entry).collect();
            print_out(cli.json, &plan, |p| {
                let expect: Vec<String> = p.expect.iter().map(u16::to_string).collect();
                format!(
                    "{}\t{}\t{} {}\t{}",
                    p.group,
                    p.name,
                    p.method,
                    p.path,
                    expect.join(",")
                )
            })?;
        }
        Commands::Run {
            local,
            email,
            password,
            full_name,
            only,
            strict,
        } => {
            let overrides = Overrides {
                base_url: cli.base_url.clone(),
                email: email.clone(),
                password: password.clone(),
                full_name: full_name.clone(),
                bind: None,
            };
            let cfg = config::load(cli.config.as_deref(), overrides)?;
            let plan = select(smoke_plan(), only).map_err(|e| CommandFailure::config(e.to_string()))?;

            // Declared before the transport so the server outlives every request.
            let backend = if *local {
                Some(LocalBackend::spawn()?)
            } else {
                None
            };
            let base_url = backend
                .as_ref()
                .map(LocalBackend::base_url)
                .unwrap_or_else(|| cfg.base_url.clone());
            info!(%base_url, checks = plan.len(), local = *local, "starting smoke run");

            let transport = HttpTransport::new(&base_url, cfg.timeout_ms)?;
            let credentials = Credentials {
                email: cfg.email.clone(),
                password: cfg.password.clone(),
                full_name: cfg.full_name.clone(),
            };
            let mut runner = SuiteRunner::new(&transport, &base_url, credentials, plan);
            if let Some(b) = &backend {
                runner = runner.with_reset(b.state());
            }

            let report = run_and_print(cli.json, &runner)?;
            record_run(&report);

            if *strict && report.failed > 0 {
                return Err(CommandFailure {
                    code: "CHECKS_FAILED",
                    message: format!("{} of {} checks failed", report.failed, report.total),
                    exit: 2,
                    reported: true,
                }
                .into());
            }
        }
        _ => return Ok(false),
    }
    Ok(true)
}

fn run_and_print(
    json: bool,
    runner: &SuiteRunner<'_, HttpTransport>,
) -> anyhow::Result<RunReport> {
    let result = if json {
        runner.run(&mut Silent)
    } else {
        let mut progress = TextProgress::stdout();
        progress.header();
        let result = runner.run(&mut progress);
        match &result {
            Ok(report) => progress.summary(report),
            Err(SmokeError::LoginFailed { body, .. }) => progress.login_failed(body),
            Err(_) => {}
        }
        result
    };

    match result {
        Ok(report) => {
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&JsonOut {
                        ok: report.failed == 0,
                        data: &report
                    })?
                );
            }
            Ok(report)
        }
        Err(e @ SmokeError::LoginFailed { .. }) => Err(CommandFailure {
            code: e.code(),
            message: e.to_string(),
            exit: 1,
            reported: !json,
        }
        .into()),
        Err(e) => Err(e.into()),
    }
}
