use crate::cli::{Cli, Commands};
use crate::domain::models::ServeInfo;
use crate::services::backend::{serve, BackendState, ROUTE_COUNT};
use crate::services::config::{self, Overrides};
use crate::services::output::print_one;

pub fn handle_serve_commands(cli: &Cli) -> anyhow::Result<bool> {
    let Commands::Serve { bind } = &cli.command else {
        return Ok(false);
    };

    let overrides = Overrides {
        base_url: cli.base_url.clone(),
        bind: bind.clone(),
        ..Default::default()
    };
    let cfg = config::load(cli.config.as_deref(), overrides)?;

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    rt.block_on(async {
        let listener = tokio::net::TcpListener::bind(&cfg.bind).await?;
        let info = ServeInfo {
            bind: listener.local_addr()?.to_string(),
            routes: ROUTE_COUNT,
        };
        print_one(cli.json, true, info, |i| {
            format!("serving {} routes on http://{}", i.routes, i.bind)
        })?;
        serve(listener, BackendState::new()).await
    })?;
    Ok(true)
}
