//! In-process reference backend for the CLM API.
//!
//! ## Files
//! - `accounts.rs` — users, bearer sessions, direct user reset.
//! - `records.rs` — templates/notifications/workflows/metadata + derived listings.
//! - `handlers.rs` — axum handlers, one per route and method.
//! - `error.rs` — `ApiError` and its REST mapping.
//! - `extract.rs` — bearer `Session` and `ApiJson` body extractors.
//!
//! Contracts are delegated to the [`ContractLedger`]; everything else is the
//! minimum a smoke run needs to exercise.

pub mod accounts;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod records;

pub use error::ApiError;

use crate::domain::constants::*;
use crate::services::ledger::ContractLedger;
use crate::services::suite::AccountReset;
use accounts::Accounts;
use axum::extract::Request;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};
use axum::Router;
use records::Records;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;
use std::time::Instant;
use tokio::sync::oneshot;
use tracing::{info, warn};

/// Number of distinct paths the router serves.
pub const ROUTE_COUNT: usize = 14;

#[derive(Debug, Default)]
pub struct Store {
    pub accounts: Accounts,
    pub ledger: ContractLedger,
    pub records: Records,
}

#[derive(Debug, Clone, Default)]
pub struct BackendState {
    inner: Arc<Mutex<Store>>,
}

impl BackendState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Locks the store. No handler holds the guard across an await point, so a
    /// poisoned lock only means a panicked handler; its data is still usable.
    pub fn lock(&self) -> MutexGuard<'_, Store> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl AccountReset for BackendState {
    fn reset_user(&self, email: &str) -> anyhow::Result<bool> {
        Ok(self.lock().accounts.remove_by_email(email))
    }
}

pub fn build_router(state: BackendState) -> Router {
    use handlers::*;
    Router::new()
        .route(ROUTE_REGISTER, post(register))
        .route(ROUTE_LOGIN, post(login))
        .route(ROUTE_CONTRACTS, post(create_contract).get(list_contracts))
        .route("/api/contracts/:id/", get(get_contract).put(update_contract))
        .route("/api/contracts/:id/create-version/", post(create_version))
        .route("/api/contracts/:id/clone/", post(clone_contract))
        .route("/api/contracts/:id/versions/", get(list_versions))
        .route(ROUTE_TEMPLATES, post(create_template).get(list_templates))
        .route(ROUTE_NOTIFICATIONS, post(create_notification).get(list_notifications))
        .route(ROUTE_WORKFLOWS, post(create_workflow).get(list_workflows))
        .route(ROUTE_METADATA_FIELDS, post(create_metadata_field).get(list_metadata_fields))
        .route(ROUTE_DOCUMENTS, get(list_documents))
        .route(ROUTE_REPOSITORY, get(repository))
        .route(ROUTE_REPOSITORY_FOLDERS, get(repository_folders))
        .layer(middleware::from_fn(trace_requests))
        .with_state(state)
}

async fn trace_requests(request: Request, next: Next) -> Response {
    let method = request.method().to_string();
    let route = request.uri().path().to_string();
    let started = Instant::now();
    let response = next.run(request).await;
    info!(
        %method,
        %route,
        status = response.status().as_u16(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "request"
    );
    response
}

/// Serves on an already bound listener until Ctrl-C.
pub async fn serve(listener: tokio::net::TcpListener, state: BackendState) -> anyhow::Result<()> {
    info!(addr = %listener.local_addr()?, "reference backend listening");
    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown requested");
        })
        .await?;
    Ok(())
}

/// A backend running on an ephemeral loopback port in a background thread.
/// Dropping the handle shuts the server down and joins the thread.
pub struct LocalBackend {
    addr: SocketAddr,
    state: BackendState,
    shutdown: Option<oneshot::Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl LocalBackend {
    pub fn spawn() -> anyhow::Result<Self> {
        let state = BackendState::new();
        let app_state = state.clone();
        let (addr_tx, addr_rx) = std::sync::mpsc::channel::<anyhow::Result<SocketAddr>>();
        let (stop_tx, stop_rx) = oneshot::channel::<()>();

        let thread = std::thread::Builder::new()
            .name("clm-local-backend".to_string())
            .spawn(move || {
                let rt = match tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                {
                    Ok(rt) => rt,
                    Err(e) => {
                        let _ = addr_tx.send(Err(e.into()));
                        return;
                    }
                };
                rt.block_on(async move {
                    let listener = match tokio::net::TcpListener::bind("127.0.0.1:0").await {
                        Ok(l) => l,
                        Err(e) => {
                            let _ = addr_tx.send(Err(e.into()));
                            return;
                        }
                    };
                    match listener.local_addr() {
                        Ok(addr) => {
                            let _ = addr_tx.send(Ok(addr));
                        }
                        Err(e) => {
                            let _ = addr_tx.send(Err(e.into()));
                            return;
                        }
                    }
                    let server = axum::serve(listener, build_router(app_state))
                        .with_graceful_shutdown(async {
                            let _ = stop_rx.await;
                        });
                    if let Err(e) = server.await {
                        warn!(error = %e, "local backend stopped with error");
                    }
                });
            })?;

        let addr = addr_rx
            .recv()
            .map_err(|_| anyhow::anyhow!("local backend exited before binding"))??;
        info!(%addr, "local backend started");
        Ok(Self {
            addr,
            state,
            shutdown: Some(stop_tx),
            thread: Some(thread),
        })
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn state(&self) -> &BackendState {
        &self.state
    }
}

impl Drop for LocalBackend {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }
}
