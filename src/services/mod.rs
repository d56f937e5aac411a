//! Service layer containing business logic and side-effect helpers.
//!
//! ## Service map
//! - `ledger.rs` — contract store with versioning and cloning.
//! - `catalog.rs` — the ordered smoke plan, payloads and captures.
//! - `suite.rs` — runner: reset, register, login, execute the plan.
//! - `client.rs` — `Transport` seam + blocking reqwest implementation.
//! - `backend/` — axum reference backend (serve and `run --local`).
//! - `config.rs` — defaults, TOML file, env and flag layering.
//! - `base_url.rs` — base URL canonicalization.
//! - `history.rs` — local run history (JSONL).
//! - `logging.rs` — tracing subscriber setup.
//! - `output.rs` — JSON/text output helpers.
//!
//! ## Conventions
//! - Prefer pure helpers where possible.
//! - Side effects should be explicit and localized.
//! - Keep command handlers thin; delegate to services.

pub mod backend;
pub mod base_url;
pub mod catalog;
pub mod client;
pub mod config;
pub mod history;
pub mod ledger;
pub mod logging;
pub mod output;
pub mod suite;
