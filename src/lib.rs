//! `clm-smoke`: end-to-end smoke checks for a contract lifecycle management
//! API, plus an in-process reference backend to run them against.
//!
//! ## Layout
//! - `cli.rs` — clap definitions.
//! - `commands/` — thin handlers: parse, delegate, print.
//! - `services/` — runner, plan, ledger, backend and ambient helpers.
//! - `domain/` — wire and report types, constants.

pub mod cli;
pub mod commands;
pub mod domain;
pub mod services;
