//! Shared data model layer (structs/constants only).
//!
//! ## Purpose
//! - Keep wire payloads and report structs in one place.
//! - Avoid cyclic imports between the runner and the reference backend.
//! - Make JSON output schema changes explicit and reviewable.
//!
//! ## Files
//! - `models.rs` — request payloads, check records, run report, output envelopes.
//! - `constants.rs` — routes, default credentials, banner width.
//!
//! ## Rule of thumb
//! Domain types should be data-only: no filesystem/network side effects.
//!
//! ## Compatibility note
//! Changes in these structs can affect `--json` outputs.
//! Keep schema-impacting changes synchronized with `docs/contracts/*`.

pub mod constants;
pub mod models;
