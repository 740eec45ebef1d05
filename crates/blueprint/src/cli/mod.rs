//! # CLI Layer
//!
//! This module is **one possible UI client** for blueprintapp. It is the only
//! place that knows about stdout, stderr and exit codes.
//!
//! ## Output
//!
//! Every command returns a `CmdResult`. By default it is rendered as styled
//! text; with `--json` the whole result is printed as JSON, which is what
//! scripts and the end-to-end tests read.
//!
//! A rejected edit prints its result and then fails with the rejection
//! message, so the exit status reflects it.
//!
//! ## Logging
//!
//! Diagnostics go to stderr through `tracing`. The filter comes from
//! `BLUEPRINT_LOG` (e.g. `BLUEPRINT_LOG=blueprintapp=debug`), defaulting to
//! `warn`, or `debug` with `-v`.
//!
//! ## Module Structure
//!
//! - `setup`: argument parsing via clap
//! - `commands`: context wiring and dispatch
//! - `render`: text output

mod commands;
mod render;
pub mod setup;

pub use commands::run;
