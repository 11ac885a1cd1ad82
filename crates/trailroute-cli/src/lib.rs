//! Trailroute CLI library.
//!
//! Command handlers, logging setup and output formatting for the
//! `trailroute-cli` binary. `main.rs` only parses arguments and dispatches.

pub mod commands;
pub mod logging;
pub mod output;
