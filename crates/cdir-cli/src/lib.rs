//! # cdir-cli -- Central directory command-line tool
//!
//! Library half of the `cdir` binary: startup wiring in [`app`] and the
//! subcommand handlers in [`commands`]. Kept separate from `main.rs` so the
//! handlers can be tested against in-memory directories.

pub mod app;
pub mod commands;
