//! # CLI Behavior
//!
//! This is **one possible host** for romshelfapp, not the store itself. The
//! CLI is the only place that knows about terminal I/O, exit codes and
//! output formatting.
//!
//! ## Session Setup
//!
//! Every command except `fields` opens a session first:
//!
//! 1. Resolve the config file: `--config`, `$ROMSHELF_CONFIG`, or
//!    `<config dir>/romshelf.toml`
//! 2. Register each `[[libraries]]` entry and scan its root
//! 3. Load its gamelist and replay its recovery journal
//!
//! A library that fails to scan or load is logged and left empty; the
//! other libraries stay usable.
//!
//! ## Edits Are Journaled, Not Saved
//!
//! `set` and `played` write one fragment per touched entry and exit. The
//! gamelist is only rewritten by `save`. `status` shows how many fragments
//! are waiting.
//!
//! ## Module Structure
//!
//! - `commands`: session setup and per-command handlers
//! - `render`: plain text and `--json` output
//! - `scan`: turns a library directory into skeleton entries
//! - `setup`: argument parsing via clap

mod commands;
mod render;
mod scan;
pub mod setup;

pub use commands::run;
