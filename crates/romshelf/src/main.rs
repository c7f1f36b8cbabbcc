//! # Romshelf CLI
//!
//! A thin host for the `romshelfapp` library: it plays the part of the
//! launcher around the metadata store. The binary only invokes `cli::run()`
//! and handles process termination.
//!
//! ## Workspace Structure
//!
//! - `crates/romshelfapp/`: the metadata store, UI-agnostic
//! - `crates/romshelf/`: this CLI
//!
//! ## One Process per Command
//!
//! Every invocation scans the configured libraries, loads their gamelists
//! and recovery journals, runs one command and exits. Edits (`set`,
//! `played`) are only journaled; `save` folds the journal into the
//! gamelists. Running `set` and then `save` in separate processes is
//! exactly the crash-recovery path the store exists for.
//!
//! ```text
//! romshelf set nes mario.nes favorite true   → <recovery>/nes/mario.nes.xml
//! romshelf save                              → /roms/nes/gamelist.xml
//! ```

mod cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
