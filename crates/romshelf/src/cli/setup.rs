use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "romshelf",
    bin_name = "romshelf",
    version,
    disable_help_subcommand = true
)]
#[command(about = "Inspect and edit game library metadata", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (defaults to the user config dir's romshelf.toml)
    #[arg(short, long, global = true, env = "ROMSHELF_CONFIG", help_heading = "Options")]
    pub config: Option<PathBuf>,

    /// Verbose output (debug logging on stderr)
    #[arg(short, long, global = true, help_heading = "Options")]
    pub verbose: bool,

    /// Print machine-readable JSON
    #[arg(long, global = true, help_heading = "Options")]
    pub json: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum SortKey {
    Name,
    Rating,
    Playcount,
    Lastplayed,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List what a folder displays
    #[command(alias = "ls")]
    List {
        /// Library name
        library: String,

        /// Folder inside the library (defaults to the root)
        folder: Option<PathBuf>,

        /// Include hidden entries
        #[arg(long)]
        all: bool,

        /// Sort order
        #[arg(long, value_enum)]
        sort: Option<SortKey>,

        /// Sort descending
        #[arg(long, requires = "sort")]
        desc: bool,
    },

    /// Show every field of one entry
    Get {
        library: String,
        /// Path relative to the library root
        path: PathBuf,
    },

    /// Change one field and journal it
    Set {
        library: String,
        path: PathBuf,
        /// Field key, as written in gamelists (e.g. favorite, rating)
        key: String,
        value: String,
    },

    /// Count a finished play session
    Played {
        library: String,
        path: PathBuf,
    },

    /// Write journaled and pending changes into the gamelists
    Save {
        /// Only this library
        library: Option<String>,
    },

    /// Dirty entries and journal state per library
    Status,

    /// Field declarations of an entry kind
    Fields {
        /// Show folder fields instead of game fields
        #[arg(long)]
        folder: bool,
    },
}
