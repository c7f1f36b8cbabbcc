//! # Configuration
//!
//! Romshelf configuration is loaded with [`confique`]: compiled defaults,
//! then a TOML file, then environment variables (highest priority).
//!
//! ## Available Settings
//!
//! | Key | Default | Env | Description |
//! |-----|---------|-----|-------------|
//! | `store.save_metadata` | `true` | `ROMSHELF_SAVE_METADATA` | Persist edits at all |
//! | `store.check_existence` | `true` | `ROMSHELF_CHECK_EXISTENCE` | Skip gamelist nodes whose file is gone |
//! | `store.recovery_root` | `<data dir>/recovery` | `ROMSHELF_RECOVERY_ROOT` | Where fragments are journaled |
//! | `store.fragment_worker` | `true` | | Write fragments off the caller's thread |
//! | `store.fragment_queue` | `64` | | Pending fragment writes before falling back to sync |
//! | `display.show_hidden` | `false` | | List entries flagged `hidden` |
//! | `display.kid_mode` | `false` | | List only entries flagged `kidgame` |
//! | `display.flatten_single_game_folders` | `true` | | Show a one-game folder as its game |
//!
//! Libraries are declared as an array of tables:
//!
//! ```toml
//! [[libraries]]
//! name = "nes"
//! root = "/roms/nes"
//! extensions = [".nes", ".zip"]
//! ```
//!
//! `gamelist` defaults to `<root>/gamelist.xml`. An empty `extensions` list
//! accepts every file.

use crate::error::{Result, StoreError};
use confique::Config;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the gamelist file inside a library root.
pub const GAMELIST_FILE: &str = "gamelist.xml";

#[derive(Config, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct StoreSettings {
    #[config(default = true, env = "ROMSHELF_SAVE_METADATA")]
    pub save_metadata: bool,

    #[config(default = true, env = "ROMSHELF_CHECK_EXISTENCE")]
    pub check_existence: bool,

    #[config(env = "ROMSHELF_RECOVERY_ROOT")]
    pub recovery_root: Option<PathBuf>,

    #[config(default = true)]
    pub fragment_worker: bool,

    #[config(default = 64)]
    pub fragment_queue: usize,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            save_metadata: true,
            check_existence: true,
            recovery_root: None,
            fragment_worker: true,
            fragment_queue: 64,
        }
    }
}

impl StoreSettings {
    /// Settings for a store journaling under `recovery_root`.
    pub fn with_recovery_root(recovery_root: impl Into<PathBuf>) -> Self {
        Self {
            recovery_root: Some(recovery_root.into()),
            ..Self::default()
        }
    }

    pub fn recovery_root(&self) -> PathBuf {
        match &self.recovery_root {
            Some(root) => root.clone(),
            None => ProjectDirs::from("", "", "romshelf")
                .map(|dirs| dirs.data_dir().join("recovery"))
                .unwrap_or_else(|| PathBuf::from(".romshelf").join("recovery")),
        }
    }
}

#[derive(Config, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct DisplaySettings {
    #[config(default = false)]
    pub show_hidden: bool,

    #[config(default = false)]
    pub kid_mode: bool,

    #[config(default = true)]
    pub flatten_single_game_folders: bool,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            show_hidden: false,
            kid_mode: false,
            flatten_single_game_folders: true,
        }
    }
}

/// One library: a named directory of games with its gamelist.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct LibraryConfig {
    pub name: String,
    pub root: PathBuf,
    #[serde(default)]
    pub extensions: Vec<String>,
    #[serde(default)]
    pub gamelist: Option<PathBuf>,
    /// Files are short set names; show canonical titles instead.
    #[serde(default)]
    pub arcade_titles: bool,
}

impl LibraryConfig {
    pub fn new(name: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            root: root.into(),
            extensions: Vec::new(),
            gamelist: None,
            arcade_titles: false,
        }
    }

    pub fn with_extensions(mut self, extensions: &[&str]) -> Self {
        self.extensions = extensions.iter().map(|ext| ext.to_string()).collect();
        self
    }

    pub fn gamelist_path(&self) -> PathBuf {
        self.gamelist
            .clone()
            .unwrap_or_else(|| self.root.join(GAMELIST_FILE))
    }

    /// Whether a file with this extension belongs in the library.
    ///
    /// `extension` is dotted (`.nes`); the comparison ignores case and the
    /// configured entries may omit the dot.
    pub fn accepts_extension(&self, extension: &str) -> bool {
        if self.extensions.is_empty() {
            return true;
        }
        let wanted = extension.trim_start_matches('.');
        self.extensions
            .iter()
            .any(|ext| ext.trim_start_matches('.').eq_ignore_ascii_case(wanted))
    }

    pub fn accepts(&self, path: &Path) -> bool {
        match crate::paths::dotted_extension(path) {
            Some(extension) => self.accepts_extension(&extension),
            None => self.extensions.is_empty(),
        }
    }
}

/// Top-level configuration, stored in `romshelf.toml`.
#[derive(Config, Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct ShelfConfig {
    #[config(nested)]
    pub store: StoreSettings,

    #[config(nested)]
    pub display: DisplaySettings,

    #[config(default = [])]
    pub libraries: Vec<LibraryConfig>,
}

impl ShelfConfig {
    /// Loads defaults, then `file` (when given and present), then the
    /// environment.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let mut builder = ShelfConfig::builder().env();
        if let Some(file) = file {
            builder = builder.file(file);
        }
        builder
            .load()
            .map_err(|err| StoreError::Config(err.to_string()))
    }

    pub fn library(&self, name: &str) -> Option<&LibraryConfig> {
        self.libraries.iter().find(|lib| lib.name == name)
    }
}
