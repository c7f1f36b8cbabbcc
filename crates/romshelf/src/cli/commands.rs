//! # Command Handlers
//!
//! `run` parses arguments, sets up logging, opens a [`Session`] and hands
//! the command to its handler. Handlers return the text to print. The one
//! exception is a failing `save`, which prints the libraries it did save
//! before reporting the error.

use super::render::{self, StatusRow};
use super::scan::scan_library;
use super::setup::{Cli, Commands, SortKey};
use anyhow::{bail, Result};
use clap::Parser;
use directories::ProjectDirs;
use romshelfapp::config::{DisplaySettings, ShelfConfig};
use romshelfapp::error::StoreError;
use romshelfapp::names::NoTitles;
use romshelfapp::paths;
use romshelfapp::schema::{FieldId, RecordKind, SchemaRegistry};
use romshelfapp::store::{LoadReport, MetadataStore, StorageBackend};
use romshelfapp::tree::{
    by_name, Catalog, EntryId, EntryKind, EntryRef, KindMask, LibraryId, SortSpec,
};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

const CONFIG_FILE: &str = "romshelf.toml";

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config_path = resolve_config_path(cli.config.as_deref())?;
    debug!(config = ?config_path, "loading configuration");
    let config = ShelfConfig::load(config_path.as_deref())?;

    let json = cli.json;
    let output = match cli.command {
        Commands::Fields { folder } => handle_fields(folder, json),
        command => {
            let mut session = Session::open(config);
            session.dispatch(command, json)?
        }
    };
    print!("{output}");
    Ok(())
}

/// `RUST_LOG` wins; otherwise `warn`, or `debug` with `--verbose`.
fn init_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn resolve_config_path(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
    if let Some(path) = explicit {
        if !path.is_file() {
            bail!("config file {} does not exist", path.display());
        }
        return Ok(Some(path.to_path_buf()));
    }
    Ok(ProjectDirs::from("", "", "romshelf").map(|dirs| dirs.config_dir().join(CONFIG_FILE)))
}

fn handle_fields(folder: bool, json: bool) -> String {
    let registry = SchemaRegistry::new();
    let kind = if folder {
        RecordKind::Folder
    } else {
        RecordKind::Game
    };
    render::render_fields(registry.schema(kind), json)
}

/// Everything one command needs: the scanned catalog, the store it was
/// loaded through, and how each load went.
struct Session {
    display: DisplaySettings,
    catalog: Catalog,
    store: MetadataStore,
    loads: Vec<(LibraryId, LoadReport)>,
}

impl Session {
    fn open(config: ShelfConfig) -> Self {
        let mut catalog = Catalog::new(Arc::new(SchemaRegistry::new()));
        let store = MetadataStore::open(config.store.clone());
        let mut loads = Vec::new();

        for library in &config.libraries {
            let id = catalog.add_library(library.clone());
            if let Err(err) = scan_library(&mut catalog, id) {
                warn!(library = %library.name, error = %err, "scan failed");
            }
            let report = match store.load_library(&mut catalog, id) {
                Ok(report) => report,
                Err(err) => {
                    warn!(library = %library.name, error = %err, "load failed");
                    LoadReport::default()
                }
            };
            loads.push((id, report));
        }

        Self {
            display: config.display,
            catalog,
            store,
            loads,
        }
    }

    fn dispatch(&mut self, command: Commands, json: bool) -> Result<String> {
        match command {
            Commands::List {
                library,
                folder,
                all,
                sort,
                desc,
            } => self.handle_list(&library, folder.as_deref(), all, sort, desc, json),
            Commands::Get { library, path } => self.handle_get(&library, &path, json),
            Commands::Set {
                library,
                path,
                key,
                value,
            } => self.handle_set(&library, &path, &key, &value, json),
            Commands::Played { library, path } => self.handle_played(&library, &path, json),
            Commands::Save { library } => self.handle_save(library.as_deref(), json),
            Commands::Status => Ok(self.handle_status(json)),
            Commands::Fields { folder } => Ok(handle_fields(folder, json)),
        }
    }

    fn library(&self, name: &str) -> Result<LibraryId, StoreError> {
        self.catalog
            .library_by_name(name)
            .ok_or_else(|| StoreError::UnknownLibrary(name.to_string()))
    }

    /// The entry at `path`, relative to the library root. An empty path or
    /// `.` is the root folder.
    fn locate(&self, library: LibraryId, path: &Path) -> Result<EntryId, StoreError> {
        let lib = self
            .catalog
            .library(library)
            .ok_or_else(|| StoreError::UnknownLibrary(format!("{library:?}")))?;
        let target = paths::resolve(lib.root_dir(), &path.to_string_lossy());
        if target == paths::normalize(lib.root_dir()) {
            return Ok(lib.root());
        }
        self.catalog
            .find_by_path(lib.root(), &target)
            .ok_or_else(|| StoreError::UnknownEntry(path.display().to_string()))
    }

    fn handle_list(
        &self,
        library: &str,
        folder: Option<&Path>,
        all: bool,
        sort: Option<SortKey>,
        desc: bool,
        json: bool,
    ) -> Result<String> {
        let lib = self.library(library)?;
        let folder = self.locate(lib, folder.unwrap_or(Path::new("")))?;
        if !self.catalog.entry(folder).is_some_and(|e| e.kind() == EntryKind::Folder) {
            bail!("{} is not a folder", self.catalog.path(folder).display());
        }

        let mut display = self.display.clone();
        display.show_hidden |= all;
        let less = sort.map(comparator);
        let spec = less.as_ref().map(|less| {
            if desc {
                SortSpec::descending(&**less)
            } else {
                SortSpec::ascending(&**less)
            }
        });

        let values: Vec<_> = self
            .catalog
            .children_to_display(folder, &display, spec.as_ref())
            .into_iter()
            .map(|id| render::entry_value(&self.catalog, id, &NoTitles))
            .collect();
        Ok(render::render_list(&values, json))
    }

    fn handle_get(&self, library: &str, path: &Path, json: bool) -> Result<String> {
        let lib = self.library(library)?;
        let id = self.locate(lib, path)?;
        Ok(render::render_entry(&self.catalog, id, &NoTitles, json))
    }

    fn handle_set(
        &mut self,
        library: &str,
        path: &Path,
        key: &str,
        value: &str,
        json: bool,
    ) -> Result<String> {
        let lib = self.library(library)?;
        let id = self.locate(lib, path)?;
        let changed = self
            .store
            .set_and_journal(&mut self.catalog, id, key, value)?;
        self.store.flush_fragments();

        let stored = self.catalog.record(id).get_by_key(key).unwrap_or_default().to_string();
        let message = if changed {
            format!("{key} = {stored}")
        } else {
            format!("{key} already {stored}")
        };
        Ok(render::render_message(
            &message,
            json!({ "key": key, "value": stored, "changed": changed }),
            json,
        ))
    }

    fn handle_played(&mut self, library: &str, path: &Path, json: bool) -> Result<String> {
        let lib = self.library(library)?;
        let id = self.locate(lib, path)?;
        let now = chrono::Local::now().naive_local();
        let count = self.store.record_play(&mut self.catalog, id, now)?;
        self.store.flush_fragments();
        Ok(render::render_message(
            &format!("played {count} times"),
            json!({ "playcount": count }),
            json,
        ))
    }

    fn handle_save(&mut self, library: Option<&str>, json: bool) -> Result<String> {
        let targets = match library {
            Some(name) => vec![self.library(name)?],
            None => self.catalog.library_ids().collect(),
        };

        let mut results = Vec::new();
        let mut first_error = None;
        for id in targets {
            let name = self.library_name(id);
            match self.store.save_library(&mut self.catalog, id) {
                Ok(report) => results.push((name, report)),
                Err(err) => {
                    warn!(library = %name, error = %err, "save failed");
                    first_error.get_or_insert(err);
                }
            }
        }

        let output = render::render_save(&results, json);
        match first_error {
            Some(err) => {
                print!("{output}");
                Err(err.into())
            }
            None => Ok(output),
        }
    }

    fn handle_status(&self, json: bool) -> String {
        let rows: Vec<StatusRow> = self
            .loads
            .iter()
            .filter_map(|(id, load)| {
                let lib = self.catalog.library(*id)?;
                let root = lib.root();
                let games = self
                    .catalog
                    .get_files_recursive(root, KindMask::GAME, false, None)
                    .len();
                let dirty = std::iter::once(root)
                    .chain(self.catalog.get_files_recursive(root, KindMask::ALL, false, None))
                    .filter(|entry| self.catalog.record(*entry).is_dirty())
                    .count();
                let fragments = self
                    .store
                    .backend()
                    .list_files(&self.store.recovery_dir(lib.name()))
                    .map(|files| files.len())
                    .unwrap_or_default();
                Some(StatusRow {
                    library: lib.name().to_string(),
                    games,
                    dirty,
                    fragments,
                    load: load.clone(),
                })
            })
            .collect();
        render::render_status(&rows, json)
    }

    fn library_name(&self, id: LibraryId) -> String {
        self.catalog
            .library(id)
            .map(|lib| lib.name().to_string())
            .unwrap_or_default()
    }
}

type Less = Box<dyn Fn(EntryRef<'_>, EntryRef<'_>) -> bool>;

/// Numeric keys sort on the value, then by name so ties stay stable.
fn comparator(key: SortKey) -> Less {
    match key {
        SortKey::Name => Box::new(by_name),
        SortKey::Rating => Box::new(|a, b| {
            let (x, y) = (
                a.record().get_rating(FieldId::Rating),
                b.record().get_rating(FieldId::Rating),
            );
            x < y || (x == y && by_name(a, b))
        }),
        SortKey::Playcount => Box::new(|a, b| {
            let (x, y) = (
                a.record().get_int(FieldId::PlayCount),
                b.record().get_int(FieldId::PlayCount),
            );
            x < y || (x == y && by_name(a, b))
        }),
        SortKey::Lastplayed => Box::new(|a, b| {
            let (x, y) = (
                a.record().get_time(FieldId::LastPlayed),
                b.record().get_time(FieldId::LastPlayed),
            );
            x < y || (x == y && by_name(a, b))
        }),
    }
}
