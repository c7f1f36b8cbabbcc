use crate::config::{LibraryConfig, StoreSettings};
use crate::schema::SchemaRegistry;
use crate::store::{FsBackend, MetadataStore};
use crate::tree::{Catalog, EntryId, EntryKind, LibraryId};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// A throwaway NES library on disk with its own recovery root.
pub struct TestEnv {
    // We keep _temp_dir to ensure the directory is not dropped until the test is done
    pub _temp_dir: TempDir,
    pub root: PathBuf,
    pub recovery: PathBuf,
    pub store: MetadataStore<FsBackend>,
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl TestEnv {
    pub fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("failed to create temp dir");
        let root = temp_dir.path().join("roms").join("nes");
        fs::create_dir_all(&root).expect("failed to create library root");
        let recovery = temp_dir.path().join("recovery");
        let store = MetadataStore::open(StoreSettings::with_recovery_root(&recovery));
        Self {
            _temp_dir: temp_dir,
            root,
            recovery,
            store,
        }
    }

    /// A store over the same directories, as a restarted process would see.
    pub fn fresh_store(&self) -> MetadataStore<FsBackend> {
        MetadataStore::open(StoreSettings::with_recovery_root(&self.recovery))
    }

    pub fn library_config(&self) -> LibraryConfig {
        LibraryConfig::new("nes", &self.root).with_extensions(&[".nes"])
    }

    /// Creates empty ROM files under the library root.
    pub fn add_roms(&self, paths: &[&str]) {
        for path in paths {
            let file = self.root.join(path);
            if let Some(parent) = file.parent() {
                fs::create_dir_all(parent).expect("failed to create rom dir");
            }
            fs::write(&file, b"").expect("failed to write rom");
        }
    }

    /// Builds the skeleton a scanner would produce for `paths`.
    pub fn scan(&self, paths: &[&str]) -> (Catalog, LibraryId) {
        let mut catalog = Catalog::new(Arc::new(SchemaRegistry::new()));
        let library = catalog.add_library(self.library_config());
        for path in paths {
            catalog
                .find_or_create(library, Path::new(path), EntryKind::Game)
                .expect("conflicting skeleton path");
        }
        (catalog, library)
    }

    pub fn find(&self, catalog: &Catalog, library: LibraryId, path: &str) -> EntryId {
        let root = catalog.library(library).expect("library").root();
        catalog
            .find_by_path(root, &self.root.join(path))
            .unwrap_or_else(|| panic!("no entry at {path}"))
    }

    pub fn gamelist_path(&self) -> PathBuf {
        self.root.join(crate::config::GAMELIST_FILE)
    }

    pub fn read_gamelist(&self) -> Option<String> {
        fs::read_to_string(self.gamelist_path()).ok()
    }

    pub fn journal_dir(&self) -> PathBuf {
        self.recovery.join("nes")
    }
}
