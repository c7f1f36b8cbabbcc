use super::backend::StorageBackend;
use super::{entry_element, worth_writing, LoadReport, MetadataStore, SaveReport};
use crate::config::LibraryConfig;
use crate::document::{Document, Element, FOLDER_TAG, GAME_TAG, PARENT_HASH_ATTR, PATH_TAG};
use crate::error::{Result, StoreError};
use crate::paths;
use crate::tree::{Catalog, EntryId, EntryKind, KindMask, LibraryId};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

pub(super) type PathIndex = HashMap<PathBuf, EntryId>;

/// Everything the protocols need to know about one library, copied out of
/// the catalog so the tree can be mutated while it is in use.
pub(super) struct LibraryTarget {
    pub id: LibraryId,
    pub name: String,
    pub root: EntryId,
    pub root_dir: PathBuf,
    pub gamelist: PathBuf,
    pub config: LibraryConfig,
    pub parent_hash: u64,
    pub collection: bool,
}

impl LibraryTarget {
    fn of(catalog: &Catalog, id: LibraryId) -> Result<Self> {
        let library = catalog
            .library(id)
            .ok_or_else(|| StoreError::UnknownLibrary(format!("{id:?}")))?;
        Ok(Self {
            id,
            name: library.name().to_string(),
            root: library.root(),
            root_dir: library.root_dir().to_path_buf(),
            gamelist: library.gamelist_path(),
            config: library.config().clone(),
            parent_hash: library.parent_hash(),
            collection: library.is_collection(),
        })
    }
}

impl<B: StorageBackend + 'static> MetadataStore<B> {
    /// Merges the library's gamelist and recovery journal onto the entries
    /// the scanner built.
    ///
    /// Per-entry problems (paths outside the root, unknown extensions,
    /// unreadable fragments) are logged and counted. A malformed gamelist is
    /// logged and skipped; the scan and the journal still apply. Only
    /// backend I/O errors abort.
    pub fn load_library(&self, catalog: &mut Catalog, library: LibraryId) -> Result<LoadReport> {
        let mut target = LibraryTarget::of(catalog, library)?;
        let mut report = LoadReport::default();
        if target.collection {
            return Ok(report);
        }

        let mut index = PathIndex::new();
        catalog.build_path_index(target.root, &mut index);

        match self.backend.read(&target.gamelist)? {
            None => debug!(library = %target.name, "no gamelist yet"),
            Some(bytes) => {
                report.parent_hash = bytes.len() as u64;
                match Document::parse(&bytes) {
                    Ok(document) => {
                        for node in &document.root.children {
                            self.attach_node(catalog, &target, &mut index, node, &mut report)?;
                        }
                    }
                    Err(source) => {
                        let err = StoreError::MalformedDocument {
                            path: target.gamelist.clone(),
                            source,
                        };
                        error!(library = %target.name, error = %err, "ignoring malformed gamelist");
                        report.malformed = true;
                    }
                }
            }
        }

        target.parent_hash = report.parent_hash;
        if let Some(lib) = catalog.library_mut(library) {
            lib.set_parent_hash(report.parent_hash);
        }

        self.replay_journal(catalog, &target, &mut index, &mut report)?;

        info!(
            library = %target.name,
            attached = report.attached,
            created = report.created,
            rejected = report.rejected,
            replayed = report.replayed,
            "library loaded"
        );
        Ok(report)
    }

    fn attach_node(
        &self,
        catalog: &mut Catalog,
        target: &LibraryTarget,
        index: &mut PathIndex,
        node: &Element,
        report: &mut LoadReport,
    ) -> Result<()> {
        match self.resolve_node(catalog, target, index, node, report) {
            Ok(Some(id)) => {
                catalog.record_mut(id).deserialize(node);
                report.attached += 1;
                Ok(())
            }
            Ok(None) => Ok(()),
            Err(err) if err.is_rejection() => {
                warn!(library = %target.name, error = %err, "rejected gamelist entry");
                report.rejected += 1;
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    /// Finds (or materialises) the entry a document node describes.
    ///
    /// Returns `Ok(None)` for nodes that are skipped rather than refused:
    /// unknown tags, nodes without a path, kind mismatches and, with
    /// existence checking on, files that are gone.
    pub(super) fn resolve_node(
        &self,
        catalog: &mut Catalog,
        target: &LibraryTarget,
        index: &mut PathIndex,
        node: &Element,
        report: &mut LoadReport,
    ) -> Result<Option<EntryId>> {
        let kind = match node.name.as_str() {
            GAME_TAG => EntryKind::Game,
            FOLDER_TAG => EntryKind::Folder,
            other => {
                debug!(library = %target.name, tag = other, "ignoring unknown node");
                report.skipped += 1;
                return Ok(None);
            }
        };
        let Some(stored) = node.child_text(PATH_TAG) else {
            warn!(library = %target.name, "node without a path");
            report.skipped += 1;
            return Ok(None);
        };

        let path = paths::resolve(&target.root_dir, stored);
        if !paths::is_within(&target.root_dir, &path) {
            return Err(StoreError::PathOutsideRoot {
                path,
                root: target.root_dir.clone(),
            });
        }
        let relative = paths::strip_root(&target.root_dir, &path).unwrap_or_default();
        if kind == EntryKind::Game && !target.config.accepts(&path) {
            return Err(StoreError::UnknownExtension(path));
        }

        if let Some(&id) = index.get(&path) {
            if catalog.node(id).kind() != kind {
                warn!(library = %target.name, path = %path.display(), "node kind disagrees with scanned entry");
                report.skipped += 1;
                return Ok(None);
            }
            return Ok(Some(id));
        }
        if relative.as_os_str().is_empty() {
            return Ok((kind == EntryKind::Folder).then_some(target.root));
        }
        if self.settings.check_existence && !self.backend.exists(&path) {
            debug!(library = %target.name, path = %path.display(), "file gone; skipping");
            report.skipped += 1;
            return Ok(None);
        }

        match catalog.find_or_create(target.id, &relative, kind) {
            Some((id, created)) => {
                if created {
                    report.created += 1;
                }
                index.insert(path, id);
                Ok(Some(id))
            }
            None => {
                warn!(library = %target.name, path = %path.display(), "path collides with an entry of another kind");
                report.skipped += 1;
                Ok(None)
            }
        }
    }

    /// Writes every dirty entry of a library into its gamelist.
    ///
    /// The document is re-read from disk, each dirty entry's old node is
    /// replaced by a fresh one, and the result goes to a temp file that is
    /// renamed over the gamelist after the previous version is copied to
    /// `.old`. The journal is cleared and entries marked clean only once
    /// the rename has happened; any earlier failure leaves the gamelist and
    /// the journal exactly as they were.
    pub fn save_library(&self, catalog: &mut Catalog, library: LibraryId) -> Result<SaveReport> {
        let target = LibraryTarget::of(catalog, library)?;
        let mut report = SaveReport::default();
        if !self.settings.save_metadata || target.collection {
            debug!(library = %target.name, "saving disabled for library");
            report.skipped = true;
            return Ok(report);
        }
        self.flush_fragments();

        let dirty: Vec<EntryId> = std::iter::once(target.root)
            .chain(catalog.get_files_recursive(target.root, KindMask::ALL, false, None))
            .filter(|id| catalog.record(*id).is_dirty())
            .collect();
        report.dirty = dirty.len();
        if dirty.is_empty() {
            self.clear_journal(&target.name);
            return Ok(report);
        }

        let existing = self.backend.read(&target.gamelist)?;
        let previous_len = existing.as_ref().map_or(0, |bytes| bytes.len() as u64);
        let mut document = match existing {
            None => Document::new(),
            Some(bytes) => Document::parse(&bytes).map_err(|source| {
                let err = StoreError::MalformedDocument {
                    path: target.gamelist.clone(),
                    source,
                };
                error!(library = %target.name, error = %err, "refusing to overwrite malformed gamelist");
                err
            })?,
        };

        let mut positions: HashMap<PathBuf, Vec<usize>> = HashMap::new();
        for (position, node) in document.root.children.iter().enumerate() {
            if let Some(stored) = node.child_text(PATH_TAG) {
                positions
                    .entry(paths::resolve(&target.root_dir, stored))
                    .or_default()
                    .push(position);
            }
        }

        let mut doomed = vec![false; document.root.children.len()];
        let mut fresh = Vec::new();
        for &id in &dirty {
            if let Some(hits) = positions.remove(&catalog.path(id)) {
                for position in hits {
                    doomed[position] = true;
                    report.removed += 1;
                }
            }
            if worth_writing(catalog, id) {
                if let Some(node) = entry_element(catalog, id) {
                    fresh.push(node);
                }
            }
        }
        report.written = fresh.len();

        if report.removed + report.written == 0 {
            debug!(library = %target.name, "dirty entries carry nothing to write");
            self.clear_journal(&target.name);
            self.mark_clean(catalog, &dirty);
            return Ok(report);
        }

        let children = std::mem::take(&mut document.root.children);
        document.root.children = children
            .into_iter()
            .zip(doomed)
            .filter_map(|(node, doomed)| (!doomed).then_some(node))
            .chain(fresh)
            .collect();
        document
            .root
            .set_attr(PARENT_HASH_ATTR, previous_len.to_string());
        let bytes = document.to_bytes()?;

        let written_len = self.swap_in(&target, &bytes)?;

        report.document_written = true;
        self.clear_journal(&target.name);
        self.mark_clean(catalog, &dirty);
        if let Some(lib) = catalog.library_mut(library) {
            lib.set_parent_hash(written_len);
        }
        info!(
            library = %target.name,
            removed = report.removed,
            written = report.written,
            "gamelist saved"
        );
        Ok(report)
    }

    /// Temp file, `.old` copy, rename. Returns the new document's length.
    fn swap_in(&self, target: &LibraryTarget, bytes: &[u8]) -> Result<u64> {
        let file_name = target
            .gamelist
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "gamelist.xml".to_string());
        let tmp = target
            .gamelist
            .with_file_name(format!(".{}-{}.tmp", file_name, Uuid::new_v4()));

        if let Err(err) = self.backend.write(&tmp, bytes) {
            self.discard(&tmp);
            let err = StoreError::WriteFailure {
                path: tmp,
                reason: err.to_string(),
            };
            error!(library = %target.name, error = %err, "save aborted");
            return Err(err);
        }
        let written_len = match self.backend.file_len(&tmp) {
            Ok(Some(len)) if len > 0 => len,
            Ok(_) => {
                self.discard(&tmp);
                let err = StoreError::WriteFailure {
                    path: tmp,
                    reason: "temporary file is empty".to_string(),
                };
                error!(library = %target.name, error = %err, "save aborted");
                return Err(err);
            }
            Err(err) => {
                self.discard(&tmp);
                let err = StoreError::WriteFailure {
                    path: tmp,
                    reason: err.to_string(),
                };
                error!(library = %target.name, error = %err, "save aborted");
                return Err(err);
            }
        };

        if self.backend.exists(&target.gamelist) {
            let mut backup = target.gamelist.clone().into_os_string();
            backup.push(".old");
            let backup = PathBuf::from(backup);
            if let Err(err) = self.backend.copy(&target.gamelist, &backup) {
                warn!(library = %target.name, error = %err, "could not rotate gamelist backup");
            }
        }

        if let Err(err) = self.backend.rename(&tmp, &target.gamelist) {
            self.discard(&tmp);
            let err = StoreError::RenameFailure {
                from: tmp,
                to: target.gamelist.clone(),
                reason: err.to_string(),
            };
            error!(library = %target.name, error = %err, "save aborted; journal kept");
            return Err(err);
        }
        Ok(written_len)
    }

    fn discard(&self, tmp: &std::path::Path) {
        if let Err(err) = self.backend.remove_file(tmp) {
            warn!(path = %tmp.display(), error = %err, "could not remove temporary file");
        }
    }

    fn mark_clean(&self, catalog: &mut Catalog, entries: &[EntryId]) {
        for &id in entries {
            catalog.record_mut(id).mark_clean();
        }
    }

    /// Loads every non-collection library, continuing past failures.
    /// Returns the first error after all libraries were attempted.
    pub fn load_all(&self, catalog: &mut Catalog) -> Result<Vec<LoadReport>> {
        let ids: Vec<LibraryId> = catalog.library_ids().collect();
        let mut reports = Vec::with_capacity(ids.len());
        let mut first_error = None;
        for id in ids {
            match self.load_library(catalog, id) {
                Ok(report) => reports.push(report),
                Err(err) => {
                    error!(library = ?id, error = %err, "load failed");
                    first_error.get_or_insert(err);
                }
            }
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(reports),
        }
    }

    /// Saves every library, continuing past failures. Returns the first
    /// error after all libraries were attempted.
    pub fn save_all(&self, catalog: &mut Catalog) -> Result<Vec<SaveReport>> {
        let ids: Vec<LibraryId> = catalog.library_ids().collect();
        let mut reports = Vec::with_capacity(ids.len());
        let mut first_error = None;
        for id in ids {
            match self.save_library(catalog, id) {
                Ok(report) => reports.push(report),
                Err(err) => {
                    first_error.get_or_insert(err);
                }
            }
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(reports),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreSettings;
    use crate::schema::{FieldId, SchemaRegistry};
    use crate::store::MemBackend;
    use std::path::Path;
    use std::sync::Arc;

    const GAMELIST: &str = "/roms/nes/gamelist.xml";

    fn store() -> MetadataStore<MemBackend> {
        let settings = StoreSettings {
            check_existence: false,
            ..StoreSettings::with_recovery_root("/journal")
        };
        MetadataStore::with_backend(MemBackend::new(), settings)
    }

    fn shelf(games: &[&str]) -> (Catalog, LibraryId) {
        let mut catalog = Catalog::new(Arc::new(SchemaRegistry::new()));
        let lib = catalog.add_library(LibraryConfig::new("nes", "/roms/nes").with_extensions(&[".nes"]));
        for game in games {
            catalog
                .find_or_create(lib, Path::new(game), EntryKind::Game)
                .unwrap();
        }
        (catalog, lib)
    }

    fn find(catalog: &Catalog, lib: LibraryId, rel: &str) -> EntryId {
        let root = catalog.library(lib).unwrap().root();
        catalog
            .find_by_path(root, &Path::new("/roms/nes").join(rel))
            .unwrap()
    }

    fn gamelist(store: &MetadataStore<MemBackend>) -> String {
        let bytes = store.backend().read(Path::new(GAMELIST)).unwrap().unwrap();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn load_rejects_outside_paths_and_unknown_extensions() {
        let store = store();
        store
            .backend()
            .write(
                Path::new(GAMELIST),
                br#"<gameList>
  <game><path>./mario.nes</path><favorite>true</favorite></game>
  <game><path>../snes/f.nes</path></game>
  <game><path>./readme.txt</path></game>
  <widget><path>./x</path></widget>
</gameList>"#,
            )
            .unwrap();
        let (mut catalog, lib) = shelf(&["mario.nes"]);

        let report = store.load_library(&mut catalog, lib).unwrap();
        assert_eq!(report.attached, 1);
        assert_eq!(report.rejected, 2);
        assert_eq!(report.skipped, 1);
        assert!(report.parent_hash > 0);

        let mario = find(&catalog, lib, "mario.nes");
        assert!(catalog.record(mario).get_bool(FieldId::Favorite));
        assert!(!catalog.record(mario).is_dirty());
        let root = catalog.library(lib).unwrap().root();
        assert!(catalog
            .find_by_path(root, Path::new("/roms/snes/f.nes"))
            .is_none());
    }

    #[test]
    fn load_materialises_unscanned_entries_when_not_checking() {
        let store = store();
        store
            .backend()
            .write(
                Path::new(GAMELIST),
                b"<gameList><game><path>./deep/er/zelda.nes</path><rating>0.5</rating></game></gameList>",
            )
            .unwrap();
        let (mut catalog, lib) = shelf(&[]);

        let report = store.load_library(&mut catalog, lib).unwrap();
        assert_eq!(report.created, 1);
        let zelda = find(&catalog, lib, "deep/er/zelda.nes");
        assert_eq!(catalog.record(zelda).get(FieldId::Rating), "0.5");
    }

    #[test]
    fn load_with_existence_checks_skips_missing_files() {
        let store = MetadataStore::with_backend(
            MemBackend::new(),
            StoreSettings::with_recovery_root("/journal"),
        );
        store
            .backend()
            .write(
                Path::new(GAMELIST),
                b"<gameList><game><path>./gone.nes</path><favorite>true</favorite></game></gameList>",
            )
            .unwrap();
        let (mut catalog, lib) = shelf(&[]);

        let report = store.load_library(&mut catalog, lib).unwrap();
        assert_eq!(report.skipped, 1);
        assert_eq!(report.created, 0);
    }

    #[test]
    fn malformed_gamelist_still_replays_journal_but_blocks_save() {
        let store = store();
        store.backend().write(Path::new(GAMELIST), b"<gameList><game>").unwrap();
        let (mut catalog, lib) = shelf(&["mario.nes"]);
        let mario = find(&catalog, lib, "mario.nes");
        store
            .set_and_journal(&mut catalog, mario, "favorite", "true")
            .unwrap();
        store.flush_fragments();

        let (mut fresh, lib) = shelf(&["mario.nes"]);
        let report = store.load_library(&mut fresh, lib).unwrap();
        assert!(report.malformed);
        assert_eq!(report.replayed, 1);
        let mario = find(&fresh, lib, "mario.nes");
        assert!(fresh.record(mario).is_dirty());

        let err = store.save_library(&mut fresh, lib).unwrap_err();
        assert!(matches!(err, StoreError::MalformedDocument { .. }));
        assert_eq!(gamelist(&store), "<gameList><game>");
        assert!(store.backend().exists(Path::new("/journal/nes/mario.nes.xml")));
    }

    #[test]
    fn replayed_reset_to_default_overrides_the_gamelist() {
        let store = store();
        store
            .backend()
            .write(
                Path::new(GAMELIST),
                b"<gameList><game><path>./mario.nes</path><favorite>true</favorite></game></gameList>",
            )
            .unwrap();
        let (mut catalog, lib) = shelf(&["mario.nes"]);
        store.load_library(&mut catalog, lib).unwrap();
        let mario = find(&catalog, lib, "mario.nes");
        assert!(store
            .set_and_journal(&mut catalog, mario, "favorite", "false")
            .unwrap());
        store.flush_fragments();

        let (mut fresh, lib) = shelf(&["mario.nes"]);
        let report = store.load_library(&mut fresh, lib).unwrap();
        assert_eq!(report.stale_fragments, 0);
        let mario = find(&fresh, lib, "mario.nes");
        assert!(!fresh.record(mario).get_bool(FieldId::Favorite));
        assert!(fresh.record(mario).is_dirty());

        let report = store.save_library(&mut fresh, lib).unwrap();
        assert_eq!((report.removed, report.written), (1, 0));
        let document = Document::parse(gamelist(&store).as_bytes()).unwrap();
        assert!(document.root.children.is_empty());
    }

    #[test]
    fn root_folder_is_journaled_and_saved() {
        let store = store();
        let (mut catalog, lib) = shelf(&["mario.nes"]);
        let root = catalog.library(lib).unwrap().root();
        assert!(store
            .set_and_journal(&mut catalog, root, "desc", "Every NES game")
            .unwrap());
        store.flush_fragments();
        assert!(store.backend().exists(Path::new("/journal/nes/.root.xml")));

        let (mut fresh, lib) = shelf(&["mario.nes"]);
        let report = store.load_library(&mut fresh, lib).unwrap();
        assert_eq!(report.replayed, 1);
        let root = fresh.library(lib).unwrap().root();
        assert_eq!(fresh.record(root).get(FieldId::Desc), "Every NES game");
        assert!(fresh.record(root).is_dirty());

        let report = store.save_library(&mut fresh, lib).unwrap();
        assert_eq!(report.written, 1);
        assert!(!store.backend().exists(Path::new("/journal/nes/.root.xml")));
        let document = Document::parse(gamelist(&store).as_bytes()).unwrap();
        let node = &document.root.children[0];
        assert_eq!(node.name, FOLDER_TAG);
        assert_eq!(node.child_text(PATH_TAG), Some("./"));
        assert_eq!(node.child_text("desc"), Some("Every NES game"));
        assert_eq!(node.child_text("name"), None);

        let (mut reloaded, lib) = shelf(&["mario.nes"]);
        let report = store.load_library(&mut reloaded, lib).unwrap();
        assert_eq!(report.attached, 1);
        let root = reloaded.library(lib).unwrap().root();
        assert_eq!(reloaded.record(root).get(FieldId::Desc), "Every NES game");
        assert_eq!(reloaded.record(root).name(), "nes");
        assert!(!reloaded.record(root).is_dirty());
    }

    #[test]
    fn save_replaces_nodes_and_keeps_others() {
        let store = store();
        store
            .backend()
            .write(
                Path::new(GAMELIST),
                br#"<gameList>
  <game><path>./mario.nes</path><playcount>3</playcount></game>
  <game><path>./zelda.nes</path><favorite>true</favorite></game>
</gameList>"#,
            )
            .unwrap();
        let (mut catalog, lib) = shelf(&["mario.nes", "zelda.nes"]);
        store.load_library(&mut catalog, lib).unwrap();

        let mario = find(&catalog, lib, "mario.nes");
        catalog.record_mut(mario).set_int(FieldId::PlayCount, 4);
        let report = store.save_library(&mut catalog, lib).unwrap();
        assert_eq!(report.dirty, 1);
        assert_eq!(report.removed, 1);
        assert_eq!(report.written, 1);
        assert!(report.document_written);

        let document = Document::parse(gamelist(&store).as_bytes()).unwrap();
        let paths: Vec<&str> = document
            .root
            .children
            .iter()
            .filter_map(|node| node.child_text("path"))
            .collect();
        assert_eq!(paths, vec!["./zelda.nes", "./mario.nes"]);
        assert_eq!(document.root.children[1].child_text("playcount"), Some("4"));
        assert!(store
            .backend()
            .exists(Path::new("/roms/nes/gamelist.xml.old")));
        assert!(!catalog.record(mario).is_dirty());
    }

    #[test]
    fn resetting_to_defaults_removes_the_node() {
        let store = store();
        store
            .backend()
            .write(
                Path::new(GAMELIST),
                b"<gameList><game><path>./mario.nes</path><hidden>true</hidden></game></gameList>",
            )
            .unwrap();
        let (mut catalog, lib) = shelf(&["mario.nes"]);
        store.load_library(&mut catalog, lib).unwrap();

        let mario = find(&catalog, lib, "mario.nes");
        catalog.record_mut(mario).set_bool(FieldId::Hidden, false);
        let report = store.save_library(&mut catalog, lib).unwrap();
        assert_eq!((report.removed, report.written), (1, 0));
        let document = Document::parse(gamelist(&store).as_bytes()).unwrap();
        assert!(document.root.children.is_empty());
    }

    #[test]
    fn nothing_to_write_leaves_the_document_alone() {
        let store = store();
        let (mut catalog, lib) = shelf(&["mario.nes"]);
        let mario = find(&catalog, lib, "mario.nes");
        catalog.record_mut(mario).set_bool(FieldId::Hidden, true);
        catalog.record_mut(mario).set_bool(FieldId::Hidden, false);
        assert!(catalog.record(mario).is_dirty());

        let report = store.save_library(&mut catalog, lib).unwrap();
        assert!(!report.document_written);
        assert!(!store.backend().exists(Path::new(GAMELIST)));
        assert!(!catalog.record(mario).is_dirty());
    }

    #[test]
    fn empty_temp_file_aborts_save() {
        let store = store();
        store.backend().write(Path::new(GAMELIST), b"<gameList/>").unwrap();
        let (mut catalog, lib) = shelf(&["mario.nes"]);
        let mario = find(&catalog, lib, "mario.nes");
        catalog.record_mut(mario).set_bool(FieldId::Favorite, true);

        store.backend().set_simulate_empty_write(true);
        let err = store.save_library(&mut catalog, lib).unwrap_err();
        store.backend().set_simulate_empty_write(false);

        assert!(matches!(err, StoreError::WriteFailure { .. }));
        assert_eq!(gamelist(&store), "<gameList/>");
        assert_eq!(store.backend().paths(), vec![PathBuf::from(GAMELIST)]);
        assert!(catalog.record(mario).is_dirty());
    }

    #[test]
    fn rename_failure_keeps_journal_and_document() {
        let store = store();
        store.backend().write(Path::new(GAMELIST), b"<gameList/>").unwrap();
        let (mut catalog, lib) = shelf(&["mario.nes"]);
        let mario = find(&catalog, lib, "mario.nes");
        store
            .set_and_journal(&mut catalog, mario, "favorite", "true")
            .unwrap();

        store.backend().set_simulate_rename_error(true);
        let err = store.save_library(&mut catalog, lib).unwrap_err();
        store.backend().set_simulate_rename_error(false);

        assert!(matches!(err, StoreError::RenameFailure { .. }));
        assert_eq!(gamelist(&store), "<gameList/>");
        assert!(store.backend().exists(Path::new("/journal/nes/mario.nes.xml")));
        assert!(catalog.record(mario).is_dirty());
    }

    #[test]
    fn disabled_saving_is_a_no_op() {
        let settings = StoreSettings {
            save_metadata: false,
            ..StoreSettings::with_recovery_root("/journal")
        };
        let store = MetadataStore::with_backend(MemBackend::new(), settings);
        let (mut catalog, lib) = shelf(&["mario.nes"]);
        let mario = find(&catalog, lib, "mario.nes");
        catalog.record_mut(mario).set_bool(FieldId::Favorite, true);

        let report = store.save_library(&mut catalog, lib).unwrap();
        assert!(report.skipped);
        assert!(store.backend().paths().is_empty());
        assert!(catalog.record(mario).is_dirty());
    }

    #[test]
    fn collections_are_never_persisted() {
        let store = store();
        let (mut catalog, lib) = shelf(&["mario.nes"]);
        let mario = find(&catalog, lib, "mario.nes");
        let favorites = catalog.add_collection("favorites");
        let proxies = catalog.rebuild_collection(favorites, &[mario]);

        store
            .set_and_journal(&mut catalog, proxies[0], "favorite", "true")
            .unwrap();
        store.flush_fragments();
        // the fragment lands under the source library
        assert!(store.backend().exists(Path::new("/journal/nes/mario.nes.xml")));

        let report = store.save_library(&mut catalog, favorites).unwrap();
        assert!(report.skipped);
        let reports = store.save_all(&mut catalog).unwrap();
        assert_eq!(reports.len(), 2);
        assert!(gamelist(&store).contains("<favorite>true</favorite>"));
    }
}
