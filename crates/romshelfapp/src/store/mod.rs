//! # Persistence Engine
//!
//! [`MetadataStore`] mirrors the dirty part of a [`Catalog`] to disk and
//! reconstructs it after a crash.
//!
//! ## On-disk Layout
//!
//! ```text
//! /roms/nes/gamelist.xml            primary document, one per library
//! /roms/nes/gamelist.xml.old        previous primary document
//! <recovery root>/nes/mario.nes.xml one fragment per entry edited since the last save
//! <recovery root>/nes/sub/zelda.nes.xml
//! <recovery root>/nes/.root.xml     fragment for the library root folder
//! ```
//!
//! Both kinds of document share one format: a `gameList` root carrying a
//! `parentHash` attribute, with `game`/`folder` children holding a `path`
//! and the record's non-default fields.
//!
//! ## Lifecycle
//!
//! | Step | Operation | Disk effect |
//! |------|-----------|-------------|
//! | start-up | [`load_library`](MetadataStore::load_library) | reads primary document, replays journal |
//! | play / favourite | [`set_and_journal`](MetadataStore::set_and_journal), [`record_play`](MetadataStore::record_play) | one fragment, usually off-thread |
//! | shutdown | [`save_library`](MetadataStore::save_library) | temp file, `.old` copy, rename, journal removed |
//!
//! A process killed between an edit and a save leaves its fragments
//! behind; the next load folds them back in and leaves those entries dirty
//! so the next save writes them into the primary document.
//!
//! ## The `parentHash` Fingerprint
//!
//! The fingerprint is the primary document's byte length when it was
//! parsed. Fragments carry the fingerprint current when they were written.
//! A mismatch on replay is logged and counted but never blocks the
//! fragment. Two documents of equal length are indistinguishable.

mod backend;
mod fs_backend;
mod gamelist;
mod journal;
mod mem_backend;
mod worker;

pub use backend::StorageBackend;
pub use fs_backend::FsBackend;
pub use mem_backend::MemBackend;

use crate::config::StoreSettings;
use crate::document::{Element, FOLDER_TAG, GAME_TAG, PATH_TAG};
use crate::error::{Result, StoreError};
use crate::paths;
use crate::schema::FieldId;
use crate::tree::{Catalog, EntryId, EntryKind};
use chrono::NaiveDateTime;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};
use worker::FragmentWriter;

/// Fragment file name for the library root folder.
pub const ROOT_FRAGMENT: &str = ".root.xml";

/// What a load did.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    /// Document nodes applied to an entry.
    pub attached: usize,
    /// Entries materialised because the document named them but the scan
    /// did not.
    pub created: usize,
    /// Nodes skipped: missing files, kind mismatches, unknown tags.
    pub skipped: usize,
    /// Nodes refused for lying outside the root or carrying an unknown
    /// extension, plus unreadable fragments.
    pub rejected: usize,
    /// Fragment nodes replayed from the recovery journal.
    pub replayed: usize,
    pub stale_fragments: usize,
    /// The primary document existed but could not be parsed.
    pub malformed: bool,
    pub parent_hash: u64,
}

/// What a save did.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct SaveReport {
    pub dirty: usize,
    /// Stale nodes dropped from the document.
    pub removed: usize,
    /// Fresh nodes appended to the document.
    pub written: usize,
    pub document_written: bool,
    /// Saving is disabled, or the library is a collection.
    pub skipped: bool,
}

/// The persistence engine, generic over where bytes go.
pub struct MetadataStore<B: StorageBackend + 'static = FsBackend> {
    backend: Arc<B>,
    settings: StoreSettings,
    recovery_root: PathBuf,
    writer: Option<FragmentWriter>,
}

impl MetadataStore<FsBackend> {
    pub fn open(settings: StoreSettings) -> Self {
        Self::with_backend(FsBackend::new(), settings)
    }
}

impl<B: StorageBackend + 'static> MetadataStore<B> {
    pub fn with_backend(backend: B, settings: StoreSettings) -> Self {
        let backend = Arc::new(backend);
        let writer = if settings.fragment_worker {
            match FragmentWriter::spawn(backend.clone(), settings.fragment_queue) {
                Ok(writer) => Some(writer),
                Err(err) => {
                    warn!(error = %err, "fragment writer unavailable; journaling synchronously");
                    None
                }
            }
        } else {
            None
        };
        Self {
            recovery_root: settings.recovery_root(),
            backend,
            settings,
            writer,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn settings(&self) -> &StoreSettings {
        &self.settings
    }

    pub fn recovery_root(&self) -> &Path {
        &self.recovery_root
    }

    /// The journal directory of one library.
    pub fn recovery_dir(&self, library_name: &str) -> PathBuf {
        self.recovery_root.join(library_name)
    }

    /// Where the fragment for a library-relative path is journaled. The
    /// library root, whose path is empty, gets [`ROOT_FRAGMENT`].
    pub fn fragment_path(&self, library_name: &str, stored: &Path) -> PathBuf {
        if stored.as_os_str().is_empty() {
            return self.recovery_dir(library_name).join(ROOT_FRAGMENT);
        }
        let mut path = self.recovery_dir(library_name).join(stored);
        path.as_mut_os_string().push(".xml");
        path
    }

    /// Waits until every queued fragment has hit the backend.
    pub fn flush_fragments(&self) {
        if let Some(writer) = &self.writer {
            writer.flush();
        }
    }

    /// Sets a field by key and journals the entry when the value changed.
    pub fn set_and_journal(
        &self,
        catalog: &mut Catalog,
        id: EntryId,
        key: &str,
        value: &str,
    ) -> Result<bool> {
        if !catalog.contains(id) {
            return Err(StoreError::UnknownEntry(format!("{id:?}")));
        }
        let changed = catalog.record_mut(id).set_by_key(key, value)?;
        if changed {
            self.write_fragment(catalog, id)?;
        }
        Ok(changed)
    }

    /// Counts a finished play session: bumps `playcount`, stamps
    /// `lastplayed` and journals the entry. Returns the new play count.
    pub fn record_play(&self, catalog: &mut Catalog, id: EntryId, at: NaiveDateTime) -> Result<i64> {
        match catalog.entry(id).map(|entry| entry.kind()) {
            Some(EntryKind::Game) => {}
            _ => return Err(StoreError::UnknownEntry(format!("{id:?} is not a game"))),
        }
        let record = catalog.record_mut(id);
        let count = record.get_int(FieldId::PlayCount) + 1;
        record.set_int(FieldId::PlayCount, count);
        record.set_time(FieldId::LastPlayed, at);
        debug!(entry = ?id, playcount = count, "recorded play");
        self.write_fragment(catalog, id)?;
        Ok(count)
    }
}

/// Serializes one entry as a `game`/`folder` node: its `path` relative to
/// the library root, then its non-default fields.
///
/// `name` is dropped when it equals the default name, since the loader
/// rebuilds that from the path anyway. The library root is written with
/// the path `./`.
pub(crate) fn entry_element(catalog: &Catalog, id: EntryId) -> Option<Element> {
    let source = catalog.source_of(id);
    let entry = catalog.entry(source)?;
    let tag = match entry.kind() {
        EntryKind::Game => GAME_TAG,
        EntryKind::Folder => FOLDER_TAG,
        EntryKind::Placeholder => return None,
    };
    let root = catalog.library(entry.library())?.root_dir();
    let record = catalog.record(source);

    let mut node = Element::new(tag);
    node.push_text_child(PATH_TAG, paths::relative_to(root, &catalog.path(source)));
    record.serialize(&mut node, true, root);
    if !has_custom_name(catalog, source) {
        if let Some(decl) = record.schema().get(FieldId::Name) {
            node.remove_children_named(decl.key);
        }
    }
    Some(node)
}

fn has_custom_name(catalog: &Catalog, id: EntryId) -> bool {
    catalog.record(id).name() != catalog.default_name(id)
}

/// Whether an entry earns a node in the primary document: it must carry
/// something the loader could not rebuild from its path alone.
pub(crate) fn worth_writing(catalog: &Catalog, id: EntryId) -> bool {
    catalog.record(id).has_non_default_fields() || has_custom_name(catalog, id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LibraryConfig;
    use crate::schema::SchemaRegistry;

    fn store() -> MetadataStore<MemBackend> {
        MetadataStore::with_backend(MemBackend::new(), StoreSettings::with_recovery_root("/journal"))
    }

    fn catalog() -> (Catalog, EntryId) {
        let mut catalog = Catalog::new(Arc::new(SchemaRegistry::new()));
        let lib = catalog.add_library(LibraryConfig::new("nes", "/roms/nes"));
        let (mario, _) = catalog
            .find_or_create(lib, Path::new("sub/mario.nes"), EntryKind::Game)
            .unwrap();
        (catalog, mario)
    }

    #[test]
    fn fragment_paths_mirror_the_library() {
        let store = store();
        assert_eq!(
            store.fragment_path("nes", Path::new("sub/mario.nes")),
            PathBuf::from("/journal/nes/sub/mario.nes.xml")
        );
        assert_eq!(
            store.fragment_path("nes", Path::new("")),
            PathBuf::from("/journal/nes/.root.xml")
        );
    }

    #[test]
    fn entry_element_drops_default_name() {
        let (mut catalog, mario) = catalog();
        catalog.record_mut(mario).set_bool(FieldId::Favorite, true);
        let node = entry_element(&catalog, mario).unwrap();
        let keys: Vec<&str> = node.children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(keys, vec!["path", "favorite"]);
        assert_eq!(node.child_text("path"), Some("./sub/mario.nes"));

        catalog.record_mut(mario).set(FieldId::Name, "Super Mario Bros.");
        let node = entry_element(&catalog, mario).unwrap();
        assert_eq!(node.child_text("name"), Some("Super Mario Bros."));
    }

    #[test]
    fn write_rule_counts_custom_names() {
        let (mut catalog, mario) = catalog();
        assert!(!worth_writing(&catalog, mario));
        catalog.record_mut(mario).set(FieldId::Name, "Mario");
        assert!(worth_writing(&catalog, mario));
    }

    #[test]
    fn record_play_counts_and_journals() {
        let store = store();
        let (mut catalog, mario) = catalog();
        let at = chrono::NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(3, 4, 5)
            .unwrap();

        assert_eq!(store.record_play(&mut catalog, mario, at).unwrap(), 1);
        assert_eq!(store.record_play(&mut catalog, mario, at).unwrap(), 2);
        store.flush_fragments();

        let record = catalog.record(mario);
        assert_eq!(record.get(FieldId::LastPlayed), "20240102T030405");
        assert!(record.is_dirty());
        assert!(store
            .backend()
            .exists(Path::new("/journal/nes/sub/mario.nes.xml")));

        let folder = catalog.node(mario).parent().unwrap();
        assert!(store.record_play(&mut catalog, folder, at).is_err());
    }

    #[test]
    fn unchanged_values_are_not_journaled() {
        let store = store();
        let (mut catalog, mario) = catalog();
        assert!(!store.set_and_journal(&mut catalog, mario, "favorite", "false").unwrap());
        store.flush_fragments();
        assert!(store.backend().paths().is_empty());

        assert!(store.set_and_journal(&mut catalog, mario, "favorite", "true").unwrap());
        store.flush_fragments();
        assert_eq!(store.backend().paths().len(), 1);

        assert!(matches!(
            store.set_and_journal(&mut catalog, mario, "bogus", "1"),
            Err(StoreError::UnknownField(_))
        ));
    }
}
