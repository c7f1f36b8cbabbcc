use super::display::{EntryRef, FilterIndex};
use super::entry::{Entry, EntryId, EntryKind, KindMask, LibraryId, RecordSlot};
use crate::config::LibraryConfig;
use crate::names::TitleLookup;
use crate::paths;
use crate::record::MetadataRecord;
use crate::schema::SchemaRegistry;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

struct Slot {
    generation: u32,
    entry: Option<Entry>,
}

/// A named entry collection rooted at one directory, or a virtual
/// collection of proxies.
pub struct Library {
    name: String,
    config: LibraryConfig,
    root: EntryId,
    parent_hash: u64,
    collection: bool,
    filter: Option<Box<dyn FilterIndex>>,
}

impl Library {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &LibraryConfig {
        &self.config
    }

    /// The library's root folder entry.
    pub fn root(&self) -> EntryId {
        self.root
    }

    /// Directory every stored path is relative to.
    pub fn root_dir(&self) -> &Path {
        &self.config.root
    }

    pub fn gamelist_path(&self) -> PathBuf {
        self.config.gamelist_path()
    }

    /// Byte length of the gamelist when it was last parsed or written.
    pub fn parent_hash(&self) -> u64 {
        self.parent_hash
    }

    pub(crate) fn set_parent_hash(&mut self, hash: u64) {
        self.parent_hash = hash;
    }

    /// Collections hold proxies only and are never persisted.
    pub fn is_collection(&self) -> bool {
        self.collection
    }

    pub fn filter(&self) -> Option<&dyn FilterIndex> {
        self.filter.as_deref()
    }
}

/// Owner of every library tree.
///
/// Entries live in one generational arena; folders own their children by
/// handle and each child keeps a non-owning handle back to its parent.
/// Tree invariants (only folders have children, one parent per entry) are
/// enforced with panics: a violation means the tree is corrupt.
pub struct Catalog {
    schemas: Arc<SchemaRegistry>,
    slots: Vec<Slot>,
    free: Vec<u32>,
    libraries: Vec<Option<Library>>,
}

impl Catalog {
    pub fn new(schemas: Arc<SchemaRegistry>) -> Self {
        Self {
            schemas,
            slots: Vec::new(),
            free: Vec::new(),
            libraries: Vec::new(),
        }
    }

    pub fn schemas(&self) -> &Arc<SchemaRegistry> {
        &self.schemas
    }

    // --- Libraries ---

    pub fn add_library(&mut self, config: LibraryConfig) -> LibraryId {
        self.push_library(config, false)
    }

    /// Adds a virtual library whose entries are proxies of other entries.
    pub fn add_collection(&mut self, name: impl Into<String>) -> LibraryId {
        self.push_library(LibraryConfig::new(name, PathBuf::new()), true)
    }

    fn push_library(&mut self, config: LibraryConfig, collection: bool) -> LibraryId {
        let id = LibraryId(self.libraries.len() as u32);
        let name = paths::file_stem(&config.root);
        let record = MetadataRecord::new(self.schemas.folder().clone(), name);
        let root = self.alloc(Entry {
            path: PathBuf::new(),
            kind: EntryKind::Folder,
            parent: None,
            library: id,
            slot: RecordSlot::Owned(record),
            children: Vec::new(),
        });
        self.libraries.push(Some(Library {
            name: config.name.clone(),
            config,
            root,
            parent_hash: 0,
            collection,
            filter: None,
        }));
        id
    }

    pub fn library(&self, id: LibraryId) -> Option<&Library> {
        self.libraries.get(id.0 as usize).and_then(Option::as_ref)
    }

    pub(crate) fn library_mut(&mut self, id: LibraryId) -> Option<&mut Library> {
        self.libraries.get_mut(id.0 as usize).and_then(Option::as_mut)
    }

    pub fn library_by_name(&self, name: &str) -> Option<LibraryId> {
        self.library_ids()
            .find(|id| self.library(*id).is_some_and(|lib| lib.name == name))
    }

    pub fn library_ids(&self) -> impl Iterator<Item = LibraryId> + '_ {
        self.libraries
            .iter()
            .enumerate()
            .filter(|(_, lib)| lib.is_some())
            .map(|(index, _)| LibraryId(index as u32))
    }

    /// Installs (or clears) the caller's filter index for a library.
    pub fn set_filter(&mut self, library: LibraryId, filter: Option<Box<dyn FilterIndex>>) {
        if let Some(lib) = self.library_mut(library) {
            lib.filter = filter;
        }
    }

    /// Tears a library down, freeing its whole tree. Collection proxies
    /// that pointed into it are dropped as well.
    pub fn remove_library(&mut self, id: LibraryId) {
        let Some(library) = self.libraries.get_mut(id.0 as usize).and_then(Option::take) else {
            return;
        };
        self.release(library.root);
        self.prune_orphan_proxies();
    }

    // --- Entries ---

    /// Creates a detached entry. `path` is relative to the library root.
    pub fn create_entry(
        &mut self,
        library: LibraryId,
        path: impl Into<PathBuf>,
        kind: EntryKind,
    ) -> EntryId {
        let path = path.into();
        let (schema, name) = match kind {
            EntryKind::Folder => (self.schemas.folder().clone(), paths::file_stem(&path)),
            EntryKind::Game => (self.schemas.game().clone(), paths::file_stem(&path)),
            EntryKind::Placeholder => (
                self.schemas.game().clone(),
                path.to_string_lossy().into_owned(),
            ),
        };
        self.alloc(Entry {
            path,
            kind,
            parent: None,
            library,
            slot: RecordSlot::Owned(MetadataRecord::new(schema, name)),
            children: Vec::new(),
        })
    }

    pub fn create_placeholder(&mut self, library: LibraryId, label: &str) -> EntryId {
        self.create_entry(library, label, EntryKind::Placeholder)
    }

    /// Creates a detached proxy of `source` inside a collection.
    pub fn create_proxy(&mut self, collection: LibraryId, source: EntryId) -> EntryId {
        let source = self.source_of(source);
        let path = self.path(source);
        let kind = self.node(source).kind;
        self.alloc(Entry {
            path,
            kind,
            parent: None,
            library: collection,
            slot: RecordSlot::Proxy(source),
            children: Vec::new(),
        })
    }

    /// Replaces a collection's contents with fresh proxies of `sources`.
    pub fn rebuild_collection(&mut self, collection: LibraryId, sources: &[EntryId]) -> Vec<EntryId> {
        let Some(root) = self.library(collection).map(Library::root) else {
            return Vec::new();
        };
        for child in self.node(root).children.clone() {
            self.remove_child(root, child);
            self.release(child);
        }
        let mut proxies = Vec::with_capacity(sources.len());
        for &source in sources {
            if !self.contains(source) {
                continue;
            }
            let proxy = self.create_proxy(collection, source);
            self.add_child(root, proxy, true);
            proxies.push(proxy);
        }
        proxies
    }

    /// Detaches an entry from its parent and frees it with its subtree.
    pub fn delete_entry(&mut self, id: EntryId) {
        if let Some(parent) = self.entry(id).and_then(Entry::parent) {
            self.remove_child(parent, id);
        }
        self.release(id);
        self.prune_orphan_proxies();
    }

    pub fn contains(&self, id: EntryId) -> bool {
        self.entry(id).is_some()
    }

    pub fn entry(&self, id: EntryId) -> Option<&Entry> {
        let slot = self.slots.get(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.entry.as_ref()
    }

    fn entry_mut(&mut self, id: EntryId) -> Option<&mut Entry> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.entry.as_mut()
    }

    /// # Panics
    ///
    /// On a stale handle.
    pub(crate) fn node(&self, id: EntryId) -> &Entry {
        match self.entry(id) {
            Some(entry) => entry,
            None => panic!("stale entry handle {id:?}"),
        }
    }

    fn node_mut(&mut self, id: EntryId) -> &mut Entry {
        match self.entry_mut(id) {
            Some(entry) => entry,
            None => panic!("stale entry handle {id:?}"),
        }
    }

    /// The entry owning the record `id` reads from (itself unless a proxy).
    pub fn source_of(&self, id: EntryId) -> EntryId {
        match self.node(id).slot {
            RecordSlot::Proxy(source) => source,
            RecordSlot::Owned(_) => id,
        }
    }

    pub fn record(&self, id: EntryId) -> &MetadataRecord {
        match &self.node(id).slot {
            RecordSlot::Owned(record) => record,
            RecordSlot::Proxy(source) => self.record(*source),
        }
    }

    pub fn record_mut(&mut self, id: EntryId) -> &mut MetadataRecord {
        let target = self.source_of(id);
        match &mut self.node_mut(target).slot {
            RecordSlot::Owned(record) => record,
            RecordSlot::Proxy(_) => unreachable!("proxies always point at an owning entry"),
        }
    }

    /// The name an entry gets when nothing overrides it: the filename stem,
    /// or the root directory's stem for a library root.
    pub fn default_name(&self, id: EntryId) -> String {
        let source = self.source_of(id);
        paths::file_stem(&self.path(source))
    }

    // --- Topology ---

    /// Appends `entry` to `folder`'s children.
    ///
    /// # Panics
    ///
    /// If `folder` is not a folder, or if `assign_parent` is set and
    /// `entry` already has a parent.
    pub fn add_child(&mut self, folder: EntryId, entry: EntryId, assign_parent: bool) {
        assert_ne!(folder, entry, "an entry cannot contain itself");
        assert!(
            self.node(folder).kind == EntryKind::Folder,
            "only folders may own children"
        );
        if assign_parent {
            let current = self.node(entry).parent;
            assert!(
                current.is_none(),
                "entry {entry:?} already belongs to {current:?}"
            );
            self.node_mut(entry).parent = Some(folder);
        }
        self.node_mut(folder).children.push(entry);
    }

    /// Detaches `entry` from `folder`.
    ///
    /// # Panics
    ///
    /// If `entry` is not currently a child of `folder`.
    pub fn remove_child(&mut self, folder: EntryId, entry: EntryId) {
        let children = &mut self.node_mut(folder).children;
        let Some(position) = children.iter().position(|child| *child == entry) else {
            panic!("entry {entry:?} is not a child of {folder:?}");
        };
        children.remove(position);
        self.node_mut(entry).parent = None;
    }

    /// Finds the entry at a library-relative path, creating it and any
    /// missing intermediate folders. Returns whether anything new was
    /// created, or `None` when the path runs into an entry of another kind.
    pub fn find_or_create(
        &mut self,
        library: LibraryId,
        relative: &Path,
        kind: EntryKind,
    ) -> Option<(EntryId, bool)> {
        let mut folder = self.library(library)?.root;
        if relative.as_os_str().is_empty() {
            return Some((folder, false));
        }

        let components: Vec<_> = relative.components().collect();
        let mut stored = PathBuf::new();
        let mut created = false;
        for (position, component) in components.iter().enumerate() {
            stored.push(component.as_os_str());
            let last = position + 1 == components.len();
            let wanted = if last { kind } else { EntryKind::Folder };

            let existing = self
                .node(folder)
                .children
                .iter()
                .copied()
                .find(|child| self.node(*child).path == stored);
            let next = match existing {
                Some(child) if self.node(child).kind == wanted => child,
                Some(_) => return None,
                None => {
                    let child = self.create_entry(library, stored.clone(), wanted);
                    self.add_child(folder, child, true);
                    created = true;
                    child
                }
            };
            folder = next;
        }
        Some((folder, created))
    }

    // --- Paths ---

    /// Absolute path of an entry. The root folder resolves to the library
    /// root itself.
    pub fn path(&self, id: EntryId) -> PathBuf {
        let entry = self.node(id);
        let root = self
            .library(entry.library)
            .map(Library::root_dir)
            .unwrap_or(Path::new(""));
        if entry.path.as_os_str().is_empty() {
            paths::normalize(root)
        } else {
            paths::normalize(&root.join(&entry.path))
        }
    }

    /// Identity used to index entries by path: the absolute path, or just
    /// the filename for collection proxies.
    pub fn key(&self, id: EntryId) -> PathBuf {
        let entry = self.node(id);
        if entry.is_proxy() {
            entry.path.file_name().map(PathBuf::from).unwrap_or_default()
        } else {
            self.path(id)
        }
    }

    /// Title shown for an entry: the filename stem, or for arcade-style
    /// libraries the canonical title from `titles` when it knows the set.
    pub fn display_name(&self, id: EntryId, titles: &dyn TitleLookup) -> String {
        let source = self.source_of(id);
        let entry = self.node(source);
        if entry.kind == EntryKind::Placeholder {
            return entry.path.to_string_lossy().into_owned();
        }
        let stem = paths::file_stem(&self.path(source));
        let arcade = self
            .library(entry.library)
            .is_some_and(|lib| lib.config.arcade_titles);
        if arcade && entry.kind == EntryKind::Game {
            if let Some(title) = titles.canonical_title(&stem) {
                return title;
            }
        }
        stem
    }

    // --- Recursive queries ---

    /// Depth-first search below `folder` for the entry whose key is `path`.
    pub fn find_by_path(&self, folder: EntryId, path: &Path) -> Option<EntryId> {
        for &child in &self.node(folder).children {
            if self.key(child) == path {
                return Some(child);
            }
            if self.node(child).kind == EntryKind::Folder {
                if let Some(found) = self.find_by_path(child, path) {
                    return Some(found);
                }
            }
        }
        None
    }

    /// Flattens everything below `folder` into `index`, keyed by [`Catalog::key`].
    pub fn build_path_index(&self, folder: EntryId, index: &mut HashMap<PathBuf, EntryId>) {
        for &child in &self.node(folder).children {
            let entry = self.node(child);
            match entry.kind {
                EntryKind::Placeholder => continue,
                EntryKind::Folder => {
                    index.insert(self.key(child), child);
                    self.build_path_index(child, index);
                }
                EntryKind::Game => {
                    index.insert(self.key(child), child);
                }
            }
        }
    }

    /// Every entry below `folder` matching `mask`, in document order.
    ///
    /// With `displayed_only`, entries rejected by the library's active
    /// filter index are left out. With `library`, only entries whose record
    /// belongs to that library are kept (how collections select one
    /// platform's games).
    pub fn get_files_recursive(
        &self,
        folder: EntryId,
        mask: KindMask,
        displayed_only: bool,
        library: Option<LibraryId>,
    ) -> Vec<EntryId> {
        let filter = if displayed_only {
            self.active_filter(folder)
        } else {
            None
        };
        let mut out = Vec::new();
        self.collect_files(folder, mask, filter, library, &mut out);
        out
    }

    fn collect_files(
        &self,
        folder: EntryId,
        mask: KindMask,
        filter: Option<&dyn FilterIndex>,
        library: Option<LibraryId>,
        out: &mut Vec<EntryId>,
    ) {
        for &child in &self.node(folder).children {
            let entry = self.node(child);
            let shown = filter.map_or(true, |f| f.show_file(EntryRef::new(self, child)));
            let owned_by = library.map_or(true, |lib| self.node(self.source_of(child)).library == lib);
            if mask.matches(entry.kind) && shown && owned_by {
                out.push(child);
            }
            if entry.kind == EntryKind::Folder {
                self.collect_files(child, mask, filter, library, out);
            }
        }
    }

    /// The filter index of `folder`'s library, if one is installed and active.
    pub(crate) fn active_filter(&self, folder: EntryId) -> Option<&dyn FilterIndex> {
        self.library(self.node(folder).library)
            .and_then(Library::filter)
            .filter(|f| f.is_filtered())
    }

    // --- Arena ---

    fn alloc(&mut self, entry: Entry) -> EntryId {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.entry = Some(entry);
            return EntryId {
                index,
                generation: slot.generation,
            };
        }
        self.slots.push(Slot {
            generation: 0,
            entry: Some(entry),
        });
        EntryId {
            index: (self.slots.len() - 1) as u32,
            generation: 0,
        }
    }

    fn release(&mut self, id: EntryId) {
        let Some(slot) = self.slots.get_mut(id.index as usize) else {
            return;
        };
        if slot.generation != id.generation {
            return;
        }
        let Some(entry) = slot.entry.take() else {
            return;
        };
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);

        for child in entry.children {
            let owned = self
                .entry(child)
                .is_some_and(|c| c.parent.is_none() || c.parent == Some(id));
            if owned {
                self.release(child);
            }
        }
    }

    fn prune_orphan_proxies(&mut self) {
        let roots: Vec<EntryId> = self
            .libraries
            .iter()
            .flatten()
            .filter(|lib| lib.collection)
            .map(|lib| lib.root)
            .collect();
        for root in roots {
            let orphans: Vec<EntryId> = self
                .node(root)
                .children
                .iter()
                .copied()
                .filter(|child| {
                    matches!(self.node(*child).slot, RecordSlot::Proxy(source) if !self.contains(source))
                })
                .collect();
            for orphan in orphans {
                self.remove_child(root, orphan);
                self.release(orphan);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::names::NoTitles;
    use crate::schema::FieldId;

    fn catalog_with_nes() -> (Catalog, LibraryId) {
        let mut catalog = Catalog::new(Arc::new(SchemaRegistry::new()));
        let lib = catalog.add_library(
            LibraryConfig::new("nes", "/roms/nes").with_extensions(&[".nes"]),
        );
        (catalog, lib)
    }

    fn root(catalog: &Catalog, lib: LibraryId) -> EntryId {
        catalog.library(lib).unwrap().root()
    }

    /// /roms/nes/{mario.nes, a/{b/{zelda.nes, metroid.nes}}, a/kid.nes}
    fn nested(catalog: &mut Catalog, lib: LibraryId) -> Vec<EntryId> {
        let mut created = Vec::new();
        for path in ["mario.nes", "a/b/zelda.nes", "a/b/metroid.nes", "a/kid.nes"] {
            let (id, _) = catalog
                .find_or_create(lib, Path::new(path), EntryKind::Game)
                .unwrap();
            created.push(id);
        }
        created
    }

    #[test]
    fn delete_entry_detaches_and_frees_the_subtree() {
        let (mut catalog, lib) = catalog_with_nes();
        let games = nested(&mut catalog, lib);
        let root_id = root(&catalog, lib);
        let folder_a = catalog.entry(games[3]).unwrap().parent().unwrap();
        let favorites = catalog.add_collection("favorites");
        let proxies = catalog.rebuild_collection(favorites, &[games[1], games[0]]);

        catalog.delete_entry(folder_a);

        assert!(!catalog.contains(folder_a));
        assert!(!catalog.contains(games[1]));
        assert!(!catalog.contains(games[3]));
        assert!(!catalog.contains(proxies[0]));
        assert!(catalog.contains(proxies[1]));
        assert_eq!(catalog.entry(root_id).unwrap().children(), &[games[0]]);
        let left = catalog.get_files_recursive(root_id, KindMask::ALL, false, None);
        assert_eq!(left, vec![games[0]]);
    }

    #[test]
    fn default_name_of_root_is_the_directory_stem() {
        let (mut catalog, lib) = catalog_with_nes();
        let games = nested(&mut catalog, lib);
        assert_eq!(catalog.default_name(root(&catalog, lib)), "nes");
        assert_eq!(catalog.default_name(games[1]), "zelda");
    }

    #[test]
    fn root_path_resolves_to_library_root() {
        let (catalog, lib) = catalog_with_nes();
        assert_eq!(catalog.path(root(&catalog, lib)), PathBuf::from("/roms/nes"));
    }

    #[test]
    fn entries_default_their_name_to_the_stem() {
        let (mut catalog, lib) = catalog_with_nes();
        let game = catalog.create_entry(lib, "sub/Super Mario.nes", EntryKind::Game);
        assert_eq!(catalog.record(game).name(), "Super Mario");
        assert_eq!(catalog.path(game), PathBuf::from("/roms/nes/sub/Super Mario.nes"));
    }

    #[test]
    fn add_then_remove_restores_children() {
        let (mut catalog, lib) = catalog_with_nes();
        let root = root(&catalog, lib);
        let existing = catalog.create_entry(lib, "mario.nes", EntryKind::Game);
        catalog.add_child(root, existing, true);
        let before = catalog.node(root).children().to_vec();

        let game = catalog.create_entry(lib, "zelda.nes", EntryKind::Game);
        catalog.add_child(root, game, true);
        assert_eq!(catalog.node(game).parent(), Some(root));
        catalog.remove_child(root, game);

        assert_eq!(catalog.node(root).children(), before.as_slice());
        assert_eq!(catalog.node(game).parent(), None);
    }

    #[test]
    #[should_panic(expected = "already belongs")]
    fn adding_a_parented_entry_panics() {
        let (mut catalog, lib) = catalog_with_nes();
        let root = root(&catalog, lib);
        let folder = catalog.create_entry(lib, "sub", EntryKind::Folder);
        catalog.add_child(root, folder, true);
        let game = catalog.create_entry(lib, "sub/zelda.nes", EntryKind::Game);
        catalog.add_child(folder, game, true);
        catalog.add_child(root, game, true);
    }

    #[test]
    #[should_panic(expected = "not a child")]
    fn removing_a_stranger_panics() {
        let (mut catalog, lib) = catalog_with_nes();
        let root = root(&catalog, lib);
        let game = catalog.create_entry(lib, "zelda.nes", EntryKind::Game);
        catalog.remove_child(root, game);
    }

    #[test]
    #[should_panic(expected = "only folders")]
    fn games_cannot_own_children() {
        let (mut catalog, lib) = catalog_with_nes();
        let game = catalog.create_entry(lib, "zelda.nes", EntryKind::Game);
        let other = catalog.create_entry(lib, "mario.nes", EntryKind::Game);
        catalog.add_child(game, other, true);
    }

    #[test]
    fn recursive_games_in_document_order() {
        let (mut catalog, lib) = catalog_with_nes();
        let games = nested(&mut catalog, lib);
        let root = root(&catalog, lib);

        let found = catalog.get_files_recursive(root, KindMask::GAME, false, None);
        assert_eq!(found, vec![games[0], games[1], games[2], games[3]]);

        let folders = catalog.get_files_recursive(root, KindMask::FOLDER, false, None);
        let names: Vec<&str> = folders.iter().map(|f| catalog.record(*f).name()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn placeholders_are_invisible_to_recursive_queries() {
        let (mut catalog, lib) = catalog_with_nes();
        let root = root(&catalog, lib);
        let placeholder = catalog.create_placeholder(lib, "..");
        catalog.add_child(root, placeholder, true);

        assert!(catalog.get_files_recursive(root, KindMask::ALL, false, None).is_empty());
        let mut index = HashMap::new();
        catalog.build_path_index(root, &mut index);
        assert!(index.is_empty());
        assert_eq!(catalog.display_name(placeholder, &NoTitles), "..");
    }

    #[test]
    fn find_or_create_reuses_existing_folders() {
        let (mut catalog, lib) = catalog_with_nes();
        let (first, created) = catalog
            .find_or_create(lib, Path::new("sub/zelda.nes"), EntryKind::Game)
            .unwrap();
        assert!(created);
        let (second, created) = catalog
            .find_or_create(lib, Path::new("sub/link.nes"), EntryKind::Game)
            .unwrap();
        assert!(created);
        assert_eq!(catalog.node(first).parent(), catalog.node(second).parent());

        let (again, created) = catalog
            .find_or_create(lib, Path::new("sub/zelda.nes"), EntryKind::Game)
            .unwrap();
        assert!(!created);
        assert_eq!(again, first);
    }

    #[test]
    fn find_or_create_refuses_kind_conflicts() {
        let (mut catalog, lib) = catalog_with_nes();
        catalog
            .find_or_create(lib, Path::new("sub"), EntryKind::Game)
            .unwrap();
        assert!(catalog
            .find_or_create(lib, Path::new("sub/zelda.nes"), EntryKind::Game)
            .is_none());
    }

    #[test]
    fn path_index_and_search_agree() {
        let (mut catalog, lib) = catalog_with_nes();
        let games = nested(&mut catalog, lib);
        let root = root(&catalog, lib);

        let mut index = HashMap::new();
        catalog.build_path_index(root, &mut index);
        assert_eq!(index.len(), 6);
        let zelda = PathBuf::from("/roms/nes/a/b/zelda.nes");
        assert_eq!(index.get(&zelda), Some(&games[1]));
        assert_eq!(catalog.find_by_path(root, &zelda), Some(games[1]));
        assert_eq!(catalog.find_by_path(root, Path::new("/roms/nes/nope.nes")), None);
    }

    #[test]
    fn proxies_share_the_source_record() {
        let (mut catalog, lib) = catalog_with_nes();
        let games = nested(&mut catalog, lib);
        let favorites = catalog.add_collection("favorites");
        let proxies = catalog.rebuild_collection(favorites, &[games[1]]);
        let proxy = proxies[0];

        assert_eq!(catalog.key(proxy), PathBuf::from("zelda.nes"));
        assert_eq!(catalog.path(proxy), PathBuf::from("/roms/nes/a/b/zelda.nes"));
        catalog.record_mut(proxy).set_bool(FieldId::Favorite, true);
        assert!(catalog.record(games[1]).get_bool(FieldId::Favorite));
        assert!(catalog.record(games[1]).is_dirty());

        let root = catalog.library(favorites).unwrap().root();
        let mine = catalog.get_files_recursive(root, KindMask::GAME, false, Some(lib));
        assert_eq!(mine, vec![proxy]);
        let other = catalog.add_library(LibraryConfig::new("snes", "/roms/snes"));
        assert!(catalog
            .get_files_recursive(root, KindMask::GAME, false, Some(other))
            .is_empty());
    }

    #[test]
    fn rebuilding_a_collection_replaces_proxies() {
        let (mut catalog, lib) = catalog_with_nes();
        let games = nested(&mut catalog, lib);
        let favorites = catalog.add_collection("favorites");
        let first = catalog.rebuild_collection(favorites, &[games[0], games[1]]);
        let second = catalog.rebuild_collection(favorites, &[games[2]]);

        assert!(!catalog.contains(first[0]));
        let root = catalog.library(favorites).unwrap().root();
        assert_eq!(catalog.node(root).children(), second.as_slice());
    }

    #[test]
    fn removing_a_library_invalidates_handles_and_proxies() {
        let (mut catalog, lib) = catalog_with_nes();
        let games = nested(&mut catalog, lib);
        let favorites = catalog.add_collection("favorites");
        catalog.rebuild_collection(favorites, &[games[0]]);

        catalog.remove_library(lib);
        assert!(catalog.library(lib).is_none());
        assert!(games.iter().all(|g| !catalog.contains(*g)));
        let root = catalog.library(favorites).unwrap().root();
        assert!(catalog.node(root).children().is_empty());

        // freed slots are reused without resurrecting old handles
        let other = catalog.add_library(LibraryConfig::new("snes", "/roms/snes"));
        let fresh = catalog.create_entry(other, "f.sfc", EntryKind::Game);
        assert!(catalog.contains(fresh));
        assert!(!catalog.contains(games[0]));
        assert!(catalog.library_by_name("nes").is_none());
        assert_eq!(catalog.library_by_name("snes"), Some(other));
    }

    #[test]
    fn display_name_uses_arcade_titles() {
        let mut catalog = Catalog::new(Arc::new(SchemaRegistry::new()));
        let mut config = LibraryConfig::new("mame", "/roms/mame");
        config.arcade_titles = true;
        let lib = catalog.add_library(config);
        let game = catalog.create_entry(lib, "sf2.zip", EntryKind::Game);
        let unknown = catalog.create_entry(lib, "zzz.zip", EntryKind::Game);

        let mut titles = HashMap::new();
        titles.insert("sf2".to_string(), "Street Fighter II".to_string());
        assert_eq!(catalog.display_name(game, &titles), "Street Fighter II");
        assert_eq!(catalog.display_name(unknown, &titles), "zzz");
    }
}
