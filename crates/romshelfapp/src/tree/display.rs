//! What a folder shows.
//!
//! `children_to_display` runs a folder's children through, in order:
//!
//! 1. the library's filter index, when one is active
//! 2. the hidden-entry policy
//! 3. kid mode (games only)
//! 4. single-game folder flattening
//! 5. the caller's sort
//!
//! Placeholders always pass through untouched.

use super::catalog::Catalog;
use super::entry::{Entry, EntryId, EntryKind};
use crate::config::DisplaySettings;
use crate::record::MetadataRecord;
use crate::schema::FieldId;
use std::cmp::Ordering;
use std::path::PathBuf;

/// Read-only view of one entry, handed to filters and comparators.
#[derive(Clone, Copy)]
pub struct EntryRef<'a> {
    catalog: &'a Catalog,
    id: EntryId,
}

impl<'a> EntryRef<'a> {
    pub fn new(catalog: &'a Catalog, id: EntryId) -> Self {
        Self { catalog, id }
    }

    pub fn id(&self) -> EntryId {
        self.id
    }

    pub fn entry(&self) -> &'a Entry {
        self.catalog.node(self.id)
    }

    pub fn kind(&self) -> EntryKind {
        self.entry().kind()
    }

    pub fn path(&self) -> PathBuf {
        self.catalog.path(self.id)
    }

    pub fn record(&self) -> &'a MetadataRecord {
        self.catalog.record(self.id)
    }

    pub fn name(&self) -> &'a str {
        self.record().name()
    }
}

/// Caller-supplied visibility filter (search, genre pickers and so on).
pub trait FilterIndex {
    /// Whether the filter currently restricts anything.
    fn is_filtered(&self) -> bool;

    fn show_file(&self, entry: EntryRef<'_>) -> bool;
}

/// A strict-weak "less than" plus direction.
pub struct SortSpec<'a> {
    pub less: &'a dyn Fn(EntryRef<'_>, EntryRef<'_>) -> bool,
    pub ascending: bool,
}

impl<'a> SortSpec<'a> {
    pub fn ascending(less: &'a dyn Fn(EntryRef<'_>, EntryRef<'_>) -> bool) -> Self {
        Self {
            less,
            ascending: true,
        }
    }

    pub fn descending(less: &'a dyn Fn(EntryRef<'_>, EntryRef<'_>) -> bool) -> Self {
        Self {
            less,
            ascending: false,
        }
    }

    fn compare(&self, a: EntryRef<'_>, b: EntryRef<'_>) -> Ordering {
        let ordering = if (self.less)(a, b) {
            Ordering::Less
        } else if (self.less)(b, a) {
            Ordering::Greater
        } else {
            Ordering::Equal
        };
        if self.ascending {
            ordering
        } else {
            ordering.reverse()
        }
    }
}

/// Comparator ordering by record name, case-insensitively.
pub fn by_name(a: EntryRef<'_>, b: EntryRef<'_>) -> bool {
    a.name().to_lowercase() < b.name().to_lowercase()
}

impl Catalog {
    /// The children of `folder` a front-end should list.
    pub fn children_to_display(
        &self,
        folder: EntryId,
        display: &DisplaySettings,
        sort: Option<&SortSpec<'_>>,
    ) -> Vec<EntryId> {
        let filter = self.active_filter(folder);
        let mut shown = Vec::new();

        for &child in self.node(folder).children() {
            match self.node(child).kind() {
                EntryKind::Placeholder => shown.push(child),
                EntryKind::Game => {
                    if self.game_visible(child, filter, display) {
                        shown.push(child);
                    }
                }
                EntryKind::Folder => {
                    if !self.folder_visible(child, display) {
                        continue;
                    }
                    let games = self.visible_games(child, filter, display);
                    if filter.is_some() && games.is_empty() {
                        continue;
                    }
                    if display.flatten_single_game_folders && games.len() == 1 {
                        shown.push(games[0]);
                    } else {
                        shown.push(child);
                    }
                }
            }
        }

        if let Some(spec) = sort {
            // stable, so equal entries keep document order
            shown.sort_by(|a, b| spec.compare(EntryRef::new(self, *a), EntryRef::new(self, *b)));
        }
        shown
    }

    fn game_visible(
        &self,
        game: EntryId,
        filter: Option<&dyn FilterIndex>,
        display: &DisplaySettings,
    ) -> bool {
        if let Some(filter) = filter {
            if !filter.show_file(EntryRef::new(self, game)) {
                return false;
            }
        }
        let record = self.record(game);
        if !display.show_hidden && record.get_bool(FieldId::Hidden) {
            return false;
        }
        !display.kid_mode || record.get_bool(FieldId::KidGame)
    }

    fn folder_visible(&self, folder: EntryId, display: &DisplaySettings) -> bool {
        display.show_hidden || !self.record(folder).get_bool(FieldId::Hidden)
    }

    fn visible_games(
        &self,
        folder: EntryId,
        filter: Option<&dyn FilterIndex>,
        display: &DisplaySettings,
    ) -> Vec<EntryId> {
        let mut games = Vec::new();
        for &child in self.node(folder).children() {
            match self.node(child).kind() {
                EntryKind::Game if self.game_visible(child, filter, display) => games.push(child),
                EntryKind::Folder if self.folder_visible(child, display) => {
                    games.extend(self.visible_games(child, filter, display));
                }
                _ => {}
            }
        }
        games
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LibraryConfig;
    use crate::schema::SchemaRegistry;
    use crate::tree::LibraryId;
    use std::path::Path;
    use std::sync::Arc;

    struct NameContains(&'static str);

    impl FilterIndex for NameContains {
        fn is_filtered(&self) -> bool {
            true
        }

        fn show_file(&self, entry: EntryRef<'_>) -> bool {
            entry.name().contains(self.0)
        }
    }

    fn shelf(paths: &[&str]) -> (Catalog, LibraryId, EntryId) {
        let mut catalog = Catalog::new(Arc::new(SchemaRegistry::new()));
        let lib = catalog.add_library(LibraryConfig::new("nes", "/roms/nes"));
        for path in paths {
            catalog
                .find_or_create(lib, Path::new(path), EntryKind::Game)
                .unwrap();
        }
        let root = catalog.library(lib).unwrap().root();
        (catalog, lib, root)
    }

    fn names(catalog: &Catalog, ids: &[EntryId]) -> Vec<String> {
        ids.iter().map(|id| catalog.record(*id).name().to_string()).collect()
    }

    fn find(catalog: &Catalog, root: EntryId, rel: &str) -> EntryId {
        catalog
            .find_by_path(root, &Path::new("/roms/nes").join(rel))
            .unwrap()
    }

    #[test]
    fn hidden_entries_follow_the_policy() {
        let (mut catalog, _, root) = shelf(&["mario.nes", "zelda.nes"]);
        let zelda = find(&catalog, root, "zelda.nes");
        catalog.record_mut(zelda).set_bool(FieldId::Hidden, true);

        let settings = DisplaySettings::default();
        let shown = catalog.children_to_display(root, &settings, None);
        assert_eq!(names(&catalog, &shown), vec!["mario"]);

        let settings = DisplaySettings {
            show_hidden: true,
            ..DisplaySettings::default()
        };
        assert_eq!(catalog.children_to_display(root, &settings, None).len(), 2);
    }

    #[test]
    fn kid_mode_keeps_kid_games_only() {
        let (mut catalog, _, root) = shelf(&["mario.nes", "contra.nes"]);
        let mario = find(&catalog, root, "mario.nes");
        catalog.record_mut(mario).set_bool(FieldId::KidGame, true);

        let settings = DisplaySettings {
            kid_mode: true,
            ..DisplaySettings::default()
        };
        let shown = catalog.children_to_display(root, &settings, None);
        assert_eq!(shown, vec![mario]);
    }

    #[test]
    fn single_game_folders_flatten() {
        let (catalog, _, root) = shelf(&["multi/a.nes", "multi/b.nes", "solo/only.nes"]);
        let settings = DisplaySettings::default();
        let shown = catalog.children_to_display(root, &settings, None);
        assert_eq!(names(&catalog, &shown), vec!["multi", "only"]);

        let settings = DisplaySettings {
            flatten_single_game_folders: false,
            ..DisplaySettings::default()
        };
        let shown = catalog.children_to_display(root, &settings, None);
        assert_eq!(names(&catalog, &shown), vec!["multi", "solo"]);
    }

    #[test]
    fn active_filter_drops_games_and_empty_folders() {
        let (mut catalog, lib, root) = shelf(&["mario.nes", "zelda.nes", "sub/metroid.nes", "sub/mario2.nes"]);
        catalog.set_filter(lib, Some(Box::new(NameContains("mario"))));

        let settings = DisplaySettings {
            flatten_single_game_folders: false,
            ..DisplaySettings::default()
        };
        let shown = catalog.children_to_display(root, &settings, None);
        assert_eq!(names(&catalog, &shown), vec!["mario", "sub"]);

        catalog.set_filter(lib, Some(Box::new(NameContains("zelda"))));
        let shown = catalog.children_to_display(root, &settings, None);
        assert_eq!(names(&catalog, &shown), vec!["zelda"]);

        let shown = catalog.get_files_recursive(root, crate::tree::KindMask::GAME, true, None);
        assert_eq!(names(&catalog, &shown), vec!["zelda"]);
    }

    #[test]
    fn sort_is_applied_last_in_either_direction() {
        let (catalog, _, root) = shelf(&["b.nes", "C.nes", "a.nes"]);
        let settings = DisplaySettings::default();

        let less = by_name;
        let ascending = SortSpec::ascending(&less);
        let shown = catalog.children_to_display(root, &settings, Some(&ascending));
        assert_eq!(names(&catalog, &shown), vec!["a", "b", "C"]);

        let descending = SortSpec::descending(&less);
        let shown = catalog.children_to_display(root, &settings, Some(&descending));
        assert_eq!(names(&catalog, &shown), vec!["C", "b", "a"]);
    }

    #[test]
    fn placeholders_pass_through() {
        let (mut catalog, lib, root) = shelf(&[]);
        let placeholder = catalog.create_placeholder(lib, "no games found");
        catalog.add_child(root, placeholder, true);

        let settings = DisplaySettings {
            kid_mode: true,
            ..DisplaySettings::default()
        };
        assert_eq!(catalog.children_to_display(root, &settings, None), vec![placeholder]);
    }
}
