use crate::record::MetadataRecord;
use std::ops::BitOr;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    Game,
    Folder,
    /// UI-only marker such as ".." or "no entries found".
    ///
    /// No [`KindMask`] matches a placeholder, so recursive queries and every
    /// persistence traversal skip them without a check at the call site.
    Placeholder,
}

/// Which entry kinds a recursive query collects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KindMask(u8);

impl KindMask {
    pub const GAME: KindMask = KindMask(1);
    pub const FOLDER: KindMask = KindMask(1 << 1);
    pub const ALL: KindMask = KindMask(0b11);

    pub const fn matches(self, kind: EntryKind) -> bool {
        match kind {
            EntryKind::Game => self.0 & Self::GAME.0 != 0,
            EntryKind::Folder => self.0 & Self::FOLDER.0 != 0,
            EntryKind::Placeholder => false,
        }
    }
}

impl BitOr for KindMask {
    type Output = KindMask;

    fn bitor(self, rhs: Self) -> Self::Output {
        KindMask(self.0 | rhs.0)
    }
}

/// Handle to an entry in a [`Catalog`](super::Catalog) arena.
///
/// The generation guards against a freed slot being reused: a handle kept
/// across a library teardown simply stops resolving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryId {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LibraryId(pub(crate) u32);

#[derive(Debug)]
pub(crate) enum RecordSlot {
    Owned(MetadataRecord),
    /// Collection proxy: reads and writes go to the source entry's record.
    Proxy(EntryId),
}

/// One node of a library tree.
#[derive(Debug)]
pub struct Entry {
    pub(crate) path: PathBuf,
    pub(crate) kind: EntryKind,
    pub(crate) parent: Option<EntryId>,
    pub(crate) library: LibraryId,
    pub(crate) slot: RecordSlot,
    pub(crate) children: Vec<EntryId>,
}

impl Entry {
    /// Path as stored: relative to the library root (empty for the root
    /// folder), or absolute for collection proxies.
    pub fn stored_path(&self) -> &Path {
        &self.path
    }

    pub fn kind(&self) -> EntryKind {
        self.kind
    }

    pub fn parent(&self) -> Option<EntryId> {
        self.parent
    }

    pub fn library(&self) -> LibraryId {
        self.library
    }

    /// Children in document order. Always empty for games.
    pub fn children(&self) -> &[EntryId] {
        &self.children
    }

    pub fn is_proxy(&self) -> bool {
        matches!(self.slot, RecordSlot::Proxy(_))
    }

    /// The canonical entry a proxy stands for.
    pub fn source(&self) -> Option<EntryId> {
        match self.slot {
            RecordSlot::Proxy(source) => Some(source),
            RecordSlot::Owned(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masks_never_match_placeholders() {
        for mask in [KindMask::GAME, KindMask::FOLDER, KindMask::ALL] {
            assert!(!mask.matches(EntryKind::Placeholder));
        }
    }

    #[test]
    fn mask_union() {
        let mask = KindMask::GAME | KindMask::FOLDER;
        assert_eq!(mask, KindMask::ALL);
        assert!(KindMask::GAME.matches(EntryKind::Game));
        assert!(!KindMask::GAME.matches(EntryKind::Folder));
    }
}
