//! # Entry Tree
//!
//! Every library is a tree of entries rooted at a folder whose path is the
//! library root:
//!
//! ```text
//!   Catalog
//!   ├── slots: [Entry, Entry, ...]      one arena, generational handles
//!   └── libraries
//!       ├── nes   root ──► folder "" ──► game "mario.nes"
//!       │                            └─► folder "hacks" ──► game "hacks/x.nes"
//!       └── favorites (collection)
//!                root ──► proxy ──────────► game "mario.nes" (record shared)
//! ```
//!
//! Folders own their children by [`EntryId`]; the child's `parent` is a plain
//! handle back, never an owner. Collections contain proxies: entries whose
//! record lives on another entry, so editing through a proxy edits the
//! source and raises the source's dirty flag.

mod catalog;
mod display;
mod entry;

pub use catalog::{Catalog, Library};
pub use display::{by_name, EntryRef, FilterIndex, SortSpec};
pub use entry::{Entry, EntryId, EntryKind, KindMask, LibraryId};
