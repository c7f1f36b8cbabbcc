//! # Romshelf Architecture
//!
//! Romshelf is the **metadata store of a game-library front-end**: the tree
//! of games and folders a launcher browses, the typed metadata on every
//! entry, and the engine that keeps that metadata on disk without losing a
//! play count to a power cut.
//!
//! Like any library it is UI-agnostic: it never prints and never exits.
//! Rendering, input, scraping and emulator launching live elsewhere and talk
//! to it through plain function calls and a few small traits.
//!
//! ## Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Host application (romshelf CLI, a launcher UI, ...)        │
//! │  - scans directories into skeleton entries                  │
//! │  - supplies filters, comparators, title lookups             │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Persistence Engine (store/)                                │
//! │  - load: gamelist + recovery journal → tree                 │
//! │  - journal: one fragment per edit, off-thread               │
//! │  - save: dirty entries → temp file → atomic rename          │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Entry Tree (tree/)                                         │
//! │  - Catalog arena of libraries, folders, games, proxies      │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Metadata Record (record.rs) over Metadata Schema (schema/) │
//! │  - sparse, canonicalised, dirty-tracked field values        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Crash Safety in One Paragraph
//!
//! Every edit that matters (a play, a favourite) is journaled as a tiny
//! single-entry document under the recovery root. The primary gamelist is
//! only rewritten on a deliberate save, through a temp file and a rename.
//! Loading replays whatever the journal still holds, so the worst a crash
//! can do is make the next save a little bigger.
//!
//! ## Module Overview
//!
//! - [`schema`]: field declarations per entry kind, value canonicalisation
//! - [`record`]: [`MetadataRecord`](record::MetadataRecord)
//! - [`tree`]: [`Catalog`](tree::Catalog), entries, display policy
//! - [`store`]: [`MetadataStore`](store::MetadataStore) and storage backends
//! - [`document`]: the gamelist XML element tree
//! - [`config`]: `confique` settings
//! - [`paths`]: stored-path resolution
//! - [`error`]: [`StoreError`](error::StoreError)

pub mod config;
pub mod document;
pub mod error;
pub mod names;
pub mod paths;
pub mod record;
pub mod schema;
pub mod store;
pub mod tree;

#[cfg(any(test, feature = "test_utils"))]
pub mod test_utils;
