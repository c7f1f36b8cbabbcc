//! Directory scanner: builds the bare skeleton entries the store attaches
//! metadata to.
//!
//! Only accepted files become games; folders exist only on the way to a
//! game. Dotfiles and the library's own gamelist are skipped. Children are
//! visited in name order so listings are stable.

use romshelfapp::tree::{Catalog, EntryKind, LibraryId};
use std::fs;
use std::io;
use std::path::Path;
use tracing::debug;

/// Scans the library root into `catalog`. Returns how many games were found.
pub fn scan_library(catalog: &mut Catalog, library: LibraryId) -> io::Result<usize> {
    let Some(lib) = catalog.library(library) else {
        return Ok(0);
    };
    let root = lib.root_dir().to_path_buf();
    let gamelist = lib.gamelist_path();
    let config = lib.config().clone();

    let mut found = Vec::new();
    walk(&root, &root, &mut found)?;

    let mut games = 0;
    for relative in found {
        let absolute = root.join(&relative);
        if absolute == gamelist || !config.accepts(&absolute) {
            continue;
        }
        if catalog
            .find_or_create(library, &relative, EntryKind::Game)
            .is_some()
        {
            games += 1;
        }
    }
    debug!(library = %config.name, games, "scanned");
    Ok(games)
}

fn walk(root: &Path, dir: &Path, out: &mut Vec<std::path::PathBuf>) -> io::Result<()> {
    let mut entries: Vec<_> = fs::read_dir(dir)?.collect::<Result<_, _>>()?;
    entries.sort_by_key(|entry| entry.file_name());
    for entry in entries {
        if entry.file_name().to_string_lossy().starts_with('.') {
            continue;
        }
        let path = entry.path();
        if entry.file_type()?.is_dir() {
            walk(root, &path, out)?;
        } else if let Ok(relative) = path.strip_prefix(root) {
            out.push(relative.to_path_buf());
        }
    }
    Ok(())
}
