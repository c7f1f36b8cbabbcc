//! Path glue between stored (library-relative) paths and the filesystem.
//!
//! Everything persisted by the store is written relative to the owning
//! library's root so a whole library can be moved without rewriting its
//! gamelist. These helpers are purely lexical: they never touch the disk,
//! so `..` is folded without resolving symlinks.

use std::path::{Component, Path, PathBuf};

/// Folds `.` and `..` components without consulting the filesystem.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let popped = matches!(out.components().next_back(), Some(Component::Normal(_)))
                    && out.pop();
                if !popped && !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Resolves a stored path against a library root.
///
/// - `""` → the root itself
/// - `./x` or `x` → `root/x`
/// - `~/x` → `$HOME/x`
/// - absolute paths are kept
pub fn resolve(root: &Path, stored: &str) -> PathBuf {
    let stored = stored.trim();
    if stored.is_empty() || stored == "." || stored == "./" {
        return normalize(root);
    }
    if let Some(rest) = stored.strip_prefix("~/") {
        if let Some(home) = home_dir() {
            return normalize(&home.join(rest));
        }
    }
    normalize(&root.join(stored))
}

/// True when `path` is `root` or lies beneath it.
pub fn is_within(root: &Path, path: &Path) -> bool {
    normalize(path).starts_with(normalize(root))
}

/// Renders `path` relative to `base` as `./a/b`, or the full path when it
/// does not live under `base`.
pub fn relative_to(base: &Path, path: &Path) -> String {
    let path = normalize(path);
    match path.strip_prefix(normalize(base)) {
        Ok(rel) if rel.as_os_str().is_empty() => "./".to_string(),
        Ok(rel) => {
            let parts: Vec<String> = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect();
            format!("./{}", parts.join("/"))
        }
        Err(_) => path.to_string_lossy().into_owned(),
    }
}

/// The library-relative form of an absolute path, or `None` outside the root.
pub fn strip_root(root: &Path, path: &Path) -> Option<PathBuf> {
    normalize(path)
        .strip_prefix(normalize(root))
        .ok()
        .map(Path::to_path_buf)
}

/// Filename without its extension; used as the default entry name.
pub fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Lower-cased extension including the leading dot.
pub fn dotted_extension(path: &Path) -> Option<String> {
    path.extension()
        .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
}

fn home_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|dirs| dirs.home_dir().to_path_buf())
}
