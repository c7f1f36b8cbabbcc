use crate::error::Result;
use std::path::{Path, PathBuf};

/// Raw byte storage addressed by path.
///
/// This trait handles the "how" of storage (filesystem vs memory), while
/// [`MetadataStore`](super::MetadataStore) handles the "what": which
/// documents to write, in which order, and how to recover. Implementations
/// must be shareable with the fragment writer thread.
pub trait StorageBackend: Send + Sync {
    /// Returns `Ok(None)` when the file does not exist. `Err` only on real
    /// I/O failures.
    fn read(&self, path: &Path) -> Result<Option<Vec<u8>>>;

    /// Writes `bytes` to `path`, creating parent directories. Not atomic:
    /// callers wanting atomicity write a temp file and [`rename`](Self::rename).
    fn write(&self, path: &Path, bytes: &[u8]) -> Result<()>;

    /// Size in bytes, or `None` when the file is missing.
    fn file_len(&self, path: &Path) -> Result<Option<u64>>;

    fn exists(&self, path: &Path) -> bool;

    fn copy(&self, from: &Path, to: &Path) -> Result<()>;

    /// Replaces `to` with `from` in one step.
    fn rename(&self, from: &Path, to: &Path) -> Result<()>;

    /// Removing a missing file is not an error.
    fn remove_file(&self, path: &Path) -> Result<()>;

    /// Removes a directory tree. A missing directory is not an error.
    fn remove_dir_all(&self, path: &Path) -> Result<()>;

    /// Every file below `dir`, recursively, in the order the storage
    /// enumerates them. A missing directory lists as empty.
    fn list_files(&self, dir: &Path) -> Result<Vec<PathBuf>>;
}
