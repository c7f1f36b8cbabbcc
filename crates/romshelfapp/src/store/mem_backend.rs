use super::backend::StorageBackend;
use crate::error::{Result, StoreError};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

/// In-memory storage backend for testing.
///
/// Files live in one ordered map keyed by path. The map sits behind a
/// `parking_lot::Mutex` because the fragment writer thread shares the
/// backend with the caller.
#[derive(Default)]
pub struct MemBackend {
    files: Mutex<BTreeMap<PathBuf, Vec<u8>>>,
    faults: Mutex<Faults>,
}

#[derive(Default, Clone, Copy)]
struct Faults {
    write_error: bool,
    empty_write: bool,
    rename_error: bool,
}

fn simulated(what: &str) -> StoreError {
    StoreError::Io(io::Error::new(io::ErrorKind::Other, format!("simulated {what} error")))
}

impl MemBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every write fails.
    pub fn set_simulate_write_error(&self, simulate: bool) {
        self.faults.lock().write_error = simulate;
    }

    /// Writes succeed but store zero bytes (a full disk that lies).
    pub fn set_simulate_empty_write(&self, simulate: bool) {
        self.faults.lock().empty_write = simulate;
    }

    /// Every rename fails.
    pub fn set_simulate_rename_error(&self, simulate: bool) {
        self.faults.lock().rename_error = simulate;
    }

    /// Test helper: every path currently stored.
    pub fn paths(&self) -> Vec<PathBuf> {
        self.files.lock().keys().cloned().collect()
    }
}

impl StorageBackend for MemBackend {
    fn read(&self, path: &Path) -> Result<Option<Vec<u8>>> {
        Ok(self.files.lock().get(path).cloned())
    }

    fn write(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        let faults = *self.faults.lock();
        if faults.write_error {
            return Err(simulated("write"));
        }
        let bytes = if faults.empty_write { Vec::new() } else { bytes.to_vec() };
        self.files.lock().insert(path.to_path_buf(), bytes);
        Ok(())
    }

    fn file_len(&self, path: &Path) -> Result<Option<u64>> {
        Ok(self.files.lock().get(path).map(|bytes| bytes.len() as u64))
    }

    fn exists(&self, path: &Path) -> bool {
        let files = self.files.lock();
        files.contains_key(path) || files.keys().any(|file| file.starts_with(path))
    }

    fn copy(&self, from: &Path, to: &Path) -> Result<()> {
        if self.faults.lock().write_error {
            return Err(simulated("write"));
        }
        let mut files = self.files.lock();
        let bytes = files
            .get(from)
            .cloned()
            .ok_or_else(|| StoreError::Io(io::Error::from(io::ErrorKind::NotFound)))?;
        files.insert(to.to_path_buf(), bytes);
        Ok(())
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        if self.faults.lock().rename_error {
            return Err(simulated("rename"));
        }
        let mut files = self.files.lock();
        let bytes = files
            .remove(from)
            .ok_or_else(|| StoreError::Io(io::Error::from(io::ErrorKind::NotFound)))?;
        files.insert(to.to_path_buf(), bytes);
        Ok(())
    }

    fn remove_file(&self, path: &Path) -> Result<()> {
        self.files.lock().remove(path);
        Ok(())
    }

    fn remove_dir_all(&self, path: &Path) -> Result<()> {
        self.files.lock().retain(|file, _| !file.starts_with(path));
        Ok(())
    }

    fn list_files(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        Ok(self
            .files
            .lock()
            .keys()
            .filter(|file| file.starts_with(dir) && file.as_path() != dir)
            .cloned()
            .collect())
    }
}
