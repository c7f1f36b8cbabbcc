use super::backend::StorageBackend;
use super::gamelist::{LibraryTarget, PathIndex};
use super::{entry_element, LoadReport, MetadataStore};
use crate::document::{Document, PARENT_HASH_ATTR};
use crate::error::{Result, StoreError};
use crate::tree::{Catalog, EntryId};
use std::path::PathBuf;
use tracing::{debug, warn};

impl<B: StorageBackend + 'static> MetadataStore<B> {
    /// Journals the current state of one entry.
    ///
    /// The fragment is a single-entry gamelist tagged with the library's
    /// current fingerprint. It goes to the background writer when one is
    /// running and has room; otherwise it is written before returning.
    pub fn write_fragment(&self, catalog: &Catalog, id: EntryId) -> Result<()> {
        let source = catalog.source_of(id);
        let Some(entry) = catalog.entry(source) else {
            return Err(StoreError::UnknownEntry(format!("{id:?}")));
        };
        let Some(library) = catalog.library(entry.library()) else {
            return Ok(());
        };
        if library.is_collection() {
            return Ok(());
        }
        let Some(node) = entry_element(catalog, source) else {
            return Ok(());
        };

        let mut fragment = Document::new();
        fragment
            .root
            .set_attr(PARENT_HASH_ATTR, library.parent_hash().to_string());
        fragment.root.children.push(node);
        let bytes = fragment.to_bytes()?;
        let path = self.fragment_path(library.name(), entry.stored_path());
        self.dispatch(path, bytes)
    }

    fn dispatch(&self, path: PathBuf, bytes: Vec<u8>) -> Result<()> {
        let (path, bytes) = match &self.writer {
            Some(writer) => match writer.submit(path, bytes) {
                Ok(()) => return Ok(()),
                Err(job) => {
                    debug!("fragment queue full; writing synchronously");
                    // keep per-entry order: older queued fragments land first
                    writer.flush();
                    job
                }
            },
            None => (path, bytes),
        };
        self.backend
            .write(&path, &bytes)
            .map_err(|err| StoreError::WriteFailure {
                path,
                reason: err.to_string(),
            })
    }

    /// Folds every fragment of the library's journal back into the tree.
    ///
    /// Fragments are applied in enumeration order, so for a path journaled
    /// twice the last one wins. A fragment replaces the entry's record
    /// outright and leaves it dirty, so the next save writes it into the
    /// gamelist even when it matches what the gamelist already says.
    pub(super) fn replay_journal(
        &self,
        catalog: &mut Catalog,
        target: &LibraryTarget,
        index: &mut PathIndex,
        report: &mut LoadReport,
    ) -> Result<()> {
        let dir = self.recovery_dir(&target.name);
        let files = self.backend.list_files(&dir)?;

        for file in files {
            if file.extension().map_or(true, |ext| ext != "xml") {
                continue;
            }
            let Some(bytes) = self.backend.read(&file)? else {
                continue;
            };
            let fragment = match Document::parse(&bytes) {
                Ok(doc) => doc,
                Err(source) => {
                    let err = StoreError::MalformedDocument { path: file, source };
                    warn!(library = %target.name, error = %err, "skipping unreadable fragment");
                    report.rejected += 1;
                    continue;
                }
            };

            let hash = fragment
                .root
                .attr(PARENT_HASH_ATTR)
                .and_then(|value| value.trim().parse::<u64>().ok());
            let stale = hash != Some(target.parent_hash);
            if stale {
                debug!(
                    library = %target.name,
                    fragment = %file.display(),
                    "fragment written against another gamelist revision"
                );
                report.stale_fragments += 1;
            }

            for node in &fragment.root.children {
                match self.resolve_node(catalog, target, index, node, report) {
                    Ok(Some(id)) => {
                        // a fragment is the whole entry; fields it omits are defaults
                        let name = catalog.default_name(id);
                        let record = catalog.record_mut(id);
                        record.reset(name);
                        record.deserialize(node);
                        record.mark_dirty();
                        report.replayed += 1;
                    }
                    Ok(None) => {}
                    Err(err) if err.is_rejection() => {
                        warn!(library = %target.name, error = %err, "rejected fragment entry");
                        report.rejected += 1;
                    }
                    Err(err) => return Err(err),
                }
            }
        }
        Ok(())
    }

    /// Removes a library's journal. Failure is logged, not returned.
    pub fn clear_journal(&self, library_name: &str) {
        let dir = self.recovery_dir(library_name);
        match self.backend.remove_dir_all(&dir) {
            Ok(()) => debug!(library = library_name, "recovery journal cleared"),
            Err(err) => {
                warn!(library = library_name, error = %err, "failed to clear recovery journal")
            }
        }
    }
}
