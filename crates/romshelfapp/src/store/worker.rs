//! Background writer for recovery fragments.
//!
//! One named thread drains a bounded channel of write jobs. Submission never
//! blocks: when the queue is full (or the thread is gone) the job is handed
//! back and the store writes it on the caller's thread instead.

use super::backend::StorageBackend;
use crossbeam_channel::{bounded, Sender};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, error, warn};

enum Job {
    Write { path: PathBuf, bytes: Vec<u8> },
    /// Barrier: acknowledged once every earlier job has been handled.
    Flush(Sender<()>),
}

pub(crate) struct FragmentWriter {
    sender: Option<Sender<Job>>,
    handle: Option<JoinHandle<()>>,
}

impl FragmentWriter {
    pub(crate) fn spawn<B: StorageBackend + 'static>(
        backend: Arc<B>,
        capacity: usize,
    ) -> io::Result<Self> {
        let (sender, receiver) = bounded::<Job>(capacity.max(1));
        let handle = thread::Builder::new()
            .name("romshelf-fragments".to_string())
            .spawn(move || {
                debug!("fragment writer started");
                for job in receiver {
                    match job {
                        Job::Write { path, bytes } => {
                            if let Err(err) = backend.write(&path, &bytes) {
                                warn!(path = %path.display(), error = %err, "failed to journal fragment");
                            }
                        }
                        Job::Flush(done) => {
                            let _ = done.send(());
                        }
                    }
                }
                debug!("fragment writer stopped");
            })?;
        Ok(Self {
            sender: Some(sender),
            handle: Some(handle),
        })
    }

    /// Queues a write, or hands it back when the queue cannot take it.
    pub(crate) fn submit(&self, path: PathBuf, bytes: Vec<u8>) -> Result<(), (PathBuf, Vec<u8>)> {
        let Some(sender) = &self.sender else {
            return Err((path, bytes));
        };
        match sender.try_send(Job::Write { path, bytes }) {
            Ok(()) => Ok(()),
            Err(err) => match err.into_inner() {
                Job::Write { path, bytes } => Err((path, bytes)),
                Job::Flush(_) => Ok(()),
            },
        }
    }

    /// Blocks until every job queued so far has been written.
    pub(crate) fn flush(&self) {
        let Some(sender) = &self.sender else {
            return;
        };
        let (done, wait) = bounded(1);
        if sender.send(Job::Flush(done)).is_ok() {
            let _ = wait.recv();
        }
    }
}

impl Drop for FragmentWriter {
    fn drop(&mut self) {
        // closing the channel lets the thread drain what is queued and exit
        self.sender.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("fragment writer panicked");
            }
        }
    }
}
