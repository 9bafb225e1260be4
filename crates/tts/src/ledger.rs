//! Per-request tracking of temporary files
//!
//! Every path a request creates on disk is registered here. The ledger
//! deletes them all exactly once, either through an explicit
//! [`TempLedger::release_all`] or when it is dropped, so an early return,
//! an engine failure or a cancelled request cannot leave files behind.

use std::io;
use std::path::{Path, PathBuf};

/// Index of a path registered in a [`TempLedger`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceHandle(usize);

#[derive(Debug)]
struct Entry {
    path: PathBuf,
    released: bool,
}

/// Request-scoped set of temporary paths
#[derive(Debug)]
pub struct TempLedger {
    dir: PathBuf,
    entries: Vec<Entry>,
}

impl TempLedger {
    /// Create an empty ledger that allocates new paths inside `dir`
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            entries: Vec::new(),
        }
    }

    /// Track an existing or future path
    pub fn register(&mut self, path: impl Into<PathBuf>) -> ResourceHandle {
        self.entries.push(Entry {
            path: path.into(),
            released: false,
        });

        ResourceHandle(self.entries.len() - 1)
    }

    /// Reserve a fresh, unique path with the given extension and track it
    ///
    /// The file itself is not created.
    pub fn allocate(&mut self, extension: &str) -> ResourceHandle {
        let name = format!("vocalis-{}.{extension}", uuid::Uuid::new_v4().simple());
        let path = self.dir.join(name);
        self.register(path)
    }

    /// Path behind a handle
    pub fn path(&self, handle: ResourceHandle) -> &Path {
        &self.entries[handle.0].path
    }

    /// Delete a single path ahead of the rest
    ///
    /// Releasing the same handle twice is a no-op.
    pub fn release(&mut self, handle: ResourceHandle) {
        if let Some(entry) = self.entries.get_mut(handle.0) {
            release_entry(entry);
        }
    }

    /// Delete every path not yet released
    ///
    /// Individual failures are logged and skipped. Calling this again
    /// afterwards does nothing.
    pub fn release_all(&mut self) {
        for entry in &mut self.entries {
            release_entry(entry);
        }
    }

    /// Delete every path not yet released on the async runtime
    ///
    /// Request handlers call this instead of [`TempLedger::release_all`] so
    /// file removal does not block a worker thread.
    pub async fn close(mut self) {
        for entry in &mut self.entries {
            if entry.released {
                continue;
            }
            entry.released = true;

            log_removal(&entry.path, tokio::fs::remove_file(&entry.path).await);
        }
    }

    /// Number of tracked paths that have not been released
    pub fn pending(&self) -> usize {
        self.entries.iter().filter(|e| !e.released).count()
    }
}

impl Drop for TempLedger {
    fn drop(&mut self) {
        self.release_all();
    }
}

fn release_entry(entry: &mut Entry) {
    if entry.released {
        return;
    }
    entry.released = true;

    log_removal(&entry.path, std::fs::remove_file(&entry.path));
}

fn log_removal(path: &Path, result: io::Result<()>) {
    match result {
        Ok(()) => tracing::trace!(path = %path.display(), "removed temporary file"),
        // never written, e.g. the engine failed before producing output
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(path = %path.display(), "failed to remove temporary file: {e}"),
    }
}
