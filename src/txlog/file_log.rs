//! File-backed transaction log
//!
//! Appends records to a single file opened in append+create mode.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use parking_lot::RwLock;

use crate::config::SyncPolicy;
use crate::error::{Result, TxkvError};
use super::{Event, Log};

/// Append-only log over a single file
///
/// Appends share the file handle (read lock) and rely on the OS append
/// semantics of one write per record. `close` takes the handle out under the
/// write lock; dropping the log releases the file on every other path.
pub struct FileLog {
    /// Location of the log file
    path: PathBuf,

    /// Open handle, `None` once closed
    file: RwLock<Option<File>>,

    /// When to fsync
    sync_policy: SyncPolicy,

    /// Appends since the last successful sync
    unsynced: AtomicUsize,

    /// Total records written through this handle
    appended: AtomicU64,
}

impl FileLog {
    /// Open or create a log file, syncing only on request
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with(path, SyncPolicy::Manual)
    }

    /// Open or create a log file with the given sync policy
    pub fn open_with(path: impl AsRef<Path>, sync_policy: SyncPolicy) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| TxkvError::Open {
                path: path.clone(),
                source,
            })?;

        Ok(Self {
            path,
            file: RwLock::new(Some(file)),
            sync_policy,
            unsynced: AtomicUsize::new(0),
            appended: AtomicU64::new(0),
        })
    }

    /// Path of the underlying file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of records appended through this handle
    pub fn appended_count(&self) -> u64 {
        self.appended.load(Ordering::Relaxed)
    }

    /// Number of appends not yet covered by a sync
    pub fn unsynced_count(&self) -> usize {
        self.unsynced.load(Ordering::Acquire)
    }

    /// Whether `close` has completed
    pub fn is_closed(&self) -> bool {
        self.file.read().is_none()
    }

    /// Appends that land while the fsync runs stay counted
    fn sync_file(&self, file: &File) -> Result<()> {
        let covered = self.unsynced.load(Ordering::Acquire);
        file.sync_all().map_err(TxkvError::SyncFailed)?;
        // Overlapping syncs may cover the same appends; never wrap below zero
        let _ = self
            .unsynced
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                Some(n.saturating_sub(covered))
            });
        Ok(())
    }
}

fn closed_error() -> io::Error {
    io::Error::new(io::ErrorKind::NotConnected, "transaction log is closed")
}

impl Log for FileLog {
    fn append(&self, event: &Event) -> Result<()> {
        // Validation and framing happen before the file is touched
        let record = event.encode()?;

        let guard = self.file.read();
        let mut file: &File = guard
            .as_ref()
            .ok_or_else(|| TxkvError::AppendFailed(closed_error()))?;

        file.write_all(&record).map_err(TxkvError::AppendFailed)?;
        self.appended.fetch_add(1, Ordering::Relaxed);
        let pending = self.unsynced.fetch_add(1, Ordering::AcqRel) + 1;

        match self.sync_policy {
            SyncPolicy::Manual => Ok(()),
            SyncPolicy::EveryWrite => self.sync_file(file),
            SyncPolicy::EveryNEntries { count } if pending >= count => self.sync_file(file),
            SyncPolicy::EveryNEntries { .. } => Ok(()),
        }
    }

    fn sync(&self) -> Result<()> {
        let guard = self.file.read();
        let file = guard
            .as_ref()
            .ok_or_else(|| TxkvError::SyncFailed(closed_error()))?;
        self.sync_file(file)
    }

    fn close(&self) -> Result<()> {
        let mut guard = self.file.write();
        let file = guard
            .as_ref()
            .ok_or_else(|| TxkvError::CloseFailed(closed_error()))?;

        // A failed sync leaves the handle open; Drop still releases it
        self.sync_file(file)?;
        drop(guard.take());
        Ok(())
    }
}

impl std::fmt::Debug for FileLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileLog")
            .field("path", &self.path)
            .field("sync_policy", &self.sync_policy)
            .field("appended", &self.appended_count())
            .field("closed", &self.is_closed())
            .finish()
    }
}
