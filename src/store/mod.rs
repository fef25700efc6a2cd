//! Store Module
//!
//! The key/value store backed by the transaction log.
//!
//! ## Responsibilities
//! - Log every mutation before applying it to the index
//! - Leave the index untouched when the log rejects a mutation
//! - Serve reads from memory only
//!
//! ## Concurrency
//! The index sits behind a single RwLock. `get` takes it shared; `set` and
//! `delete` take it exclusively, but only for the in-memory step. The log
//! append runs outside the lock, so concurrent writers to the same key may
//! leave the index holding a value other than the last one logged for that
//! key. Writers to distinct keys are unaffected.
//!
//! ## Failed automatic syncs
//! With `SyncPolicy::EveryWrite` or `EveryNEntries`, `append` can return
//! `SyncFailed` after the record is already in the file. The store treats
//! that as a failed mutation and leaves the index unchanged, so replaying the
//! log would apply a mutation this process never served.

mod index;

pub use index::Index;

use crate::error::Result;
use crate::txlog::{Event, Log};

/// Key/value store over an injected transaction log
pub struct Store<L> {
    /// In-memory state, built only from mutations made by this process
    index: Index,

    /// Durability substrate
    log: L,
}

impl<L: Log> Store<L> {
    /// Create an empty store over `log`
    ///
    /// The log is not read; an existing file only receives further appends.
    pub fn new(log: L) -> Self {
        Self {
            index: Index::new(),
            log,
        }
    }

    /// Set a key to a value
    ///
    /// Steps:
    /// 1. Append a `set` record
    /// 2. On success, insert into the index
    pub fn set(&self, key: &[u8], value: &[u8]) -> Result<()> {
        let event = Event::set(key, value);
        self.log.append(&event)?;

        self.index.insert(event.key, event.value);
        Ok(())
    }

    /// Look a key up in memory
    pub fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.index.get(key)
    }

    /// Delete a key
    ///
    /// Steps:
    /// 1. Append a `delete` record, even if the key is absent
    /// 2. On success, remove from the index
    pub fn delete(&self, key: &[u8]) -> Result<()> {
        self.log.append(&Event::delete(key))?;

        self.index.remove(key);
        Ok(())
    }

    /// Force logged records to stable storage
    pub fn sync(&self) -> Result<()> {
        self.log.sync()
    }

    /// Close the underlying log
    ///
    /// Callers must stop issuing mutations first.
    pub fn close(&self) -> Result<()> {
        self.log.close()
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Whether the key is present
    pub fn contains_key(&self, key: &[u8]) -> bool {
        self.index.contains_key(key)
    }

    /// Number of live keys
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// The log this store appends to
    pub fn log(&self) -> &L {
        &self.log
    }
}
