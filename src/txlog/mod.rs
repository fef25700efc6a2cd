//! Transaction Log Module
//!
//! Provides durability through append-only logging.
//!
//! ## Responsibilities
//! - Append one record per mutation, before the mutation is applied
//! - Validate key/value sizes before anything is written
//! - Length-prefixed framing so keys and values may hold arbitrary bytes
//! - Sync and close on orderly shutdown
//!
//! ## File Format
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │ Record 1                                                 │
//! │ ┌──────┬───┬────────┬───┬────────┬───┬─────┬───────┬────┐ │
//! │ │  op  │ ␠ │ keyLen │ ␠ │ valLen │ ␠ │ key │ value │ \n │ │
//! │ └──────┴───┴────────┴───┴────────┴───┴─────┴───────┴────┘ │
//! ├──────────────────────────────────────────────────────────┤
//! │ Record 2                                                 │
//! │ ...                                                      │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! `op` is `set` or `delete`; both lengths are decimal byte counts. There is
//! no separator between key and value.

mod event;
mod file_log;
mod reader;

pub use event::{Event, Op, MAX_KEY_SIZE, MAX_VALUE_SIZE};
pub use file_log::FileLog;
pub use reader::LogReader;

use crate::error::Result;

/// Capability the store needs from its durability substrate.
///
/// Implemented by [`FileLog`] and by in-memory doubles in tests. All methods
/// take `&self` so a log can be shared across threads.
pub trait Log: Send + Sync {
    /// Durably record one event at the end of the log.
    ///
    /// An error before the write (`KeyTooLarge`, `ValueTooLarge`,
    /// `AppendFailed`) leaves the log unchanged. `SyncFailed` from a
    /// policy-driven sync means the record was written but may not be on
    /// stable storage.
    fn append(&self, event: &Event) -> Result<()>;

    /// Force previously appended records to stable storage.
    fn sync(&self) -> Result<()>;

    /// Sync, then release the underlying resource.
    fn close(&self) -> Result<()>;
}
