//! # txkv
//!
//! A minimal durable key-value store with:
//! - An append-only transaction log with length-prefixed framing
//! - An in-memory index guarded by a reader/writer lock
//! - Log-before-mutate ordering for every write
//! - An HTTP interface with request metrics
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      HTTP Server                            │
//! │          /kv/set  /kv/get  /kv/delete  /health              │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                        Store                                │
//! │             (append first, then mutate)                     │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │    Log      │          │    Index    │
//!   │  (Append)   │          │  (RwLock)   │
//!   └──────┬──────┘          └─────────────┘
//!          │
//!          ▼
//!   ┌─────────────┐
//!   │   kv.log    │
//!   └─────────────┘
//! ```
//!
//! The log is write-only while the store runs. It is never replayed into the
//! index on startup.

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod txlog;
pub mod store;
pub mod metrics;
pub mod http;
pub mod telemetry;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{TxkvError, Result};
pub use config::Config;
pub use store::Store;
pub use txlog::{Event, FileLog, Log, Op};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of txkv
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
