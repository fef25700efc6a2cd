//! Logging setup
//!
//! The subscriber is installed once by a binary; components receive an
//! explicit [`tracing::Span`] carrying their context instead of reaching for
//! a process-wide logger.

use tracing::Span;
use tracing_subscriber::{fmt, EnvFilter};

use crate::error::{Result, TxkvError};

/// Filter used when `RUST_LOG` is not set
pub const DEFAULT_FILTER: &str = "info,txkv=debug";

/// Install the fmt subscriber, honouring `RUST_LOG` over `default_filter`
pub fn init(default_filter: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .try_init()
        .map_err(|e| TxkvError::Config(format!("failed to install log subscriber: {}", e)))
}

/// Root span for one service's log lines
pub fn service_span(service: &str) -> Span {
    tracing::info_span!("service", service = %service)
}
