//! Configuration for txkv
//!
//! Centralized configuration with sensible defaults.

use std::net::SocketAddr;
use std::path::PathBuf;

use crate::error::{Result, TxkvError};

/// Main configuration for a txkv instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Transaction Log Configuration
    // -------------------------------------------------------------------------
    /// Path of the append-only transaction log.
    /// Opened in append+create mode and never truncated.
    pub log_path: PathBuf,

    /// How often the log is forced to stable storage
    pub sync_policy: SyncPolicy,

    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// HTTP listen address
    pub listen_addr: String,

    /// How long in-flight requests may drain on shutdown (milliseconds)
    pub shutdown_timeout_ms: u64,
}

/// Log sync policy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SyncPolicy {
    /// fsync only on explicit `sync` or `close`
    #[default]
    Manual,

    /// fsync after every append (safest, slowest)
    EveryWrite,

    /// fsync after N unsynced appends
    EveryNEntries { count: usize },
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_path: PathBuf::from("kv.log"),
            sync_policy: SyncPolicy::Manual,
            listen_addr: "0.0.0.0:8081".to_string(),
            shutdown_timeout_ms: 5000,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Check that the configuration is usable
    pub fn validate(&self) -> Result<()> {
        if self.log_path.as_os_str().is_empty() {
            return Err(TxkvError::Config("log path must not be empty".to_string()));
        }

        if let SyncPolicy::EveryNEntries { count: 0 } = self.sync_policy {
            return Err(TxkvError::Config(
                "sync interval must be at least one entry".to_string(),
            ));
        }

        self.listen_socket_addr()?;
        Ok(())
    }

    /// Parse the listen address
    pub fn listen_socket_addr(&self) -> Result<SocketAddr> {
        self.listen_addr.parse().map_err(|e| {
            TxkvError::Config(format!("invalid listen address {:?}: {}", self.listen_addr, e))
        })
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the transaction log path
    pub fn log_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.log_path = path.into();
        self
    }

    /// Set the log sync policy
    pub fn sync_policy(mut self, policy: SyncPolicy) -> Self {
        self.config.sync_policy = policy;
        self
    }

    /// Set the HTTP listen address
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.listen_addr = addr.into();
        self
    }

    /// Set the shutdown drain timeout (in milliseconds)
    pub fn shutdown_timeout_ms(mut self, ms: u64) -> Self {
        self.config.shutdown_timeout_ms = ms;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
