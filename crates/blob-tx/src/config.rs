//! Configuration for blob transaction construction.

use crate::fees::DEFAULT_EXCESS_BLOB_GAS;
use serde::{Deserialize, Serialize};
use std::{path::Path, time::Duration};

/// Default timeout for each rpc call, in milliseconds.
pub const DEFAULT_RPC_TIMEOUT_MS: u64 = 10_000;

/// Config errors
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// failed to read the config file
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    /// config file is not valid toml
    #[error("invalid config file: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Blob transaction config. Missing fields take their defaults.
///
/// ```toml
/// rpc_timeout_ms = 10000
/// fallback_excess_blob_gas = 100066
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BlobTxConfig {
    /// Timeout applied to every rpc call, in milliseconds.
    pub rpc_timeout_ms: u64,
    /// Excess blob gas used to price blob gas when the latest header does not report it.
    pub fallback_excess_blob_gas: u64,
}

impl Default for BlobTxConfig {
    fn default() -> Self {
        Self {
            rpc_timeout_ms: DEFAULT_RPC_TIMEOUT_MS,
            fallback_excess_blob_gas: DEFAULT_EXCESS_BLOB_GAS,
        }
    }
}

impl BlobTxConfig {
    /// Parse a config from a toml string.
    pub fn from_toml_str(s: &str) -> Result<Self, Error> {
        toml::from_str(s).map_err(Into::into)
    }

    /// Read and parse a toml config file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Timeout applied to every rpc call.
    pub const fn rpc_timeout(&self) -> Duration {
        Duration::from_millis(self.rpc_timeout_ms)
    }
}
