//! Wallet configuration
//!
//! Loaded from a JSON file or assembled with the `with_*` methods. Every
//! field has a default so a partial file is enough.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::{WalletError, WalletResult};

pub const DEFAULT_RPC_URL: &str = "http://localhost:20606";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalletConfig {
    /// Node JSON-RPC endpoint
    pub rpc_url: String,
    /// SQLite database file; memory storage when unset
    pub database_path: Option<PathBuf>,
    /// Side-chain address that locks funds for a main-chain deposit
    pub deposit_address: Option<String>,
    pub request_timeout_secs: u64,
    /// Replay new blocks into the UTXO store before every build
    pub sync_before_build: bool,
    /// Fail a build when the sync before it fails
    pub fail_on_sync_error: bool,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            rpc_url: DEFAULT_RPC_URL.to_string(),
            database_path: None,
            deposit_address: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            sync_before_build: true,
            fail_on_sync_error: false,
        }
    }
}

impl WalletConfig {
    pub fn from_json_str(json: &str) -> WalletResult<Self> {
        let config: WalletConfig = serde_json::from_str(json)
            .map_err(|e| WalletError::ConfigurationError(format!("Invalid config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> WalletResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            WalletError::ConfigurationError(format!("Failed to read {}: {e}", path.display()))
        })?;
        Self::from_json_str(&content)
    }

    pub fn validate(&self) -> WalletResult<()> {
        if self.rpc_url.trim().is_empty() {
            return Err(WalletError::ConfigurationError(
                "rpc_url must not be empty".to_string(),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(WalletError::ConfigurationError(
                "request_timeout_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn with_rpc_url(mut self, rpc_url: impl Into<String>) -> Self {
        self.rpc_url = rpc_url.into();
        self
    }

    pub fn with_database_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.database_path = Some(path.into());
        self
    }

    pub fn with_deposit_address(mut self, address: impl Into<String>) -> Self {
        self.deposit_address = Some(address.into());
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout_secs = timeout.as_secs();
        self
    }

    pub fn with_sync_before_build(mut self, sync: bool) -> Self {
        self.sync_before_build = sync;
        self
    }

    pub fn with_fail_on_sync_error(mut self, fail: bool) -> Self {
        self.fail_on_sync_error = fail;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let config =
            WalletConfig::from_json_str(r#"{"deposit_address": "XQd1DCi6H62NQdWZQhJCRnrPn7sF9CTjaU"}"#)
                .unwrap();
        assert_eq!(config.rpc_url, DEFAULT_RPC_URL);
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert!(config.sync_before_build);
        assert_eq!(
            config.deposit_address.as_deref(),
            Some("XQd1DCi6H62NQdWZQhJCRnrPn7sF9CTjaU")
        );
    }

    #[test]
    fn test_invalid_config_rejected() {
        assert!(matches!(
            WalletConfig::from_json_str(r#"{"request_timeout_secs": 0}"#),
            Err(WalletError::ConfigurationError(_))
        ));
        assert!(matches!(
            WalletConfig::from_json_str("not json"),
            Err(WalletError::ConfigurationError(_))
        ));
    }

    #[test]
    fn test_builder_methods() {
        let config = WalletConfig::default()
            .with_rpc_url("http://node:1234")
            .with_fail_on_sync_error(true)
            .with_sync_before_build(false);
        assert_eq!(config.rpc_url, "http://node:1234");
        assert!(config.fail_on_sync_error);
        assert!(!config.sync_before_build);
    }
}
