//! Fluent construction of a [`Wallet`]
//!
//! The builder picks the pieces a wallet needs from its configuration unless
//! they are supplied directly: a SQLite store when `database_path` is set (and
//! the `storage` feature is on), otherwise memory; an HTTP chain client for
//! `rpc_url` when the `http` feature is on.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use sidechain_wallet_libs::{config::WalletConfig, storage::MemoryUtxoStore, wallet::WalletBuilder};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let wallet = WalletBuilder::new()
//!     .with_config(WalletConfig::default().with_rpc_url("http://localhost:20606"))
//!     .with_store(Arc::new(MemoryUtxoStore::new()))
//!     .build()
//!     .await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use tracing::debug;

use crate::{
    config::WalletConfig,
    errors::WalletResult,
    scanning::{ChainClient, ChainDataSync, ChainSync},
    storage::{MemoryUtxoStore, UtxoStore},
};

use super::Wallet;

#[derive(Default)]
pub struct WalletBuilder {
    config: WalletConfig,
    store: Option<Arc<dyn UtxoStore>>,
    chain_client: Option<Arc<dyn ChainClient>>,
    offline: bool,
}

impl WalletBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: WalletConfig) -> Self {
        self.config = config;
        self
    }

    /// Use `store` instead of the one the configuration describes
    pub fn with_store(mut self, store: Arc<dyn UtxoStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Use `client` instead of an HTTP client for `rpc_url`
    pub fn with_chain_client(mut self, client: Arc<dyn ChainClient>) -> Self {
        self.chain_client = Some(client);
        self
    }

    /// Build without any chain client: transactions come from the local store only
    pub fn offline(mut self) -> Self {
        self.offline = true;
        self
    }

    pub async fn build(self) -> WalletResult<Wallet> {
        self.config.validate()?;

        let store = match self.store {
            Some(store) => store,
            None => open_store(&self.config).await?,
        };

        let chain_client = if self.offline {
            None
        } else {
            match self.chain_client {
                Some(client) => Some(client),
                None => default_chain_client(&self.config)?,
            }
        };
        let chain_sync = chain_client.map(|client| {
            Arc::new(ChainDataSync::new(client, store.clone())) as Arc<dyn ChainSync>
        });

        debug!(
            rpc_url = %self.config.rpc_url,
            sync = chain_sync.is_some(),
            "Built wallet"
        );
        Ok(Wallet::new(self.config, store, chain_sync))
    }
}

#[cfg(feature = "storage")]
async fn open_store(config: &WalletConfig) -> WalletResult<Arc<dyn UtxoStore>> {
    match &config.database_path {
        Some(path) => Ok(Arc::new(crate::storage::SqliteUtxoStore::new(path).await?)),
        None => Ok(Arc::new(MemoryUtxoStore::new())),
    }
}

#[cfg(not(feature = "storage"))]
async fn open_store(config: &WalletConfig) -> WalletResult<Arc<dyn UtxoStore>> {
    match &config.database_path {
        Some(path) => Err(crate::errors::WalletError::ConfigurationError(format!(
            "database_path {} requires the storage feature",
            path.display()
        ))),
        None => Ok(Arc::new(MemoryUtxoStore::new())),
    }
}

#[cfg(feature = "http")]
fn default_chain_client(config: &WalletConfig) -> WalletResult<Option<Arc<dyn ChainClient>>> {
    let client = crate::scanning::HttpChainClient::with_timeout(
        config.rpc_url.clone(),
        config.request_timeout(),
    )?;
    Ok(Some(Arc::new(client)))
}

#[cfg(not(feature = "http"))]
fn default_chain_client(_config: &WalletConfig) -> WalletResult<Option<Arc<dyn ChainClient>>> {
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::WalletError;

    #[tokio::test]
    async fn test_offline_wallet_cannot_sync() {
        let wallet = WalletBuilder::new().offline().build().await.unwrap();
        assert!(matches!(
            wallet.sync_chain_data().await,
            Err(WalletError::ConfigurationError(_))
        ));
        assert_eq!(wallet.current_height().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_invalid_config_rejected() {
        let config = WalletConfig {
            rpc_url: String::new(),
            ..Default::default()
        };
        assert!(WalletBuilder::new()
            .with_config(config)
            .offline()
            .build()
            .await
            .is_err());
    }
}
