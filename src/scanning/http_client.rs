//! JSON-RPC client for the sidechain node
//!
//! ```rust,no_run
//! use sidechain_wallet_libs::scanning::{ChainClient, HttpChainClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = HttpChainClient::new("http://localhost:20606".to_string())?;
//! let height = client.chain_height().await?;
//! println!("Chain height: {}", height);
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::{json, Value};
use tracing::debug;

use crate::errors::{WalletError, WalletResult};

use super::chain_client::{BlockInfo, ChainClient};

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Verbosity asking the node for fully expanded transactions
const BLOCK_VERBOSITY: u32 = 2;

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Value,
    #[serde(default)]
    error: Value,
}

pub struct HttpChainClient {
    client: Client,
    base_url: String,
}

impl HttpChainClient {
    pub fn new(base_url: String) -> WalletResult<Self> {
        Self::with_timeout(base_url, DEFAULT_REQUEST_TIMEOUT)
    }

    pub fn with_timeout(base_url: String, timeout: Duration) -> WalletResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| WalletError::NetworkError(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self { client, base_url })
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> WalletResult<T> {
        debug!(method, %params, "RPC request");
        let body = json!({ "method": method, "params": params });
        let response = self
            .client
            .post(&self.base_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| WalletError::NetworkError(format!("{method} request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(WalletError::NetworkError(format!(
                "{method}: HTTP error {}",
                response.status()
            )));
        }

        let response: RpcResponse = response
            .json()
            .await
            .map_err(|e| WalletError::NetworkError(format!("{method}: invalid response: {e}")))?;
        if !response.error.is_null() {
            return Err(WalletError::NetworkError(format!(
                "{method}: node error {}",
                response.error
            )));
        }
        serde_json::from_value(response.result)
            .map_err(|e| WalletError::NetworkError(format!("{method}: unexpected result: {e}")))
    }
}

#[async_trait]
impl ChainClient for HttpChainClient {
    async fn chain_height(&self) -> WalletResult<u32> {
        let count: u32 = self.call("getblockcount", json!({})).await?;
        Ok(count.saturating_sub(1))
    }

    async fn block_hash(&self, height: u32) -> WalletResult<String> {
        self.call("getblockhash", json!({ "height": height })).await
    }

    async fn block(&self, hash: &str) -> WalletResult<BlockInfo> {
        self.call(
            "getblock",
            json!({ "blockhash": hash, "verbosity": BLOCK_VERBOSITY }),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = HttpChainClient::new("http://127.0.0.1:20606".to_string());
        assert!(client.is_ok());
    }

    #[test]
    fn test_rpc_response_parsing() {
        let response: RpcResponse =
            serde_json::from_str(r#"{"id": null, "error": null, "result": 42}"#).unwrap();
        assert!(response.error.is_null());
        let count: u32 = serde_json::from_value(response.result).unwrap();
        assert_eq!(count, 42);
    }
}
