//! Mock node for deterministic sync and builder tests
//!
//! Blocks are held in memory and served by height. Failure modes are one-shot:
//! each flag fails the next matching call and then resets.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::{
    data_structures::{amount::Amount, types::{AssetId, TxId}},
    errors::{WalletError, WalletResult},
};

use super::chain_client::{BlockInfo, ChainClient, InputInfo, OutputInfo, TransactionInfo};

#[derive(Debug, Clone, Default)]
pub struct MockChainFailureModes {
    /// Fail next chain_height call
    pub fail_chain_height: bool,
    /// Fail next block_hash call
    pub fail_block_hash: bool,
    /// Fail next block call
    pub fail_block: bool,
    /// Return specific error message for next failure
    pub next_error_message: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct MockChainClient {
    blocks: Arc<Mutex<Vec<BlockInfo>>>,
    failure_modes: Arc<Mutex<MockChainFailureModes>>,
}

fn poisoned<T>(_: T) -> WalletError {
    WalletError::NetworkError("Mock chain lock poisoned".to_string())
}

/// Deterministic block hash for `height`
pub fn mock_block_hash(height: u32) -> String {
    format!("{height:064x}")
}

impl MockChainClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a block holding `transactions` at the next height
    pub fn push_block(&self, transactions: Vec<TransactionInfo>) -> WalletResult<u32> {
        let mut blocks = self.blocks.lock().map_err(poisoned)?;
        let height = blocks.len() as u32;
        blocks.push(BlockInfo {
            hash: mock_block_hash(height),
            height,
            transactions,
        });
        Ok(height)
    }

    /// Append `count` blocks without transactions
    pub fn push_empty_blocks(&self, count: u32) -> WalletResult<()> {
        for _ in 0..count {
            self.push_block(Vec::new())?;
        }
        Ok(())
    }

    pub fn set_failure_modes(&self, modes: MockChainFailureModes) -> WalletResult<()> {
        *self.failure_modes.lock().map_err(poisoned)? = modes;
        Ok(())
    }

    fn check_failure(&self, operation: &str) -> WalletResult<()> {
        let mut modes = self.failure_modes.lock().map_err(poisoned)?;
        let fail = match operation {
            "chain_height" => std::mem::take(&mut modes.fail_chain_height),
            "block_hash" => std::mem::take(&mut modes.fail_block_hash),
            "block" => std::mem::take(&mut modes.fail_block),
            _ => false,
        };
        if fail {
            let message = modes
                .next_error_message
                .take()
                .unwrap_or_else(|| format!("Mock failure: {operation}"));
            return Err(WalletError::NetworkError(message));
        }
        Ok(())
    }
}

#[async_trait]
impl ChainClient for MockChainClient {
    async fn chain_height(&self) -> WalletResult<u32> {
        self.check_failure("chain_height")?;
        let blocks = self.blocks.lock().map_err(poisoned)?;
        match blocks.len() {
            0 => Err(WalletError::NetworkError("Mock chain has no blocks".to_string())),
            n => Ok(n as u32 - 1),
        }
    }

    async fn block_hash(&self, height: u32) -> WalletResult<String> {
        self.check_failure("block_hash")?;
        let blocks = self.blocks.lock().map_err(poisoned)?;
        blocks
            .get(height as usize)
            .map(|block| block.hash.clone())
            .ok_or_else(|| WalletError::NetworkError(format!("No block at height {height}")))
    }

    async fn block(&self, hash: &str) -> WalletResult<BlockInfo> {
        self.check_failure("block")?;
        let blocks = self.blocks.lock().map_err(poisoned)?;
        blocks
            .iter()
            .find(|block| block.hash == hash)
            .cloned()
            .ok_or_else(|| WalletError::NetworkError(format!("No block with hash {hash}")))
    }
}

/// Builder for block JSON transactions used with [`MockChainClient`]
#[derive(Debug, Clone, Default)]
pub struct MockTransaction {
    info: TransactionInfo,
}

impl MockTransaction {
    pub fn new(tx_id: TxId) -> Self {
        Self {
            info: TransactionInfo {
                hash: tx_id.to_string(),
                tx_type: 0x02,
                ..Default::default()
            },
        }
    }

    pub fn coinbase(tx_id: TxId) -> Self {
        let mut tx = Self::new(tx_id);
        tx.info.tx_type = 0x00;
        tx
    }

    pub fn spend(mut self, tx_id: TxId, vout: u16) -> Self {
        self.info.inputs.push(InputInfo {
            txid: tx_id.to_string(),
            vout,
            sequence: 0,
        });
        self
    }

    pub fn pay(mut self, address: &str, asset_id: &AssetId, amount: &Amount, lock: u32) -> Self {
        let n = self.info.outputs.len() as u32;
        let value = match amount {
            Amount::Native(value) => value.to_string(),
            Amount::Token(value) => value.units().to_string(),
        };
        self.info.outputs.push(OutputInfo {
            value,
            n,
            address: address.to_string(),
            assetid: asset_id.to_string(),
            outputlock: lock,
        });
        self
    }

    pub fn build(self) -> TransactionInfo {
        self.info
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_serves_blocks_by_height() {
        let client = MockChainClient::new();
        client.push_empty_blocks(3).unwrap();
        assert_eq!(client.chain_height().await.unwrap(), 2);
        let hash = client.block_hash(1).await.unwrap();
        assert_eq!(client.block(&hash).await.unwrap().height, 1);
        assert!(client.block_hash(3).await.is_err());
    }

    #[tokio::test]
    async fn test_failure_modes_are_one_shot() {
        let client = MockChainClient::new();
        client.push_empty_blocks(1).unwrap();
        client
            .set_failure_modes(MockChainFailureModes {
                fail_chain_height: true,
                next_error_message: Some("node down".to_string()),
                ..Default::default()
            })
            .unwrap();
        let err = client.chain_height().await.unwrap_err();
        assert!(err.to_string().contains("node down"));
        assert_eq!(client.chain_height().await.unwrap(), 0);
    }
}
