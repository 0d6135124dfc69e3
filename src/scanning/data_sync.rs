//! Replays blocks from a node into the local UTXO store
//!
//! Outputs paying a tracked address become UTXOs, inputs delete the UTXO they
//! spend, and the store height advances one block at a time so an interrupted
//! sync resumes where it stopped.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::{
    data_structures::{
        amount::{Amount, NativeAmount, TokenAmount},
        asset::SYSTEM_ASSET_ID,
        transaction::OutPoint,
        types::{AssetId, ProgramHash, TxId},
    },
    errors::{WalletError, WalletResult},
    storage::{HeightQuery, Utxo, UtxoStore},
};

use super::chain_client::{BlockInfo, ChainClient};

/// Coinbase outputs mature this many blocks after the block that created them
pub const COINBASE_MATURITY: u32 = 100;

/// What one sync run did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub start_height: u32,
    /// Store height once the run finished, i.e. the next block to replay
    pub current_height: u32,
    pub blocks_processed: u32,
    pub utxos_added: u32,
    pub utxos_spent: u32,
}

/// Brings the local UTXO store up to the chain tip
#[async_trait]
pub trait ChainSync: Send + Sync {
    async fn sync_chain_data(&self) -> WalletResult<SyncReport>;
}

/// Node errors and malformed block data surface as `SyncFailed`; store errors pass through
fn sync_failed(err: WalletError) -> WalletError {
    match err {
        WalletError::StoreUnavailable(_) | WalletError::SyncFailed(_) => err,
        other => WalletError::SyncFailed(other.to_string()),
    }
}

pub struct ChainDataSync {
    client: Arc<dyn ChainClient>,
    store: Arc<dyn UtxoStore>,
    /// One sync at a time per store
    running: Mutex<()>,
}

impl ChainDataSync {
    pub fn new(client: Arc<dyn ChainClient>, store: Arc<dyn UtxoStore>) -> Self {
        Self {
            client,
            store,
            running: Mutex::new(()),
        }
    }

    async fn process_block(
        &self,
        block: &BlockInfo,
        tracked: &HashMap<String, ProgramHash>,
        report: &mut SyncReport,
    ) -> WalletResult<()> {
        for tx in &block.transactions {
            let tx_id = TxId::from_str(&tx.hash).map_err(sync_failed)?;

            for (index, output) in tx.outputs.iter().enumerate() {
                let Some(owner) = tracked.get(&output.address) else {
                    continue;
                };
                let lock_time = if tx.is_coinbase() {
                    block.height.checked_add(COINBASE_MATURITY).ok_or_else(|| {
                        WalletError::SyncFailed(format!("Block height {} overflows", block.height))
                    })?
                } else {
                    output.outputlock
                };
                let asset_id = AssetId::from_str(&output.assetid).map_err(sync_failed)?;
                let amount = if asset_id == *SYSTEM_ASSET_ID {
                    Amount::Native(NativeAmount::from_str(&output.value).map_err(sync_failed)?)
                } else {
                    Amount::Token(TokenAmount::from_str(&output.value).map_err(sync_failed)?)
                };
                let index = u16::try_from(index).map_err(|_| {
                    WalletError::SyncFailed(format!(
                        "Output index {index} of {} out of range",
                        tx.hash
                    ))
                })?;
                debug!(
                    tx = %tx.hash,
                    index,
                    address = %output.address,
                    asset = %asset_id,
                    amount = %amount,
                    lock_time,
                    "Adding UTXO"
                );
                self.store
                    .add_unspent(
                        owner,
                        Utxo::new(asset_id, OutPoint::new(tx_id, index), amount, lock_time),
                    )
                    .await?;
                report.utxos_added += 1;
            }

            for input in &tx.inputs {
                let previous = TxId::from_str(&input.txid).map_err(sync_failed)?;
                if self
                    .store
                    .delete_unspent(&OutPoint::new(previous, input.vout))
                    .await?
                {
                    debug!(tx = %input.txid, index = input.vout, "Spent UTXO");
                    report.utxos_spent += 1;
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl ChainSync for ChainDataSync {
    async fn sync_chain_data(&self) -> WalletResult<SyncReport> {
        let _running = self.running.lock().await;

        let tracked: HashMap<String, ProgramHash> = self
            .store
            .get_addresses()
            .await?
            .into_iter()
            .map(|address| (address.address, address.program_hash))
            .collect();

        let start_height = self.store.current_height(HeightQuery::Current).await?;
        let mut report = SyncReport {
            start_height,
            current_height: start_height,
            ..Default::default()
        };

        // The tip can move while we replay, so check again after every pass
        loop {
            let chain_height = self.client.chain_height().await.map_err(sync_failed)?;
            let mut current = self.store.current_height(HeightQuery::Current).await?;
            if current > chain_height {
                break;
            }
            info!(current, chain_height, "Syncing chain data");

            while current <= chain_height {
                let hash = self.client.block_hash(current).await.map_err(sync_failed)?;
                let block = self.client.block(&hash).await.map_err(sync_failed)?;
                if block.height != current {
                    return Err(WalletError::SyncFailed(format!(
                        "Node returned block {} at height {} when asked for height {current}",
                        block.hash, block.height
                    )));
                }
                self.process_block(&block, &tracked, &mut report).await?;

                let next = block.height.checked_add(1).ok_or_else(|| {
                    WalletError::SyncFailed(format!("Block height {} overflows", block.height))
                })?;
                current = self.store.current_height(HeightQuery::Set(next)).await?;
                report.blocks_processed += 1;
                debug!(height = block.height, transactions = block.transactions.len(), "Processed block");
            }
            report.current_height = current;
        }

        info!(
            start = report.start_height,
            current = report.current_height,
            blocks = report.blocks_processed,
            added = report.utxos_added,
            spent = report.utxos_spent,
            "Chain data sync finished"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sync_failed_keeps_store_errors() {
        let err = sync_failed(WalletError::StoreUnavailable("down".to_string()));
        assert!(matches!(err, WalletError::StoreUnavailable(_)));
        let err = sync_failed(WalletError::NetworkError("refused".to_string()));
        assert!(matches!(err, WalletError::SyncFailed(_)));
    }
}
