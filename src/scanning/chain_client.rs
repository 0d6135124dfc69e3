//! Node access used by the chain data sync
//!
//! The JSON shapes follow the node's verbose `getblock` output. Only the
//! fields the sync replays are modelled; everything else is ignored.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::WalletResult;

/// Transaction type tag of coinbase transactions in block JSON
pub const COINBASE_TX_TYPE: u8 = 0x00;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockInfo {
    pub hash: String,
    pub height: u32,
    #[serde(rename = "tx", default)]
    pub transactions: Vec<TransactionInfo>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionInfo {
    /// Transaction id in display (byte reversed) hex
    pub hash: String,
    #[serde(rename = "type", default)]
    pub tx_type: u8,
    #[serde(rename = "vin", alias = "inputs", default)]
    pub inputs: Vec<InputInfo>,
    #[serde(rename = "vout", alias = "outputs", default)]
    pub outputs: Vec<OutputInfo>,
}

impl TransactionInfo {
    pub fn is_coinbase(&self) -> bool {
        self.tx_type == COINBASE_TX_TYPE
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputInfo {
    pub txid: String,
    pub vout: u16,
    #[serde(default)]
    pub sequence: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputInfo {
    /// Decimal coins for the native asset, raw integer units for tokens
    pub value: String,
    #[serde(default)]
    pub n: u32,
    pub address: String,
    pub assetid: String,
    #[serde(default)]
    pub outputlock: u32,
}

/// Read access to a node
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Height of the chain tip
    async fn chain_height(&self) -> WalletResult<u32>;

    /// Block hash at `height`
    async fn block_hash(&self, height: u32) -> WalletResult<String>;

    /// Block with its transactions expanded
    async fn block(&self, hash: &str) -> WalletResult<BlockInfo>;
}
