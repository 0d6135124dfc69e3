//! Storage trait definition for the wallet's UTXO set
//!
//! This module defines the `UtxoStore` trait: the local view of which outputs
//! the wallet's addresses own, plus the height up to which the chain has been
//! replayed into it. The transaction builder only reads from it; chain data
//! sync is the only writer of UTXOs.

use async_trait::async_trait;

use crate::{
    data_structures::{
        amount::Amount,
        transaction::OutPoint,
        types::{AssetId, ProgramHash},
    },
    errors::WalletResult,
};

use super::stored_output::{StoredAddress, Utxo};

/// Argument to [`UtxoStore::current_height`]: read the stored height, or set it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeightQuery {
    Current,
    Set(u32),
}

impl From<u32> for HeightQuery {
    /// Zero reads the current height; anything else sets it
    fn from(value: u32) -> Self {
        match value {
            0 => HeightQuery::Current,
            height => HeightQuery::Set(height),
        }
    }
}

/// UTXOs of one (owner, asset) pair read together with the height they are valid at
#[derive(Debug, Clone)]
pub struct UtxoSnapshot {
    pub height: u32,
    pub utxos: Vec<Utxo>,
}

/// Available and locked totals of one asset held by an address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetBalance {
    pub asset_id: AssetId,
    /// Outputs with `lock_time` below the current height
    pub available: Amount,
    pub locked: Amount,
}

/// Trait for UTXO storage backends
#[async_trait]
pub trait UtxoStore: Send + Sync {
    // === Address Management Methods ===

    /// Track a new address; re-adding an address replaces its record
    async fn add_address(&self, address: StoredAddress) -> WalletResult<()>;

    /// All tracked addresses
    async fn get_addresses(&self) -> WalletResult<Vec<StoredAddress>>;

    /// Record for one address, `ResourceNotFound` when it is not tracked
    async fn get_address_info(&self, owner: &ProgramHash) -> WalletResult<StoredAddress>;

    /// Stop tracking an address and drop its UTXOs
    async fn delete_address(&self, owner: &ProgramHash) -> WalletResult<bool>;

    // === UTXO Methods ===

    /// Unspent outputs of `asset_id` owned by `owner`, in insertion order
    async fn get_unspent(&self, owner: &ProgramHash, asset_id: &AssetId) -> WalletResult<Vec<Utxo>>;

    /// Record a new unspent output for `owner`
    async fn add_unspent(&self, owner: &ProgramHash, utxo: Utxo) -> WalletResult<()>;

    /// Remove the unspent output at `reference`, whoever owns it
    async fn delete_unspent(&self, reference: &OutPoint) -> WalletResult<bool>;

    /// Asset ids `owner` holds outputs of
    async fn get_asset_ids(&self, owner: &ProgramHash) -> WalletResult<Vec<AssetId>>;

    // === Height Methods ===

    /// Read the replayed height, or set it and return the new value
    async fn current_height(&self, query: HeightQuery) -> WalletResult<u32>;

    /// Clear all UTXOs and the stored height; tracked addresses are kept
    async fn reset(&self) -> WalletResult<()>;

    /// Height and UTXOs read under one consistent view
    ///
    /// Backends that can serve both reads atomically should override this.
    async fn spendable_snapshot(
        &self,
        owner: &ProgramHash,
        asset_id: &AssetId,
    ) -> WalletResult<UtxoSnapshot> {
        let height = self.current_height(HeightQuery::Current).await?;
        let utxos = self.get_unspent(owner, asset_id).await?;
        Ok(UtxoSnapshot { height, utxos })
    }

    /// Available and locked totals for every asset `owner` holds
    async fn balances(&self, owner: &ProgramHash) -> WalletResult<Vec<AssetBalance>> {
        let mut balances = Vec::new();
        for asset_id in self.get_asset_ids(owner).await? {
            let snapshot = self.spendable_snapshot(owner, &asset_id).await?;
            let mut available = Amount::zero_for(&asset_id);
            let mut locked = Amount::zero_for(&asset_id);
            for utxo in &snapshot.utxos {
                if utxo.is_available_at(snapshot.height) {
                    available = available.checked_add(&utxo.amount)?;
                } else {
                    locked = locked.checked_add(&utxo.amount)?;
                }
            }
            balances.push(AssetBalance {
                asset_id,
                available,
                locked,
            });
        }
        Ok(balances)
    }
}
