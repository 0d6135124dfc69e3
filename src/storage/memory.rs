//! In-memory UTXO store
//!
//! Everything lives behind one mutex, so every trait method (including
//! [`UtxoStore::spendable_snapshot`]) observes a consistent state. Failure
//! modes let tests simulate an unavailable store.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use crate::{
    data_structures::{
        transaction::OutPoint,
        types::{AssetId, ProgramHash},
    },
    errors::{WalletError, WalletResult},
    storage::{
        stored_output::{StoredAddress, Utxo},
        storage_trait::{HeightQuery, UtxoSnapshot, UtxoStore},
    },
};

#[derive(Debug, Default)]
struct MemoryState {
    addresses: Vec<StoredAddress>,
    /// UTXOs per owner, in insertion order
    utxos: HashMap<ProgramHash, Vec<Utxo>>,
    height: u32,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryFailureModes {
    /// Fail the next read of UTXOs or height
    pub fail_reads: bool,
    /// Fail the next write of UTXOs or height
    pub fail_writes: bool,
}

/// UTXO store kept entirely in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryUtxoStore {
    state: Arc<Mutex<MemoryState>>,
    failure_modes: Arc<Mutex<MemoryFailureModes>>,
}

impl MemoryUtxoStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set failure modes for testing error conditions
    pub fn set_failure_modes(&self, modes: MemoryFailureModes) -> WalletResult<()> {
        *self
            .failure_modes
            .lock()
            .map_err(|e| WalletError::StoreUnavailable(format!("Failure modes poisoned: {e}")))? = modes;
        Ok(())
    }

    fn state(&self) -> WalletResult<MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|e| WalletError::StoreUnavailable(format!("Memory store poisoned: {e}")))
    }

    fn check_failure(&self, write: bool) -> WalletResult<()> {
        let mut modes = self
            .failure_modes
            .lock()
            .map_err(|e| WalletError::StoreUnavailable(format!("Failure modes poisoned: {e}")))?;
        if write && modes.fail_writes {
            modes.fail_writes = false;
            return Err(WalletError::StoreUnavailable(
                "Mock failure: write".to_string(),
            ));
        }
        if !write && modes.fail_reads {
            modes.fail_reads = false;
            return Err(WalletError::StoreUnavailable(
                "Mock failure: read".to_string(),
            ));
        }
        Ok(())
    }

    fn unspent_of(state: &MemoryState, owner: &ProgramHash, asset_id: &AssetId) -> Vec<Utxo> {
        state
            .utxos
            .get(owner)
            .map(|utxos| {
                utxos
                    .iter()
                    .filter(|utxo| utxo.asset_id == *asset_id)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[async_trait]
impl UtxoStore for MemoryUtxoStore {
    async fn add_address(&self, address: StoredAddress) -> WalletResult<()> {
        let mut state = self.state()?;
        state
            .addresses
            .retain(|existing| existing.program_hash != address.program_hash);
        state.addresses.push(address);
        Ok(())
    }

    async fn get_addresses(&self) -> WalletResult<Vec<StoredAddress>> {
        Ok(self.state()?.addresses.clone())
    }

    async fn get_address_info(&self, owner: &ProgramHash) -> WalletResult<StoredAddress> {
        self.state()?
            .addresses
            .iter()
            .find(|address| address.program_hash == *owner)
            .cloned()
            .ok_or_else(|| WalletError::ResourceNotFound(format!("Address {owner} is not tracked")))
    }

    async fn delete_address(&self, owner: &ProgramHash) -> WalletResult<bool> {
        let mut state = self.state()?;
        let before = state.addresses.len();
        state.addresses.retain(|address| address.program_hash != *owner);
        state.utxos.remove(owner);
        Ok(state.addresses.len() != before)
    }

    async fn get_unspent(&self, owner: &ProgramHash, asset_id: &AssetId) -> WalletResult<Vec<Utxo>> {
        self.check_failure(false)?;
        let state = self.state()?;
        Ok(Self::unspent_of(&state, owner, asset_id))
    }

    async fn add_unspent(&self, owner: &ProgramHash, utxo: Utxo) -> WalletResult<()> {
        self.check_failure(true)?;
        let mut state = self.state()?;
        let owned = state.utxos.entry(*owner).or_default();
        owned.retain(|existing| existing.outpoint != utxo.outpoint);
        owned.push(utxo);
        Ok(())
    }

    async fn delete_unspent(&self, reference: &OutPoint) -> WalletResult<bool> {
        self.check_failure(true)?;
        let mut state = self.state()?;
        let mut removed = false;
        for owned in state.utxos.values_mut() {
            let before = owned.len();
            owned.retain(|utxo| utxo.outpoint != *reference);
            removed |= owned.len() != before;
        }
        Ok(removed)
    }

    async fn get_asset_ids(&self, owner: &ProgramHash) -> WalletResult<Vec<AssetId>> {
        self.check_failure(false)?;
        let state = self.state()?;
        let mut asset_ids: Vec<AssetId> = Vec::new();
        for utxo in state.utxos.get(owner).into_iter().flatten() {
            if !asset_ids.contains(&utxo.asset_id) {
                asset_ids.push(utxo.asset_id);
            }
        }
        Ok(asset_ids)
    }

    async fn current_height(&self, query: HeightQuery) -> WalletResult<u32> {
        let mut state = match query {
            HeightQuery::Current => {
                self.check_failure(false)?;
                self.state()?
            }
            HeightQuery::Set(_) => {
                self.check_failure(true)?;
                self.state()?
            }
        };
        if let HeightQuery::Set(height) = query {
            state.height = height;
        }
        Ok(state.height)
    }

    async fn reset(&self) -> WalletResult<()> {
        let mut state = self.state()?;
        state.utxos.clear();
        state.height = 0;
        Ok(())
    }

    async fn spendable_snapshot(
        &self,
        owner: &ProgramHash,
        asset_id: &AssetId,
    ) -> WalletResult<UtxoSnapshot> {
        self.check_failure(false)?;
        let state = self.state()?;
        Ok(UtxoSnapshot {
            height: state.height,
            utxos: Self::unspent_of(&state, owner, asset_id),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_structures::{
        amount::{NativeAmount, TokenAmount},
        asset::SYSTEM_ASSET_ID,
        types::TxId,
    };
    use crate::storage::account_type::AccountType;

    fn owner(byte: u8) -> ProgramHash {
        let mut bytes = [byte; 21];
        bytes[0] = 0x21;
        ProgramHash::new(bytes)
    }

    fn native(tx: u8, index: u16, units: i64, lock_time: u32) -> Utxo {
        Utxo::new(
            *SYSTEM_ASSET_ID,
            OutPoint::new(TxId::new([tx; 32]), index),
            NativeAmount::from_units(units).into(),
            lock_time,
        )
    }

    #[tokio::test]
    async fn test_add_query_and_delete_unspent() {
        let store = MemoryUtxoStore::new();
        let a = owner(1);
        store.add_unspent(&a, native(1, 0, 100, 0)).await.unwrap();
        store.add_unspent(&a, native(1, 1, 200, 0)).await.unwrap();

        let token_id = AssetId::new([5u8; 32]);
        store
            .add_unspent(
                &a,
                Utxo::new(
                    token_id,
                    OutPoint::new(TxId::new([2u8; 32]), 0),
                    TokenAmount::from_u64(7).into(),
                    0,
                ),
            )
            .await
            .unwrap();

        let utxos = store.get_unspent(&a, &SYSTEM_ASSET_ID).await.unwrap();
        assert_eq!(utxos.len(), 2);
        assert_eq!(store.get_asset_ids(&a).await.unwrap(), vec![*SYSTEM_ASSET_ID, token_id]);

        let removed = store
            .delete_unspent(&OutPoint::new(TxId::new([1u8; 32]), 0))
            .await
            .unwrap();
        assert!(removed);
        let utxos = store.get_unspent(&a, &SYSTEM_ASSET_ID).await.unwrap();
        assert_eq!(utxos.len(), 1);
        assert_eq!(utxos[0].outpoint.index, 1);
        assert!(store.get_unspent(&owner(2), &SYSTEM_ASSET_ID).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_height_query_and_set() {
        let store = MemoryUtxoStore::new();
        assert_eq!(store.current_height(HeightQuery::Current).await.unwrap(), 0);
        assert_eq!(store.current_height(HeightQuery::Set(42)).await.unwrap(), 42);
        assert_eq!(store.current_height(0.into()).await.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_address_info_and_reset() {
        let store = MemoryUtxoStore::new();
        let a = owner(1);
        store
            .add_address(StoredAddress::new(a, vec![0xAC], AccountType::Master))
            .await
            .unwrap();
        assert_eq!(store.get_address_info(&a).await.unwrap().program_hash, a);
        assert!(matches!(
            store.get_address_info(&owner(9)).await,
            Err(WalletError::ResourceNotFound(_))
        ));

        store.add_unspent(&a, native(1, 0, 100, 0)).await.unwrap();
        store.current_height(HeightQuery::Set(10)).await.unwrap();
        store.reset().await.unwrap();
        assert!(store.get_unspent(&a, &SYSTEM_ASSET_ID).await.unwrap().is_empty());
        assert_eq!(store.current_height(HeightQuery::Current).await.unwrap(), 0);
        assert_eq!(store.get_addresses().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_balances_split_available_and_locked() {
        let store = MemoryUtxoStore::new();
        let a = owner(1);
        store.current_height(HeightQuery::Set(50)).await.unwrap();
        store.add_unspent(&a, native(1, 0, 100, 0)).await.unwrap();
        store.add_unspent(&a, native(1, 1, 300, 49)).await.unwrap();
        store.add_unspent(&a, native(1, 2, 500, 50)).await.unwrap();

        let balances = store.balances(&a).await.unwrap();
        assert_eq!(balances.len(), 1);
        assert_eq!(balances[0].available.as_native().unwrap().units(), 400);
        assert_eq!(balances[0].locked.as_native().unwrap().units(), 500);
    }

    #[tokio::test]
    async fn test_failure_modes_surface_store_unavailable() {
        let store = MemoryUtxoStore::new();
        store
            .set_failure_modes(MemoryFailureModes {
                fail_reads: true,
                ..Default::default()
            })
            .unwrap();
        assert!(matches!(
            store.get_unspent(&owner(1), &SYSTEM_ASSET_ID).await,
            Err(WalletError::StoreUnavailable(_))
        ));
        // Failure is one-shot
        assert!(store.get_unspent(&owner(1), &SYSTEM_ASSET_ID).await.is_ok());
    }
}
