//! SQLite storage implementation for the UTXO set
//!
//! This module provides a SQLite-based backend implementing `UtxoStore`. Amounts
//! are persisted in their wire form so the representation is recovered from the
//! asset id when rows are read back.

#[cfg(feature = "storage")]
use async_trait::async_trait;
#[cfg(feature = "storage")]
use rusqlite::{params, OptionalExtension};
#[cfg(feature = "storage")]
use std::path::Path;
#[cfg(feature = "storage")]
use tokio_rusqlite::Connection;

#[cfg(feature = "storage")]
use crate::{
    data_structures::{
        transaction::OutPoint,
        types::{AssetId, ProgramHash, TxId},
    },
    errors::{WalletError, WalletResult},
    storage::{
        account_type::AccountType,
        stored_output::{StoredAddress, Utxo},
        storage_trait::{HeightQuery, UtxoSnapshot, UtxoStore},
    },
};

/// Raw UTXO row: txid, output index, asset id, amount bytes, lock time
#[cfg(feature = "storage")]
type UtxoRow = (Vec<u8>, i64, Vec<u8>, Vec<u8>, i64);

/// Raw address row: program hash, redeem script, account type
#[cfg(feature = "storage")]
type AddressRow = (Vec<u8>, Vec<u8>, i64);

#[cfg(feature = "storage")]
const SELECT_UTXOS: &str = r#"
    SELECT tx_id, output_index, asset_id, amount, lock_time FROM utxos
    WHERE owner = ? AND asset_id = ?
    ORDER BY id ASC
"#;

/// SQLite storage backend for the wallet's UTXO set
#[cfg(feature = "storage")]
pub struct SqliteUtxoStore {
    connection: Connection,
}

#[cfg(feature = "storage")]
impl SqliteUtxoStore {
    /// Open (or create) a database file and make sure the schema exists
    pub async fn new<P: AsRef<Path>>(database_path: P) -> WalletResult<Self> {
        let connection = Connection::open(database_path).await.map_err(|e| {
            WalletError::StoreUnavailable(format!("Failed to open SQLite database: {e}"))
        })?;
        let store = Self { connection };
        store.create_schema().await?;
        Ok(store)
    }

    /// Create an in-memory SQLite store (useful for testing)
    pub async fn new_in_memory() -> WalletResult<Self> {
        let connection = Connection::open(":memory:").await.map_err(|e| {
            WalletError::StoreUnavailable(format!("Failed to create in-memory database: {e}"))
        })?;
        let store = Self { connection };
        store.create_schema().await?;
        Ok(store)
    }

    async fn create_schema(&self) -> WalletResult<()> {
        let sql = r#"
            CREATE TABLE IF NOT EXISTS addresses (
                program_hash BLOB PRIMARY KEY,
                address TEXT NOT NULL,
                redeem_script BLOB NOT NULL,
                account_type INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS utxos (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                tx_id BLOB NOT NULL,
                output_index INTEGER NOT NULL,
                owner BLOB NOT NULL,
                asset_id BLOB NOT NULL,
                amount BLOB NOT NULL,
                lock_time INTEGER NOT NULL,
                UNIQUE(tx_id, output_index)
            );

            CREATE INDEX IF NOT EXISTS idx_utxos_owner_asset ON utxos(owner, asset_id);

            CREATE TABLE IF NOT EXISTS wallet_state (
                key TEXT PRIMARY KEY,
                value INTEGER NOT NULL
            );
        "#;
        self.connection
            .call(move |conn| {
                conn.execute_batch(sql)?;
                Ok(())
            })
            .await
            .map_err(|e| WalletError::StoreUnavailable(format!("Failed to create schema: {e}")))
    }

    fn decode_utxo(row: UtxoRow) -> WalletResult<Utxo> {
        let (tx_id, index, asset_id, amount, lock_time) = row;
        let asset_id = AssetId::from_slice(&asset_id)?;
        let index = u16::try_from(index).map_err(|_| {
            WalletError::StoreUnavailable(format!("Stored output index {index} out of range"))
        })?;
        Ok(Utxo {
            outpoint: OutPoint::new(TxId::from_slice(&tx_id)?, index),
            amount: Utxo::amount_from_bytes(&asset_id, &amount)?,
            asset_id,
            lock_time: lock_time as u32,
        })
    }

    fn decode_address(row: AddressRow) -> WalletResult<StoredAddress> {
        let (program_hash, redeem_script, account_type) = row;
        Ok(StoredAddress::new(
            ProgramHash::from_slice(&program_hash)?,
            redeem_script,
            AccountType::from(account_type as u32),
        ))
    }
}

#[cfg(feature = "storage")]
#[async_trait]
impl UtxoStore for SqliteUtxoStore {
    async fn add_address(&self, address: StoredAddress) -> WalletResult<()> {
        self.connection
            .call(move |conn| {
                conn.execute(
                    r#"
                    INSERT OR REPLACE INTO addresses (program_hash, address, redeem_script, account_type)
                    VALUES (?, ?, ?, ?)
                    "#,
                    params![
                        address.program_hash.as_bytes().to_vec(),
                        address.address,
                        address.redeem_script,
                        u32::from(address.account_type) as i64,
                    ],
                )?;
                Ok(())
            })
            .await
            .map_err(|e| WalletError::StoreUnavailable(format!("Failed to add address: {e}")))
    }

    async fn get_addresses(&self) -> WalletResult<Vec<StoredAddress>> {
        let rows: Vec<AddressRow> = self
            .connection
            .call(|conn| {
                let mut stmt = conn.prepare(
                    "SELECT program_hash, redeem_script, account_type FROM addresses ORDER BY rowid",
                )?;
                let rows: Vec<AddressRow> = stmt
                    .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await
            .map_err(|e| WalletError::StoreUnavailable(format!("Failed to get addresses: {e}")))?;
        rows.into_iter().map(Self::decode_address).collect()
    }

    async fn get_address_info(&self, owner: &ProgramHash) -> WalletResult<StoredAddress> {
        let key = owner.as_bytes().to_vec();
        let row: Option<AddressRow> = self
            .connection
            .call(move |conn| {
                let row: Option<AddressRow> = conn
                    .query_row(
                        "SELECT program_hash, redeem_script, account_type FROM addresses WHERE program_hash = ?",
                        params![key],
                        |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
                    )
                    .optional()?;
                Ok(row)
            })
            .await
            .map_err(|e| WalletError::StoreUnavailable(format!("Failed to get address info: {e}")))?;
        match row {
            Some(row) => Self::decode_address(row),
            None => Err(WalletError::ResourceNotFound(format!(
                "Address {owner} is not tracked"
            ))),
        }
    }

    async fn delete_address(&self, owner: &ProgramHash) -> WalletResult<bool> {
        let key = owner.as_bytes().to_vec();
        self.connection
            .call(move |conn| {
                let tx = conn.transaction()?;
                tx.execute("DELETE FROM utxos WHERE owner = ?", params![key])?;
                let removed = tx.execute("DELETE FROM addresses WHERE program_hash = ?", params![key])?;
                tx.commit()?;
                Ok(removed > 0)
            })
            .await
            .map_err(|e| WalletError::StoreUnavailable(format!("Failed to delete address: {e}")))
    }

    async fn get_unspent(&self, owner: &ProgramHash, asset_id: &AssetId) -> WalletResult<Vec<Utxo>> {
        let owner = owner.as_bytes().to_vec();
        let asset = asset_id.as_bytes().to_vec();
        let rows: Vec<UtxoRow> = self
            .connection
            .call(move |conn| {
                let mut stmt = conn.prepare(SELECT_UTXOS)?;
                let rows: Vec<UtxoRow> = stmt
                    .query_map(params![owner, asset], |row| {
                        Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await
            .map_err(|e| WalletError::StoreUnavailable(format!("Failed to get UTXOs: {e}")))?;
        rows.into_iter().map(Self::decode_utxo).collect()
    }

    async fn add_unspent(&self, owner: &ProgramHash, utxo: Utxo) -> WalletResult<()> {
        let owner = owner.as_bytes().to_vec();
        let amount = utxo.amount_bytes();
        self.connection
            .call(move |conn| {
                conn.execute(
                    r#"
                    INSERT OR REPLACE INTO utxos (tx_id, output_index, owner, asset_id, amount, lock_time)
                    VALUES (?, ?, ?, ?, ?, ?)
                    "#,
                    params![
                        utxo.outpoint.tx_id.as_bytes().to_vec(),
                        utxo.outpoint.index as i64,
                        owner,
                        utxo.asset_id.as_bytes().to_vec(),
                        amount,
                        utxo.lock_time as i64,
                    ],
                )?;
                Ok(())
            })
            .await
            .map_err(|e| WalletError::StoreUnavailable(format!("Failed to add UTXO: {e}")))
    }

    async fn delete_unspent(&self, reference: &OutPoint) -> WalletResult<bool> {
        let tx_id = reference.tx_id.as_bytes().to_vec();
        let index = reference.index as i64;
        self.connection
            .call(move |conn| {
                let removed = conn.execute(
                    "DELETE FROM utxos WHERE tx_id = ? AND output_index = ?",
                    params![tx_id, index],
                )?;
                Ok(removed > 0)
            })
            .await
            .map_err(|e| WalletError::StoreUnavailable(format!("Failed to delete UTXO: {e}")))
    }

    async fn get_asset_ids(&self, owner: &ProgramHash) -> WalletResult<Vec<AssetId>> {
        let owner = owner.as_bytes().to_vec();
        let rows: Vec<Vec<u8>> = self
            .connection
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT asset_id FROM utxos WHERE owner = ? GROUP BY asset_id ORDER BY MIN(id)",
                )?;
                let rows: Vec<Vec<u8>> = stmt
                    .query_map(params![owner], |row| row.get(0))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await
            .map_err(|e| WalletError::StoreUnavailable(format!("Failed to get asset ids: {e}")))?;
        rows.iter().map(|bytes| AssetId::from_slice(bytes)).collect()
    }

    async fn current_height(&self, query: HeightQuery) -> WalletResult<u32> {
        let height = self
            .connection
            .call(move |conn| {
                if let HeightQuery::Set(height) = query {
                    conn.execute(
                        "INSERT OR REPLACE INTO wallet_state (key, value) VALUES ('height', ?)",
                        params![height as i64],
                    )?;
                }
                let height: Option<i64> = conn
                    .query_row(
                        "SELECT value FROM wallet_state WHERE key = 'height'",
                        [],
                        |row| row.get(0),
                    )
                    .optional()?;
                Ok(height.unwrap_or(0))
            })
            .await
            .map_err(|e| WalletError::StoreUnavailable(format!("Failed to access height: {e}")))?;
        Ok(height as u32)
    }

    async fn reset(&self) -> WalletResult<()> {
        self.connection
            .call(|conn| {
                let tx = conn.transaction()?;
                tx.execute("DELETE FROM utxos", [])?;
                tx.execute("DELETE FROM wallet_state WHERE key = 'height'", [])?;
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(|e| WalletError::StoreUnavailable(format!("Failed to reset store: {e}")))
    }

    async fn spendable_snapshot(
        &self,
        owner: &ProgramHash,
        asset_id: &AssetId,
    ) -> WalletResult<UtxoSnapshot> {
        let owner = owner.as_bytes().to_vec();
        let asset = asset_id.as_bytes().to_vec();
        let (height, rows): (i64, Vec<UtxoRow>) = self
            .connection
            .call(move |conn| {
                let tx = conn.transaction()?;
                let height: Option<i64> = tx
                    .query_row(
                        "SELECT value FROM wallet_state WHERE key = 'height'",
                        [],
                        |row| row.get(0),
                    )
                    .optional()?;
                let rows = {
                    let mut stmt = tx.prepare(SELECT_UTXOS)?;
                    let rows: Vec<UtxoRow> = stmt
                        .query_map(params![owner, asset], |row| {
                            Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
                        })?
                        .collect::<Result<Vec<_>, _>>()?;
                    rows
                };
                tx.commit()?;
                Ok((height.unwrap_or(0), rows))
            })
            .await
            .map_err(|e| WalletError::StoreUnavailable(format!("Failed to read snapshot: {e}")))?;
        Ok(UtxoSnapshot {
            height: height as u32,
            utxos: rows
                .into_iter()
                .map(Self::decode_utxo)
                .collect::<WalletResult<Vec<_>>>()?,
        })
    }
}

#[cfg(all(test, feature = "storage"))]
mod tests {
    use super::*;
    use crate::data_structures::{
        amount::{NativeAmount, TokenAmount},
        asset::SYSTEM_ASSET_ID,
    };

    fn owner() -> ProgramHash {
        let mut bytes = [3u8; 21];
        bytes[0] = 0x21;
        ProgramHash::new(bytes)
    }

    #[tokio::test]
    async fn test_sqlite_utxo_round_trip() {
        let store = SqliteUtxoStore::new_in_memory().await.unwrap();
        let a = owner();
        let native = Utxo::new(
            *SYSTEM_ASSET_ID,
            OutPoint::new(TxId::new([1u8; 32]), 3),
            NativeAmount::from_units(500).into(),
            12,
        );
        let token_id = AssetId::new([8u8; 32]);
        let token = Utxo::new(
            token_id,
            OutPoint::new(TxId::new([2u8; 32]), 0),
            TokenAmount::from_whole(1000).into(),
            0,
        );
        store.add_unspent(&a, native.clone()).await.unwrap();
        store.add_unspent(&a, token.clone()).await.unwrap();

        assert_eq!(store.get_unspent(&a, &SYSTEM_ASSET_ID).await.unwrap(), vec![native.clone()]);
        assert_eq!(store.get_unspent(&a, &token_id).await.unwrap(), vec![token]);
        assert_eq!(
            store.get_asset_ids(&a).await.unwrap(),
            vec![*SYSTEM_ASSET_ID, token_id]
        );

        assert!(store.delete_unspent(&native.outpoint).await.unwrap());
        assert!(!store.delete_unspent(&native.outpoint).await.unwrap());
        assert!(store.get_unspent(&a, &SYSTEM_ASSET_ID).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_sqlite_height_and_reset() {
        let store = SqliteUtxoStore::new_in_memory().await.unwrap();
        assert_eq!(store.current_height(HeightQuery::Current).await.unwrap(), 0);
        assert_eq!(store.current_height(HeightQuery::Set(77)).await.unwrap(), 77);

        let a = owner();
        store
            .add_address(StoredAddress::new(a, vec![1, 2, 3], AccountType::MultiSig))
            .await
            .unwrap();
        let info = store.get_address_info(&a).await.unwrap();
        assert_eq!(info.account_type, AccountType::MultiSig);
        assert_eq!(info.redeem_script, vec![1, 2, 3]);

        store.reset().await.unwrap();
        assert_eq!(store.current_height(HeightQuery::Current).await.unwrap(), 0);
        assert_eq!(store.get_addresses().await.unwrap().len(), 1);
    }
}
