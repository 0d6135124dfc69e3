//! Shared fixtures for integration tests
#![allow(dead_code)]

use std::sync::Arc;

use sidechain_wallet_libs::{
    data_structures::{Amount, AssetId, NativeAmount, TokenAmount, TxId, SYSTEM_ASSET_ID},
    scanning::{MockChainClient, MockTransaction},
    signing::Account,
    storage::MemoryUtxoStore,
    KeyProvider, Wallet, WalletBuilder, WalletConfig, WalletResult,
};

pub fn coins(value: &str) -> NativeAmount {
    value.parse().expect("valid native amount")
}

pub fn tx_id(seed: u8) -> TxId {
    TxId::new([seed; 32])
}

pub struct TestWallet {
    pub wallet: Wallet,
    pub chain: MockChainClient,
    pub store: Arc<MemoryUtxoStore>,
}

impl TestWallet {
    pub async fn new() -> WalletResult<Self> {
        Self::with_config(WalletConfig::default()).await
    }

    pub async fn with_config(config: WalletConfig) -> WalletResult<Self> {
        let chain = MockChainClient::new();
        // Genesis, so the chain always has a tip
        chain.push_empty_blocks(1)?;
        let store = Arc::new(MemoryUtxoStore::new());
        let wallet = WalletBuilder::new()
            .with_config(config)
            .with_store(store.clone())
            .with_chain_client(Arc::new(chain.clone()))
            .build()
            .await?;
        Ok(Self {
            wallet,
            chain,
            store,
        })
    }

    /// Track a fresh standard account and return it with its address
    pub async fn account(&self) -> WalletResult<(Account, String)> {
        let account = Account::random();
        let stored = self
            .wallet
            .add_standard_account(&account.public_key())
            .await?;
        Ok((account, stored.address))
    }

    /// Mine one block paying each native amount to `address` in its own output
    pub fn fund_native(&self, seed: u8, address: &str, amounts: &[&str]) -> WalletResult<u32> {
        let mut tx = MockTransaction::new(tx_id(seed));
        for amount in amounts {
            tx = tx.pay(address, &SYSTEM_ASSET_ID, &Amount::Native(coins(amount)), 0);
        }
        self.chain.push_block(vec![tx.build()])
    }

    pub fn fund_token(
        &self,
        seed: u8,
        address: &str,
        asset_id: &AssetId,
        units: u64,
    ) -> WalletResult<u32> {
        let tx = MockTransaction::new(tx_id(seed)).pay(
            address,
            asset_id,
            &Amount::Token(TokenAmount::from_u64(units)),
            0,
        );
        self.chain.push_block(vec![tx.build()])
    }
}

/// An address no test wallet tracks
pub fn foreign_address() -> String {
    Account::random().address().expect("address")
}
