//! The wallet: tracked accounts, their UTXOs and the transactions built from them
//!
//! A [`Wallet`] is an explicit value holding its store, its chain sync and a
//! transaction builder; create one with [`WalletBuilder`].

pub mod builder;

use std::path::Path;
use std::sync::Arc;

use tracing::info;

use crate::{
    config::WalletConfig,
    crypto::PublicKey,
    data_structures::{
        amount::{NativeAmount, TokenAmount},
        asset::Asset,
        script::{create_multisig_redeem_script, create_standard_redeem_script, SignStatus},
        transaction::Transaction,
        types::{AssetId, ProgramHash, DESTROY_ADDRESS},
    },
    errors::{WalletError, WalletResult},
    scanning::{ChainSync, SyncReport},
    signing::{
        parse_multi_output, sign_transaction, AssetRegistration, CrossChainOutput, KeyProvider,
        TokenTransfer, TransactionBuilder, TransactionIntent, Transfer,
    },
    storage::{AccountType, AssetBalance, HeightQuery, StoredAddress, UtxoStore},
};

pub use builder::WalletBuilder;

pub struct Wallet {
    config: WalletConfig,
    store: Arc<dyn UtxoStore>,
    chain_sync: Option<Arc<dyn ChainSync>>,
    builder: TransactionBuilder,
}

impl Wallet {
    pub(crate) fn new(
        config: WalletConfig,
        store: Arc<dyn UtxoStore>,
        chain_sync: Option<Arc<dyn ChainSync>>,
    ) -> Self {
        let mut builder =
            TransactionBuilder::new(store.clone()).with_strict_sync(config.fail_on_sync_error);
        if config.sync_before_build {
            if let Some(chain_sync) = &chain_sync {
                builder = builder.with_chain_sync(chain_sync.clone());
            }
        }
        Self {
            config,
            store,
            chain_sync,
            builder,
        }
    }

    pub fn config(&self) -> &WalletConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn UtxoStore> {
        &self.store
    }

    // === Accounts ===

    /// Track the standard account of `public_key`
    pub async fn add_standard_account(&self, public_key: &PublicKey) -> WalletResult<StoredAddress> {
        let redeem_script = create_standard_redeem_script(public_key);
        self.add_account(redeem_script, AccountType::Standard).await
    }

    /// Track the M-of-N account of `public_keys`
    pub async fn add_multisig_account(
        &self,
        m: usize,
        public_keys: &[PublicKey],
    ) -> WalletResult<StoredAddress> {
        let redeem_script = create_multisig_redeem_script(m, public_keys)?;
        self.add_account(redeem_script, AccountType::MultiSig).await
    }

    async fn add_account(
        &self,
        redeem_script: Vec<u8>,
        account_type: AccountType,
    ) -> WalletResult<StoredAddress> {
        let program_hash = ProgramHash::from_redeem_script(&redeem_script)?;
        let address = StoredAddress::new(program_hash, redeem_script, account_type);
        self.store.add_address(address.clone()).await?;
        info!(address = %address.address, account_type = account_type.name(), "Added account");
        Ok(address)
    }

    pub async fn addresses(&self) -> WalletResult<Vec<StoredAddress>> {
        self.store.get_addresses().await
    }

    pub async fn delete_address(&self, address: &str) -> WalletResult<bool> {
        let program_hash = ProgramHash::from_address(address)?;
        self.store.delete_address(&program_hash).await
    }

    // === Chain data ===

    /// Replay new blocks into the store now
    pub async fn sync_chain_data(&self) -> WalletResult<SyncReport> {
        let chain_sync = self.chain_sync.as_ref().ok_or_else(|| {
            WalletError::ConfigurationError("No chain client configured".to_string())
        })?;
        chain_sync.sync_chain_data().await
    }

    pub async fn current_height(&self) -> WalletResult<u32> {
        self.store.current_height(HeightQuery::Current).await
    }

    /// Available and locked totals per asset for `address`
    pub async fn balances(&self, address: &str) -> WalletResult<Vec<AssetBalance>> {
        let program_hash = ProgramHash::from_address(address)?;
        self.store.balances(&program_hash).await
    }

    /// Forget all UTXOs and the sync height so the next sync starts from genesis
    pub async fn reset(&self) -> WalletResult<()> {
        self.store.reset().await?;
        info!("Wallet UTXO store reset");
        Ok(())
    }

    // === Transactions ===

    pub async fn create_transaction(
        &self,
        from: &str,
        to: &str,
        amount: NativeAmount,
        fee: NativeAmount,
    ) -> WalletResult<Transaction> {
        self.create_locked_transaction(from, to, amount, fee, 0).await
    }

    pub async fn create_locked_transaction(
        &self,
        from: &str,
        to: &str,
        amount: NativeAmount,
        fee: NativeAmount,
        lock_time: u32,
    ) -> WalletResult<Transaction> {
        self.create_locked_multi_output_transaction(
            from,
            fee,
            lock_time,
            vec![Transfer::new(to, amount)],
        )
        .await
    }

    pub async fn create_multi_output_transaction(
        &self,
        from: &str,
        fee: NativeAmount,
        outputs: Vec<Transfer>,
    ) -> WalletResult<Transaction> {
        self.create_locked_multi_output_transaction(from, fee, 0, outputs)
            .await
    }

    pub async fn create_locked_multi_output_transaction(
        &self,
        from: &str,
        fee: NativeAmount,
        lock_time: u32,
        outputs: Vec<Transfer>,
    ) -> WalletResult<Transaction> {
        self.builder
            .build(TransactionIntent::Transfer {
                from: from.to_string(),
                fee,
                lock_time,
                outputs,
            })
            .await
    }

    /// Multi-output transfer read from an `address, amount` per line file
    pub async fn create_multi_output_transaction_from_file(
        &self,
        from: &str,
        fee: NativeAmount,
        lock_time: u32,
        path: &Path,
    ) -> WalletResult<Transaction> {
        let content = std::fs::read_to_string(path)?;
        let outputs = parse_multi_output(&content)?;
        self.create_locked_multi_output_transaction(from, fee, lock_time, outputs)
            .await
    }

    pub async fn create_cross_chain_transaction(
        &self,
        from: &str,
        to: &str,
        cross_chain_address: &str,
        amount: NativeAmount,
        fee: NativeAmount,
    ) -> WalletResult<Transaction> {
        self.create_multi_cross_chain_transaction(
            from,
            fee,
            vec![CrossChainOutput::new(to, amount, cross_chain_address)],
        )
        .await
    }

    pub async fn create_multi_cross_chain_transaction(
        &self,
        from: &str,
        fee: NativeAmount,
        outputs: Vec<CrossChainOutput>,
    ) -> WalletResult<Transaction> {
        self.builder
            .build(TransactionIntent::CrossChain {
                from: from.to_string(),
                fee,
                lock_time: 0,
                outputs,
            })
            .await
    }

    /// Lock funds at the configured deposit address for release on the main chain
    pub async fn create_deposit_transaction(
        &self,
        from: &str,
        main_chain_address: &str,
        amount: NativeAmount,
        fee: NativeAmount,
    ) -> WalletResult<Transaction> {
        let deposit_address = self.config.deposit_address.clone().ok_or_else(|| {
            WalletError::ConfigurationError("No deposit address configured".to_string())
        })?;
        self.create_cross_chain_transaction(from, &deposit_address, main_chain_address, amount, fee)
            .await
    }

    /// Burn funds on this chain for release on the main chain
    pub async fn create_withdraw_transaction(
        &self,
        from: &str,
        main_chain_address: &str,
        amount: NativeAmount,
        fee: NativeAmount,
    ) -> WalletResult<Transaction> {
        self.create_cross_chain_transaction(from, DESTROY_ADDRESS, main_chain_address, amount, fee)
            .await
    }

    pub async fn create_token_transaction(
        &self,
        from: &str,
        asset_id: &AssetId,
        to: &str,
        amount: TokenAmount,
        fee: NativeAmount,
    ) -> WalletResult<Transaction> {
        self.create_locked_token_transaction(from, asset_id, to, amount, fee, 0)
            .await
    }

    pub async fn create_locked_token_transaction(
        &self,
        from: &str,
        asset_id: &AssetId,
        to: &str,
        amount: TokenAmount,
        fee: NativeAmount,
        lock_time: u32,
    ) -> WalletResult<Transaction> {
        self.builder
            .build(TransactionIntent::Token {
                from: from.to_string(),
                asset_id: *asset_id,
                fee,
                lock_time,
                outputs: vec![TokenTransfer::new(to, amount)],
            })
            .await
    }

    /// Register `asset` and mint `amount` whole units of it to `controller`
    pub async fn create_register_transaction(
        &self,
        from: &str,
        controller: &str,
        asset: Asset,
        amount: i64,
        fee: NativeAmount,
    ) -> WalletResult<Transaction> {
        self.builder
            .build(TransactionIntent::RegisterAsset {
                from: from.to_string(),
                fee,
                registration: AssetRegistration {
                    asset,
                    amount,
                    controller: controller.to_string(),
                },
            })
            .await
    }

    /// Add `key_provider`'s signature to `transaction`
    pub fn sign(
        &self,
        transaction: &mut Transaction,
        key_provider: &dyn KeyProvider,
    ) -> WalletResult<SignStatus> {
        sign_transaction(transaction, key_provider)
    }
}
