//! Builds unsigned transactions from a [`TransactionIntent`]
//!
//! Every shape follows the same steps: validate the addresses and amounts,
//! bring the UTXO store up to date, select inputs smallest first under a
//! per-address lock, add a change output when the inputs overshoot and attach
//! a nonce plus the spender's redeem script.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::{
    data_structures::{
        amount::{Amount, NativeAmount, TokenAmount},
        asset::SYSTEM_ASSET_ID,
        transaction::{Attribute, Input, Output, Payload, Program, Transaction},
        types::{AssetId, ProgramHash, DESTROY_ADDRESS},
    },
    errors::{WalletError, WalletResult},
    scanning::ChainSync,
    signing::{
        models::intent::{
            AssetRegistration, CrossChainOutput, TokenTransfer, Transfer, TransactionIntent,
        },
        prepare::input_selector::{InputSelector, UtxoSelection},
    },
    storage::UtxoStore,
};

fn parse_spender(address: &str) -> WalletResult<ProgramHash> {
    ProgramHash::from_address(address)
        .map_err(|e| WalletError::InvalidAddress(format!("Invalid spender address {address}: {e}")))
}

fn parse_receiver(address: &str) -> WalletResult<ProgramHash> {
    ProgramHash::from_address(address)
        .map_err(|e| WalletError::InvalidAddress(format!("Invalid receiver address {address}: {e}")))
}

fn check_fee(fee: NativeAmount) -> WalletResult<()> {
    if !fee.is_zero() && !fee.is_positive() {
        return Err(WalletError::InvalidAmount(format!("Fee {fee} is negative")));
    }
    Ok(())
}

fn check_targets<T>(outputs: &[T]) -> WalletResult<()> {
    if outputs.is_empty() {
        return Err(WalletError::InvalidArgument(
            "Invalid transaction target: no outputs".to_string(),
        ));
    }
    Ok(())
}

fn check_positive(amount: &Amount, address: &str) -> WalletResult<()> {
    if !amount.is_positive() {
        return Err(WalletError::InvalidAmount(format!(
            "Amount {amount} to {address} must be positive"
        )));
    }
    Ok(())
}

/// Change back to the spender, unlocked
fn change_output(
    asset_id: &AssetId,
    selection: &UtxoSelection,
    spender: &ProgramHash,
) -> WalletResult<Option<Output>> {
    selection
        .change
        .clone()
        .map(|change| Output::new(*asset_id, change, 0, *spender))
        .transpose()
}

/// A validated intent: every address decoded, every amount checked
enum Plan {
    Transfer {
        fee: NativeAmount,
        outputs: Vec<Output>,
        required: NativeAmount,
    },
    CrossChain {
        fee: NativeAmount,
        outputs: Vec<Output>,
        required: NativeAmount,
        payload: Payload,
    },
    Token {
        asset_id: AssetId,
        fee: NativeAmount,
        outputs: Vec<Output>,
        required: TokenAmount,
    },
    RegisterAsset {
        fee: NativeAmount,
        minted: Output,
        payload: Payload,
    },
}

pub struct TransactionBuilder {
    store: Arc<dyn UtxoStore>,
    selector: InputSelector,
    chain_sync: Option<Arc<dyn ChainSync>>,
    strict_sync: bool,
    address_locks: Mutex<HashMap<ProgramHash, Arc<Mutex<()>>>>,
}

impl TransactionBuilder {
    pub fn new(store: Arc<dyn UtxoStore>) -> Self {
        Self {
            selector: InputSelector::new(store.clone()),
            store,
            chain_sync: None,
            strict_sync: false,
            address_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Sync the store through `chain_sync` before every build
    pub fn with_chain_sync(mut self, chain_sync: Arc<dyn ChainSync>) -> Self {
        self.chain_sync = Some(chain_sync);
        self
    }

    /// Fail builds with `SyncFailed` instead of continuing on local data
    pub fn with_strict_sync(mut self, strict: bool) -> Self {
        self.strict_sync = strict;
        self
    }

    pub async fn build(&self, intent: TransactionIntent) -> WalletResult<Transaction> {
        let spender = parse_spender(intent.from())?;
        let kind = intent.kind();
        let plan = plan_intent(intent)?;

        self.sync_chain_data().await?;

        let lock = self.address_lock(&spender).await;
        let _guard = lock.lock().await;

        let transaction = match plan {
            Plan::Transfer {
                fee,
                outputs,
                required,
            } => {
                debug!(%fee, outputs = outputs.len(), "Building transfer");
                self.build_native(&spender, Payload::Transfer, outputs, required)
                    .await?
            }
            Plan::CrossChain {
                fee,
                outputs,
                required,
                payload,
            } => {
                debug!(%fee, outputs = outputs.len(), "Building cross chain transfer");
                self.build_native(&spender, payload, outputs, required).await?
            }
            Plan::Token {
                asset_id,
                fee,
                outputs,
                required,
            } => {
                self.build_token(&spender, &asset_id, fee, outputs, required)
                    .await?
            }
            Plan::RegisterAsset {
                fee,
                minted,
                payload,
            } => {
                self.build_native(&spender, payload, vec![minted], fee)
                    .await?
            }
        };

        info!(
            kind,
            tx = %transaction.hash(),
            inputs = transaction.inputs.len(),
            outputs = transaction.outputs.len(),
            "Created transaction"
        );
        Ok(transaction)
    }

    async fn sync_chain_data(&self) -> WalletResult<()> {
        let Some(chain_sync) = &self.chain_sync else {
            return Ok(());
        };
        match chain_sync.sync_chain_data().await {
            Ok(report) => {
                debug!(height = report.current_height, "UTXO store synced");
                Ok(())
            }
            Err(e) if self.strict_sync => Err(e),
            Err(e) => {
                warn!(error = %e, "Chain data sync failed, building from local UTXO set");
                Ok(())
            }
        }
    }

    async fn address_lock(&self, owner: &ProgramHash) -> Arc<Mutex<()>> {
        let mut locks = self.address_locks.lock().await;
        locks.entry(*owner).or_default().clone()
    }

    /// Fund `outputs` plus the fee from the native pool
    async fn build_native(
        &self,
        spender: &ProgramHash,
        payload: Payload,
        mut outputs: Vec<Output>,
        required: NativeAmount,
    ) -> WalletResult<Transaction> {
        let selection = self
            .selector
            .fetch_unspent_outputs(spender, &SYSTEM_ASSET_ID, &required.into())
            .await?;
        if let Some(change) = change_output(&SYSTEM_ASSET_ID, &selection, spender)? {
            outputs.push(change);
        }
        self.assemble(spender, payload, selection.inputs(), outputs)
            .await
    }

    /// Token outputs funded from the token pool, fee from the native pool
    async fn build_token(
        &self,
        spender: &ProgramHash,
        asset_id: &AssetId,
        fee: NativeAmount,
        mut outputs: Vec<Output>,
        required: TokenAmount,
    ) -> WalletResult<Transaction> {
        debug!(asset = %asset_id, %fee, outputs = outputs.len(), "Building token transfer");
        let tokens = self
            .selector
            .fetch_unspent_outputs(spender, asset_id, &required.into())
            .await?;
        if let Some(change) = change_output(asset_id, &tokens, spender)? {
            outputs.push(change);
        }

        let native = self
            .selector
            .fetch_unspent_outputs(spender, &SYSTEM_ASSET_ID, &fee.into())
            .await?;
        if let Some(change) = change_output(&SYSTEM_ASSET_ID, &native, spender)? {
            outputs.push(change);
        }

        let mut inputs = tokens.inputs();
        inputs.extend(native.inputs());
        self.assemble(spender, Payload::Transfer, inputs, outputs)
            .await
    }

    async fn assemble(
        &self,
        spender: &ProgramHash,
        payload: Payload,
        inputs: Vec<Input>,
        outputs: Vec<Output>,
    ) -> WalletResult<Transaction> {
        let account = self.store.get_address_info(spender).await?;
        let mut transaction = Transaction::new(payload);
        transaction.attributes.push(Attribute::random_nonce());
        transaction.inputs = inputs;
        transaction.outputs = outputs;
        transaction.programs.push(Program::unsigned(account.redeem_script));
        Ok(transaction)
    }
}

fn plan_intent(intent: TransactionIntent) -> WalletResult<Plan> {
    match intent {
        TransactionIntent::Transfer {
            fee,
            lock_time,
            outputs,
            ..
        } => {
            let (outputs, required) = plan_transfer(fee, lock_time, &outputs)?;
            Ok(Plan::Transfer {
                fee,
                outputs,
                required,
            })
        }
        TransactionIntent::CrossChain {
            fee,
            lock_time,
            outputs,
            ..
        } => plan_cross_chain(fee, lock_time, outputs),
        TransactionIntent::Token {
            asset_id,
            fee,
            lock_time,
            outputs,
            ..
        } => plan_token(&asset_id, fee, lock_time, &outputs),
        TransactionIntent::RegisterAsset {
            fee, registration, ..
        } => plan_registration(fee, registration),
    }
}

fn plan_transfer(
    fee: NativeAmount,
    lock_time: u32,
    transfers: &[Transfer],
) -> WalletResult<(Vec<Output>, NativeAmount)> {
    check_fee(fee)?;
    check_targets(transfers)?;
    let mut required = fee;
    let mut outputs = Vec::with_capacity(transfers.len());
    for transfer in transfers {
        let receiver = parse_receiver(&transfer.address)?;
        let amount = Amount::Native(transfer.amount);
        check_positive(&amount, &transfer.address)?;
        required = required.checked_add(transfer.amount)?;
        outputs.push(Output::new(*SYSTEM_ASSET_ID, amount, lock_time, receiver)?);
    }
    Ok((outputs, required))
}

/// The fee is shared evenly across the cross-chain amounts; the remainder of
/// the split comes off the last one so the deductions add up to the fee.
fn plan_cross_chain(
    fee: NativeAmount,
    lock_time: u32,
    targets: Vec<CrossChainOutput>,
) -> WalletResult<Plan> {
    check_fee(fee)?;
    check_targets(&targets)?;
    let (per_output_fee, remainder) = fee.div_rem(targets.len() as i64)?;

    let mut required = fee;
    let mut outputs = Vec::with_capacity(targets.len());
    let mut cross_chain_addresses = Vec::with_capacity(targets.len());
    let mut output_indexes = Vec::with_capacity(targets.len());
    let mut cross_chain_amounts = Vec::with_capacity(targets.len());
    let last = targets.len() - 1;

    for (index, target) in targets.into_iter().enumerate() {
        let receiver = if target.address == DESTROY_ADDRESS {
            ProgramHash::ZERO
        } else {
            parse_receiver(&target.address)?
        };
        if target.cross_chain_address.trim().is_empty() {
            return Err(WalletError::InvalidAddress(format!(
                "Missing cross chain address for output {index}"
            )));
        }
        let amount = Amount::Native(target.amount);
        check_positive(&amount, &target.address)?;

        let mut cross_chain_amount = target.amount.checked_sub(per_output_fee)?;
        if index == last {
            cross_chain_amount = cross_chain_amount.checked_sub(remainder)?;
        }
        if !cross_chain_amount.is_positive() {
            return Err(WalletError::InvalidAmount(format!(
                "Amount {} to {} does not cover its share of the fee",
                target.amount, target.cross_chain_address
            )));
        }

        required = required.checked_add(target.amount)?;
        outputs.push(Output::new(*SYSTEM_ASSET_ID, amount, lock_time, receiver)?);
        cross_chain_addresses.push(target.cross_chain_address);
        output_indexes.push(index as u64);
        cross_chain_amounts.push(cross_chain_amount);
    }

    Ok(Plan::CrossChain {
        fee,
        outputs,
        required,
        payload: Payload::CrossChainTransfer {
            cross_chain_addresses,
            output_indexes,
            cross_chain_amounts,
        },
    })
}

fn plan_token(
    asset_id: &AssetId,
    fee: NativeAmount,
    lock_time: u32,
    transfers: &[TokenTransfer],
) -> WalletResult<Plan> {
    if asset_id.is_zero() {
        return Err(WalletError::InvalidAssetId(format!(
            "{asset_id} is not a registered asset"
        )));
    }

    // Token transfers of the native asset are ordinary transfers
    if *asset_id == *SYSTEM_ASSET_ID {
        let native: Vec<Transfer> = transfers
            .iter()
            .map(|transfer| {
                let units = i64::try_from(transfer.amount.units()).map_err(|_| {
                    WalletError::AmountOverflow(format!(
                        "{} does not fit a native amount",
                        transfer.amount.units()
                    ))
                })?;
                Ok(Transfer::new(
                    transfer.address.clone(),
                    NativeAmount::from_units(units),
                ))
            })
            .collect::<WalletResult<_>>()?;
        let (outputs, required) = plan_transfer(fee, lock_time, &native)?;
        return Ok(Plan::Transfer {
            fee,
            outputs,
            required,
        });
    }

    check_fee(fee)?;
    check_targets(transfers)?;
    let mut required = TokenAmount::zero();
    let mut outputs = Vec::with_capacity(transfers.len());
    for transfer in transfers {
        let receiver = parse_receiver(&transfer.address)?;
        let amount = Amount::Token(transfer.amount.clone());
        check_positive(&amount, &transfer.address)?;
        required = required.checked_add(&transfer.amount)?;
        outputs.push(Output::new(*asset_id, amount, lock_time, receiver)?);
    }
    Ok(Plan::Token {
        asset_id: *asset_id,
        fee,
        outputs,
        required,
    })
}

fn plan_registration(fee: NativeAmount, registration: AssetRegistration) -> WalletResult<Plan> {
    check_fee(fee)?;
    let controller = ProgramHash::from_address(&registration.controller).map_err(|e| {
        WalletError::InvalidAddress(format!(
            "Invalid register address {}: {e}",
            registration.controller
        ))
    })?;
    if registration.amount <= 0 {
        return Err(WalletError::InvalidAmount(format!(
            "Registration amount {} must be positive",
            registration.amount
        )));
    }
    let asset_id = registration.asset.id();
    let minted = TokenAmount::from_whole(registration.amount as u64);
    debug!(asset = %asset_id, name = %registration.asset.name, supply = %minted, "Registering asset");

    let minted = Output::new(asset_id, Amount::Token(minted), 0, controller)?;
    Ok(Plan::RegisterAsset {
        fee,
        minted,
        payload: Payload::RegisterAsset {
            asset: registration.asset,
            amount: NativeAmount::from_units(registration.amount),
            controller,
        },
    })
}
