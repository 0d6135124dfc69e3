//! What the caller wants a transaction to do, before any UTXO is chosen

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::data_structures::{
    amount::{NativeAmount, TokenAmount},
    asset::Asset,
    types::AssetId,
};
use crate::{WalletError, WalletResult};

/// Native coins to one destination
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub address: String,
    pub amount: NativeAmount,
}

impl Transfer {
    pub fn new(address: impl Into<String>, amount: NativeAmount) -> Self {
        Self {
            address: address.into(),
            amount,
        }
    }
}

/// Token units (already scaled by 10^18) to one destination
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenTransfer {
    pub address: String,
    pub amount: TokenAmount,
}

impl TokenTransfer {
    pub fn new(address: impl Into<String>, amount: TokenAmount) -> Self {
        Self {
            address: address.into(),
            amount,
        }
    }
}

/// Native coins locked at `address` on this chain and released to
/// `cross_chain_address` on the main chain
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossChainOutput {
    pub address: String,
    pub amount: NativeAmount,
    pub cross_chain_address: String,
}

impl CrossChainOutput {
    pub fn new(
        address: impl Into<String>,
        amount: NativeAmount,
        cross_chain_address: impl Into<String>,
    ) -> Self {
        Self {
            address: address.into(),
            amount,
            cross_chain_address: cross_chain_address.into(),
        }
    }
}

/// A new asset and its initial supply
///
/// `amount` is in whole asset units; the minted output carries `amount * 10^18`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRegistration {
    pub asset: Asset,
    pub amount: i64,
    pub controller: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransactionIntent {
    Transfer {
        from: String,
        fee: NativeAmount,
        lock_time: u32,
        outputs: Vec<Transfer>,
    },
    CrossChain {
        from: String,
        fee: NativeAmount,
        lock_time: u32,
        outputs: Vec<CrossChainOutput>,
    },
    Token {
        from: String,
        asset_id: AssetId,
        fee: NativeAmount,
        lock_time: u32,
        outputs: Vec<TokenTransfer>,
    },
    RegisterAsset {
        from: String,
        fee: NativeAmount,
        registration: AssetRegistration,
    },
}

impl TransactionIntent {
    pub fn from(&self) -> &str {
        match self {
            TransactionIntent::Transfer { from, .. }
            | TransactionIntent::CrossChain { from, .. }
            | TransactionIntent::Token { from, .. }
            | TransactionIntent::RegisterAsset { from, .. } => from,
        }
    }

    pub fn fee(&self) -> NativeAmount {
        match self {
            TransactionIntent::Transfer { fee, .. }
            | TransactionIntent::CrossChain { fee, .. }
            | TransactionIntent::Token { fee, .. }
            | TransactionIntent::RegisterAsset { fee, .. } => *fee,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            TransactionIntent::Transfer { .. } => "transfer",
            TransactionIntent::CrossChain { .. } => "cross chain transfer",
            TransactionIntent::Token { .. } => "token transfer",
            TransactionIntent::RegisterAsset { .. } => "asset registration",
        }
    }
}

/// Parse `address, amount` lines into native transfers
///
/// Both columns are trimmed and blank lines are ignored. Amounts use the
/// native decimal format, e.g. `1.5`.
pub fn parse_multi_output(text: &str) -> WalletResult<Vec<Transfer>> {
    let mut outputs = Vec::new();
    for (number, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let columns: Vec<&str> = line.split(',').collect();
        if columns.len() < 2 {
            return Err(WalletError::InvalidArgument(format!(
                "Invalid multi output line {}: {line}",
                number + 1
            )));
        }
        let address = columns[0].trim();
        let amount_str = columns[1].trim();
        let amount: NativeAmount = amount_str.parse().map_err(|_| {
            WalletError::InvalidAmount(format!(
                "Invalid multi output amount on line {}: {amount_str}",
                number + 1
            ))
        })?;
        trace!(address, amount = %amount, "Multi output line");
        outputs.push(Transfer::new(address, amount));
    }
    Ok(outputs)
}
