//! Wallet libraries for a UTXO sidechain
//!
//! This crate builds and signs sidechain transactions: standard and locked
//! transfers, multi-output batches, cross-chain deposits and withdrawals,
//! asset registration and token transfers. It keeps a local UTXO set per
//! tracked address, replayed from a node's blocks.
//!
//! ## Features
//!
//! - `http` (default): JSON-RPC chain client built on `reqwest`
//! - `storage`: SQLite UTXO store built on `rusqlite` / `tokio-rusqlite`
//!
//! Without the `storage` feature the wallet keeps its UTXO set in memory.
//!
//! ```toml
//! [dependencies]
//! sidechain_wallet_libs = { version = "0.2", features = ["storage"] }
//! ```

pub mod config;
pub mod crypto;
pub mod data_structures;
pub mod errors;
pub mod scanning;
pub mod signing;
pub mod storage;
pub mod wallet;

pub use config::WalletConfig;
pub use data_structures::{
    Amount, AssetId, NativeAmount, ProgramHash, SignStatus, TokenAmount, Transaction, TxId,
    SYSTEM_ASSET_ID,
};
pub use errors::*;
pub use signing::{sign_transaction, Account, KeyProvider, TransactionBuilder, TransactionIntent};
pub use storage::{read_transaction_file, write_transaction_file, MemoryUtxoStore, UtxoStore};
pub use wallet::{Wallet, WalletBuilder};
