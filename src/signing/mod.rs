//! Transaction construction and signing

pub mod key_provider;
pub mod models;
pub mod prepare;
pub mod signer;

pub use key_provider::{Account, KeyProvider};
pub use models::intent::{
    parse_multi_output, AssetRegistration, CrossChainOutput, TokenTransfer, TransactionIntent,
    Transfer,
};
pub use prepare::input_selector::{InputSelector, UtxoSelection};
pub use prepare::transaction_builder::TransactionBuilder;
pub use signer::sign_transaction;
