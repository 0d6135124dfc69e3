//! Wire data structures: amounts, identifiers, scripts and transactions

pub mod amount;
pub mod asset;
pub mod encoding;
pub mod script;
pub mod transaction;
pub mod types;

pub use amount::{Amount, AssetAmount, NativeAmount, TokenAmount};
pub use asset::{Asset, AssetType, RecordType, SYSTEM_ASSET_ID};
pub use script::{ScriptType, SignState, SignStatus};
pub use transaction::{
    Attribute, AttributeUsage, Input, OutPoint, Output, Payload, Program, Transaction, TxType,
};
pub use types::{AssetId, Hash256, ProgramHash, TxId, DESTROY_ADDRESS};
