use serde::{Deserialize, Serialize};

use crate::data_structures::{
    amount::{Amount, NativeAmount, TokenAmount},
    asset::SYSTEM_ASSET_ID,
    transaction::OutPoint,
    types::{AssetId, ProgramHash},
};
use crate::errors::{SerializationError, WalletResult};
use crate::storage::account_type::AccountType;

/// An unspent output owned by one of the wallet's addresses
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Utxo {
    pub asset_id: AssetId,
    /// Prior transaction id and output index
    pub outpoint: OutPoint,
    pub amount: Amount,
    /// Height before which the output cannot be spent; zero when unlocked
    pub lock_time: u32,
}

impl Utxo {
    pub fn new(asset_id: AssetId, outpoint: OutPoint, amount: Amount, lock_time: u32) -> Self {
        Self {
            asset_id,
            outpoint,
            amount,
            lock_time,
        }
    }

    /// Amount in its persisted form: 8 byte little endian for the native asset,
    /// big-endian magnitude for tokens
    pub fn amount_bytes(&self) -> Vec<u8> {
        match &self.amount {
            Amount::Native(value) => value.to_le_bytes().to_vec(),
            Amount::Token(value) => value.to_wire_bytes(),
        }
    }

    /// Inverse of [`Utxo::amount_bytes`], choosing the representation from `asset_id`
    pub fn amount_from_bytes(asset_id: &AssetId, bytes: &[u8]) -> WalletResult<Amount> {
        if *asset_id == *SYSTEM_ASSET_ID {
            let array: [u8; 8] = bytes.try_into().map_err(|_| SerializationError::InvalidValue {
                field: "native amount".to_string(),
                reason: format!("expected 8 bytes, got {}", bytes.len()),
            })?;
            Ok(Amount::Native(NativeAmount::from_le_bytes(array)))
        } else {
            Ok(Amount::Token(TokenAmount::from_wire_bytes(bytes)))
        }
    }

    /// Whether the output may be spent at `height`
    pub fn is_available_at(&self, height: u32) -> bool {
        self.lock_time < height
    }
}

/// A tracked address together with the redeem script that controls it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredAddress {
    pub address: String,
    pub program_hash: ProgramHash,
    /// Hex encoded redeem script
    #[serde(with = "hex_bytes")]
    pub redeem_script: Vec<u8>,
    pub account_type: AccountType,
}

impl StoredAddress {
    pub fn new(program_hash: ProgramHash, redeem_script: Vec<u8>, account_type: AccountType) -> Self {
        Self {
            address: program_hash.to_address(),
            program_hash,
            redeem_script,
            account_type,
        }
    }
}

mod hex_bytes {
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(s).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_structures::types::TxId;

    #[test]
    fn test_amount_bytes_round_trip() {
        let native = Utxo::new(
            *SYSTEM_ASSET_ID,
            OutPoint::new(TxId::new([1u8; 32]), 0),
            NativeAmount::from_units(123_456_789).into(),
            0,
        );
        let bytes = native.amount_bytes();
        assert_eq!(bytes.len(), 8);
        assert_eq!(
            Utxo::amount_from_bytes(&SYSTEM_ASSET_ID, &bytes).unwrap(),
            native.amount
        );

        let token_id = AssetId::new([2u8; 32]);
        let token = Utxo::new(
            token_id,
            OutPoint::new(TxId::new([1u8; 32]), 1),
            TokenAmount::from_whole(5).into(),
            0,
        );
        assert_eq!(
            Utxo::amount_from_bytes(&token_id, &token.amount_bytes()).unwrap(),
            token.amount
        );
        assert!(Utxo::amount_from_bytes(&SYSTEM_ASSET_ID, &[1, 2, 3]).is_err());
    }

    #[test]
    fn test_availability_uses_strict_comparison() {
        let utxo = Utxo::new(
            *SYSTEM_ASSET_ID,
            OutPoint::new(TxId::new([1u8; 32]), 0),
            NativeAmount::from_units(1).into(),
            10,
        );
        assert!(!utxo.is_available_at(10));
        assert!(utxo.is_available_at(11));
    }
}
