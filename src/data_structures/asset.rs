//! Asset definitions and the native asset identifier

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

use crate::crypto::sha256d;
use crate::data_structures::amount::NativeAmount;
use crate::data_structures::encoding::{write_u8, write_var_string, ByteReader};
use crate::data_structures::transaction::{Payload, Transaction};
use crate::data_structures::types::{AssetId, ProgramHash};
use crate::errors::SerializationError;

pub const NATIVE_ASSET_NAME: &str = "ELA";
pub const NATIVE_ASSET_PRECISION: u8 = 8;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum AssetType {
    #[default]
    Token = 0x00,
    Share = 0x01,
}

impl TryFrom<u8> for AssetType {
    type Error = SerializationError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x00 => Ok(AssetType::Token),
            0x01 => Ok(AssetType::Share),
            other => Err(SerializationError::InvalidValue {
                field: "asset type".to_string(),
                reason: format!("unknown value {other:#04x}"),
            }),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum RecordType {
    #[default]
    Unspent = 0x00,
    Balance = 0x01,
}

impl TryFrom<u8> for RecordType {
    type Error = SerializationError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x00 => Ok(RecordType::Unspent),
            0x01 => Ok(RecordType::Balance),
            other => Err(SerializationError::InvalidValue {
                field: "record type".to_string(),
                reason: format!("unknown value {other:#04x}"),
            }),
        }
    }
}

/// Registration record for an asset
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Asset {
    pub name: String,
    pub description: String,
    pub precision: u8,
    pub asset_type: AssetType,
    pub record_type: RecordType,
}

impl Asset {
    pub fn new(name: impl Into<String>, description: impl Into<String>, precision: u8) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            precision,
            asset_type: AssetType::Token,
            record_type: RecordType::Unspent,
        }
    }

    pub fn serialize(&self, buf: &mut Vec<u8>) {
        write_var_string(buf, &self.name);
        write_var_string(buf, &self.description);
        write_u8(buf, self.precision);
        write_u8(buf, self.asset_type as u8);
        write_u8(buf, self.record_type as u8);
    }

    pub fn deserialize(reader: &mut ByteReader<'_>) -> Result<Self, SerializationError> {
        Ok(Self {
            name: reader.read_var_string("asset name")?,
            description: reader.read_var_string("asset description")?,
            precision: reader.read_u8("asset precision")?,
            asset_type: AssetType::try_from(reader.read_u8("asset type")?)?,
            record_type: RecordType::try_from(reader.read_u8("record type")?)?,
        })
    }

    /// Identifier of the asset, the double SHA-256 of its serialization
    pub fn id(&self) -> AssetId {
        let mut buf = Vec::new();
        self.serialize(&mut buf);
        AssetId::new(sha256d(&buf))
    }
}

/// The registration transaction that defines the native asset
pub fn native_asset_registration() -> Transaction {
    Transaction::new(Payload::RegisterAsset {
        asset: Asset::new(NATIVE_ASSET_NAME, "", NATIVE_ASSET_PRECISION),
        amount: NativeAmount::ZERO,
        controller: ProgramHash::ZERO,
    })
}

lazy_static! {
    /// Asset id of the native coin
    pub static ref SYSTEM_ASSET_ID: AssetId = native_asset_registration().hash();
}
