//! Fixed size identifiers: 32 byte hashes and 21 byte program hashes
//!
//! Hashes are displayed byte-reversed in hex, the way the node's RPC reports
//! transaction ids and asset ids. Program hashes are displayed as Base58Check
//! addresses.

use std::fmt;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::crypto::{hash160, sha256d};
use crate::errors::{WalletError, WalletResult};

pub const HASH256_LEN: usize = 32;
pub const PROGRAM_HASH_LEN: usize = 21;

/// Program hash prefix for single-key redeem scripts
pub const PREFIX_STANDARD: u8 = 0x21;
/// Program hash prefix for M-of-N redeem scripts
pub const PREFIX_MULTISIG: u8 = 0x12;
/// Program hash prefix for cross-chain redeem scripts
pub const PREFIX_CROSSCHAIN: u8 = 0x4B;

/// Address that burns funds sent to it; decodes to the all-zero program hash
pub const DESTROY_ADDRESS: &str = "0000000000000000000000000000000000";

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Hash256([u8; HASH256_LEN]);

/// Identifier of a registered asset
pub type AssetId = Hash256;
/// Identifier of a transaction
pub type TxId = Hash256;

impl Hash256 {
    pub const ZERO: Hash256 = Hash256([0u8; HASH256_LEN]);

    pub const fn new(bytes: [u8; HASH256_LEN]) -> Self {
        Self(bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> WalletResult<Self> {
        let array: [u8; HASH256_LEN] = bytes.try_into().map_err(|_| {
            WalletError::InvalidArgument(format!("Hash must be 32 bytes, got {}", bytes.len()))
        })?;
        Ok(Self(array))
    }

    pub fn as_bytes(&self) -> &[u8; HASH256_LEN] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; HASH256_LEN]
    }
}

impl fmt::Display for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut reversed = self.0;
        reversed.reverse();
        f.write_str(&hex::encode(reversed))
    }
}

impl fmt::Debug for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash256({self})")
    }
}

impl FromStr for Hash256 {
    type Err = WalletError;

    /// Parse the byte-reversed hex display form
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = hex::decode(s.trim())
            .map_err(|e| WalletError::InvalidArgument(format!("Invalid hash hex {s}: {e}")))?;
        bytes.reverse();
        Self::from_slice(&bytes)
    }
}

impl Serialize for Hash256 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Hash256 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Hash256::from_str(&s).map_err(de::Error::custom)
    }
}

/// 21 byte hash identifying the redeem script that controls an output
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProgramHash([u8; PROGRAM_HASH_LEN]);

impl Default for ProgramHash {
    fn default() -> Self {
        Self::ZERO
    }
}

impl ProgramHash {
    pub const ZERO: ProgramHash = ProgramHash([0u8; PROGRAM_HASH_LEN]);

    pub const fn new(bytes: [u8; PROGRAM_HASH_LEN]) -> Self {
        Self(bytes)
    }

    /// Program hash of a redeem script, prefixed according to its final opcode
    pub fn from_redeem_script(code: &[u8]) -> WalletResult<Self> {
        let prefix = match code.last() {
            Some(&crate::data_structures::script::CHECKSIG) => PREFIX_STANDARD,
            Some(&crate::data_structures::script::CHECKMULTISIG) => PREFIX_MULTISIG,
            Some(&crate::data_structures::script::CROSSCHAIN) => PREFIX_CROSSCHAIN,
            _ => {
                return Err(WalletError::InvalidProgram(format!(
                    "Unknown redeem script type: {}",
                    hex::encode(code)
                )))
            }
        };
        let mut bytes = [0u8; PROGRAM_HASH_LEN];
        bytes[0] = prefix;
        bytes[1..].copy_from_slice(&hash160(code));
        Ok(Self(bytes))
    }

    pub fn from_slice(bytes: &[u8]) -> WalletResult<Self> {
        let array: [u8; PROGRAM_HASH_LEN] = bytes.try_into().map_err(|_| {
            WalletError::InvalidArgument(format!(
                "Program hash must be 21 bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self(array))
    }

    /// Decode a Base58Check address
    pub fn from_address(address: &str) -> WalletResult<Self> {
        let decoded = bs58::decode(address)
            .into_vec()
            .map_err(|e| WalletError::InvalidAddress(format!("{address}: {e}")))?;
        if decoded.len() != PROGRAM_HASH_LEN + 4 {
            return Err(WalletError::InvalidAddress(format!(
                "{address}: decoded length {} is not {}",
                decoded.len(),
                PROGRAM_HASH_LEN + 4
            )));
        }
        let (body, checksum) = decoded.split_at(PROGRAM_HASH_LEN);
        if sha256d(body)[..4] != *checksum {
            return Err(WalletError::InvalidAddress(format!(
                "{address}: checksum mismatch"
            )));
        }
        match body[0] {
            PREFIX_STANDARD | PREFIX_MULTISIG | PREFIX_CROSSCHAIN => Self::from_slice(body),
            prefix => Err(WalletError::InvalidAddress(format!(
                "{address}: unknown prefix {prefix:#04x}"
            ))),
        }
    }

    pub fn to_address(&self) -> String {
        let mut data = self.0.to_vec();
        let checksum = sha256d(&self.0);
        data.extend_from_slice(&checksum[..4]);
        bs58::encode(data).into_string()
    }

    pub fn as_bytes(&self) -> &[u8; PROGRAM_HASH_LEN] {
        &self.0
    }

    pub fn prefix(&self) -> u8 {
        self.0[0]
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }
}

impl fmt::Display for ProgramHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_address())
    }
}

impl fmt::Debug for ProgramHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ProgramHash({})", hex::encode(self.0))
    }
}

impl FromStr for ProgramHash {
    type Err = WalletError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_address(s.trim())
    }
}

impl Serialize for ProgramHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_address())
    }
}

impl<'de> Deserialize<'de> for ProgramHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        ProgramHash::from_address(&s).map_err(de::Error::custom)
    }
}
