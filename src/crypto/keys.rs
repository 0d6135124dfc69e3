//! secp256r1 key wrappers
//!
//! Public keys travel in compressed SEC1 form (33 bytes) inside redeem
//! scripts; signatures are the 64 byte `r || s` encoding over SHA-256 of the
//! signed data.

use std::cmp::Ordering;
use std::fmt;

use p256::ecdsa::{
    signature::{Signer, Verifier},
    Signature, SigningKey, VerifyingKey,
};
use rand_core::OsRng;

use crate::errors::{WalletError, WalletResult};

pub const COMPRESSED_PUBLIC_KEY_LEN: usize = 33;
pub const SIGNATURE_LEN: usize = 64;

#[derive(Clone, PartialEq, Eq)]
pub struct PublicKey(VerifyingKey);

impl PublicKey {
    /// Parse a SEC1 encoded key (compressed or uncompressed)
    pub fn from_bytes(bytes: &[u8]) -> WalletResult<Self> {
        VerifyingKey::from_sec1_bytes(bytes)
            .map(Self)
            .map_err(|e| WalletError::InvalidArgument(format!("Invalid public key: {e}")))
    }

    pub fn from_hex(hex_str: &str) -> WalletResult<Self> {
        let bytes = hex::decode(hex_str.trim())
            .map_err(|e| WalletError::InvalidArgument(format!("Invalid public key hex: {e}")))?;
        Self::from_bytes(&bytes)
    }

    pub fn to_compressed(&self) -> [u8; COMPRESSED_PUBLIC_KEY_LEN] {
        let point = self.0.to_encoded_point(true);
        let mut out = [0u8; COMPRESSED_PUBLIC_KEY_LEN];
        out.copy_from_slice(point.as_bytes());
        out
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.to_compressed())
    }

    /// Uncompressed `X || Y`, the ordering key for multisig scripts
    fn coordinates(&self) -> Vec<u8> {
        self.0.to_encoded_point(false).as_bytes()[1..].to_vec()
    }

    /// Check a 64 byte signature over `data`
    pub fn verify(&self, data: &[u8], signature: &[u8]) -> bool {
        match Signature::from_slice(signature) {
            Ok(sig) => self.0.verify(data, &sig).is_ok(),
            Err(_) => false,
        }
    }
}

impl Ord for PublicKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.coordinates().cmp(&other.coordinates())
    }
}

impl PartialOrd for PublicKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self.to_hex())
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

#[derive(Clone)]
pub struct PrivateKey(SigningKey);

impl PrivateKey {
    pub fn random() -> Self {
        Self(SigningKey::random(&mut OsRng))
    }

    pub fn from_bytes(bytes: &[u8]) -> WalletResult<Self> {
        SigningKey::from_slice(bytes)
            .map(Self)
            .map_err(|e| WalletError::InvalidArgument(format!("Invalid private key: {e}")))
    }

    pub fn public_key(&self) -> PublicKey {
        PublicKey(VerifyingKey::from(&self.0))
    }

    pub fn sign(&self, data: &[u8]) -> Vec<u8> {
        let signature: Signature = self.0.sign(data);
        signature.to_bytes().to_vec()
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PrivateKey({})", self.public_key().to_hex())
    }
}
