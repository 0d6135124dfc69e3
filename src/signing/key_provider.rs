//! Key access for signing
//!
//! The signer only ever asks for a public key and a signature, so keystores,
//! hardware devices and in-memory keys can all sit behind [`KeyProvider`].

use crate::{
    crypto::{PrivateKey, PublicKey},
    data_structures::{
        script::create_standard_redeem_script, transaction::Transaction, types::ProgramHash,
    },
    errors::WalletResult,
};

pub trait KeyProvider: Send + Sync {
    fn public_key(&self) -> PublicKey;

    /// Sign arbitrary bytes, returning a 64 byte `r || s` signature
    fn sign(&self, data: &[u8]) -> WalletResult<Vec<u8>>;

    /// Program hash of this key's standard account
    fn program_hash(&self) -> WalletResult<ProgramHash> {
        ProgramHash::from_redeem_script(&create_standard_redeem_script(&self.public_key()))
    }

    /// Signature over the transaction's unsigned serialization
    fn sign_transaction(&self, transaction: &Transaction) -> WalletResult<Vec<u8>> {
        self.sign(&transaction.serialize_unsigned())
    }
}

/// A standard account backed by a private key held in memory
#[derive(Clone, Debug)]
pub struct Account {
    private_key: PrivateKey,
}

impl Account {
    pub fn new(private_key: PrivateKey) -> Self {
        Self { private_key }
    }

    pub fn random() -> Self {
        Self::new(PrivateKey::random())
    }

    pub fn from_bytes(bytes: &[u8]) -> WalletResult<Self> {
        PrivateKey::from_bytes(bytes).map(Self::new)
    }

    pub fn redeem_script(&self) -> Vec<u8> {
        create_standard_redeem_script(&self.private_key.public_key())
    }

    pub fn address(&self) -> WalletResult<String> {
        Ok(self.program_hash()?.to_address())
    }
}

impl KeyProvider for Account {
    fn public_key(&self) -> PublicKey {
        self.private_key.public_key()
    }

    fn sign(&self, data: &[u8]) -> WalletResult<Vec<u8>> {
        Ok(self.private_key.sign(data))
    }
}
