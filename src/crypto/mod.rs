//! Hashing and secp256r1 key primitives

pub mod hashing;
pub mod keys;

pub use hashing::{hash160, sha256, sha256d};
pub use keys::{PrivateKey, PublicKey, COMPRESSED_PUBLIC_KEY_LEN, SIGNATURE_LEN};
