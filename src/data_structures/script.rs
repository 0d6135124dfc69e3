//! Redeem scripts and signature parameters
//!
//! A standard redeem script pushes one compressed public key and ends in
//! `CHECKSIG`. A multisig script is `OP_M <key>... OP_N CHECKMULTISIG` with the
//! keys sorted by their uncompressed coordinates. Signature parameters are a
//! concatenation of `[64] || r || s` entries.

use std::fmt;

use crate::crypto::{PublicKey, COMPRESSED_PUBLIC_KEY_LEN, SIGNATURE_LEN};
use crate::data_structures::types::ProgramHash;
use crate::errors::{WalletError, WalletResult};

/// Pushes the number one; `OP_M` is `PUSH1 - 1 + M`
pub const PUSH1: u8 = 0x51;
pub const CHECKSIG: u8 = 0xAC;
pub const CHECKMULTISIG: u8 = 0xAE;
pub const CROSSCHAIN: u8 = 0xAF;

/// Push of a 33 byte compressed key
const PUSH_PUBLIC_KEY: u8 = COMPRESSED_PUBLIC_KEY_LEN as u8;
/// Length of a standard redeem script
pub const STANDARD_SCRIPT_LEN: usize = COMPRESSED_PUBLIC_KEY_LEN + 2;
/// Length of one signature entry in a parameter
pub const SIGNATURE_ENTRY_LEN: usize = SIGNATURE_LEN + 1;
/// Most keys a multisig script can carry with single-byte number pushes
pub const MAX_MULTISIG_KEYS: usize = 16;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScriptType {
    Standard,
    MultiSig,
    CrossChain,
}

impl ScriptType {
    /// Classify a redeem script by its final opcode
    pub fn of(code: &[u8]) -> WalletResult<Self> {
        match code.last() {
            Some(&CHECKSIG) if code.len() == STANDARD_SCRIPT_LEN => Ok(ScriptType::Standard),
            Some(&CHECKMULTISIG) => Ok(ScriptType::MultiSig),
            Some(&CROSSCHAIN) => Ok(ScriptType::CrossChain),
            _ => Err(WalletError::InvalidProgram(format!(
                "Unrecognised redeem script {}",
                hex::encode(code)
            ))),
        }
    }
}

pub fn create_standard_redeem_script(public_key: &PublicKey) -> Vec<u8> {
    let mut script = Vec::with_capacity(STANDARD_SCRIPT_LEN);
    script.push(PUSH_PUBLIC_KEY);
    script.extend_from_slice(&public_key.to_compressed());
    script.push(CHECKSIG);
    script
}

/// Build an M-of-N script; keys are sorted so every co-signer derives the same bytes
pub fn create_multisig_redeem_script(m: usize, public_keys: &[PublicKey]) -> WalletResult<Vec<u8>> {
    let n = public_keys.len();
    if m == 0 || m > n || n > MAX_MULTISIG_KEYS {
        return Err(WalletError::InvalidArgument(format!(
            "Invalid multisig parameters: {m} of {n}"
        )));
    }
    let mut keys = public_keys.to_vec();
    keys.sort();
    keys.dedup();
    if keys.len() != n {
        return Err(WalletError::InvalidArgument(
            "Multisig public keys must be distinct".to_string(),
        ));
    }

    let mut script = Vec::with_capacity(3 + n * (COMPRESSED_PUBLIC_KEY_LEN + 1));
    script.push(PUSH1 - 1 + m as u8);
    for key in &keys {
        script.push(PUSH_PUBLIC_KEY);
        script.extend_from_slice(&key.to_compressed());
    }
    script.push(PUSH1 - 1 + n as u8);
    script.push(CHECKMULTISIG);
    Ok(script)
}

/// Required signature count and public keys of a multisig script
pub fn parse_multisig_script(code: &[u8]) -> WalletResult<(usize, Vec<PublicKey>)> {
    let invalid = || WalletError::InvalidProgram(format!("Malformed multisig script {}", hex::encode(code)));
    if code.len() < 3 || code[code.len() - 1] != CHECKMULTISIG {
        return Err(invalid());
    }
    let m = code[0].checked_sub(PUSH1 - 1).ok_or_else(invalid)? as usize;
    let n = code[code.len() - 2].checked_sub(PUSH1 - 1).ok_or_else(invalid)? as usize;
    let body = &code[1..code.len() - 2];
    if m == 0 || m > n || body.len() != n * (COMPRESSED_PUBLIC_KEY_LEN + 1) {
        return Err(invalid());
    }

    let keys = body
        .chunks(COMPRESSED_PUBLIC_KEY_LEN + 1)
        .map(|chunk| {
            if chunk[0] != PUSH_PUBLIC_KEY {
                return Err(invalid());
            }
            PublicKey::from_bytes(&chunk[1..])
        })
        .collect::<WalletResult<Vec<_>>>()?;
    Ok((m, keys))
}

/// Public keys allowed to sign for a redeem script, in script order
pub fn signer_keys(code: &[u8]) -> WalletResult<Vec<PublicKey>> {
    match ScriptType::of(code)? {
        ScriptType::Standard => Ok(vec![PublicKey::from_bytes(&code[1..STANDARD_SCRIPT_LEN - 1])?]),
        ScriptType::MultiSig => Ok(parse_multisig_script(code)?.1),
        ScriptType::CrossChain => Err(WalletError::InvalidProgram(
            "Cross-chain scripts are not signed by wallet keys".to_string(),
        )),
    }
}

/// Program hashes of the standard accounts that may sign for a redeem script
pub fn signer_program_hashes(code: &[u8]) -> WalletResult<Vec<ProgramHash>> {
    signer_keys(code)?
        .iter()
        .map(|key| ProgramHash::from_redeem_script(&create_standard_redeem_script(key)))
        .collect()
}

/// Split a parameter into its raw 64 byte signatures
pub fn split_signatures(parameter: &[u8]) -> WalletResult<Vec<&[u8]>> {
    if parameter.len() % SIGNATURE_ENTRY_LEN != 0 {
        return Err(WalletError::InvalidProgram(format!(
            "Signature parameter length {} is not a multiple of {SIGNATURE_ENTRY_LEN}",
            parameter.len()
        )));
    }
    parameter
        .chunks(SIGNATURE_ENTRY_LEN)
        .map(|entry| {
            if entry[0] as usize != SIGNATURE_LEN {
                return Err(WalletError::InvalidProgram(format!(
                    "Signature entry has length byte {}",
                    entry[0]
                )));
            }
            Ok(&entry[1..])
        })
        .collect()
}

/// Length prefixed signature entry
pub fn signature_entry(signature: &[u8]) -> WalletResult<Vec<u8>> {
    if signature.len() != SIGNATURE_LEN {
        return Err(WalletError::SigningError(format!(
            "Signature must be {SIGNATURE_LEN} bytes, got {}",
            signature.len()
        )));
    }
    let mut entry = Vec::with_capacity(SIGNATURE_ENTRY_LEN);
    entry.push(SIGNATURE_LEN as u8);
    entry.extend_from_slice(signature);
    Ok(entry)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SignState {
    Unsigned,
    PartiallySigned,
    FullySigned,
}

/// Signatures present versus signatures required for one program
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SignStatus {
    pub have: usize,
    pub need: usize,
}

impl SignStatus {
    pub fn of(code: &[u8], parameter: &[u8]) -> WalletResult<Self> {
        let need = match ScriptType::of(code)? {
            ScriptType::Standard => 1,
            ScriptType::MultiSig => parse_multisig_script(code)?.0,
            ScriptType::CrossChain => {
                return Err(WalletError::InvalidProgram(
                    "Cross-chain scripts carry no signature status".to_string(),
                ))
            }
        };
        Ok(Self {
            have: parameter.len() / SIGNATURE_ENTRY_LEN,
            need,
        })
    }

    pub fn state(&self) -> SignState {
        if self.have == 0 {
            SignState::Unsigned
        } else if self.have < self.need {
            SignState::PartiallySigned
        } else {
            SignState::FullySigned
        }
    }

    pub fn is_complete(&self) -> bool {
        self.state() == SignState::FullySigned
    }
}

impl fmt::Display for SignStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.have, self.need)
    }
}
