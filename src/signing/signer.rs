//! Adds signatures to the first program of a transaction
//!
//! Standard programs hold a single signature that is replaced on every call.
//! Multisig programs collect signatures ordered by the signer's position in
//! the redeem script until M of them are present. A failed attempt never
//! changes the transaction.

use tracing::{debug, info};

use crate::{
    data_structures::{
        script::{
            signature_entry, signer_keys, signer_program_hashes, split_signatures, ScriptType,
            SignStatus,
        },
        transaction::Transaction,
        types::ProgramHash,
    },
    errors::{WalletError, WalletResult},
};

use super::key_provider::KeyProvider;

/// Sign `transaction` with `key_provider`, returning the resulting progress
pub fn sign_transaction(
    transaction: &mut Transaction,
    key_provider: &dyn KeyProvider,
) -> WalletResult<SignStatus> {
    let code = transaction
        .programs
        .first()
        .map(|program| program.code.clone())
        .ok_or_else(|| WalletError::InvalidProgram("Transaction has no programs".to_string()))?;

    let parameter = match ScriptType::of(&code)? {
        ScriptType::Standard => sign_standard(transaction, &code, key_provider)?,
        ScriptType::MultiSig => sign_multisig(transaction, &code, key_provider)?,
        ScriptType::CrossChain => {
            return Err(WalletError::InvalidProgram(
                "Cross-chain programs are not signed by the wallet".to_string(),
            ))
        }
    };

    transaction.programs[0].parameter = parameter;
    let status = transaction.sign_status()?;
    info!(tx = %transaction.hash(), progress = %status, "Signed transaction");
    Ok(status)
}

fn sign_standard(
    transaction: &Transaction,
    code: &[u8],
    key_provider: &dyn KeyProvider,
) -> WalletResult<Vec<u8>> {
    let signer = ProgramHash::from_redeem_script(code)?;
    let caller = key_provider.program_hash()?;
    if signer != caller {
        return Err(WalletError::NotASigner(format!(
            "{} cannot sign for {}",
            caller.to_address(),
            signer.to_address()
        )));
    }
    let signature = key_provider.sign_transaction(transaction)?;
    signature_entry(&signature)
}

fn sign_multisig(
    transaction: &Transaction,
    code: &[u8],
    key_provider: &dyn KeyProvider,
) -> WalletResult<Vec<u8>> {
    let parameter = &transaction.programs[0].parameter;
    let status = SignStatus::of(code, parameter)?;
    if status.is_complete() {
        return Err(WalletError::AlreadyFullySigned {
            have: status.have,
            need: status.need,
        });
    }

    let caller = key_provider.program_hash()?;
    let signer_index = signer_program_hashes(code)?
        .iter()
        .position(|hash| *hash == caller)
        .ok_or_else(|| {
            WalletError::NotASigner(format!(
                "{} is not one of the co-signers",
                caller.to_address()
            ))
        })?;

    // Place existing signatures by the key that produced them
    let keys = signer_keys(code)?;
    let data = transaction.serialize_unsigned();
    let mut signatures: Vec<(usize, Vec<u8>)> = Vec::new();
    for signature in split_signatures(parameter)? {
        let index = keys
            .iter()
            .position(|key| key.verify(&data, signature))
            .ok_or_else(|| {
                WalletError::InvalidProgram(
                    "Existing signature does not match any co-signer".to_string(),
                )
            })?;
        if index == signer_index {
            return Err(WalletError::AlreadySigned(caller.to_address()));
        }
        signatures.push((index, signature_entry(signature)?));
    }

    let signature = key_provider.sign(&data)?;
    signatures.push((signer_index, signature_entry(&signature)?));
    signatures.sort_by_key(|(index, _)| *index);
    debug!(signer_index, have = signatures.len(), need = status.need, "Added co-signature");

    Ok(signatures.into_iter().flat_map(|(_, entry)| entry).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_structures::{
        script::{create_multisig_redeem_script, SignState},
        transaction::{Payload, Program},
    };
    use crate::signing::key_provider::Account;

    fn unsigned(code: Vec<u8>) -> Transaction {
        let mut transaction = Transaction::new(Payload::Transfer);
        transaction.programs.push(Program::unsigned(code));
        transaction
    }

    #[test]
    fn test_standard_sign_and_resign_overwrites() {
        let account = Account::random();
        let mut transaction = unsigned(account.redeem_script());

        let status = sign_transaction(&mut transaction, &account).unwrap();
        assert_eq!(status, SignStatus { have: 1, need: 1 });
        assert_eq!(transaction.programs[0].parameter.len(), 65);

        let status = sign_transaction(&mut transaction, &account).unwrap();
        assert_eq!(status.have, 1);
        let signature = &transaction.programs[0].parameter[1..];
        assert!(account
            .public_key()
            .verify(&transaction.serialize_unsigned(), signature));
    }

    #[test]
    fn test_standard_wrong_key_leaves_parameter() {
        let owner = Account::random();
        let mut transaction = unsigned(owner.redeem_script());
        sign_transaction(&mut transaction, &owner).unwrap();
        let before = transaction.programs[0].parameter.clone();

        let err = sign_transaction(&mut transaction, &Account::random()).unwrap_err();
        assert!(matches!(err, WalletError::NotASigner(_)));
        assert_eq!(transaction.programs[0].parameter, before);
    }

    #[test]
    fn test_multisig_orders_signatures_by_signer_index() {
        let accounts: Vec<Account> = (0..3).map(|_| Account::random()).collect();
        let keys: Vec<_> = accounts.iter().map(|a| a.public_key()).collect();
        let code = create_multisig_redeem_script(3, &keys).unwrap();
        let ordered = signer_keys(&code).unwrap();
        let mut transaction = unsigned(code);

        for account in accounts.iter().rev() {
            sign_transaction(&mut transaction, account).unwrap();
        }
        assert_eq!(transaction.sign_status().unwrap().state(), SignState::FullySigned);

        let data = transaction.serialize_unsigned();
        let signatures = split_signatures(&transaction.programs[0].parameter).unwrap();
        for (key, signature) in ordered.iter().zip(signatures) {
            assert!(key.verify(&data, signature));
        }
    }

    #[test]
    fn test_multisig_same_signer_twice_rejected() {
        let accounts: Vec<Account> = (0..3).map(|_| Account::random()).collect();
        let keys: Vec<_> = accounts.iter().map(|a| a.public_key()).collect();
        let mut transaction = unsigned(create_multisig_redeem_script(2, &keys).unwrap());

        sign_transaction(&mut transaction, &accounts[1]).unwrap();
        let before = transaction.programs[0].parameter.clone();
        let err = sign_transaction(&mut transaction, &accounts[1]).unwrap_err();
        assert!(matches!(err, WalletError::AlreadySigned(_)));
        assert_eq!(transaction.programs[0].parameter, before);
    }

    #[test]
    fn test_cross_chain_program_cannot_be_signed() {
        let mut transaction = unsigned(vec![0x21, 0xAF]);
        assert!(matches!(
            sign_transaction(&mut transaction, &Account::random()),
            Err(WalletError::InvalidProgram(_))
        ));
    }
}
