//! Hex file handoff of unsigned and partially signed transactions
//!
//! Co-signers exchange transactions as files holding the hex of the full
//! serialization. The file name reflects how far signing has progressed:
//! `to_be_signed.txn`, `to_be_signed_<have>_of_<need>.txn` or `ready_to_send.txn`.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::data_structures::{script::SignStatus, transaction::Transaction};
use crate::errors::{WalletError, WalletResult};

pub const TRANSACTION_FILE_EXTENSION: &str = "txn";

/// File name for a transaction with the given signing progress
pub fn transaction_file_name(status: SignStatus) -> String {
    let stem = if status.have == 0 {
        "to_be_signed".to_string()
    } else if status.need > status.have {
        format!("to_be_signed_{}_of_{}", status.have, status.need)
    } else {
        "ready_to_send".to_string()
    };
    format!("{stem}.{TRANSACTION_FILE_EXTENSION}")
}

/// Write the transaction's hex into `directory`, named after its signing progress
pub fn write_transaction_file(directory: &Path, transaction: &Transaction) -> WalletResult<PathBuf> {
    let status = transaction.sign_status()?;
    let path = directory.join(transaction_file_name(status));
    std::fs::write(&path, transaction.to_hex())?;
    debug!(path = %path.display(), %status, "Wrote transaction file");
    Ok(path)
}

/// Read a transaction file: trimmed, non-empty hex of a full serialization
pub fn read_transaction_file(path: &Path) -> WalletResult<Transaction> {
    let content = std::fs::read_to_string(path)?;
    let content = content.trim();
    if content.is_empty() {
        return Err(WalletError::InvalidArgument(format!(
            "Transaction file {} is empty",
            path.display()
        )));
    }
    Ok(Transaction::from_hex(content)?)
}
