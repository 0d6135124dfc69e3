//! Error types for the sidechain wallet libraries
//!
//! Every fallible operation in the crate returns [`WalletResult`]. None of the
//! errors are retried internally; they are terminal to the operation that
//! raised them.

use thiserror::Error;

/// Result alias used throughout the crate
pub type WalletResult<T> = Result<T, WalletError>;

/// Errors raised while encoding or decoding wire data
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SerializationError {
    #[error("Unexpected end of data while reading {0}")]
    UnexpectedEof(String),
    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
    #[error("Unknown transaction type: {0:#04x}")]
    UnknownTransactionType(u8),
    #[error("Trailing bytes after transaction: {0}")]
    TrailingBytes(usize),
    #[error("Hex decoding error: {0}")]
    HexDecodingError(String),
    #[error("JSON serialization error: {0}")]
    JsonSerializationError(String),
    #[error("JSON deserialization error: {0}")]
    JsonDeserializationError(String),
}

impl From<hex::FromHexError> for SerializationError {
    fn from(err: hex::FromHexError) -> Self {
        SerializationError::HexDecodingError(err.to_string())
    }
}

/// Top level wallet error
#[derive(Debug, Error)]
pub enum WalletError {
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Invalid asset id: {0}")]
    InvalidAssetId(String),

    #[error("Asset mismatch: expected {expected}, found {found}")]
    AssetMismatch { expected: String, found: String },

    #[error("Insufficient funds for asset {asset_id}: required {required}, available {available}")]
    InsufficientFunds {
        asset_id: String,
        required: String,
        available: String,
    },

    #[error("Not a signer of this transaction: {0}")]
    NotASigner(String),

    #[error("Transaction is already fully signed ({have}/{need})")]
    AlreadyFullySigned { have: usize, need: usize },

    #[error("Signer {0} has already signed this transaction")]
    AlreadySigned(String),

    #[error("UTXO store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Chain data sync failed: {0}")]
    SyncFailed(String),

    #[error("Node request failed: {0}")]
    NetworkError(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Amount overflow: {0}")]
    AmountOverflow(String),

    #[error("Invalid program: {0}")]
    InvalidProgram(String),

    #[error("Signing error: {0}")]
    SigningError(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] SerializationError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl WalletError {
    /// Shorthand for an [`WalletError::AssetMismatch`] built from displayable values
    pub fn asset_mismatch(expected: impl ToString, found: impl ToString) -> Self {
        WalletError::AssetMismatch {
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }
}

impl From<serde_json::Error> for WalletError {
    fn from(err: serde_json::Error) -> Self {
        WalletError::SerializationError(SerializationError::JsonDeserializationError(
            err.to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_funds_message_names_asset() {
        let err = WalletError::InsufficientFunds {
            asset_id: "abcd".to_string(),
            required: "2.6".to_string(),
            available: "1".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("abcd"));
        assert!(msg.contains("2.6"));
    }

    #[test]
    fn test_serialization_error_converts() {
        let err: WalletError = SerializationError::TrailingBytes(3).into();
        assert!(matches!(err, WalletError::SerializationError(_)));
    }
}
