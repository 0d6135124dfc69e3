use serde::{Deserialize, Serialize};

/// Kind of account an address belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccountType {
    /// The wallet's own key
    Master = 0,
    /// A single-key account added by public key
    Standard = 1,
    /// An M-of-N account
    MultiSig = 2,
}

impl AccountType {
    pub fn name(&self) -> &'static str {
        match self {
            AccountType::Master => "MASTER",
            AccountType::Standard => "STANDARD",
            AccountType::MultiSig => "MULTI",
        }
    }
}

impl From<u32> for AccountType {
    fn from(value: u32) -> Self {
        match value {
            0 => AccountType::Master,
            2 => AccountType::MultiSig,
            _ => AccountType::Standard,
        }
    }
}

impl From<AccountType> for u32 {
    fn from(account_type: AccountType) -> Self {
        account_type as u32
    }
}
