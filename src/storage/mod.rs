//! Storage abstraction layer for the wallet's UTXO set
//!
//! This module provides a trait-based store so the transaction builder and
//! chain data sync can run against memory in tests and SQLite in production,
//! plus the hex file handoff used between co-signers.

pub mod account_type;
pub mod memory;
#[cfg(feature = "storage")]
pub mod sqlite;
pub mod storage_trait;
pub mod stored_output;
pub mod transaction_file;

pub use account_type::*;
pub use memory::*;
#[cfg(feature = "storage")]
pub use sqlite::*;
pub use storage_trait::*;
pub use stored_output::*;
pub use transaction_file::*;
