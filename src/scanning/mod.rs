//! Chain data sync: replaying node blocks into the local UTXO store

pub mod chain_client;
pub mod data_sync;
#[cfg(feature = "http")]
pub mod http_client;
pub mod mocks;

pub use chain_client::{BlockInfo, ChainClient, InputInfo, OutputInfo, TransactionInfo};
pub use data_sync::{ChainDataSync, ChainSync, SyncReport, COINBASE_MATURITY};
#[cfg(feature = "http")]
pub use http_client::HttpChainClient;
pub use mocks::{MockChainClient, MockChainFailureModes, MockTransaction};
