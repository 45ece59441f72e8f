//! EIP-1559 style base fee for a Cosmos-SDK style mempool.
//!
//! [EipState] follows block gas usage and moves the base fee toward the configured target
//! gas, one bounded step per block. The fee is persisted in the background through a
//! [FeeStore] so a restarted node resumes from where it stopped.
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

pub mod admission;
pub mod config;
pub mod error;
pub mod persist;
pub mod reader;
pub mod state;
pub mod tx;

pub use admission::{CheckMode, InsufficientFee, MempoolFeeChecker};
pub use config::{ConfigError, FeeMarketConfig};
pub use error::FeeMarketError;
pub use persist::{BaseFeePersister, WriteProgress};
pub use reader::BaseFeeReader;
pub use state::{compute_next_base_fee, EipState};
pub use tx::{BlockContext, FeeTx, TxFee};

pub use primitives::{self, Dec};
pub use store::{self, FeeStore, FeeStoreError, FileKv, InMemoryKv, KeyValueStore};
