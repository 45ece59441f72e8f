//! Durable storage for the base fee.
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

use auto_impl::auto_impl;
use std::vec::Vec;

pub mod fee_store;
pub mod file;
pub mod memory;

pub use fee_store::{FeeStore, FeeStoreError, PersistedBaseFee};
pub use file::{FileKv, FileKvError};
pub use memory::InMemoryKv;
pub use primitives;

/// Key under which the base fee snapshot is stored.
pub const BASE_FEE_KEY: &[u8] = b"base_fee.json";

/// Error marker for store back ends.
pub trait StoreErrorMarker: core::error::Error + Send + Sync + 'static {}

impl StoreErrorMarker for core::convert::Infallible {}

/// Byte-oriented key-value store.
///
/// Both methods take `&self`: a store is shared between the block-processing path, which
/// reads it at startup, and the background writer.
#[auto_impl(&, Box, Arc)]
pub trait KeyValueStore {
    /// The store error type.
    type Error: StoreErrorMarker;

    /// Gets the value stored under `key`.
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, Self::Error>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set(&self, key: &[u8], value: &[u8]) -> Result<(), Self::Error>;
}
