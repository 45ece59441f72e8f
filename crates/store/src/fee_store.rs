//! JSON record of the base fee on top of a key-value store.
use crate::{KeyValueStore, StoreErrorMarker, BASE_FEE_KEY};
use primitives::Dec;
use serde::{Deserialize, Serialize};
use std::vec::Vec;

/// Errors returned by [FeeStore].
#[derive(Debug, thiserror::Error)]
pub enum FeeStoreError<E: StoreErrorMarker> {
    /// The underlying key-value store failed.
    #[error("base fee store backend: {0}")]
    Backend(#[source] E),
    /// The stored bytes are not a valid base fee record.
    #[error("base fee record codec: {0}")]
    Codec(#[from] serde_json::Error),
}

/// On-disk form of the base fee.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedBaseFee {
    /// The base fee at the time of the write.
    pub base_fee: Dec,
}

/// Base fee persistence on top of a [KeyValueStore].
///
/// Owns the key the fee lives under. Only the fee market writes to that key.
#[derive(Debug)]
pub struct FeeStore<KV> {
    kv: KV,
    key: Vec<u8>,
}

impl<KV: KeyValueStore> FeeStore<KV> {
    /// Creates a fee store using [BASE_FEE_KEY].
    pub fn new(kv: KV) -> Self {
        Self::with_key(kv, BASE_FEE_KEY)
    }

    /// Creates a fee store under a custom key, e.g. to keep several chains in one store.
    pub fn with_key(kv: KV, key: impl Into<Vec<u8>>) -> Self {
        Self {
            kv,
            key: key.into(),
        }
    }

    /// The key the base fee is stored under.
    pub fn key(&self) -> &[u8] {
        &self.key
    }

    /// The underlying key-value store.
    pub fn kv(&self) -> &KV {
        &self.kv
    }

    /// Writes `base_fee`, replacing the previous value.
    pub fn save(&self, base_fee: Dec) -> Result<(), FeeStoreError<KV::Error>> {
        let bytes = serde_json::to_vec(&PersistedBaseFee { base_fee })?;
        self.kv
            .set(&self.key, &bytes)
            .map_err(FeeStoreError::Backend)
    }

    /// Reads the persisted base fee. `None` if nothing was ever written.
    pub fn load(&self) -> Result<Option<Dec>, FeeStoreError<KV::Error>> {
        let Some(bytes) = self.kv.get(&self.key).map_err(FeeStoreError::Backend)? else {
            return Ok(None);
        };
        let record: PersistedBaseFee = serde_json::from_slice(&bytes)?;
        Ok(Some(record.base_fee))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FileKv, InMemoryKv};

    #[test]
    fn empty_store_loads_none() {
        let store = FeeStore::new(InMemoryKv::new());
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn save_then_load() {
        let store = FeeStore::new(InMemoryKv::new());
        let fee: Dec = "0.0265625".parse().unwrap();
        store.save(fee).unwrap();
        assert_eq!(store.load().unwrap(), Some(fee));
        // repeated loads see the same value
        assert_eq!(store.load().unwrap(), Some(fee));
    }

    #[test]
    fn record_is_json() {
        let store = FeeStore::new(InMemoryKv::new());
        store.save("0.006".parse().unwrap()).unwrap();
        let bytes = store.kv().get(BASE_FEE_KEY).unwrap().unwrap();
        assert_eq!(bytes, br#"{"base_fee":"0.006000000000000000"}"#.to_vec());
    }

    #[test]
    fn keys_are_independent() {
        let kv = InMemoryKv::new();
        let chain_a = FeeStore::with_key(&kv, "chain-a.json");
        let chain_b = FeeStore::with_key(&kv, "chain-b.json");
        chain_a.save(Dec::ONE).unwrap();
        assert_eq!(chain_b.load().unwrap(), None);
        assert_eq!(chain_a.load().unwrap(), Some(Dec::ONE));
    }

    #[test]
    fn corrupt_record_is_codec_error() {
        let kv = InMemoryKv::new();
        kv.set(BASE_FEE_KEY, b"not json").unwrap();
        let store = FeeStore::new(kv);
        assert!(matches!(store.load(), Err(FeeStoreError::Codec(_))));
    }

    #[test]
    fn file_backend_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let fee: Dec = "7.123456789012345678".parse().unwrap();
        FeeStore::new(FileKv::open(dir.path()).unwrap())
            .save(fee)
            .unwrap();

        let reopened = FeeStore::new(FileKv::open(dir.path()).unwrap());
        assert_eq!(reopened.load().unwrap(), Some(fee));
    }

    #[test]
    fn backend_error_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let store = FeeStore::with_key(FileKv::open(dir.path()).unwrap(), "../escape");
        assert!(matches!(store.load(), Err(FeeStoreError::Backend(_))));
    }
}
