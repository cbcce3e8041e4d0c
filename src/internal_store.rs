//! Address-keyed bookkeeping store over the same object backend (spec §4.H).
//!
//! Unlike points, which are first-write-wins, entries here are last-write-wins:
//! every write is a `write_full` to a fixed per-address key, so overwrite
//! semantics fall out of the store for free.

use crate::model::{Kind, Origin};
use crate::naming;
use crate::pool::{Pool, PoolError, PoolResult, Stat};

pub struct InternalKv<'a, P: Pool> {
    pool: &'a P,
}

impl<'a, P: Pool> InternalKv<'a, P> {
    pub fn new(pool: &'a P) -> Self {
        Self { pool }
    }

    /// Write `bytes` under `address`: a 24-byte simple-shaped header record
    /// plus an extended object holding the length-prefixed payload.
    pub async fn write_to(&self, origin: &Origin, address: u64, bytes: &[u8]) -> PoolResult<()> {
        let simple_key = naming::internal_label(origin, address, Kind::Simple);
        let mut header = [0u8; 24];
        header[0..8].copy_from_slice(&address.to_le_bytes());
        // time = 0
        header[16..24].copy_from_slice(&(bytes.len() as u64).to_le_bytes());
        self.pool.write_full(&simple_key, &header).await?;

        let extended_key = naming::internal_label(origin, address, Kind::Extended);
        let mut payload = Vec::with_capacity(8 + bytes.len());
        payload.extend_from_slice(&(bytes.len() as u64).to_le_bytes());
        payload.extend_from_slice(bytes);
        self.pool.write_full(&extended_key, &payload).await?;

        Ok(())
    }

    /// Read the payload stored under `address`, stripping the 8-byte length
    /// prefix, or `None` if nothing has been written there.
    pub async fn read_from(&self, origin: &Origin, address: u64) -> PoolResult<Option<Vec<u8>>> {
        let extended_key = naming::internal_label(origin, address, Kind::Extended);
        match self.pool.read_full(&extended_key).await {
            Ok(bytes) if bytes.len() >= 8 => Ok(Some(bytes[8..].to_vec())),
            Ok(_) => Ok(Some(Vec::new())),
            Err(PoolError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Every live `(address, bytes)` pair under `origin`, sorted by address.
    /// Last-write-wins falls out of `write_full`'s overwrite semantics — each
    /// address has at most one current object, so this enumerates addresses
    /// once each, not per-write.
    pub async fn enumerate_origin(&self, origin: &Origin) -> PoolResult<Vec<(u64, Vec<u8>)>> {
        let prefix = naming::internal_prefix(origin);
        let keys = self.pool.list_keys(&prefix).await?;

        let mut addresses: Vec<u64> = keys
            .iter()
            .filter_map(|key| parse_internal_address(&prefix, key))
            .collect();
        addresses.sort_unstable();
        addresses.dedup();

        let mut out = Vec::with_capacity(addresses.len());
        for address in addresses {
            if let Some(bytes) = self.read_from(origin, address).await? {
                out.push((address, bytes));
            }
        }
        Ok(out)
    }
}

/// Parse the `{address:020}` segment out of an internal-KV key of the form
/// `{prefix}{address:020}_{0:020}_{simple|extended}`.
fn parse_internal_address(prefix: &str, key: &str) -> Option<u64> {
    let rest = key.strip_prefix(prefix)?;
    let address_str = rest.split('_').next()?;
    address_str.parse::<u64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakePool {
        objects: Mutex<HashMap<String, Vec<u8>>>,
    }

    struct FakeLock;

    #[async_trait]
    impl crate::pool::LockHandle for FakeLock {
        async fn release(self) -> PoolResult<()> {
            Ok(())
        }
    }

    #[async_trait]
    impl Pool for FakePool {
        type Lock = FakeLock;

        async fn append(&self, key: &str, bytes: &[u8]) -> PoolResult<u64> {
            let mut objs = self.objects.lock().unwrap();
            let entry = objs.entry(key.to_string()).or_default();
            let offset = entry.len() as u64;
            entry.extend_from_slice(bytes);
            Ok(offset)
        }

        async fn write_full(&self, key: &str, bytes: &[u8]) -> PoolResult<()> {
            self.objects.lock().unwrap().insert(key.to_string(), bytes.to_vec());
            Ok(())
        }

        async fn stat(&self, key: &str) -> PoolResult<Stat> {
            match self.objects.lock().unwrap().get(key) {
                Some(v) => Ok(Stat::Size(v.len() as u64)),
                None => Ok(Stat::NotFound),
            }
        }

        async fn read_full(&self, key: &str) -> PoolResult<Vec<u8>> {
            self.objects
                .lock()
                .unwrap()
                .get(key)
                .cloned()
                .ok_or_else(|| PoolError::NotFound(key.to_string()))
        }

        async fn list_keys(&self, prefix: &str) -> PoolResult<Vec<String>> {
            Ok(self
                .objects
                .lock()
                .unwrap()
                .keys()
                .filter(|k| k.starts_with(prefix))
                .cloned()
                .collect())
        }

        async fn exclusive_lock(&self, _key: &str) -> PoolResult<Self::Lock> {
            Ok(FakeLock)
        }
    }

    #[tokio::test]
    async fn write_then_read_round_trips() {
        let pool = FakePool::default();
        let kv = InternalKv::new(&pool);
        let origin = Origin::raw("PONY::::::");

        kv.write_to(&origin, 4, b"Hai").await.unwrap();
        let bytes = kv.read_from(&origin, 4).await.unwrap().unwrap();
        assert_eq!(bytes, b"Hai");
    }

    #[tokio::test]
    async fn internal_simple_bucket_matches_spec_test_vector() {
        let pool = FakePool::default();
        let kv = InternalKv::new(&pool);
        let origin = Origin::raw("PONY::::::");
        kv.write_to(&origin, 4, b"Hai").await.unwrap();

        let key = naming::internal_label(&origin, 4, Kind::Simple);
        let bytes = pool.read_full(&key).await.unwrap();
        assert_eq!(
            bytes,
            vec![4, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 3, 0, 0, 0, 0, 0, 0, 0]
        );
    }

    #[tokio::test]
    async fn internal_extended_bucket_matches_spec_test_vector() {
        let pool = FakePool::default();
        let kv = InternalKv::new(&pool);
        let origin = Origin::raw("PONY::::::");
        kv.write_to(&origin, 4, b"Hai").await.unwrap();

        let key = naming::internal_label(&origin, 4, Kind::Extended);
        let bytes = pool.read_full(&key).await.unwrap();
        assert_eq!(bytes, vec![3, 0, 0, 0, 0, 0, 0, 0, 0x48, 0x61, 0x69]);
    }

    #[tokio::test]
    async fn enumerate_origin_sorts_and_dedups_by_address() {
        let pool = FakePool::default();
        let kv = InternalKv::new(&pool);
        let origin = Origin::raw("PONY::::::");

        kv.write_to(&origin, 128, b"Hai1").await.unwrap();
        kv.write_to(&origin, 0, b"Hai2").await.unwrap();
        kv.write_to(&origin, 128, b"Hai3").await.unwrap();

        let entries = kv.enumerate_origin(&origin).await.unwrap();
        assert_eq!(
            entries,
            vec![(0, b"Hai2".to_vec()), (128, b"Hai3".to_vec())]
        );
    }

    #[tokio::test]
    async fn read_from_missing_address_is_none() {
        let pool = FakePool::default();
        let kv = InternalKv::new(&pool);
        let origin = Origin::raw("PONY::::::");
        assert!(kv.read_from(&origin, 999).await.unwrap().is_none());
    }
}
