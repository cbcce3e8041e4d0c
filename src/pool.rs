//! Abstract external object-store backend (spec §4.B).
//!
//! `Pool` is the boundary between the batching/flush logic and whatever
//! distributed append-only store actually holds bucket objects. Production
//! deployments plug in a real backend; tests plug in an in-memory fake.

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PoolError {
    #[error("object not found: {0}")]
    NotFound(String),

    #[error("lock held by another writer: {0}")]
    LockContended(String),

    #[error("backend error: {0}")]
    Backend(String),
}

pub type PoolResult<T> = Result<T, PoolError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stat {
    Size(u64),
    NotFound,
}

/// A held exclusive lock on a key. Dropping without calling `release` is a
/// logic error in callers — the lock type carries no Drop-based release
/// because releasing is fallible and callers must observe the error.
#[async_trait]
pub trait LockHandle: Send + Sized {
    async fn release(self) -> PoolResult<()>;
}

/// The append-only object backend. Every key is an opaque string produced by
/// [`crate::naming`].
#[async_trait]
pub trait Pool: Send + Sync {
    type Lock: LockHandle;

    /// Append `bytes` to the object at `key`, creating it if absent. Returns
    /// the byte offset at which `bytes` begins.
    async fn append(&self, key: &str, bytes: &[u8]) -> PoolResult<u64>;

    /// Overwrite the full contents of `key`.
    async fn write_full(&self, key: &str, bytes: &[u8]) -> PoolResult<()>;

    /// Current size of the object at `key`, or `Stat::NotFound`.
    async fn stat(&self, key: &str) -> PoolResult<Stat>;

    /// Read the full contents of `key`.
    async fn read_full(&self, key: &str) -> PoolResult<Vec<u8>>;

    /// List every key under `prefix`. Added to complete the abstract
    /// interface for origin enumeration — not a literal spec primitive, but
    /// required to implement it.
    async fn list_keys(&self, prefix: &str) -> PoolResult<Vec<String>>;

    /// Take an exclusive lock on `key`, blocking concurrent writers.
    async fn exclusive_lock(&self, key: &str) -> PoolResult<Self::Lock>;
}
