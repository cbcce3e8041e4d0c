//! The two-phase flush writer (spec §4.F).

use std::collections::{HashMap, HashSet};

use futures::future::join_all;
use thiserror::Error;

use crate::batch::BatchState;
use crate::broker::ReplyOutcome;
use crate::daymap::Rollover;
use crate::model::{BucketKey, Kind, Origin};
use crate::naming;
use crate::pool::{Pool, PoolError, Stat};

/// Bucket objects roll to a new day-map epoch once they exceed this size.
pub const BUCKET_SIZE: u64 = 4 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum FlushError {
    #[error("store error: {0}")]
    Store(#[from] PoolError),

    /// Phase 2 found a `pending` entry with no corresponding base offset
    /// from Phase 1 — a programming error per spec §4.F Phase 2.
    #[error("missing extended base offset for bucket {epoch}:{bucket}")]
    MissingOffset { epoch: u64, bucket: u64 },
}

/// A finished batch, handed from a batcher to the flush writer.
pub struct FlushJob {
    pub origin: Origin,
    pub state: BatchState,
}

/// Run the full five-phase flush for one origin's finished batch.
///
/// The write lock is released before this function returns on every path,
/// including error paths — the result is computed first and the lock
/// released unconditionally, matching spec §5's "any panic inside the scope
/// must release the lock" by construction rather than by `Drop`, since
/// releasing is fallible and the caller must observe that failure.
pub async fn flush<P, R>(pool: &P, rollover: &R, job: FlushJob) -> Result<(), FlushError>
where
    P: Pool,
    R: Rollover,
{
    let lock_key = naming::write_lock_label(&job.origin);
    let lock = pool.exclusive_lock(&lock_key).await?;

    let result = run_phases(pool, &job.origin, job.state).await;

    // Phase 4 requires acks to be dispatched before the lock is released;
    // `run_phases` already drove replies before returning.
    lock.release().await?;

    let (max_simple_size, max_extended_size) = result?;

    if max_simple_size > BUCKET_SIZE {
        rollover.roll_over_simple(&job.origin).await;
    }
    if max_extended_size > BUCKET_SIZE {
        rollover.roll_over_extended(&job.origin).await;
    }

    Ok(())
}

/// Phases 1-4. Returns the largest post-write simple-object size and the
/// largest post-write extended-object size observed, as two independent
/// values for the Phase 5 rollover checks in the caller.
async fn run_phases<P: Pool>(
    pool: &P,
    origin: &Origin,
    mut state: BatchState,
) -> Result<(u64, u64), FlushError> {
    // Phase 1: extended pre-stat + append.
    let extended_buffers: HashMap<BucketKey, Vec<u8>> = state
        .extended_lanes()
        .map(|(key, bytes)| (*key, bytes.clone()))
        .collect();
    let extended_labels: HashMap<BucketKey, String> = extended_buffers
        .keys()
        .map(|key| (*key, naming::bucket_label(origin, key.1, key.0, Kind::Extended)))
        .collect();

    let stat_results = join_all(extended_labels.iter().map(|(key, label)| async move {
        let base_offset = match pool.stat(label).await? {
            Stat::Size(n) => n,
            Stat::NotFound => 0,
        };
        Ok::<_, PoolError>((*key, base_offset))
    }))
    .await
    .into_iter()
    .collect::<Result<Vec<_>, _>>()?;

    let base_offsets: HashMap<BucketKey, u64> = stat_results.into_iter().collect();

    join_all(extended_labels.iter().map(|(key, label)| {
        let bytes = &extended_buffers[key];
        async move { pool.append(label, bytes).await }
    }))
    .await
    .into_iter()
    .collect::<Result<Vec<_>, _>>()?;

    // Phase 2: offset patching.
    let mut simple_keys: HashSet<BucketKey> = state.simple_keys().copied().collect();
    simple_keys.extend(extended_buffers.keys().copied());

    let mut patched: HashMap<BucketKey, Vec<u8>> = HashMap::new();
    for key in &simple_keys {
        let mut buf = state.simple_buffer(key).cloned().unwrap_or_default();

        if let Some((offsets, _running_len)) = state.pending_for(key) {
            let base_offset = *base_offsets.get(key).ok_or(FlushError::MissingOffset {
                epoch: key.0,
                bucket: key.1,
            })?;
            for offset in offsets {
                buf.extend_from_slice(&offset.address.to_le_bytes());
                buf.extend_from_slice(&offset.time.to_le_bytes());
                buf.extend_from_slice(&(base_offset + offset.local_offset).to_le_bytes());
            }
        }

        patched.insert(*key, buf);
    }

    // Phase 3: simple write.
    let writes = patched.iter().map(|(key, bytes)| {
        let key_label = naming::bucket_label(origin, key.1, key.0, Kind::Simple);
        async move {
            pool.write_full(&key_label, bytes).await?;
            match pool.stat(&key_label).await? {
                Stat::Size(n) => Ok::<_, PoolError>(n),
                Stat::NotFound => Ok(bytes.len() as u64),
            }
        }
    });
    let sizes = join_all(writes)
        .await
        .into_iter()
        .collect::<Result<Vec<_>, _>>()?;
    let max_simple_size = sizes.into_iter().max().unwrap_or(0);

    let max_extended_size = base_offsets
        .iter()
        .map(|(key, base)| {
            let grown = state
                .pending_for(key)
                .map(|(_, running_len)| running_len)
                .unwrap_or(0);
            base + grown
        })
        .max()
        .unwrap_or(0);

    // Phase 4: acknowledge. Only after this does the caller release the lock.
    for reply in std::mem::take(&mut state.reply_handles) {
        reply.reply(ReplyOutcome::Success).await;
    }

    Ok((max_simple_size, max_extended_size))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broker::ReplyHandle;
    use async_trait::async_trait;
    use std::collections::HashMap as StdHashMap;
    use std::sync::Mutex;
    use tokio::sync::oneshot;

    struct FakeLock;

    #[async_trait]
    impl crate::pool::LockHandle for FakeLock {
        async fn release(self) -> Result<(), PoolError> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakePool {
        objects: Mutex<StdHashMap<String, Vec<u8>>>,
    }

    #[async_trait]
    impl Pool for FakePool {
        type Lock = FakeLock;

        async fn append(&self, key: &str, bytes: &[u8]) -> Result<u64, PoolError> {
            let mut objs = self.objects.lock().unwrap();
            let entry = objs.entry(key.to_string()).or_default();
            let offset = entry.len() as u64;
            entry.extend_from_slice(bytes);
            Ok(offset)
        }

        async fn write_full(&self, key: &str, bytes: &[u8]) -> Result<(), PoolError> {
            self.objects.lock().unwrap().insert(key.to_string(), bytes.to_vec());
            Ok(())
        }

        async fn stat(&self, key: &str) -> Result<Stat, PoolError> {
            match self.objects.lock().unwrap().get(key) {
                Some(v) => Ok(Stat::Size(v.len() as u64)),
                None => Ok(Stat::NotFound),
            }
        }

        async fn read_full(&self, key: &str) -> Result<Vec<u8>, PoolError> {
            self.objects
                .lock()
                .unwrap()
                .get(key)
                .cloned()
                .ok_or_else(|| PoolError::NotFound(key.to_string()))
        }

        async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, PoolError> {
            Ok(self
                .objects
                .lock()
                .unwrap()
                .keys()
                .filter(|k| k.starts_with(prefix))
                .cloned()
                .collect())
        }

        async fn exclusive_lock(&self, _key: &str) -> Result<Self::Lock, PoolError> {
            Ok(FakeLock)
        }
    }

    struct NoopRollover;

    #[async_trait]
    impl Rollover for NoopRollover {
        async fn roll_over_simple(&self, _origin: &Origin) {}
        async fn roll_over_extended(&self, _origin: &Origin) {}
    }

    struct OneshotReply(Option<oneshot::Sender<ReplyOutcome>>);

    #[async_trait]
    impl ReplyHandle for OneshotReply {
        async fn reply(mut self: Box<Self>, outcome: ReplyOutcome) {
            let _ = self.0.take().unwrap().send(outcome);
        }
    }

    #[tokio::test]
    async fn extended_offsets_patch_against_preexisting_size() {
        let pool = FakePool::default();
        let origin = Origin::raw("PONY::::::");
        let extended_key = naming::bucket_label(&origin, 0, 0, Kind::Extended);

        // Pre-existing extended object of size 100, per spec §8 scenario 5.
        pool.write_full(&extended_key, &vec![0u8; 100]).await.unwrap();

        let mut state = BatchState::new();
        state.append_extended(0, 0, 2, 1, &vec![0u8; 5]);
        state.append_extended(0, 0, 4, 1, &vec![0u8; 7]);

        let (tx, rx) = oneshot::channel();
        state.reply_handles.push(Box::new(OneshotReply(Some(tx))));

        let job = FlushJob { origin: origin.clone(), state };
        flush(&pool, &NoopRollover, job).await.unwrap();

        assert_eq!(rx.await.unwrap(), ReplyOutcome::Success);

        let simple_key = naming::bucket_label(&origin, 0, 0, Kind::Simple);
        let simple_bytes = pool.read_full(&simple_key).await.unwrap();
        assert_eq!(simple_bytes.len(), 48);

        let offset_1 = u64::from_le_bytes(simple_bytes[16..24].try_into().unwrap());
        let offset_2 = u64::from_le_bytes(simple_bytes[40..48].try_into().unwrap());
        assert_eq!(offset_1, 100);
        assert_eq!(offset_2, 105);

        let extended_bytes = pool.read_full(&extended_key).await.unwrap();
        assert_eq!(extended_bytes.len(), 100 + 8 + 5 + 8 + 7);
    }

    #[tokio::test]
    async fn lock_is_released_even_when_phase_fails() {
        struct FailingPool;

        #[async_trait]
        impl Pool for FailingPool {
            type Lock = FakeLock;

            async fn append(&self, _key: &str, _bytes: &[u8]) -> Result<u64, PoolError> {
                Err(PoolError::Backend("boom".into()))
            }
            async fn write_full(&self, _key: &str, _bytes: &[u8]) -> Result<(), PoolError> {
                Ok(())
            }
            async fn stat(&self, _key: &str) -> Result<Stat, PoolError> {
                Ok(Stat::NotFound)
            }
            async fn read_full(&self, _key: &str) -> Result<Vec<u8>, PoolError> {
                Err(PoolError::NotFound("x".into()))
            }
            async fn list_keys(&self, _prefix: &str) -> Result<Vec<String>, PoolError> {
                Ok(vec![])
            }
            async fn exclusive_lock(&self, _key: &str) -> Result<Self::Lock, PoolError> {
                Ok(FakeLock)
            }
        }

        let pool = FailingPool;
        let origin = Origin::raw("PONY::::::");
        let mut state = BatchState::new();
        state.append_extended(0, 0, 2, 1, &vec![0u8; 5]);

        let job = FlushJob { origin, state };
        let result = flush(&pool, &NoopRollover, job).await;
        assert!(matches!(result, Err(FlushError::Store(_))));
    }
}
