//! Handle + spawn for one origin's batcher actor (spec §4.G).
//!
//! Follows the teacher corpus's `create_batch_builder`-style pattern: a
//! constructor returns a cheap, cloneable handle plus the `Future` the
//! caller is responsible for spawning.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::daymap::DayMapSource;
use crate::flush::FlushJob;
use crate::model::Origin;

use super::actor::{batcher_task, spawn_tick_generator};
use super::message::BatcherMsg;

/// Single-slot channel into one origin's batcher, per spec §4.G ("bounded
/// single-slot channel").
const BATCHER_CHANNEL_CAPACITY: usize = 1;

#[derive(Clone)]
pub struct BatcherHandle {
    tx: mpsc::Sender<BatcherMsg>,
}

impl BatcherHandle {
    /// Forward an ingress frame. `Err` means the batcher's channel is
    /// sealed (dead or torn down) — the dispatcher treats this the same as
    /// the entry being absent.
    pub async fn send(&self, msg: BatcherMsg) -> Result<(), BatcherMsg> {
        self.tx.send(msg).await.map_err(|e| e.0)
    }

    /// Whether this handle's batcher has torn down. The dispatcher checks
    /// this on lookup and lazily drops stale entries, per spec §4.G.
    pub fn is_sealed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Spawn a batcher for `origin`: starts both the actor loop and its tick
/// generator. Returns the handle and the actor's future — the caller
/// (dispatcher) spawns it onto the runtime.
pub fn create_batcher(
    origin: Origin,
    day_map_source: Arc<dyn DayMapSource>,
    batch_period: Duration,
    flush_tx: mpsc::Sender<FlushJob>,
) -> (BatcherHandle, impl Future<Output = ()>) {
    let (tx, rx) = mpsc::channel(BATCHER_CHANNEL_CAPACITY);
    spawn_tick_generator(tx.clone());

    let handle = BatcherHandle { tx };
    let task = batcher_task(origin, rx, day_map_source, batch_period, flush_tx);

    (handle, task)
}
