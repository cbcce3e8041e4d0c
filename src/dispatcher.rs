//! Process-wide dispatcher actor (spec §4.G).
//!
//! Owns the `origin -> batcher` table and routes each ingress frame to the
//! right batcher, spawning one on demand. A single actor serializes routing
//! decisions — no other code touches the table.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::error;

use crate::batch::{create_batcher, BatcherHandle, BatcherMsg};
use crate::broker::{IngressFrame, ReplyHandle};
use crate::daymap::DayMapSource;
use crate::flush::FlushJob;
use crate::model::Origin;

pub struct Dispatcher {
    day_map_source: Arc<dyn DayMapSource>,
    batch_period: Duration,
    flush_tx: mpsc::Sender<FlushJob>,
    batchers: HashMap<Origin, BatcherHandle>,
}

impl Dispatcher {
    pub fn new(
        day_map_source: Arc<dyn DayMapSource>,
        batch_period: Duration,
        flush_tx: mpsc::Sender<FlushJob>,
    ) -> Self {
        Self {
            day_map_source,
            batch_period,
            flush_tx,
            batchers: HashMap::new(),
        }
    }

    /// Route one ingress frame. Spawns a batcher for `frame.origin` if none
    /// exists yet, or the existing one has sealed.
    pub async fn dispatch(&mut self, frame: IngressFrame, reply: Box<dyn ReplyHandle>) {
        let needs_spawn = match self.batchers.get(&frame.origin) {
            Some(handle) if !handle.is_sealed() => false,
            _ => true,
        };

        if needs_spawn {
            let (handle, task) = create_batcher(
                frame.origin.clone(),
                self.day_map_source.clone(),
                self.batch_period,
                self.flush_tx.clone(),
            );
            tokio::spawn(task);

            // Spec §4.G: the first send into a freshly spawned batcher must
            // succeed; a failure here means the batcher died before
            // accepting a single message — an invariant violation.
            if handle
                .send(BatcherMsg::Ingress {
                    reply,
                    payload: frame.payload,
                })
                .await
                .is_err()
            {
                error!(origin = %frame.origin, "batcher died immediately after spawn");
                std::process::abort();
            }

            self.batchers.insert(frame.origin, handle);
            return;
        }

        let handle = self.batchers.get(&frame.origin).expect("just checked present");
        if handle
            .send(BatcherMsg::Ingress {
                reply,
                payload: frame.payload,
            })
            .await
            .is_err()
        {
            self.batchers.remove(&frame.origin);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broker::ReplyOutcome;
    use crate::daymap::OriginDayMaps;
    use async_trait::async_trait;
    use tokio::sync::oneshot;

    struct NoDayMaps;

    #[async_trait]
    impl DayMapSource for NoDayMaps {
        async fn fetch(&self, _origin: &Origin) -> OriginDayMaps {
            OriginDayMaps::default()
        }
    }

    struct OneshotReply(Option<oneshot::Sender<ReplyOutcome>>);

    #[async_trait]
    impl ReplyHandle for OneshotReply {
        async fn reply(mut self: Box<Self>, outcome: ReplyOutcome) {
            let _ = self.0.take().unwrap().send(outcome);
        }
    }

    #[tokio::test]
    async fn cold_start_origin_replies_no_such_origin() {
        let (flush_tx, _flush_rx) = mpsc::channel(8);
        let mut dispatcher = Dispatcher::new(Arc::new(NoDayMaps), Duration::from_millis(50), flush_tx);

        let (tx, rx) = oneshot::channel();
        let frame = IngressFrame {
            origin: Origin::raw("PONY::::::"),
            payload: Vec::new(),
        };
        dispatcher.dispatch(frame, Box::new(OneshotReply(Some(tx)))).await;

        assert_eq!(
            rx.await.unwrap(),
            ReplyOutcome::Failure("No such origin".into())
        );
    }
}
