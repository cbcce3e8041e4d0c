//! The batcher actor loop (spec §4.E).
//!
//! One actor per origin. Consumes `Msg | Tick` off a single bounded channel,
//! mutates its private `BatchState`, and on a batch-period boundary hands the
//! finished state downstream to the flush writer. Mirrors the `tokio::select!`
//! two-branch shape the teacher's sequencer task uses — here the two sources
//! (ingress, tick) are pre-merged onto one channel per spec, so the loop
//! itself is a single `recv` rather than a `select!`.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::Instant as TokioInstant;

use crate::broker::ReplyOutcome;
use crate::codec::point_burst::{decode_burst, PointRecord};
use crate::daymap::{DayMap, DayMapSource, OriginDayMaps};
use crate::flush::FlushJob;
use crate::model::{Bucket, Epoch, Origin};

use super::message::BatcherMsg;
use super::state::BatchState;

const TICK_PERIOD: Duration = Duration::from_millis(100);

/// Spawns the tick generator: a lone task feeding `BatcherMsg::Tick` onto the
/// batcher's channel every [`TICK_PERIOD`]. Exits once the channel is closed.
/// Spec §4.E: "only one generator runs per batcher."
pub fn spawn_tick_generator(tx: mpsc::Sender<BatcherMsg>) {
    tokio::spawn(async move {
        let mut next = TokioInstant::now() + TICK_PERIOD;
        loop {
            tokio::time::sleep_until(next).await;
            next += TICK_PERIOD;
            if tx.send(BatcherMsg::Tick).await.is_err() {
                return;
            }
        }
    });
}

/// Resolve `(epoch, bucket)` for a point's time. Per spec §9 Open Question 1
/// the *simple* day-map resolves both simple and extended points — this is a
/// preserved oddity of the original source, not a mistake introduced here.
fn resolve_lane(simple_day_map: &DayMap, no_buckets_addr: u64, time: u64) -> Option<(Epoch, Bucket)> {
    let (epoch, no_buckets) = simple_day_map.lookup(time)?;
    let bucket = crate::model::Address(no_buckets_addr).bucket(no_buckets);
    Some((epoch, bucket))
}

/// Apply every point in a decoded burst to `state`, or reject the whole
/// burst if any point's time falls outside the loaded day-map. Resolution is
/// done as a read-only pass before any mutation so a rejected burst leaves
/// `state` untouched, matching the "batch state is not mutated" rule for
/// in-burst failures.
fn apply_burst(state: &mut BatchState, maps: &OriginDayMaps, points: &[PointRecord]) -> Result<(), String> {
    let simple_day_map = maps.simple.as_ref().expect("cold-start gate already checked");

    let mut lanes = Vec::with_capacity(points.len());
    for point in points {
        match resolve_lane(simple_day_map, point.address(), point.time()) {
            Some(lane) => lanes.push(lane),
            None => return Err(format!("no day-map entry covering time {}", point.time())),
        }
    }

    for (point, (epoch, bucket)) in points.iter().zip(lanes) {
        match point {
            PointRecord::Simple { address, time, payload } => {
                let mut bytes = [0u8; 24];
                bytes[0..8].copy_from_slice(&address.to_le_bytes());
                bytes[8..16].copy_from_slice(&time.to_le_bytes());
                bytes[16..24].copy_from_slice(&payload.to_le_bytes());
                state.append_simple(epoch, bucket, bytes);
            }
            PointRecord::Extended { address, time, payload } => {
                state.append_extended(epoch, bucket, *address, *time, payload);
            }
        }
    }

    Ok(())
}

/// Main loop for one origin's batcher. Runs until the channel is sealed.
pub async fn batcher_task(
    origin: Origin,
    mut rx: mpsc::Receiver<BatcherMsg>,
    day_map_source: Arc<dyn DayMapSource>,
    batch_period: Duration,
    flush_tx: mpsc::Sender<FlushJob>,
) {
    let mut maps = day_map_source.fetch(&origin).await;
    let mut state = BatchState::new();

    while let Some(msg) = rx.recv().await {
        match msg {
            BatcherMsg::Tick => {
                if state.start.elapsed() >= batch_period {
                    let finished = std::mem::replace(&mut state, BatchState::new());
                    // Refetch at every new batch's start (spec §5: "triggered
                    // at each batch start and after a rollover") so a rollover
                    // appending a fresh epoch/bucket-count becomes visible to
                    // this already-running batcher instead of staying stuck
                    // on the maps it loaded at spawn time.
                    maps = day_map_source.fetch(&origin).await;
                    if flush_tx
                        .send(FlushJob {
                            origin: origin.clone(),
                            state: finished,
                        })
                        .await
                        .is_err()
                    {
                        return;
                    }
                }
            }
            BatcherMsg::Ingress { reply, payload } => {
                if maps.simple.is_none() || maps.extended.is_none() {
                    reply.reply(ReplyOutcome::Failure("No such origin".into())).await;
                    continue;
                }

                match decode_burst(&payload) {
                    Ok(points) => match apply_burst(&mut state, &maps, &points) {
                        Ok(()) => state.reply_handles.push(reply),
                        Err(msg) => reply.reply(ReplyOutcome::Failure(msg)).await,
                    },
                    Err(e) => reply.reply(ReplyOutcome::Failure(e.to_string())).await,
                }
            }
        }
    }
}
