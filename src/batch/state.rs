//! `BatchState` — per-origin, per-flush-window accumulator (spec §3, §4.D).
//!
//! Pure data plus pure transitions. No I/O lives here; the flush writer
//! consumes a `BatchState` by value and turns it into store operations.

use std::collections::HashMap;
use std::time::Instant;

use crate::broker::ReplyHandle;
use crate::model::{Bucket, BucketKey, Epoch};

/// Non-functional stand-in for the "closure capturing `base_offset`"
/// described in spec §9 Design Notes: `addr`/`time` identify the simple
/// record to patch, `local_offset` is the offset of this payload within the
/// *batch's own* extended buffer (before the pre-existing store offset is
/// known). Pushed in ingress order, so no reversal is needed at flush time —
/// iterating the `Vec` already yields ingress order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingOffset {
    pub address: u64,
    pub time: u64,
    pub local_offset: u64,
}

#[derive(Default)]
struct PendingLane {
    running_len: u64,
    offsets: Vec<PendingOffset>,
}

/// Accumulated state for one origin's in-flight batch.
pub struct BatchState {
    pub reply_handles: Vec<Box<dyn ReplyHandle>>,
    simple: HashMap<BucketKey, Vec<u8>>,
    extended: HashMap<BucketKey, Vec<u8>>,
    pending: HashMap<BucketKey, PendingLane>,
    pub start: Instant,
}

impl BatchState {
    pub fn new() -> Self {
        Self {
            reply_handles: Vec::new(),
            simple: HashMap::new(),
            extended: HashMap::new(),
            pending: HashMap::new(),
            start: Instant::now(),
        }
    }

    /// Append a 24-byte simple record verbatim into `simple[epoch][bucket]`.
    pub fn append_simple(&mut self, epoch: Epoch, bucket: Bucket, bytes_24: [u8; 24]) {
        self.simple
            .entry((epoch, bucket))
            .or_default()
            .extend_from_slice(&bytes_24);
    }

    /// Record an extended payload: grows `extended[epoch][bucket]` by
    /// `u64LE(len) ‖ payload`, and records a pending offset patch for the
    /// simple record that will reference it.
    pub fn append_extended(
        &mut self,
        epoch: Epoch,
        bucket: Bucket,
        address: u64,
        time: u64,
        payload: &[u8],
    ) {
        let lane = self.pending.entry((epoch, bucket)).or_default();
        let local_offset = lane.running_len;
        lane.offsets.push(PendingOffset {
            address,
            time,
            local_offset,
        });
        lane.running_len += payload.len() as u64;

        let buf = self.extended.entry((epoch, bucket)).or_default();
        buf.extend_from_slice(&(payload.len() as u64).to_le_bytes());
        buf.extend_from_slice(payload);
    }

    pub fn extended_lanes(&self) -> impl Iterator<Item = (&BucketKey, &Vec<u8>)> {
        self.extended.iter()
    }

    pub fn simple_lanes(&self) -> impl Iterator<Item = (&BucketKey, &Vec<u8>)> {
        self.simple.iter()
    }

    pub fn simple_buffer(&self, key: &BucketKey) -> Option<&Vec<u8>> {
        self.simple.get(key)
    }

    pub fn simple_keys(&self) -> impl Iterator<Item = &BucketKey> {
        self.simple.keys()
    }

    /// Pending offset triples for `key`, in ingress order, and the total
    /// extended bytes this batch contributed for it — or `None` if this lane
    /// received no extended points this batch.
    pub fn pending_for(&self, key: &BucketKey) -> Option<(&[PendingOffset], u64)> {
        self.pending
            .get(key)
            .map(|lane| (lane.offsets.as_slice(), lane.running_len))
    }
}
