//! Epoch -> bucket-count resolver (spec §3, §4.G).
//!
//! A day map is append-only over its lifetime: new epochs are always added
//! with a time strictly greater than any existing entry. Lookup answers
//! "how many buckets did this origin use at time t" by finding the greatest
//! epoch <= t.

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::model::{Epoch, NoBuckets, Origin, Time};

#[derive(Debug, Clone, Default)]
pub struct DayMap {
    epochs: BTreeMap<Epoch, NoBuckets>,
}

impl DayMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: impl IntoIterator<Item = (Epoch, NoBuckets)>) -> Self {
        Self {
            epochs: records.into_iter().collect(),
        }
    }

    pub fn insert(&mut self, epoch: Epoch, no_buckets: NoBuckets) {
        self.epochs.insert(epoch, no_buckets);
    }

    pub fn is_empty(&self) -> bool {
        self.epochs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Epoch, NoBuckets)> + '_ {
        self.epochs.iter().map(|(&e, &n)| (e, n))
    }

    /// Greatest epoch <= `t`. `None` if `t` precedes every known epoch,
    /// which per spec §9 Open Question 2 is undefined territory we surface
    /// as "no such origin" rather than guessing a default.
    pub fn lookup(&self, t: Time) -> Option<(Epoch, NoBuckets)> {
        self.epochs.range(..=t).next_back().map(|(&e, &n)| (e, n))
    }

    pub fn latest_epoch(&self) -> Option<Epoch> {
        self.epochs.keys().next_back().copied()
    }
}

/// A fetched pair of day-maps for one origin. `None` means no day-map object
/// exists yet for that side, which the batcher's cold-start path treats as
/// "no such origin".
#[derive(Debug, Clone, Default)]
pub struct OriginDayMaps {
    pub simple: Option<DayMap>,
    pub extended: Option<DayMap>,
}

/// External collaborator that loads and refreshes per-origin day-maps.
/// Kept out of this module's concern since loading means reading the
/// day-map object (see [`crate::codec::day_map_file`]) and is an I/O
/// boundary, while `DayMap` itself stays pure data.
#[async_trait]
pub trait DayMapSource: Send + Sync {
    async fn fetch(&self, origin: &Origin) -> OriginDayMaps;
}

/// External operation that extends a day-map with a new epoch starting
/// "now" and re-hashes bucket counts (spec §4.F Phase 5). Left abstract —
/// rollover's idempotence under concurrent processes is a property of
/// whatever shared store backs the day-map object, not of this crate.
#[async_trait]
pub trait Rollover: Send + Sync {
    async fn roll_over_simple(&self, origin: &Origin);
    async fn roll_over_extended(&self, origin: &Origin);
}
