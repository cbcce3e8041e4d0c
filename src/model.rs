//! Core data model: origins, addresses, time, buckets.
//!
//! See spec §3. Kept deliberately free of I/O — everything here is pure data
//! and pure transitions, grounded the same way the teacher crate keeps
//! `kernel::thread_table`'s `ThreadRecord` a plain data type independent of
//! its storage.

use std::fmt;

/// Sanitized, namespace-scoping tenant identifier.
///
/// Always exactly 10 bytes once produced by [`Origin::tidy`]. [`Origin::raw`]
/// skips sanitization for callers (tests, internal fixtures) that already
/// hold a valid short tag and don't want it right-padded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Origin(String);

impl Origin {
    /// Sanitize an arbitrary string into a namespace-safe origin: drop
    /// non-ASCII/non-printable bytes and `_`, right-pad with `:` to 10
    /// bytes, then truncate to 10 bytes.
    pub fn tidy(raw: &str) -> Self {
        let filtered: String = raw
            .chars()
            .filter(|&c| c.is_ascii() && (c == ' ' || c.is_ascii_graphic()) && c != '_')
            .collect();

        let mut padded = filtered;
        while padded.len() < 10 {
            padded.push(':');
        }
        padded.truncate(10);
        Self(padded)
    }

    /// Wrap a string verbatim, without sanitization or padding.
    pub fn raw(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Epoch: lower boundary of a bucket generation, in nanoseconds since epoch.
pub type Epoch = u64;

/// Wall-clock time, nanoseconds since epoch.
pub type Time = u64;

/// Number of buckets active for a given epoch.
pub type NoBuckets = u64;

/// Sharded lane within an epoch.
pub type Bucket = u64;

/// Whether an address addresses a simple or an extended point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Simple,
    Extended,
}

impl Kind {
    pub fn as_str(self) -> &'static str {
        match self {
            Kind::Simple => "simple",
            Kind::Extended => "extended",
        }
    }
}

/// Raw 64-bit address. Bit 0 flags "extended"; masking it off gives the
/// bucket lane shared by a simple/extended pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address(pub u64);

impl Address {
    pub fn is_extended(self) -> bool {
        self.0 & 1 == 1
    }

    pub fn masked(self) -> u64 {
        self.0 & !1u64
    }

    pub fn bucket(self, no_buckets: NoBuckets) -> Bucket {
        self.masked() % no_buckets
    }
}

/// Key identifying an `(epoch, bucket)` lane within a single batch.
pub type BucketKey = (Epoch, Bucket);
