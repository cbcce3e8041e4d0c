//! Object-label scheme (spec §4.C).
//!
//! Pure string formatting — no I/O. Kept as free functions rather than
//! methods on `Origin` so callers can see the full label shape at the call
//! site, the same way the teacher crate's WAL entry builders
//! (`wal_entry_dispatch`, `wal_entry_append`, ...) are free functions next
//! to the type they describe.

use crate::model::{Bucket, Epoch, Kind, Origin, Time};

/// `"02_{origin}_{bucket:020}_{epoch:020}_{simple|extended}"`
pub fn bucket_label(origin: &Origin, bucket: Bucket, epoch: Epoch, kind: Kind) -> String {
    format!(
        "02_{}_{:020}_{:020}_{}",
        origin.as_str(),
        bucket,
        epoch,
        kind.as_str()
    )
}

/// `"02_{origin}_write_lock"`
pub fn write_lock_label(origin: &Origin) -> String {
    format!("02_{}_write_lock", origin.as_str())
}

/// `"02_{origin}_INTERNAL_{address:020}_{0:020}_{simple|extended}"`
pub fn internal_label(origin: &Origin, address: u64, kind: Kind) -> String {
    format!(
        "02_{}_INTERNAL_{:020}_{:020}_{}",
        origin.as_str(),
        address,
        0u64,
        kind.as_str()
    )
}

/// Shared key prefix for every internal-KV object under an origin, used to
/// enumerate the live address set via `Pool::list_keys`.
pub fn internal_prefix(origin: &Origin) -> String {
    format!("02_{}_INTERNAL_", origin.as_str())
}

/// `"{EPOCH_TAG}_{origin}_{sha1_base62_source}_{(t / (window*ns)) * window}"`
///
/// `window_secs` and `ns_per_sec` are constructor parameters per spec §9
/// Open Question 3 rather than hardcoded constants.
pub fn contents_hash_label(
    epoch_tag: &str,
    origin: &Origin,
    sha1_base62_source: &str,
    t: Time,
    window_secs: u64,
    ns_per_sec: u64,
) -> String {
    let window_ns = window_secs * ns_per_sec;
    let bucketed = (t / window_ns) * window_secs;
    format!(
        "{epoch_tag}_{}_{sha1_base62_source}_{bucketed}",
        origin.as_str()
    )
}
