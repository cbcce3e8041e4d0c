//! Day-map object codec (spec §3, §4.G).
//!
//! A day-map object is a stream of 16-byte records: `epoch:u64 LE` followed
//! by `no_buckets:u64 LE`, concatenated with no header or trailer.

use super::DecodeError;
use crate::model::{Epoch, NoBuckets};

pub fn decode(bytes: &[u8]) -> Result<Vec<(Epoch, NoBuckets)>, DecodeError> {
    if bytes.len() % 16 != 0 {
        return Err(DecodeError::Corrupt(format!(
            "day-map length {} is not a multiple of 16",
            bytes.len()
        )));
    }

    let mut out = Vec::with_capacity(bytes.len() / 16);
    let mut o = 0usize;
    while o < bytes.len() {
        let epoch = u64::from_le_bytes(bytes[o..o + 8].try_into().unwrap());
        let no_buckets = u64::from_le_bytes(bytes[o + 8..o + 16].try_into().unwrap());
        out.push((epoch, no_buckets));
        o += 16;
    }
    Ok(out)
}

pub fn encode(records: &[(Epoch, NoBuckets)]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(records.len() * 16);
    for (epoch, no_buckets) in records {
        buf.extend_from_slice(&epoch.to_le_bytes());
        buf.extend_from_slice(&no_buckets.to_le_bytes());
    }
    buf
}
