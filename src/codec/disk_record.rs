//! Generic `VaultPrefix ‖ VaultPoint` disk-record reader (spec §4.A).
//!
//! This models the protobuf-framed reconstruction format described for
//! generic readers. It is a distinct concern from the fixed-width bucket
//! layout the flush writer produces — see [`super::point_burst`] for that
//! format, which is the one the §8 test vectors are byte-exact against.

use std::collections::HashSet;

use prost::Message;

use super::DecodeError;

include!(concat!(env!("OUT_DIR"), "/vaultaire.rs"));

impl From<&PointRecordRef<'_>> for VaultPoint {
    fn from(r: &PointRecordRef<'_>) -> Self {
        match r {
            PointRecordRef::Simple {
                address,
                time,
                payload,
            } => VaultPoint {
                address: *address,
                time: *time,
                payload: *payload,
                extended_payload: Vec::new(),
            },
            PointRecordRef::Extended {
                address,
                time,
                payload,
            } => VaultPoint {
                address: *address,
                time: *time,
                payload: 0,
                extended_payload: payload.to_vec(),
            },
        }
    }
}

/// Borrowed view over a point so callers need not round-trip through the
/// owned `codec::point_burst::PointRecord` to produce a disk record.
pub enum PointRecordRef<'a> {
    Simple { address: u64, time: u64, payload: u64 },
    Extended { address: u64, time: u64, payload: &'a [u8] },
}

/// Append one length-delimited `VaultPoint` to `out`, each preceded by a
/// `VaultPrefix` carrying its encoded length.
pub fn write_record(out: &mut Vec<u8>, point: &PointRecordRef<'_>) {
    let message: VaultPoint = point.into();
    let body = message.encode_to_vec();
    let prefix = VaultPrefix {
        record_len: body.len() as u32,
    };
    prefix
        .encode_length_delimited(out)
        .expect("Vec<u8> write is infallible");
    out.extend_from_slice(&body);
}

/// Read every `VaultPrefix ‖ VaultPoint` pair out of `bytes` until exhausted,
/// then drop duplicate timestamps (first occurrence wins), per spec §4.A.
pub fn read_records(bytes: &[u8]) -> Result<Vec<VaultPoint>, DecodeError> {
    let mut cursor = bytes;
    let mut out = Vec::new();

    while !cursor.is_empty() {
        let prefix = VaultPrefix::decode_length_delimited(&mut cursor)
            .map_err(|e| DecodeError::Corrupt(e.to_string()))?;
        let len = prefix.record_len as usize;
        if len > cursor.len() {
            return Err(DecodeError::Overrun);
        }
        let (body, rest) = cursor.split_at(len);
        let point =
            VaultPoint::decode(body).map_err(|e| DecodeError::Corrupt(e.to_string()))?;
        out.push(point);
        cursor = rest;
    }

    Ok(dedup_by_time_first_wins(out))
}

/// Keep only the first record seen for each timestamp, preserving order.
fn dedup_by_time_first_wins(records: Vec<VaultPoint>) -> Vec<VaultPoint> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|record| seen.insert(record.time))
        .collect()
}
