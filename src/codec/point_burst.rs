//! Point-burst wire codec (spec §4.A, §6).
//!
//! A contiguous stream of fixed 24-byte headers, with an inline payload
//! trailing any record whose address is odd (extended).

use super::DecodeError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PointRecord {
    Simple { address: u64, time: u64, payload: u64 },
    Extended { address: u64, time: u64, payload: Vec<u8> },
}

impl PointRecord {
    pub fn address(&self) -> u64 {
        match self {
            PointRecord::Simple { address, .. } => *address,
            PointRecord::Extended { address, .. } => *address,
        }
    }

    pub fn time(&self) -> u64 {
        match self {
            PointRecord::Simple { time, .. } => *time,
            PointRecord::Extended { time, .. } => *time,
        }
    }
}

/// Decode a burst. Any arithmetic overrun (a length claiming bytes past the
/// end of the buffer) is a decode failure with no partial result.
pub fn decode_burst(bytes: &[u8]) -> Result<Vec<PointRecord>, DecodeError> {
    let mut o = 0usize;
    let len = bytes.len();
    let mut out = Vec::new();

    while o < len {
        if o + 24 > len {
            return Err(DecodeError::Truncated);
        }
        let address = u64::from_le_bytes(bytes[o..o + 8].try_into().unwrap());
        let time = u64::from_le_bytes(bytes[o + 8..o + 16].try_into().unwrap());
        let payload = u64::from_le_bytes(bytes[o + 16..o + 24].try_into().unwrap());

        if address & 1 == 1 {
            let start = o + 24;
            let plen = payload as usize;
            let end = start.checked_add(plen).ok_or(DecodeError::Overrun)?;
            if end > len {
                return Err(DecodeError::Overrun);
            }
            out.push(PointRecord::Extended {
                address,
                time,
                payload: bytes[start..end].to_vec(),
            });
            o = end;
        } else {
            out.push(PointRecord::Simple {
                address,
                time,
                payload,
            });
            o += 24;
        }
    }

    Ok(out)
}

pub fn encode_burst(points: &[PointRecord]) -> Vec<u8> {
    let mut buf = Vec::new();
    for point in points {
        match point {
            PointRecord::Simple {
                address,
                time,
                payload,
            } => {
                buf.extend_from_slice(&address.to_le_bytes());
                buf.extend_from_slice(&time.to_le_bytes());
                buf.extend_from_slice(&payload.to_le_bytes());
            }
            PointRecord::Extended {
                address,
                time,
                payload,
            } => {
                buf.extend_from_slice(&address.to_le_bytes());
                buf.extend_from_slice(&time.to_le_bytes());
                buf.extend_from_slice(&(payload.len() as u64).to_le_bytes());
                buf.extend_from_slice(payload);
            }
        }
    }
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_mixed_burst() {
        let points = vec![
            PointRecord::Simple {
                address: 128,
                time: 1,
                payload: 42,
            },
            PointRecord::Extended {
                address: 129,
                time: 2,
                payload: b"hello".to_vec(),
            },
        ];
        let encoded = encode_burst(&points);
        let decoded = decode_burst(&encoded).unwrap();
        assert_eq!(points, decoded);
    }

    #[test]
    fn empty_burst_decodes_empty() {
        assert_eq!(decode_burst(&[]).unwrap(), vec![]);
    }

    #[test]
    fn truncated_header_fails() {
        let err = decode_burst(&[1, 2, 3]).unwrap_err();
        assert_eq!(err, DecodeError::Truncated);
    }

    #[test]
    fn extended_payload_overrun_fails() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&129u64.to_le_bytes());
        buf.extend_from_slice(&0u64.to_le_bytes());
        buf.extend_from_slice(&1000u64.to_le_bytes()); // claims 1000 bytes, none present
        let err = decode_burst(&buf).unwrap_err();
        assert_eq!(err, DecodeError::Overrun);
    }
}
