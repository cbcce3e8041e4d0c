//! `SourceDict` canonical encoding and hash-id (spec §3, §4.A).

use std::collections::BTreeMap;

use sha1::{Digest, Sha1};

use super::DecodeError;
use crate::base62;

/// Canonical sorted `text -> text` mapping describing a metric source.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SourceDict(BTreeMap<String, String>);

impl SourceDict {
    pub fn new(pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        Self(pairs.into_iter().collect())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Serialize as the ordered sequence of `(u32 len, bytes)` pairs, keys
    /// then values, in sorted-key order.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        for (k, v) in &self.0 {
            buf.extend_from_slice(&(k.len() as u32).to_le_bytes());
            buf.extend_from_slice(k.as_bytes());
            buf.extend_from_slice(&(v.len() as u32).to_le_bytes());
            buf.extend_from_slice(v.as_bytes());
        }
        buf
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let mut map = BTreeMap::new();
        let mut o = 0usize;
        let len = bytes.len();

        while o < len {
            let key = read_prefixed_string(bytes, &mut o)?;
            let value = read_prefixed_string(bytes, &mut o)?;
            map.insert(key, value);
        }

        Ok(Self(map))
    }

    /// `base62(SHA1(encoded), 27 digits)`
    pub fn hash_id(&self) -> String {
        let mut hasher = Sha1::new();
        hasher.update(self.encode());
        let digest = hasher.finalize();
        base62::encode(&digest, 27)
    }
}

fn read_prefixed_string(bytes: &[u8], o: &mut usize) -> Result<String, DecodeError> {
    if *o + 4 > bytes.len() {
        return Err(DecodeError::Truncated);
    }
    let n = u32::from_le_bytes(bytes[*o..*o + 4].try_into().unwrap()) as usize;
    *o += 4;
    let end = o.checked_add(n).ok_or(DecodeError::Overrun)?;
    if end > bytes.len() {
        return Err(DecodeError::Overrun);
    }
    let s = String::from_utf8(bytes[*o..end].to_vec())
        .map_err(|e| DecodeError::Corrupt(e.to_string()))?;
    *o = end;
    Ok(s)
}
