//! `ContentsOperation` wire codec — client <-> contents service (spec §4.A).

use super::source_dict::SourceDict;
use super::DecodeError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentsOperation {
    ContentsListRequest,
    GenerateNewAddress,
    UpdateSourceTag { addr: u64, dict: SourceDict },
    RemoveSourceTag { addr: u64, dict: SourceDict },
}

const OP_CONTENTS_LIST_REQUEST: u64 = 0x0;
const OP_GENERATE_NEW_ADDRESS: u64 = 0x1;
const OP_UPDATE_SOURCE_TAG: u64 = 0x2;
const OP_REMOVE_SOURCE_TAG: u64 = 0x3;

impl ContentsOperation {
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        if bytes.len() < 8 {
            return Err(DecodeError::Truncated);
        }
        let op = u64::from_le_bytes(bytes[0..8].try_into().unwrap());

        match op {
            OP_CONTENTS_LIST_REQUEST => Ok(Self::ContentsListRequest),
            OP_GENERATE_NEW_ADDRESS => Ok(Self::GenerateNewAddress),
            OP_UPDATE_SOURCE_TAG | OP_REMOVE_SOURCE_TAG => {
                if bytes.len() < 24 {
                    return Err(DecodeError::Truncated);
                }
                let addr = u64::from_le_bytes(bytes[8..16].try_into().unwrap());
                let dict_len = u64::from_le_bytes(bytes[16..24].try_into().unwrap()) as usize;
                let end = 24usize.checked_add(dict_len).ok_or(DecodeError::Overrun)?;
                if end != bytes.len() {
                    return Err(DecodeError::Overrun);
                }
                let dict = SourceDict::decode(&bytes[24..end])?;

                if op == OP_UPDATE_SOURCE_TAG {
                    Ok(Self::UpdateSourceTag { addr, dict })
                } else {
                    Ok(Self::RemoveSourceTag { addr, dict })
                }
            }
            _ => Err(DecodeError::IllegalOpCode),
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        match self {
            Self::ContentsListRequest => OP_CONTENTS_LIST_REQUEST.to_le_bytes().to_vec(),
            Self::GenerateNewAddress => OP_GENERATE_NEW_ADDRESS.to_le_bytes().to_vec(),
            Self::UpdateSourceTag { addr, dict } => {
                encode_tag_op(OP_UPDATE_SOURCE_TAG, *addr, dict)
            }
            Self::RemoveSourceTag { addr, dict } => {
                encode_tag_op(OP_REMOVE_SOURCE_TAG, *addr, dict)
            }
        }
    }
}

fn encode_tag_op(op: u64, addr: u64, dict: &SourceDict) -> Vec<u8> {
    let encoded_dict = dict.encode();
    let mut buf = Vec::with_capacity(24 + encoded_dict.len());
    buf.extend_from_slice(&op.to_le_bytes());
    buf.extend_from_slice(&addr.to_le_bytes());
    buf.extend_from_slice(&(encoded_dict.len() as u64).to_le_bytes());
    buf.extend_from_slice(&encoded_dict);
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contents_list_request_is_eight_zero_bytes() {
        let encoded = ContentsOperation::ContentsListRequest.encode();
        assert_eq!(encoded, [0u8; 8]);
        assert_eq!(
            ContentsOperation::decode(&encoded).unwrap(),
            ContentsOperation::ContentsListRequest
        );
    }

    #[test]
    fn update_source_tag_round_trips() {
        let dict = SourceDict::new([("a".to_string(), "b".to_string())]);
        let op = ContentsOperation::UpdateSourceTag {
            addr: 0x2A,
            dict: dict.clone(),
        };
        let encoded = op.encode();
        assert_eq!(&encoded[0..8], &2u64.to_le_bytes());
        assert_eq!(&encoded[8..16], &0x2Au64.to_le_bytes());
        assert_eq!(ContentsOperation::decode(&encoded).unwrap(), op);
    }

    #[test]
    fn unknown_opcode_is_illegal() {
        let err = ContentsOperation::decode(&99u64.to_le_bytes()).unwrap_err();
        assert_eq!(err, DecodeError::IllegalOpCode);
    }

    #[test]
    fn truncated_frame_fails() {
        let err = ContentsOperation::decode(&[0, 0, 0]).unwrap_err();
        assert_eq!(err, DecodeError::Truncated);
    }

    #[test]
    fn inner_dict_failure_propagates() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&2u64.to_le_bytes());
        buf.extend_from_slice(&0u64.to_le_bytes());
        buf.extend_from_slice(&1u64.to_le_bytes()); // claims 1 byte of dict, provides 0
        let err = ContentsOperation::decode(&buf).unwrap_err();
        assert_eq!(err, DecodeError::Overrun);
    }
}
