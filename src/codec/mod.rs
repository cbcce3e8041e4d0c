//! Wire and disk framing codecs (spec §4.A).

pub mod contents;
pub mod day_map_file;
pub mod disk_record;
pub mod point_burst;
pub mod source_dict;

use thiserror::Error;

/// Decode-time failures. Every codec in this module returns this type;
/// callers turn it into `Failure(msg)` without mutating any batch state.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Illegal op code")]
    IllegalOpCode,

    #[error("truncated frame")]
    Truncated,

    #[error("arithmetic overrun")]
    Overrun,

    #[error("corrupt: {0}")]
    Corrupt(String),
}
