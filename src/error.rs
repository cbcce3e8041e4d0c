//! Crate-wide error aggregation.
//!
//! Each module keeps its own narrow `thiserror` enum; this is the root type
//! the dispatcher and CLI boundary deal in.

use thiserror::Error;

use crate::codec::DecodeError;
use crate::flush::FlushError;
use crate::pool::PoolError;

#[derive(Debug, Error)]
pub enum VaultError {
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("store error: {0}")]
    Pool(#[from] PoolError),

    #[error("flush error: {0}")]
    Flush(#[from] FlushError),

    #[error("no such origin: {0}")]
    NoSuchOrigin(String),

    #[error("{0}")]
    Other(String),
}

pub type VaultResult<T> = Result<T, VaultError>;
