//! Abstract message broker boundary (spec §4.D).
//!
//! The broker hands ingress frames to the dispatcher and expects exactly one
//! outcome back per frame. Mirrors the teacher's dispatch/deliver/fail reply
//! lifecycle, generalized from a single pipeline peer to an arbitrary broker.

use async_trait::async_trait;

use crate::model::Origin;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyOutcome {
    Success,
    Failure(String),
}

/// A raw ingress write, bound for a specific origin's batcher.
#[derive(Debug, Clone)]
pub struct IngressFrame {
    pub origin: Origin,
    pub payload: Vec<u8>,
}

/// A handle back to the broker for acking a single ingress frame. Each
/// handle is consumed exactly once — reused or dropped handles represent a
/// broker bug, not a vault error.
#[async_trait]
pub trait ReplyHandle: Send {
    async fn reply(self: Box<Self>, outcome: ReplyOutcome);
}
