//! Per-origin batching: state, the actor loop, and its spawn handle.

pub mod actor;
pub mod handle;
pub mod message;
pub mod state;

pub use handle::{create_batcher, BatcherHandle};
pub use message::BatcherMsg;
pub use state::{BatchState, PendingOffset};
