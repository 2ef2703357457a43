//! The stale-while-revalidate offline worker.
//!
//! - `OfflineCacheManager`: handlers for install, activate, fetch, message
//!   and sync events, plus `dispatch` to route a `WorkerEvent`
//! - `WaitUntil`: the completion token the host holds open per event
//! - `Lifecycle`: worker state and the skip-waiting / clients-claimed signals
//! - `ClientMessage`: control messages posted by hosting pages

pub mod lifecycle;
pub mod manager;
pub mod message;
pub mod wait_until;

pub use lifecycle::{Lifecycle, WorkerState};
pub use manager::{
    EventOutcome, FetchOutcome, MessageOutcome, OfflineCacheManager, SyncOutcome, WarmReport,
    WorkerEvent,
};
pub use message::ClientMessage;
pub use wait_until::WaitUntil;
