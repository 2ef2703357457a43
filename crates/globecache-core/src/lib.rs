//! Offline support for a static web page.
//!
//! Static assets are pre-cached on install, partitions from older versions
//! are dropped on activate, and outbound GET requests are answered with a
//! stale-while-revalidate policy against a runtime partition.

pub mod config;
pub mod error;
pub mod models;
pub mod network;
pub mod storage;
pub mod worker;

#[cfg(test)]
mod testing;

pub use config::WorkerConfig;
pub use error::{FetchError, WorkerError, WorkerResult};
pub use models::{Request, RequestKey, Response};
pub use network::{Fetcher, HttpFetcher};
pub use storage::{CacheStorage, CachedEntry, DiskStorage, MemoryStorage};
pub use worker::{
    ClientMessage, EventOutcome, FetchOutcome, MessageOutcome, OfflineCacheManager, SyncOutcome,
    WaitUntil, WarmReport, WorkerEvent, WorkerState,
};

// Request construction needs these; re-exported so callers need not depend on reqwest
pub use reqwest::{Method, Url};
