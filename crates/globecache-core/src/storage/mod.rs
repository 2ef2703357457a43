//! Cache partition storage.
//!
//! This module provides the `CacheStorage` trait, the worker's view of the
//! host's named key-value caches, and two implementations:
//!
//! - `MemoryStorage`: partitions held in memory, for tests and embedding
//! - `DiskStorage`: one JSON file per partition under a cache directory
//!
//! Every stored response is wrapped in a `CachedEntry` recording when it was
//! written, so listings can report entry ages.

pub mod disk;
pub mod entry;
pub mod memory;

use async_trait::async_trait;

use crate::error::WorkerResult;
use crate::models::{RequestKey, Response};

pub use disk::DiskStorage;
pub use entry::CachedEntry;
pub use memory::MemoryStorage;

/// Named cache partitions mapping request identity to a stored response.
///
/// Each single-key read or write is atomic. Overlapping writes to the same
/// key are last-writer-wins.
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Names of all existing partitions, in creation order
    async fn keys(&self) -> WorkerResult<Vec<String>>;

    /// Open a partition, creating it empty if it does not exist
    async fn open(&self, name: &str) -> WorkerResult<()>;

    async fn has(&self, name: &str) -> WorkerResult<bool>;

    /// Delete a partition. Returns false if it did not exist.
    async fn delete(&self, name: &str) -> WorkerResult<bool>;

    async fn match_request(&self, name: &str, key: &RequestKey) -> WorkerResult<Option<Response>>;

    /// Store a response, overwriting any prior entry for the key
    async fn put(&self, name: &str, key: RequestKey, response: Response) -> WorkerResult<()>;

    /// Store a batch of responses as one write: either all land or none do
    async fn put_all(&self, name: &str, entries: Vec<(RequestKey, Response)>) -> WorkerResult<()>;

    /// All entries of a partition, ordered by key
    async fn entries(&self, name: &str) -> WorkerResult<Vec<(RequestKey, CachedEntry)>>;
}
