//! Scripted network and instrumented storage for unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Semaphore;

use crate::error::{FetchError, WorkerResult};
use crate::models::{Request, RequestKey, Response};
use crate::network::Fetcher;
use crate::storage::{CacheStorage, CachedEntry, MemoryStorage};

#[derive(Clone)]
pub enum Reply {
    Ok(Response),
    Fail,
}

/// Fetcher answering from a fixed route table. Unknown URLs fail.
#[derive(Default)]
pub struct StubFetcher {
    routes: Mutex<HashMap<String, Reply>>,
    calls: Mutex<Vec<String>>,
    gate: Option<Arc<Semaphore>>,
}

impl StubFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every fetch blocks until the returned semaphore receives permits
    pub fn gated() -> (Self, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        let fetcher = Self {
            gate: Some(Arc::clone(&gate)),
            ..Self::default()
        };
        (fetcher, gate)
    }

    pub fn route(self, url: &str, reply: Reply) -> Self {
        self.set(url, reply);
        self
    }

    pub fn ok(self, url: &str, body: &str) -> Self {
        self.route(url, Reply::Ok(Response::new(200, body)))
    }

    pub fn set(&self, url: &str, reply: Reply) {
        self.routes.lock().unwrap().insert(url.to_string(), reply);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Fetcher for StubFetcher {
    async fn fetch(&self, request: &Request) -> Result<Response, FetchError> {
        let url = request.url.to_string();
        self.calls.lock().unwrap().push(url.clone());
        if let Some(gate) = &self.gate {
            let _permit = gate.acquire().await.unwrap();
        }
        let reply = self.routes.lock().unwrap().get(&url).cloned();
        match reply {
            Some(Reply::Ok(response)) => Ok(response),
            _ => Err(FetchError::Unreachable(url)),
        }
    }
}

/// Memory storage that counts every call made against it.
#[derive(Default)]
pub struct CountingStorage {
    inner: MemoryStorage,
    calls: AtomicUsize,
}

impl CountingStorage {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn hit(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl CacheStorage for CountingStorage {
    async fn keys(&self) -> WorkerResult<Vec<String>> {
        self.hit();
        self.inner.keys().await
    }

    async fn open(&self, name: &str) -> WorkerResult<()> {
        self.hit();
        self.inner.open(name).await
    }

    async fn has(&self, name: &str) -> WorkerResult<bool> {
        self.hit();
        self.inner.has(name).await
    }

    async fn delete(&self, name: &str) -> WorkerResult<bool> {
        self.hit();
        self.inner.delete(name).await
    }

    async fn match_request(&self, name: &str, key: &RequestKey) -> WorkerResult<Option<Response>> {
        self.hit();
        self.inner.match_request(name, key).await
    }

    async fn put(&self, name: &str, key: RequestKey, response: Response) -> WorkerResult<()> {
        self.hit();
        self.inner.put(name, key, response).await
    }

    async fn put_all(&self, name: &str, entries: Vec<(RequestKey, Response)>) -> WorkerResult<()> {
        self.hit();
        self.inner.put_all(name, entries).await
    }

    async fn entries(&self, name: &str) -> WorkerResult<Vec<(RequestKey, CachedEntry)>> {
        self.hit();
        self.inner.entries(name).await
    }
}
