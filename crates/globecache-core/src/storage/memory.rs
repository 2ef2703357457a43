use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{CacheStorage, CachedEntry};
use crate::error::WorkerResult;
use crate::models::{RequestKey, Response};

struct Partition {
    name: String,
    entries: BTreeMap<RequestKey, CachedEntry>,
}

/// In-memory partitions. Contents are lost when the value is dropped.
#[derive(Default)]
pub struct MemoryStorage {
    partitions: RwLock<Vec<Partition>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

fn find<'a>(partitions: &'a mut Vec<Partition>, name: &str) -> &'a mut Partition {
    let index = match partitions.iter().position(|p| p.name == name) {
        Some(index) => index,
        None => {
            partitions.push(Partition {
                name: name.to_string(),
                entries: BTreeMap::new(),
            });
            partitions.len() - 1
        }
    };
    &mut partitions[index]
}

#[async_trait]
impl CacheStorage for MemoryStorage {
    async fn keys(&self) -> WorkerResult<Vec<String>> {
        let partitions = self.partitions.read().await;
        Ok(partitions.iter().map(|p| p.name.clone()).collect())
    }

    async fn open(&self, name: &str) -> WorkerResult<()> {
        let mut partitions = self.partitions.write().await;
        find(&mut partitions, name);
        Ok(())
    }

    async fn has(&self, name: &str) -> WorkerResult<bool> {
        let partitions = self.partitions.read().await;
        Ok(partitions.iter().any(|p| p.name == name))
    }

    async fn delete(&self, name: &str) -> WorkerResult<bool> {
        let mut partitions = self.partitions.write().await;
        let before = partitions.len();
        partitions.retain(|p| p.name != name);
        Ok(partitions.len() != before)
    }

    async fn match_request(&self, name: &str, key: &RequestKey) -> WorkerResult<Option<Response>> {
        let partitions = self.partitions.read().await;
        Ok(partitions
            .iter()
            .find(|p| p.name == name)
            .and_then(|p| p.entries.get(key))
            .map(|entry| entry.response.clone()))
    }

    async fn put(&self, name: &str, key: RequestKey, response: Response) -> WorkerResult<()> {
        let mut partitions = self.partitions.write().await;
        find(&mut partitions, name)
            .entries
            .insert(key, CachedEntry::new(response));
        Ok(())
    }

    async fn put_all(&self, name: &str, entries: Vec<(RequestKey, Response)>) -> WorkerResult<()> {
        let mut partitions = self.partitions.write().await;
        let partition = find(&mut partitions, name);
        for (key, response) in entries {
            partition.entries.insert(key, CachedEntry::new(response));
        }
        Ok(())
    }

    async fn entries(&self, name: &str) -> WorkerResult<Vec<(RequestKey, CachedEntry)>> {
        let partitions = self.partitions.read().await;
        Ok(partitions
            .iter()
            .find(|p| p.name == name)
            .map(|p| {
                p.entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }
}
