use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::{CacheStorage, CachedEntry};
use crate::error::WorkerResult;
use crate::models::{RequestKey, Response};

const PARTITION_EXT: &str = "json";

#[derive(Debug, Serialize, Deserialize)]
struct PartitionFile {
    name: String,
    created_at: DateTime<Utc>,
    entries: Vec<StoredEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredEntry {
    key: RequestKey,
    #[serde(flatten)]
    entry: CachedEntry,
}

impl PartitionFile {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            created_at: Utc::now(),
            entries: Vec::new(),
        }
    }

    fn insert(&mut self, key: RequestKey, response: Response) {
        let entry = CachedEntry::new(response);
        match self.entries.iter_mut().find(|e| e.key == key) {
            Some(existing) => existing.entry = entry,
            None => self.entries.push(StoredEntry { key, entry }),
        }
    }
}

/// Partitions persisted as one JSON file each under a cache directory.
///
/// All writes go through one lock and replace the partition file with a
/// rename, so a reader never sees a half-written partition.
pub struct DiskStorage {
    cache_dir: PathBuf,
    write_lock: Mutex<()>,
}

impl DiskStorage {
    pub fn new(cache_dir: PathBuf) -> WorkerResult<Self> {
        std::fs::create_dir_all(&cache_dir)?;
        Ok(Self {
            cache_dir,
            write_lock: Mutex::new(()),
        })
    }

    /// File names are the hex encoding of the partition name, so distinct
    /// names never share a file and the name can be read back from the path.
    fn partition_path(&self, name: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.{}", hex::encode(name), PARTITION_EXT))
    }

    fn partition_name(path: &Path) -> Option<String> {
        if path.extension().and_then(|e| e.to_str()) != Some(PARTITION_EXT) {
            return None;
        }
        let stem = path.file_stem()?.to_str()?;
        String::from_utf8(hex::decode(stem).ok()?).ok()
    }

    async fn load(&self, name: &str) -> WorkerResult<Option<PartitionFile>> {
        let path = self.partition_path(name);
        let partition = Self::load_path(&path).await?;
        match partition {
            Some(partition) if partition.name != name => {
                warn!(
                    path = %path.display(),
                    expected = name,
                    found = %partition.name,
                    "Partition file holds a different partition, ignoring it"
                );
                Ok(None)
            }
            other => Ok(other),
        }
    }

    async fn load_path(path: &Path) -> WorkerResult<Option<PartitionFile>> {
        let contents = match tokio::fs::read_to_string(path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_str(&contents)?))
    }

    async fn save(&self, partition: &PartitionFile) -> WorkerResult<()> {
        let path = self.partition_path(&partition.name);
        let tmp = path.with_extension("json.tmp");
        let contents = serde_json::to_string_pretty(partition)?;
        tokio::fs::write(&tmp, contents).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn update(
        &self,
        name: &str,
        apply: impl FnOnce(&mut PartitionFile) + Send,
    ) -> WorkerResult<()> {
        let _guard = self.write_lock.lock().await;
        let mut partition = self
            .load(name)
            .await?
            .unwrap_or_else(|| PartitionFile::new(name));
        apply(&mut partition);
        self.save(&partition).await
    }
}

#[async_trait]
impl CacheStorage for DiskStorage {
    async fn keys(&self) -> WorkerResult<Vec<String>> {
        let mut found = Vec::new();
        let mut dir = tokio::fs::read_dir(&self.cache_dir).await?;
        while let Some(item) = dir.next_entry().await? {
            let path = item.path();
            let Some(name) = Self::partition_name(&path) else {
                continue;
            };
            // An unreadable file is still listed so activation can delete it
            let created_at = match Self::load_path(&path).await {
                Ok(Some(partition)) => partition.created_at,
                Ok(None) => continue,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Unreadable partition file");
                    item.metadata()
                        .await
                        .and_then(|m| m.modified())
                        .map(DateTime::<Utc>::from)
                        .unwrap_or_else(|_| Utc::now())
                }
            };
            found.push((created_at, name));
        }
        found.sort();
        Ok(found.into_iter().map(|(_, name)| name).collect())
    }

    async fn open(&self, name: &str) -> WorkerResult<()> {
        let _guard = self.write_lock.lock().await;
        if self.load(name).await?.is_none() {
            debug!(partition = name, "Creating partition");
            self.save(&PartitionFile::new(name)).await?;
        }
        Ok(())
    }

    async fn has(&self, name: &str) -> WorkerResult<bool> {
        Ok(self.load(name).await?.is_some())
    }

    async fn delete(&self, name: &str) -> WorkerResult<bool> {
        let _guard = self.write_lock.lock().await;
        match tokio::fs::remove_file(self.partition_path(name)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn match_request(&self, name: &str, key: &RequestKey) -> WorkerResult<Option<Response>> {
        Ok(self.load(name).await?.and_then(|partition| {
            partition
                .entries
                .into_iter()
                .find(|e| &e.key == key)
                .map(|e| e.entry.response)
        }))
    }

    async fn put(&self, name: &str, key: RequestKey, response: Response) -> WorkerResult<()> {
        self.update(name, move |partition| partition.insert(key, response))
            .await
    }

    async fn put_all(&self, name: &str, entries: Vec<(RequestKey, Response)>) -> WorkerResult<()> {
        self.update(name, move |partition| {
            for (key, response) in entries {
                partition.insert(key, response);
            }
        })
        .await
    }

    async fn entries(&self, name: &str) -> WorkerResult<Vec<(RequestKey, CachedEntry)>> {
        let mut entries: Vec<_> = self
            .load(name)
            .await?
            .map(|partition| {
                partition
                    .entries
                    .into_iter()
                    .map(|e| (e.key, e.entry))
                    .collect()
            })
            .unwrap_or_default();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(entries)
    }
}
