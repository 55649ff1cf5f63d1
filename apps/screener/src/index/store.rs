//! On-disk retention of recent similarity indexes, for debugging only.
//!
//! Layout: `<root>/resume_index_<id>/index.json`. The pipeline writes these but
//! never reads them back, so evicting an artifact cannot disturb a running query.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::index::{IndexError, IndexedChunk, SimilarityIndex};

const INDEX_PREFIX: &str = "resume_index_";
const INDEX_FILE: &str = "index.json";

#[derive(Debug, Serialize, Deserialize)]
struct PersistedIndex {
    id: String,
    created_at: DateTime<Utc>,
    chunks: Vec<IndexedChunk>,
}

#[derive(Debug, Deserialize)]
struct PersistedHeader {
    created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct IndexStore {
    root: PathBuf,
    retention: usize,
}

impl IndexStore {
    pub fn new(root: impl Into<PathBuf>, retention: usize) -> Self {
        Self {
            root: root.into(),
            retention,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Writes the index under a directory unique to its id, then evicts old artifacts.
    pub async fn save(&self, index: &SimilarityIndex) -> Result<PathBuf, IndexError> {
        let path = self.persist(index, Utc::now()).await?;
        let evicted = self.evict().await?;
        if !evicted.is_empty() {
            info!("Evicted {} old index artifacts", evicted.len());
        }
        Ok(path)
    }

    async fn persist(
        &self,
        index: &SimilarityIndex,
        created_at: DateTime<Utc>,
    ) -> Result<PathBuf, IndexError> {
        let dir = self.root.join(format!("{INDEX_PREFIX}{}", index.id()));
        tokio::fs::create_dir_all(&dir).await?;

        let artifact = PersistedIndex {
            id: index.id().to_string(),
            created_at,
            chunks: index.chunks().to_vec(),
        };
        tokio::fs::write(dir.join(INDEX_FILE), serde_json::to_vec(&artifact)?).await?;

        info!("Saved index {} to {}", index.id(), dir.display());
        Ok(dir)
    }

    /// Lists persisted index directories, oldest first.
    pub async fn list(&self) -> Result<Vec<PathBuf>, IndexError> {
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut found: Vec<(DateTime<Utc>, PathBuf)> = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let is_index = entry
                .file_name()
                .to_str()
                .map(|n| n.starts_with(INDEX_PREFIX))
                .unwrap_or(false);
            if !is_index || !entry.file_type().await?.is_dir() {
                continue;
            }
            let path = entry.path();
            found.push((created_at(&path).await, path));
        }

        found.sort();
        Ok(found.into_iter().map(|(_, path)| path).collect())
    }

    /// Deletes every artifact beyond the retention count, oldest first.
    /// Individual deletion failures are logged and skipped.
    pub async fn evict(&self) -> Result<Vec<PathBuf>, IndexError> {
        let all = self.list().await?;
        if all.len() <= self.retention {
            return Ok(Vec::new());
        }

        let excess = all.len() - self.retention;
        let mut removed = Vec::with_capacity(excess);
        for path in all.into_iter().take(excess) {
            match tokio::fs::remove_dir_all(&path).await {
                Ok(()) => {
                    info!("Cleaned up old index: {}", path.display());
                    removed.push(path);
                }
                Err(e) => warn!("Could not remove old index {}: {e}", path.display()),
            }
        }
        Ok(removed)
    }

    /// Deletes every persisted artifact. Returns how many were removed.
    pub async fn clear(&self) -> Result<usize, IndexError> {
        let mut removed = 0;
        for path in self.list().await? {
            tokio::fs::remove_dir_all(&path).await?;
            removed += 1;
        }
        Ok(removed)
    }
}

/// Creation time recorded in the artifact, falling back to the directory's mtime.
async fn created_at(dir: &Path) -> DateTime<Utc> {
    if let Ok(bytes) = tokio::fs::read(dir.join(INDEX_FILE)).await {
        if let Ok(header) = serde_json::from_slice::<PersistedHeader>(&bytes) {
            return header.created_at;
        }
    }
    tokio::fs::metadata(dir)
        .await
        .and_then(|m| m.modified())
        .map(DateTime::<Utc>::from)
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}
