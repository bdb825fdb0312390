use std::future::Future;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{debug, trace};

/// Prefix of every cache file. Bumping it orphans all previously written entries.
pub const CACHE_VERSION: &str = "v0";

/// Readable part of a file name; the digest suffix keeps names unique.
const MAX_PREFIX_LEN: usize = 120;

/// On-disk memoization of network lookups, one JSON file per id.
///
/// Entries never expire. Concurrent callers must use distinct ids; nothing is locked.
#[derive(Debug, Clone)]
pub struct Cache {
    dir: PathBuf,
    fresh: bool,
}

impl Cache {
    /// `fresh` skips reads but still writes, refreshing every entry touched.
    pub fn new(dir: impl Into<PathBuf>, fresh: bool) -> Self {
        Self {
            dir: dir.into(),
            fresh,
        }
    }

    pub fn path_for(&self, id: &str) -> PathBuf {
        self.dir
            .join(format!("{}_{}.json", CACHE_VERSION, sanitize_key(id)))
    }

    /// Return the stored value for `id`, or run `producer` and store its result.
    ///
    /// A missing, unreadable or corrupt entry counts as a miss. `None` results are
    /// returned but not stored, so they are retried on the next run.
    pub async fn cached<T, F, Fut>(&self, id: &str, producer: F) -> Option<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Option<T>>,
    {
        let path = self.path_for(id);

        if !self.fresh {
            match read_entry(&path).await {
                Ok(value) => {
                    trace!(id, "cache hit");
                    return Some(value);
                }
                Err(e) => trace!(id, error = %e, "cache miss"),
            }
        }

        let result = producer().await;

        if let Some(value) = &result {
            if let Err(e) = self.write_entry(&path, value).await {
                debug!(id, error = %e, "failed to write cache entry");
            }
        }

        result
    }

    async fn write_entry<T: Serialize>(&self, path: &Path, value: &T) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("Failed to create {}", self.dir.display()))?;
        let json = serde_json::to_string(value)?;
        tokio::fs::write(path, json)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }
}

async fn read_entry<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = tokio::fs::read_to_string(path).await?;
    Ok(serde_json::from_str(&content)?)
}

/// Turn an arbitrary id into a single, non-hidden path component.
///
/// The readable prefix is lossy, so the SHA-256 of the raw id is appended:
/// distinct ids never share a file.
pub fn sanitize_key(id: &str) -> String {
    let mut prefix: String = id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '^' | '@' | '+') {
                c
            } else {
                '_'
            }
        })
        .take(MAX_PREFIX_LEN)
        .collect();

    if prefix.starts_with('.') {
        prefix.replace_range(..1, "_");
    }

    let mut hasher = Sha256::new();
    hasher.update(id.as_bytes());
    format!("{}_{:x}", prefix, hasher.finalize())
}
