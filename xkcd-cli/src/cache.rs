// ABOUTME: JSON cache of the comic archive listing with a freshness timeout
// ABOUTME: Created on first use and refreshed transparently once it is older than the timeout

use crate::archive::{ComicMeta, XkcdClient};
use crate::constants::cache::{CACHE_DIR_NAME, CACHE_FILE_NAME};
use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComicCache {
    pub last_updated: DateTime<Utc>,
    pub comics: Vec<ComicMeta>,
}

/// `~/.cache/xkcd-cli/cache.json`, or the platform cache dir equivalent.
pub fn default_cache_path() -> Result<PathBuf> {
    let base = dirs::cache_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".cache")))
        .ok_or_else(|| anyhow!("Could not determine a cache directory"))?;
    Ok(base.join(CACHE_DIR_NAME).join(CACHE_FILE_NAME))
}

impl ComicCache {
    pub fn new(comics: Vec<ComicMeta>) -> Self {
        Self {
            last_updated: Utc::now(),
            comics,
        }
    }

    pub fn read(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read cache file: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse cache file: {}", path.display()))
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| anyhow!("Failed to create cache directory {:?}: {}", parent, e))?;
        }

        // Write to a sibling file first so a crash never leaves half a cache
        let temp_path = path.with_extension("tmp");
        let content = serde_json::to_string(self).context("Failed to serialize cache")?;
        fs::write(&temp_path, content)
            .map_err(|e| anyhow!("Failed to write cache file {:?}: {}", temp_path, e))?;
        fs::rename(&temp_path, path).map_err(|e| {
            anyhow!(
                "Failed to move cache file {:?} -> {:?}: {}",
                temp_path,
                path,
                e
            )
        })?;

        log::debug!("Cached {} comics at {}", self.comics.len(), path.display());
        Ok(())
    }

    pub fn is_outdated(&self, timeout: Duration, now: DateTime<Utc>) -> bool {
        let timeout = chrono::Duration::from_std(timeout).unwrap_or(chrono::Duration::MAX);
        match self.last_updated.checked_add_signed(timeout) {
            Some(expires) => now > expires,
            None => false,
        }
    }
}

/// Fetch the archive and overwrite the cache at `path`.
pub async fn update_cache(path: &Path, client: &XkcdClient) -> Result<ComicCache> {
    let cache = ComicCache::new(client.fetch_archive().await?);
    cache.write(path)?;
    Ok(cache)
}

/// Read the cache at `path`, creating or refreshing it as needed.
pub async fn load_or_refresh(
    path: &Path,
    timeout: Duration,
    client: &XkcdClient,
) -> Result<ComicCache> {
    if !path.exists() {
        log::debug!("No cache at {}, creating it", path.display());
        return update_cache(path, client).await;
    }

    let cache = ComicCache::read(path)?;
    if cache.is_outdated(timeout, Utc::now()) {
        log::debug!("Cache from {} is outdated, refreshing", cache.last_updated);
        return update_cache(path, client).await;
    }
    Ok(cache)
}
