use std::{
    path::PathBuf,
    time::{Duration, SystemTime},
};

use serde::{Deserialize, Serialize};

use crate::config::Config;

/// Tracks how fresh the cached copy of the published index is.
#[derive(Debug)]
pub struct CachesManager {
    root: PathBuf,
    last_refreshed: Duration,
    update_interval: Duration,
    force: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CacheMeta {
    last_refreshed: u64,
}

impl CachesManager {
    pub fn new(opts: &Config) -> Self {
        let root = opts.cache_dir();
        let metafile = root.join("meta.json");

        // An unreadable or missing meta file just means the cache is stale.
        let last_refreshed = std::fs::read_to_string(&metafile)
            .ok()
            .and_then(|meta| serde_json::from_str::<CacheMeta>(&meta).ok())
            .map(|meta| meta.last_refreshed)
            .unwrap_or(0);

        Self {
            root: root.to_path_buf(),
            last_refreshed: Duration::from_secs(last_refreshed),
            update_interval: Duration::from_secs(opts.update_interval()),
            force: opts.force(),
        }
    }

    pub fn should_refresh(&self) -> bool {
        let last_refreshed = SystemTime::UNIX_EPOCH + self.last_refreshed;
        match SystemTime::now().duration_since(last_refreshed) {
            Ok(duration) => self.force || duration > self.update_interval,
            Err(_) => self.force,
        }
    }

    pub async fn flush_meta(&mut self) -> anyhow::Result<()> {
        let last_refreshed = SystemTime::now().duration_since(SystemTime::UNIX_EPOCH)?;
        let meta = CacheMeta {
            last_refreshed: last_refreshed.as_secs(),
        };
        self.last_refreshed = last_refreshed;

        let meta = serde_json::to_string(&meta)?;
        let metafile = self.root.join("meta.json");
        tokio::fs::create_dir_all(&self.root).await?;
        tokio::fs::write(metafile, meta).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_cache_is_not_refreshed() {
        let manager = CachesManager {
            root: PathBuf::from("/tmp"),
            last_refreshed: SystemTime::now()
                .duration_since(SystemTime::UNIX_EPOCH)
                .unwrap(),
            update_interval: Duration::from_secs(60 * 60),
            force: false,
        };
        assert!(!manager.should_refresh());
    }

    #[test]
    fn stale_cache_is_refreshed() {
        let manager = CachesManager {
            root: PathBuf::from("/tmp"),
            last_refreshed: Duration::from_secs(0),
            update_interval: Duration::from_secs(60 * 60),
            force: false,
        };
        assert!(manager.should_refresh());
    }

    #[test]
    fn force_always_refreshes() {
        let manager = CachesManager {
            root: PathBuf::from("/tmp"),
            last_refreshed: SystemTime::now()
                .duration_since(SystemTime::UNIX_EPOCH)
                .unwrap(),
            update_interval: Duration::from_secs(60 * 60),
            force: true,
        };
        assert!(manager.should_refresh());
    }
}
