use std::{
    path::{Path, PathBuf},
    sync::LazyLock,
};

use clap::Args;
use serde::{Deserialize, Serialize};

const DEFAULT_INDEX_URL: &str =
    "https://raw.githubusercontent.com/rapid-scripts/rapid/main/index.json";

#[derive(Debug, Serialize, Deserialize, Default, Args)]
pub struct Config {
    /// The directory where the cache is stored.
    #[arg(long)]
    cache_dir: Option<PathBuf>,
    /// Whether to show progress bars.
    #[arg(long)]
    progress: Option<bool>,
    /// The interval to refresh the cached index. in seconds.
    #[arg(long)]
    update_interval: Option<u64>,
    /// Whether to force refresh the cached index.
    #[serde(skip)]
    #[arg(short, long)]
    force: Option<bool>,
    /// Max number of concurrent source-url verifications.
    #[arg(long)]
    limit: Option<usize>,
    /// The URL where the published index lives.
    #[arg(long)]
    index_url: Option<String>,
}

static DEFAULT_CACHE_DIR: LazyLock<PathBuf> = LazyLock::new(default_cache_dir);
fn default_cache_dir() -> PathBuf {
    let base_dir = xdg::BaseDirectories::with_prefix("rapid-index").unwrap();
    base_dir.get_cache_home()
}

impl Config {
    pub fn cache_dir(&self) -> &Path {
        self.cache_dir
            .as_deref()
            .unwrap_or(DEFAULT_CACHE_DIR.as_path())
    }

    pub fn progress(&self) -> bool {
        self.progress.unwrap_or(true)
    }

    pub fn update_interval(&self) -> u64 {
        self.update_interval.unwrap_or(60 * 60 * 24)
    }

    pub fn force(&self) -> bool {
        self.force.unwrap_or(false)
    }

    pub fn limit(&self) -> usize {
        self.limit.unwrap_or(5)
    }

    pub fn index_url(&self) -> &str {
        self.index_url.as_deref().unwrap_or(DEFAULT_INDEX_URL)
    }

    pub fn extends(self, other: Config) -> Self {
        Self {
            cache_dir: other.cache_dir.or(self.cache_dir),
            progress: other.progress.or(self.progress),
            update_interval: other.update_interval.or(self.update_interval),
            force: other.force.or(self.force),
            limit: other.limit.or(self.limit),
            index_url: other.index_url.or(self.index_url),
        }
    }

    /// Layer CLI overrides on top of the config file.
    pub fn load(overrides: Config) -> Self {
        Self::new_from_file().extends(overrides)
    }

    #[cfg(test)]
    pub fn with_cache_dir(cache_dir: PathBuf) -> Self {
        Self {
            cache_dir: Some(cache_dir),
            ..Default::default()
        }
    }

    fn new_from_file() -> Self {
        match Self::load_from_file() {
            Ok(config) => config,
            Err(_) => Self::default(),
        }
    }

    fn load_from_file() -> anyhow::Result<Self> {
        let base_dir = xdg::BaseDirectories::with_prefix("rapid-index").unwrap();
        let config_file = base_dir.get_config_file("config.toml");
        if config_file.exists() {
            let config = std::fs::read_to_string(config_file)?;
            let config = toml::from_str(&config)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = Config::default();
        assert!(config.progress());
        assert_eq!(config.update_interval(), 60 * 60 * 24);
        assert_eq!(config.limit(), 5);
        assert_eq!(config.index_url(), DEFAULT_INDEX_URL);
    }

    #[test]
    fn overrides_win_over_the_base_layer() {
        let base = Config {
            update_interval: Some(60),
            index_url: Some("https://example.com/a/index.json".into()),
            ..Default::default()
        };
        let overrides = Config {
            index_url: Some("https://example.com/b/index.json".into()),
            limit: Some(2),
            ..Default::default()
        };

        let merged = base.extends(overrides);

        assert_eq!(merged.index_url(), "https://example.com/b/index.json");
        assert_eq!(merged.update_interval(), 60);
        assert_eq!(merged.limit(), 2);
    }
}
