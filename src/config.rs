use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::debug;

use crate::models::Scope;

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONCURRENCY: usize = 64;

/// On-disk configuration, deserialized from `.depsman/config.toml`.
///
/// ```toml
/// [github]
/// token = "ghp_..."
///
/// [cache]
/// dir = "/tmp/depsman"
///
/// [network]
/// timeout_secs = 30
/// concurrency = 64
/// ```
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub github: GitHubSection,
    #[serde(default)]
    pub cache: CacheSection,
    #[serde(default)]
    pub network: NetworkSection,
}

#[derive(Debug, Default, Deserialize)]
pub struct GitHubSection {
    pub token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CacheSection {
    /// Relative paths are resolved against the project directory.
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
pub struct NetworkSection {
    pub timeout_secs: Option<u64>,
    /// Maximum dependencies resolved at once; `0` removes the bound.
    pub concurrency: Option<usize>,
}

/// Settings gathered from the command line and the environment.
#[derive(Debug, Default)]
pub struct Overrides {
    pub token: Option<String>,
    pub scope: Scope,
    pub fresh: bool,
    pub no_color: bool,
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone)]
pub struct Config {
    pub project_dir: PathBuf,
    pub scope: Scope,
    pub token: Option<String>,
    /// Skip cache reads; results are still written.
    pub fresh: bool,
    pub cache_dir: PathBuf,
    pub timeout: Duration,
    pub concurrency: usize,
    pub color: bool,
}

impl Default for Config {
    fn default() -> Self {
        let project_dir = PathBuf::from(".");
        Config {
            cache_dir: default_cache_dir(&project_dir),
            project_dir,
            scope: Scope::All,
            token: None,
            fresh: false,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            concurrency: DEFAULT_CONCURRENCY,
            color: true,
        }
    }
}

impl Config {
    /// Layer command line overrides over the file values and the defaults.
    pub fn resolve(project_dir: &Path, file: FileConfig, overrides: Overrides) -> Self {
        let cache_dir = match file.cache.dir {
            Some(dir) if dir.is_relative() => project_dir.join(dir),
            Some(dir) => dir,
            None => default_cache_dir(project_dir),
        };

        Config {
            project_dir: project_dir.to_path_buf(),
            scope: overrides.scope,
            token: overrides
                .token
                .or(file.github.token)
                .filter(|t| !t.trim().is_empty()),
            fresh: overrides.fresh,
            cache_dir,
            timeout: Duration::from_secs(file.network.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)),
            concurrency: file.network.concurrency.unwrap_or(DEFAULT_CONCURRENCY),
            color: !overrides.no_color,
        }
    }
}

pub fn default_cache_dir(project_dir: &Path) -> PathBuf {
    project_dir.join("node_modules").join(".cache").join("depsman")
}

/// Load the file configuration, searching in order:
///
/// 1. `config_override`: path passed via `--config`
/// 2. `<project_path>/.depsman/config.toml`
/// 3. `~/.config/depsman/config.toml`
/// 4. Built-in defaults
pub fn load_config(project_path: &Path, config_override: Option<&Path>) -> Result<FileConfig> {
    if let Some(path) = config_override {
        return read_config(path);
    }

    let project_config = project_path.join(".depsman").join("config.toml");
    if project_config.exists() {
        return read_config(&project_config);
    }

    if let Some(home) = dirs::home_dir() {
        let home_config = home.join(".config").join("depsman").join("config.toml");
        if home_config.exists() {
            return read_config(&home_config);
        }
    }

    Ok(FileConfig::default())
}

fn read_config(path: &Path) -> Result<FileConfig> {
    debug!(path = %path.display(), "loading config");
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("Invalid config file {}", path.display()))
}
