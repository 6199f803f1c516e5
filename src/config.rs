//! Configuration for fieldsync paths and the remote archive.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (FIELDSYNC_HOME, FIELDSYNC_ARCHIVE_URL)
//! 2. Config file (.fieldsync/config.yaml)
//! 3. Defaults (~/.fieldsync, http://localhost:8000)
//!
//! Config file discovery:
//! - Searches current directory and parents for .fieldsync/config.yaml
//! - Paths in the config file are relative to the config file's parent

use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Global cached configuration (stores Result to handle init errors)
static CONFIG: OnceLock<Result<ResolvedConfig, String>> = OnceLock::new();

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    pub version: String,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub remote: Option<RemoteConfig>,
    #[serde(default)]
    pub retention: Option<RetentionConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathsConfig {
    /// Engine state directory (relative to config file)
    pub home: Option<String>,
    /// Captured media directory (relative to config file)
    pub media: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoteConfig {
    pub base_url: Option<String>,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RetentionConfig {
    pub max_age_days: Option<i64>,
}

/// Resolved configuration with absolute paths
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Absolute path to fieldsync home (database + state)
    pub home: PathBuf,
    /// Absolute path to the captured media directory
    pub media: PathBuf,
    /// Archive base URL
    pub archive_url: String,
    /// Bound on every network call
    pub timeout: Duration,
    /// Retention sweep threshold
    pub retention_days: i64,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
}

impl ResolvedConfig {
    /// Local database path ($FIELDSYNC_HOME/fieldsync.db)
    pub fn db_path(&self) -> PathBuf {
        self.home.join("fieldsync.db")
    }
}

/// Find config file by searching current directory and parents
fn find_config_file() -> Option<PathBuf> {
    let mut current = std::env::current_dir().ok()?;

    loop {
        let config_path = current.join(".fieldsync").join("config.yaml");
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Resolve a path that may be relative to the config file's parent
fn resolve_path(base: &Path, path_str: &str) -> PathBuf {
    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
            .canonicalize()
            .unwrap_or_else(|_| base.join(path_str))
    }
}

/// Load configuration from all sources
fn load_config() -> Result<ResolvedConfig> {
    let default_home = dirs::home_dir()
        .context("Failed to determine home directory")?
        .join(".fieldsync");

    let config_file = find_config_file();
    let file = match config_file {
        Some(ref path) => Some(load_config_file(path)?),
        None => None,
    };

    let home = if let Ok(env_home) = std::env::var("FIELDSYNC_HOME") {
        PathBuf::from(env_home)
    } else if let Some(home_path) = file.as_ref().and_then(|f| f.paths.home.as_deref()) {
        // home is relative to the .fieldsync/ directory
        let base = config_file
            .as_ref()
            .and_then(|p| p.parent())
            .unwrap_or(Path::new("."));
        resolve_path(base, home_path)
    } else {
        default_home
    };

    let media = if let Some(media_path) = file.as_ref().and_then(|f| f.paths.media.as_deref()) {
        let base = config_file
            .as_ref()
            .and_then(|p| p.parent())
            .and_then(|p| p.parent())
            .unwrap_or(Path::new("."));
        resolve_path(base, media_path)
    } else {
        home.join("media")
    };

    let archive_url = if let Ok(env_url) = std::env::var("FIELDSYNC_ARCHIVE_URL") {
        env_url
    } else {
        file.as_ref()
            .and_then(|f| f.remote.as_ref())
            .and_then(|r| r.base_url.clone())
            .unwrap_or_else(|| "http://localhost:8000".to_string())
    };

    let timeout_seconds = file
        .as_ref()
        .and_then(|f| f.remote.as_ref())
        .and_then(|r| r.timeout_seconds)
        .unwrap_or(30);

    let retention_days = file
        .as_ref()
        .and_then(|f| f.retention.as_ref())
        .and_then(|r| r.max_age_days)
        .unwrap_or(crate::store::DEFAULT_RETENTION_DAYS);

    Ok(ResolvedConfig {
        home,
        media,
        archive_url,
        timeout: Duration::from_secs(timeout_seconds),
        retention_days,
        config_file,
    })
}

/// Get the global configuration (loads once, then cached)
pub fn config() -> Result<&'static ResolvedConfig> {
    let result = CONFIG.get_or_init(|| load_config().map_err(|e| e.to_string()));

    match result {
        Ok(config) => Ok(config),
        Err(e) => anyhow::bail!("{}", e),
    }
}

/// Force reload configuration (useful for testing)
pub fn reload_config() -> Result<ResolvedConfig> {
    load_config()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_config_file_parsing() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join(".fieldsync");
        std::fs::create_dir_all(&dir).unwrap();

        let config_path = dir.join("config.yaml");
        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(
            file,
            r#"
version: "1.0"
paths:
  home: ./
  media: ../captures
remote:
  base_url: http://archive.dig.example:8000
  timeout_seconds: 10
retention:
  max_age_days: 14
"#
        )
        .unwrap();

        let config = load_config_file(&config_path).unwrap();
        assert_eq!(config.version, "1.0");
        assert_eq!(config.paths.home, Some("./".to_string()));
        assert_eq!(config.paths.media, Some("../captures".to_string()));
        let remote = config.remote.unwrap();
        assert_eq!(
            remote.base_url,
            Some("http://archive.dig.example:8000".to_string())
        );
        assert_eq!(remote.timeout_seconds, Some(10));
        assert_eq!(config.retention.unwrap().max_age_days, Some(14));
    }

    #[test]
    fn test_resolve_relative_path() {
        let base = PathBuf::from("/home/user/dig");

        assert_eq!(
            resolve_path(&base, "./captures"),
            PathBuf::from("/home/user/dig/captures")
        );
        assert_eq!(
            resolve_path(&base, "/absolute/path"),
            PathBuf::from("/absolute/path")
        );
    }

    #[test]
    fn test_db_path() {
        let config = ResolvedConfig {
            home: PathBuf::from("/test/.fieldsync"),
            media: PathBuf::from("/test/.fieldsync/media"),
            archive_url: "http://localhost:8000".to_string(),
            timeout: Duration::from_secs(30),
            retention_days: 30,
            config_file: None,
        };
        assert_eq!(
            config.db_path(),
            PathBuf::from("/test/.fieldsync/fieldsync.db")
        );
    }
}
