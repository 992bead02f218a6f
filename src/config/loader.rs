//! Configuration loader with tier-based merging.
//!
//! Loads configuration from multiple tiers and merges them field-by-field.

use super::merge::merge_tiers;
use super::types::Config;
use anyhow::{Result, anyhow};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Configuration tier priority (lowest to highest).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConfigTier {
    /// Embedded defaults (lowest priority)
    Defaults = 0,
    /// Project-level config ($CWD/task-board/)
    Project = 1,
    /// User-level config (~/.task-board/)
    User = 2,
    /// Environment variables (highest priority)
    Environment = 3,
}

impl std::fmt::Display for ConfigTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigTier::Defaults => write!(f, "defaults"),
            ConfigTier::Project => write!(f, "project"),
            ConfigTier::User => write!(f, "user"),
            ConfigTier::Environment => write!(f, "environment"),
        }
    }
}

/// Where each tier lives on disk.
#[derive(Debug, Clone, Default)]
pub struct ConfigPaths {
    /// Explicit config file; when set, tiers are skipped.
    pub explicit_file: Option<PathBuf>,
    /// Project-level config directory
    pub project_dir: Option<PathBuf>,
    /// User-level config directory
    pub user_dir: Option<PathBuf>,
}

impl ConfigPaths {
    /// Discover configuration paths from environment and defaults.
    pub fn discover() -> Self {
        let explicit_file = std::env::var("TASK_BOARD_CONFIG_PATH")
            .ok()
            .map(PathBuf::from);

        // Project dir: TASK_BOARD_PROJECT_DIR or $CWD/task-board
        let project_dir = std::env::var("TASK_BOARD_PROJECT_DIR")
            .ok()
            .map(PathBuf::from)
            .or_else(|| Some(PathBuf::from("task-board")));

        // User dir: TASK_BOARD_USER_DIR or ~/.task-board
        let user_dir = std::env::var("TASK_BOARD_USER_DIR")
            .ok()
            .map(PathBuf::from)
            .or_else(|| dirs::home_dir().map(|h| h.join(".task-board")));

        Self {
            explicit_file,
            project_dir,
            user_dir,
        }
    }

    /// Create paths with explicit directories.
    pub fn with_dirs(project_dir: Option<PathBuf>, user_dir: Option<PathBuf>) -> Self {
        Self {
            explicit_file: None,
            project_dir,
            user_dir,
        }
    }

    /// Use a single config file instead of the tiers.
    pub fn with_file(mut self, file: PathBuf) -> Self {
        self.explicit_file = Some(file);
        self
    }
}

/// Configuration loader that handles tier-based merging.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    pub paths: ConfigPaths,
    config: Config,
    /// Files that contributed, lowest tier first.
    sources: Vec<(ConfigTier, PathBuf)>,
}

impl ConfigLoader {
    /// Load configuration from all tiers with proper merging.
    pub fn load() -> Result<Self> {
        Self::load_with_paths(ConfigPaths::discover())
    }

    /// Load configuration with explicit paths.
    pub fn load_with_paths(paths: ConfigPaths) -> Result<Self> {
        let mut sources = Vec::new();

        let mut config = if let Some(ref file) = paths.explicit_file {
            sources.push((ConfigTier::Project, file.clone()));
            Config::load(file)?
        } else {
            let mut tiers: Vec<Value> = vec![serde_json::to_value(Config::default())?];

            for (tier, dir) in [
                (ConfigTier::Project, paths.project_dir.as_deref()),
                (ConfigTier::User, paths.user_dir.as_deref()),
            ] {
                let Some(dir) = dir else { continue };
                let file = dir.join("config.yaml");
                if let Some(value) = read_tier(&file)? {
                    debug!(tier = %tier, path = %file.display(), "Loaded config tier");
                    tiers.push(value);
                    sources.push((tier, file));
                }
            }

            serde_json::from_value(merge_tiers(tiers))?
        };

        Self::apply_env_overrides(&mut config)?;
        config.validate()?;

        Ok(Self {
            paths,
            config,
            sources,
        })
    }

    /// Apply environment variable overrides to config.
    fn apply_env_overrides(config: &mut Config) -> Result<()> {
        if let Ok(db_path) = std::env::var("TASK_BOARD_DB_PATH") {
            config.server.db_path = PathBuf::from(db_path);
        }

        if let Ok(bind) = std::env::var("TASK_BOARD_BIND") {
            config.server.bind = bind
                .parse()
                .map_err(|e| anyhow!("TASK_BOARD_BIND: invalid address '{}': {}", bind, e))?;
        }

        if let Ok(port) = std::env::var("TASK_BOARD_PORT") {
            config.server.port = port
                .parse()
                .map_err(|e| anyhow!("TASK_BOARD_PORT: invalid port '{}': {}", port, e))?;
        }

        Ok(())
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Consume the loader and return the configuration.
    pub fn into_config(self) -> Config {
        self.config
    }

    /// Config files that were merged, lowest tier first.
    pub fn sources(&self) -> &[(ConfigTier, PathBuf)] {
        &self.sources
    }
}

/// Read one tier file. A missing file is skipped; an unreadable or
/// malformed one is reported so typos do not silently fall back to defaults.
fn read_tier(file: &Path) -> Result<Option<Value>> {
    if !file.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(file)?;
    if content.trim().is_empty() {
        warn!(path = %file.display(), "Ignoring empty config file");
        return Ok(None);
    }
    let value = serde_yaml::from_str::<Value>(&content)
        .map_err(|e| anyhow!("invalid YAML in {}: {}", file.display(), e))?;
    Ok(Some(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Role;
    use tempfile::TempDir;

    #[test]
    fn load_defaults_only() {
        let temp = TempDir::new().unwrap();
        let paths = ConfigPaths::with_dirs(
            Some(temp.path().join("project")),
            Some(temp.path().join("user")),
        );

        let loader = ConfigLoader::load_with_paths(paths).unwrap();
        let config = loader.config();

        assert_eq!(config.server.busy_timeout_ms, 5_000);
        assert_eq!(config.catalog.sections.len(), 2);
        assert!(loader.sources().is_empty());
    }

    #[test]
    fn user_config_overrides_project() {
        let temp = TempDir::new().unwrap();
        let project_dir = temp.path().join("task-board");
        let user_dir = temp.path().join("user");
        std::fs::create_dir_all(&project_dir).unwrap();
        std::fs::create_dir_all(&user_dir).unwrap();

        std::fs::write(
            project_dir.join("config.yaml"),
            "server:\n  busy_timeout_ms: 100\n  session_ttl_hours: 24\n",
        )
        .unwrap();
        std::fs::write(
            user_dir.join("config.yaml"),
            "server:\n  busy_timeout_ms: 200\ndomains:\n  min_role: manager\n",
        )
        .unwrap();

        let loader =
            ConfigLoader::load_with_paths(ConfigPaths::with_dirs(Some(project_dir), Some(user_dir)))
                .unwrap();
        let config = loader.config();

        assert_eq!(config.server.busy_timeout_ms, 200);
        assert_eq!(config.server.session_ttl_hours, 24);
        assert_eq!(config.domains.min_role, Role::Manager);
        assert_eq!(loader.sources().len(), 2);
        assert_eq!(loader.sources()[0].0, ConfigTier::Project);
    }

    #[test]
    fn project_catalog_replaces_default_catalog() {
        let temp = TempDir::new().unwrap();
        let project_dir = temp.path().join("task-board");
        std::fs::create_dir_all(&project_dir).unwrap();
        std::fs::write(
            project_dir.join("config.yaml"),
            "catalog:\n  sections:\n    - name: Ops\n      topics: [Logistics, Training]\n",
        )
        .unwrap();

        let loader =
            ConfigLoader::load_with_paths(ConfigPaths::with_dirs(Some(project_dir), None)).unwrap();
        let catalog = loader.config().topic_catalog().unwrap();

        assert_eq!(catalog.section_names(), vec!["Ops"]);
        assert!(catalog.is_valid_topic("Ops", "Training"));
    }

    #[test]
    fn invalid_catalog_fails_loading() {
        let temp = TempDir::new().unwrap();
        let project_dir = temp.path().join("task-board");
        std::fs::create_dir_all(&project_dir).unwrap();
        std::fs::write(
            project_dir.join("config.yaml"),
            "catalog:\n  sections:\n    - name: Ops\n      topics: []\n",
        )
        .unwrap();

        let result = ConfigLoader::load_with_paths(ConfigPaths::with_dirs(Some(project_dir), None));
        assert!(result.is_err());
    }

    #[test]
    fn explicit_file_skips_tiers() {
        let temp = TempDir::new().unwrap();
        let project_dir = temp.path().join("task-board");
        std::fs::create_dir_all(&project_dir).unwrap();
        std::fs::write(project_dir.join("config.yaml"), "server:\n  busy_timeout_ms: 1\n").unwrap();
        let explicit = temp.path().join("only.yaml");
        std::fs::write(&explicit, "server:\n  busy_timeout_ms: 42\n").unwrap();

        let paths = ConfigPaths::with_dirs(Some(project_dir), None).with_file(explicit);
        let loader = ConfigLoader::load_with_paths(paths).unwrap();

        assert_eq!(loader.config().server.busy_timeout_ms, 42);
    }
}
