//! Configuration types and structures.

use crate::topics::TopicCatalog;
use crate::types::Role;
use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

/// Default port for the HTTP API.
pub const DEFAULT_PORT: u16 = 31995;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub catalog: CatalogConfig,

    #[serde(default)]
    pub domains: DomainsConfig,
}

/// Server-specific configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Address the HTTP API binds to.
    #[serde(default = "default_bind")]
    pub bind: IpAddr,

    /// Port for the HTTP API (default: 31995).
    #[serde(default = "default_port")]
    pub port: u16,

    /// How long a writer waits on a locked database before failing.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,

    /// Lifetime of a login session.
    #[serde(default = "default_session_ttl_hours")]
    pub session_ttl_hours: i64,

    /// Send internal error detail to clients. Leave off in production.
    #[serde(default)]
    pub expose_internal_errors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            bind: default_bind(),
            port: default_port(),
            busy_timeout_ms: default_busy_timeout_ms(),
            session_ttl_hours: default_session_ttl_hours(),
            expose_internal_errors: false,
        }
    }
}

impl ServerConfig {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }

    pub fn session_ttl_ms(&self) -> i64 {
        self.session_ttl_hours.saturating_mul(3_600_000)
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("task-board/board.db")
}

fn default_bind() -> IpAddr {
    IpAddr::V4(Ipv4Addr::LOCALHOST)
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_busy_timeout_ms() -> u64 {
    5_000
}

fn default_session_ttl_hours() -> i64 {
    168 // one week
}

/// A catalog section and its topics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionConfig {
    pub name: String,
    #[serde(default)]
    pub topics: Vec<String>,
}

/// Sections and topics available for tagging tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogConfig {
    #[serde(default)]
    pub sections: Vec<SectionConfig>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        let section = |name: &str, topics: &[&str]| SectionConfig {
            name: name.to_string(),
            topics: topics.iter().map(|t| t.to_string()).collect(),
        };
        Self {
            sections: vec![
                section("Positioning", &["PR", "Digital", "Visits"]),
                section("Sourcing", &["Enlisted", "Officers", "NCOs"]),
            ],
        }
    }
}

/// Domain list settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainsConfig {
    /// Domains inserted by `seed-domains` and on first start.
    #[serde(default = "default_seed_domains")]
    pub seed: Vec<String>,

    /// Lowest role allowed to create or delete domains.
    #[serde(default = "default_domain_min_role")]
    pub min_role: Role,
}

impl Default for DomainsConfig {
    fn default() -> Self {
        Self {
            seed: default_seed_domains(),
            min_role: default_domain_min_role(),
        }
    }
}

fn default_seed_domains() -> Vec<String> {
    ["Development", "Marketing", "Support", "Sales", "Management"]
        .iter()
        .map(|d| d.to_string())
        .collect()
}

fn default_domain_min_role() -> Role {
    Role::TeamLead
}

impl Config {
    /// Load configuration from a single YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow!("cannot read {}: {}", path.display(), e))?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Build the topic catalog, failing on an invalid catalog section.
    pub fn topic_catalog(&self) -> Result<TopicCatalog> {
        TopicCatalog::from_config(&self.catalog)
    }

    /// Check settings that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        self.topic_catalog()?;
        if self.server.session_ttl_hours <= 0 {
            return Err(anyhow!("server.session_ttl_hours must be positive"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        config.validate().unwrap();
        assert_eq!(config.server.port, DEFAULT_PORT);
        assert_eq!(config.domains.min_role, Role::TeamLead);
        assert_eq!(config.catalog.sections.len(), 2);
    }

    #[test]
    fn partial_yaml_fills_in_defaults() {
        let config: Config = serde_yaml::from_str(
            r#"
server:
  port: 8080
domains:
  min_role: member
"#,
        )
        .unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.busy_timeout_ms, 5_000);
        assert_eq!(config.domains.min_role, Role::Member);
        assert_eq!(config.domains.seed.len(), 5);
    }

    #[test]
    fn session_ttl_must_be_positive() {
        let mut config = Config::default();
        config.server.session_ttl_hours = 0;
        assert!(config.validate().is_err());
    }
}
