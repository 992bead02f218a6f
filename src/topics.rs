//! Topic catalog: the closed set of sections and the topics under each.
//!
//! The catalog is built once from configuration at startup and is read-only
//! afterwards. Tasks and parent tasks are tagged with a (section, topic) pair
//! from the catalog; user topic grants use the same pairs.

use crate::config::CatalogConfig;
use crate::error::ApiError;
use anyhow::{Result, anyhow};
use serde::Serialize;
use std::collections::HashSet;

/// Topic assigned to general tasks created without one.
pub const GENERAL_TOPIC: &str = "general";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Section {
    pub name: String,
    pub topics: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopicCatalog {
    sections: Vec<Section>,
}

impl Default for TopicCatalog {
    fn default() -> Self {
        // Defaults always validate
        Self::from_config(&CatalogConfig::default()).unwrap_or(Self {
            sections: Vec::new(),
        })
    }
}

impl TopicCatalog {
    /// Build and validate a catalog from configuration.
    pub fn from_config(config: &CatalogConfig) -> Result<Self> {
        if config.sections.is_empty() {
            return Err(anyhow!("catalog must define at least one section"));
        }

        let mut names = HashSet::new();
        let mut sections = Vec::with_capacity(config.sections.len());
        for section in &config.sections {
            let name = section.name.trim();
            if name.is_empty() {
                return Err(anyhow!("catalog section names must not be empty"));
            }
            if !names.insert(name.to_string()) {
                return Err(anyhow!("duplicate catalog section: {}", name));
            }
            if section.topics.is_empty() {
                return Err(anyhow!("catalog section '{}' has no topics", name));
            }

            let mut seen = HashSet::new();
            let mut topics = Vec::with_capacity(section.topics.len());
            for topic in &section.topics {
                let topic = topic.trim();
                if topic.is_empty() {
                    return Err(anyhow!("empty topic in catalog section '{}'", name));
                }
                if topic.eq_ignore_ascii_case(GENERAL_TOPIC) {
                    return Err(anyhow!(
                        "topic '{}' in section '{}' is reserved for general tasks",
                        topic,
                        name
                    ));
                }
                if !seen.insert(topic.to_string()) {
                    return Err(anyhow!("duplicate topic '{}' in section '{}'", topic, name));
                }
                topics.push(topic.to_string());
            }

            sections.push(Section {
                name: name.to_string(),
                topics,
            });
        }

        Ok(Self { sections })
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn section_names(&self) -> Vec<&str> {
        self.sections.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn topics(&self, section: &str) -> Option<&[String]> {
        self.sections
            .iter()
            .find(|s| s.name == section)
            .map(|s| s.topics.as_slice())
    }

    pub fn is_valid_section(&self, section: &str) -> bool {
        self.sections.iter().any(|s| s.name == section)
    }

    pub fn is_valid_topic(&self, section: &str, topic: &str) -> bool {
        self.topics(section)
            .is_some_and(|topics| topics.iter().any(|t| t == topic))
    }

    /// Whether any section lists this topic.
    pub fn has_topic_anywhere(&self, topic: &str) -> bool {
        self.sections
            .iter()
            .any(|s| s.topics.iter().any(|t| t == topic))
    }

    /// Check a section name, reporting the allowed values on failure.
    pub fn check_section(&self, section: &str) -> Result<(), ApiError> {
        if self.is_valid_section(section) {
            Ok(())
        } else {
            Err(ApiError::invalid_value(
                "section",
                format!(
                    "section must be one of: {}",
                    self.section_names().join(", ")
                ),
            ))
        }
    }

    /// Check that a topic belongs to a section.
    pub fn check_topic(&self, section: &str, topic: &str) -> Result<(), ApiError> {
        self.check_section(section)?;
        if self.is_valid_topic(section, topic) {
            Ok(())
        } else {
            let allowed = self.topics(section).unwrap_or_default().join(", ");
            Err(ApiError::invalid_value(
                "topic",
                format!("topic must be one of: {}", allowed),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SectionConfig;
    use crate::error::ErrorCode;

    fn section(name: &str, topics: &[&str]) -> SectionConfig {
        SectionConfig {
            name: name.to_string(),
            topics: topics.iter().map(|t| t.to_string()).collect(),
        }
    }

    #[test]
    fn default_catalog_has_two_sections() {
        let catalog = TopicCatalog::default();
        assert_eq!(catalog.section_names(), vec!["Positioning", "Sourcing"]);
        assert!(catalog.is_valid_topic("Positioning", "Digital"));
        assert!(catalog.is_valid_topic("Sourcing", "Officers"));
        assert!(!catalog.is_valid_topic("Positioning", "Officers"));
    }

    #[test]
    fn check_topic_reports_allowed_values() {
        let catalog = TopicCatalog::default();
        let err = catalog.check_topic("Sourcing", "Digital").unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidFieldValue);
        assert_eq!(err.field.as_deref(), Some("topic"));
        assert!(err.message.contains("Officers"));

        let err = catalog.check_topic("Nowhere", "Digital").unwrap_err();
        assert_eq!(err.field.as_deref(), Some("section"));
    }

    #[test]
    fn rejects_duplicate_sections_and_topics() {
        let dup_section = CatalogConfig {
            sections: vec![section("A", &["x"]), section("A", &["y"])],
        };
        assert!(TopicCatalog::from_config(&dup_section).is_err());

        let dup_topic = CatalogConfig {
            sections: vec![section("A", &["x", "x"])],
        };
        assert!(TopicCatalog::from_config(&dup_topic).is_err());
    }

    #[test]
    fn rejects_reserved_and_empty_entries() {
        let reserved = CatalogConfig {
            sections: vec![section("A", &["General"])],
        };
        assert!(TopicCatalog::from_config(&reserved).is_err());

        let empty = CatalogConfig {
            sections: vec![section("A", &[])],
        };
        assert!(TopicCatalog::from_config(&empty).is_err());

        assert!(TopicCatalog::from_config(&CatalogConfig { sections: vec![] }).is_err());
    }
}
