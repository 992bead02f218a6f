//! Board operations.
//!
//! Every API operation is a method on [`Board`] taking the acting user. Checks
//! run in a fixed order: role-only policy rules, then visibility (absent and
//! invisible entities are both `NOT_FOUND`), then relationship rules, then
//! input validation. Nothing is written before all checks pass.

mod auth;
mod collaborators;
mod discussion;
mod domains;
mod parent_tasks;
mod pins;
mod tasks;
mod users;

pub use auth::{LoginInput, LoginResponse, RegisterInput};
pub use collaborators::AddCollaboratorInput;
pub use discussion::PostMessageInput;
pub use domains::CreateDomainInput;
pub use parent_tasks::{CreateParentTaskInput, UpdateParentTaskInput};
pub use pins::PinInput;
pub use tasks::{CreateTaskInput, TaskQuery, UpdateTaskInput};
pub use users::{Me, SetRoleInput, UserTopicInput};

use crate::config::Config;
use crate::db::Database;
use crate::error::{ApiError, ApiResult};
use crate::policy::Policy;
use crate::topics::TopicCatalog;
use crate::types::Priority;
use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Deserializer};
use std::sync::Arc;

/// Shared state behind every operation.
#[derive(Clone)]
pub struct Board {
    db: Database,
    catalog: Arc<TopicCatalog>,
    policy: Policy,
    session_ttl_ms: i64,
}

impl Board {
    pub fn new(db: Database, config: &Config) -> anyhow::Result<Self> {
        Ok(Self {
            db,
            catalog: Arc::new(config.topic_catalog()?),
            policy: Policy::new(config.domains.min_role),
            session_ttl_ms: config.server.session_ttl_ms(),
        })
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn catalog(&self) -> &TopicCatalog {
        &self.catalog
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }
}

/// Deserialize a field that distinguishes "absent" (`None`) from an explicit
/// `null` (`Some(None)`). Use with `#[serde(default)]`.
pub(crate) fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Trim a required text field.
pub(crate) fn required_text(field: &str, value: Option<&str>) -> ApiResult<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
        .ok_or_else(|| ApiError::missing_field(field))
}

/// Trim an optional text field being edited; present but blank is invalid.
pub(crate) fn edited_text(field: &str, value: Option<&str>) -> ApiResult<Option<String>> {
    match value {
        None => Ok(None),
        Some(v) if v.trim().is_empty() => Err(ApiError::invalid_value(
            field,
            format!("{} must not be empty", field),
        )),
        Some(v) => Ok(Some(v.trim().to_string())),
    }
}

/// Trim an optional free-text field; blank becomes `None`.
pub(crate) fn optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

pub(crate) fn parse_priority(value: &str) -> ApiResult<Priority> {
    Priority::from_str(value.trim()).ok_or_else(|| {
        ApiError::invalid_value("priority", "priority must be one of: low, medium, high")
    })
}

/// Parse a due date given as RFC 3339 or `YYYY-MM-DD` (midnight UTC) into
/// epoch milliseconds.
pub(crate) fn parse_due_date(value: &str) -> ApiResult<i64> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.timestamp_millis());
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp_millis())
        .ok_or_else(|| {
            ApiError::invalid_value(
                "due_date",
                "due_date must be an RFC 3339 timestamp or YYYY-MM-DD",
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn due_dates_accept_both_formats() {
        assert_eq!(parse_due_date("1970-01-02").unwrap(), 86_400_000);
        assert_eq!(parse_due_date("1970-01-01T00:00:01Z").unwrap(), 1_000);
        let err = parse_due_date("next tuesday").unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidFieldValue);
    }

    #[test]
    fn required_text_trims_and_rejects_blank() {
        assert_eq!(required_text("title", Some("  Plan  ")).unwrap(), "Plan");
        let err = required_text("title", Some("   ")).unwrap_err();
        assert_eq!(err.code, ErrorCode::MissingRequiredField);
        assert!(required_text("title", None).is_err());
    }

    #[test]
    fn double_option_distinguishes_null_from_absent() {
        #[derive(Deserialize)]
        struct Body {
            #[serde(default, deserialize_with = "double_option")]
            description: Option<Option<String>>,
        }
        let absent: Body = serde_json::from_str("{}").unwrap();
        let null: Body = serde_json::from_str(r#"{"description": null}"#).unwrap();
        let set: Body = serde_json::from_str(r#"{"description": "x"}"#).unwrap();
        assert_eq!(absent.description, None);
        assert_eq!(null.description, Some(None));
        assert_eq!(set.description, Some(Some("x".to_string())));
    }
}
