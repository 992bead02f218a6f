//! Task placement: where a new task lands in the section/topic/domain tree.

use crate::error::{ApiError, ApiResult};
use crate::topics::{GENERAL_TOPIC, TopicCatalog};
use crate::types::ParentTask;

/// Placement fields as supplied by the caller.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlacementRequest<'a> {
    pub parent_task_id: Option<&'a str>,
    pub is_general: bool,
    pub section: Option<&'a str>,
    pub topic: Option<&'a str>,
    pub domain: Option<&'a str>,
}

/// Resolved placement stored on the task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    pub section: Option<String>,
    pub topic: String,
    pub domain: String,
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Resolve section, topic and domain for a new task.
///
/// `parent` is the loaded parent task when `request.parent_task_id` is set;
/// `None` there means the parent does not exist (or is not visible).
/// Values inherited from a parent are trusted and not re-validated.
pub fn resolve_hierarchy(
    request: &PlacementRequest<'_>,
    parent: Option<&ParentTask>,
    catalog: &TopicCatalog,
) -> ApiResult<Placement> {
    let section = non_empty(request.section);
    let topic = non_empty(request.topic);
    let domain = non_empty(request.domain);

    if let Some(parent_id) = request.parent_task_id {
        if request.is_general {
            return Err(ApiError::invalid_value(
                "is_general",
                "a general task cannot have a parent task",
            ));
        }
        let parent = parent
            .filter(|p| p.id == parent_id)
            .ok_or_else(|| ApiError::not_found("parent task"))?;
        return Ok(Placement {
            section: Some(parent.section.clone()),
            topic: parent.topic.clone(),
            domain: domain.unwrap_or(&parent.domain).to_string(),
        });
    }

    let domain = domain.ok_or_else(|| ApiError::missing_field("domain"))?;

    let topic = match (request.is_general, topic) {
        (_, Some(topic)) => topic,
        (true, None) => GENERAL_TOPIC,
        (false, None) => return Err(ApiError::missing_field("topic")),
    };

    check_placement(section, topic, catalog)?;

    Ok(Placement {
        section: section.map(String::from),
        topic: topic.to_string(),
        domain: domain.to_string(),
    })
}

/// Check a standalone (section, topic) pair against the catalog.
///
/// The `general` sentinel only needs a valid section, if any. A topic with no
/// section must still exist somewhere in the catalog.
pub fn check_placement(section: Option<&str>, topic: &str, catalog: &TopicCatalog) -> ApiResult<()> {
    match section {
        Some(section) if topic == GENERAL_TOPIC => catalog.check_section(section),
        Some(section) => catalog.check_topic(section, topic),
        None if topic == GENERAL_TOPIC || catalog.has_topic_anywhere(topic) => Ok(()),
        None => Err(ApiError::invalid_value(
            "topic",
            format!("unknown topic: {}", topic),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::types::Priority;

    fn parent() -> ParentTask {
        ParentTask {
            id: "p1".into(),
            section: "Positioning".into(),
            domain: "Marketing".into(),
            title: "Campaign".into(),
            topic: "Digital".into(),
            priority: Priority::High,
            created_by_user_id: "m1".into(),
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn child_inherits_section_and_topic_from_parent() {
        let catalog = TopicCatalog::default();
        let request = PlacementRequest {
            parent_task_id: Some("p1"),
            section: Some("Sourcing"),
            topic: Some("Officers"),
            ..Default::default()
        };
        let placement = resolve_hierarchy(&request, Some(&parent()), &catalog).unwrap();
        assert_eq!(placement.section.as_deref(), Some("Positioning"));
        assert_eq!(placement.topic, "Digital");
        assert_eq!(placement.domain, "Marketing");
    }

    #[test]
    fn child_domain_can_be_overridden() {
        let catalog = TopicCatalog::default();
        let request = PlacementRequest {
            parent_task_id: Some("p1"),
            domain: Some(" Sales "),
            ..Default::default()
        };
        let placement = resolve_hierarchy(&request, Some(&parent()), &catalog).unwrap();
        assert_eq!(placement.domain, "Sales");
    }

    #[test]
    fn missing_parent_is_not_found() {
        let catalog = TopicCatalog::default();
        let request = PlacementRequest {
            parent_task_id: Some("p2"),
            ..Default::default()
        };
        let err = resolve_hierarchy(&request, None, &catalog).unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[test]
    fn general_task_with_parent_is_rejected() {
        let catalog = TopicCatalog::default();
        let request = PlacementRequest {
            parent_task_id: Some("p1"),
            is_general: true,
            ..Default::default()
        };
        let err = resolve_hierarchy(&request, Some(&parent()), &catalog).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidFieldValue);
    }

    #[test]
    fn general_task_defaults_to_sentinel_topic() {
        let catalog = TopicCatalog::default();
        let request = PlacementRequest {
            is_general: true,
            domain: Some("Support"),
            ..Default::default()
        };
        let placement = resolve_hierarchy(&request, None, &catalog).unwrap();
        assert_eq!(placement.topic, GENERAL_TOPIC);
        assert_eq!(placement.section, None);
    }

    #[test]
    fn standalone_task_requires_topic() {
        let catalog = TopicCatalog::default();
        let request = PlacementRequest {
            domain: Some("Support"),
            ..Default::default()
        };
        let err = resolve_hierarchy(&request, None, &catalog).unwrap_err();
        assert_eq!(err.code, ErrorCode::MissingRequiredField);
        assert_eq!(err.field.as_deref(), Some("topic"));
    }

    #[test]
    fn explicit_section_and_topic_are_validated() {
        let catalog = TopicCatalog::default();
        let request = PlacementRequest {
            section: Some("Sourcing"),
            topic: Some("PR"),
            domain: Some("Sales"),
            ..Default::default()
        };
        let err = resolve_hierarchy(&request, None, &catalog).unwrap_err();
        assert_eq!(err.field.as_deref(), Some("topic"));

        let request = PlacementRequest {
            section: Some("Sourcing"),
            topic: Some("NCOs"),
            domain: Some("Sales"),
            ..Default::default()
        };
        let placement = resolve_hierarchy(&request, None, &catalog).unwrap();
        assert_eq!(placement.section.as_deref(), Some("Sourcing"));
    }

    #[test]
    fn domain_required_without_parent() {
        let catalog = TopicCatalog::default();
        let request = PlacementRequest {
            is_general: true,
            ..Default::default()
        };
        let err = resolve_hierarchy(&request, None, &catalog).unwrap_err();
        assert_eq!(err.field.as_deref(), Some("domain"));
    }
}
