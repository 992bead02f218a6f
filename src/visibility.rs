//! Visibility rules.
//!
//! Managers see everything. Everyone else sees:
//! - general tasks they lead or collaborate on,
//! - non-general tasks and parent tasks whose (section, topic) matches one of
//!   their topic grants.
//!
//! Leading a non-general task does not make it visible without a grant.
//!
//! The list queries in `db::visibility` express the same rules in SQL; the
//! predicates here are used for single-entity checks once the facts are loaded.

use crate::policy::Actor;
use crate::types::{ParentTask, Role, Task, UserTopic};
use std::collections::HashSet;

/// A user as seen by the visibility rules.
#[derive(Debug, Clone)]
pub struct Viewer {
    pub user_id: String,
    pub role: Role,
    topics: HashSet<UserTopic>,
}

/// What the rules need to know about a task.
#[derive(Debug, Clone, Copy)]
pub struct TaskFacts<'a> {
    pub is_general: bool,
    pub section: Option<&'a str>,
    pub topic: &'a str,
    pub leader_id: &'a str,
    pub collaborator_ids: &'a [String],
}

impl<'a> TaskFacts<'a> {
    pub fn new(task: &'a Task, collaborator_ids: &'a [String]) -> Self {
        Self {
            is_general: task.is_general,
            section: task.section.as_deref(),
            topic: &task.topic,
            leader_id: &task.leader_id,
            collaborator_ids,
        }
    }

    fn is_assignee(&self, user_id: &str) -> bool {
        self.leader_id == user_id || self.collaborator_ids.iter().any(|c| c == user_id)
    }
}

impl Viewer {
    pub fn new(actor: &Actor, topics: impl IntoIterator<Item = UserTopic>) -> Self {
        Self {
            user_id: actor.user_id.clone(),
            role: actor.role,
            topics: topics.into_iter().collect(),
        }
    }

    pub fn is_manager(&self) -> bool {
        self.role.is_manager()
    }

    pub fn has_topic(&self, section: &str, topic: &str) -> bool {
        // Avoid allocating a UserTopic for the lookup
        self.topics
            .iter()
            .any(|t| t.section == section && t.topic == topic)
    }

    pub fn can_see_task(&self, task: &TaskFacts<'_>) -> bool {
        if self.is_manager() {
            return true;
        }
        if task.is_general {
            task.is_assignee(&self.user_id)
        } else {
            task.section
                .is_some_and(|section| self.has_topic(section, task.topic))
        }
    }

    pub fn can_see_parent_task(&self, parent: &ParentTask) -> bool {
        self.is_manager() || self.has_topic(&parent.section, &parent.topic)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Priority, TaskStatus};

    fn task(is_general: bool, section: Option<&str>, topic: &str, leader: &str) -> Task {
        Task {
            id: "t1".into(),
            title: "Task".into(),
            description: None,
            parent_task_id: None,
            is_general,
            section: section.map(String::from),
            domain: "Development".into(),
            topic: topic.into(),
            leader_id: leader.into(),
            due_date: None,
            priority: Priority::Medium,
            status: TaskStatus::Pending,
            created_at: 0,
            updated_at: 0,
        }
    }

    fn grant(section: &str, topic: &str) -> UserTopic {
        UserTopic {
            section: section.into(),
            topic: topic.into(),
        }
    }

    fn viewer(role: Role, topics: Vec<UserTopic>) -> Viewer {
        Viewer::new(&Actor::new("alice", role), topics)
    }

    #[test]
    fn manager_sees_everything_without_grants() {
        let manager = viewer(Role::Manager, vec![]);
        let t = task(false, Some("Sourcing"), "Officers", "bob");
        assert!(manager.can_see_task(&TaskFacts::new(&t, &[])));
    }

    #[test]
    fn general_task_visible_to_assignees_only() {
        let member = viewer(Role::TeamLead, vec![]);
        let led = task(true, None, "general", "alice");
        let other = task(true, None, "general", "bob");
        let collaborators = vec!["alice".to_string()];

        assert!(member.can_see_task(&TaskFacts::new(&led, &[])));
        assert!(!member.can_see_task(&TaskFacts::new(&other, &[])));
        assert!(member.can_see_task(&TaskFacts::new(&other, &collaborators)));
    }

    #[test]
    fn general_task_is_not_visible_through_topic_grant() {
        let member = viewer(Role::Member, vec![grant("Positioning", "PR")]);
        let t = task(true, Some("Positioning"), "PR", "bob");
        assert!(!member.can_see_task(&TaskFacts::new(&t, &[])));
    }

    #[test]
    fn topic_grant_controls_non_general_tasks() {
        let member = viewer(Role::Member, vec![grant("Positioning", "PR")]);
        let granted = task(false, Some("Positioning"), "PR", "bob");
        let other_topic = task(false, Some("Positioning"), "Digital", "bob");
        let no_section = task(false, None, "PR", "bob");

        assert!(member.can_see_task(&TaskFacts::new(&granted, &[])));
        assert!(!member.can_see_task(&TaskFacts::new(&other_topic, &[])));
        assert!(!member.can_see_task(&TaskFacts::new(&no_section, &[])));
    }

    #[test]
    fn leader_without_grant_cannot_see_topic_task() {
        let member = viewer(Role::Member, vec![]);
        let t = task(false, Some("Sourcing"), "NCOs", "alice");
        let collaborators = vec!["alice".to_string()];
        assert!(!member.can_see_task(&TaskFacts::new(&t, &collaborators)));
    }

    #[test]
    fn parent_tasks_need_a_matching_grant() {
        let parent = ParentTask {
            id: "p1".into(),
            section: "Sourcing".into(),
            domain: "Sales".into(),
            title: "Recruiting".into(),
            topic: "Enlisted".into(),
            priority: Priority::High,
            created_by_user_id: "bob".into(),
            created_at: 0,
            updated_at: 0,
        };
        assert!(!viewer(Role::TeamLead, vec![]).can_see_parent_task(&parent));
        assert!(
            viewer(Role::Member, vec![grant("Sourcing", "Enlisted")]).can_see_parent_task(&parent)
        );
        assert!(viewer(Role::Manager, vec![]).can_see_parent_task(&parent));
    }
}
