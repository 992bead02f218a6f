//! Core types for the task board.

use serde::{Deserialize, Serialize};

/// User role. Variants are declared in privilege order so the derived
/// ordering is member < team lead < manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    Member,
    TeamLead,
    Manager,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Member, Role::TeamLead, Role::Manager];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Member => "member",
            Role::TeamLead => "team_lead",
            Role::Manager => "manager",
        }
    }

    /// Parse a role name. Accepts the stored form and the hyphenated
    /// spelling used in URLs and forms.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "member" => Some(Role::Member),
            "team_lead" | "team-lead" | "teamlead" => Some(Role::TeamLead),
            "manager" => Some(Role::Manager),
            _ => None,
        }
    }

    /// Team leads and managers.
    pub fn is_lead(&self) -> bool {
        *self >= Role::TeamLead
    }

    pub fn is_manager(&self) -> bool {
        *self == Role::Manager
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Task status. Any status may move directly to any other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in-progress",
            TaskStatus::Completed => "completed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(TaskStatus::Pending),
            "in-progress" => Some(TaskStatus::InProgress),
            "completed" => Some(TaskStatus::Completed),
            _ => None,
        }
    }

    /// Column order on the board.
    pub fn board_order(&self) -> u8 {
        match self {
            TaskStatus::Pending => 0,
            TaskStatus::InProgress => 1,
            TaskStatus::Completed => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "low" => Some(Priority::Low),
            "medium" => Some(Priority::Medium),
            "high" => Some(Priority::High),
            _ => None,
        }
    }
}

/// Kind of entity a discussion thread hangs off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Task,
    ParentTask,
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Task => "task",
            EntityType::ParentTask => "parent_task",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "task" => Some(EntityType::Task),
            "parent_task" => Some(EntityType::ParentTask),
            _ => None,
        }
    }
}

/// A registered user. The password hash never leaves the store layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
    pub role: Role,
    pub created_at: i64,
}

/// A (section, topic) visibility grant held by a user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserTopic {
    pub section: String,
    pub topic: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParentTask {
    pub id: String,
    pub section: String,
    pub domain: String,
    pub title: String,
    pub topic: String,
    pub priority: Priority,
    pub created_by_user_id: String,
    pub created_at: i64,
    pub updated_at: i64,
}

/// A child, general, or standalone task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub parent_task_id: Option<String>,
    pub is_general: bool,
    pub section: Option<String>,
    pub domain: String,
    pub topic: String,
    pub leader_id: String,
    pub due_date: Option<i64>,
    pub priority: Priority,
    pub status: TaskStatus,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collaborator {
    pub id: String,
    pub name: Option<String>,
    pub email: String,
    pub role: String,
}

/// Unread indicator for one discussion thread, computed per viewer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscussionIndicator {
    pub count: i64,
    pub unread: i64,
    pub has_unread: bool,
}

/// A task as returned to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskView {
    #[serde(flatten)]
    pub task: Task,
    pub leader_name: Option<String>,
    pub leader_email: Option<String>,
    pub parent_title: Option<String>,
    pub collaborators: Vec<Collaborator>,
    pub discussion: DiscussionIndicator,
    pub pinned: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParentTaskView {
    #[serde(flatten)]
    pub parent_task: ParentTask,
    pub created_by_name: Option<String>,
    pub created_by_email: Option<String>,
    pub child_count: i64,
    pub discussion: DiscussionIndicator,
}

/// Parent task detail with the children the viewer can see.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParentTaskDetail {
    #[serde(flatten)]
    pub parent_task: ParentTaskView,
    pub children: Vec<TaskView>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscussionMessage {
    pub id: String,
    pub entity_type: EntityType,
    pub entity_id: String,
    pub author_id: String,
    pub author_name: Option<String>,
    pub author_email: Option<String>,
    pub content: String,
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Domain {
    pub id: String,
    pub name: String,
    pub created_at: i64,
}

/// One kanban column: every visible task in a domain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardColumn {
    pub domain: String,
    pub tasks: Vec<TaskView>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_are_totally_ordered_by_privilege() {
        assert!(Role::Member < Role::TeamLead);
        assert!(Role::TeamLead < Role::Manager);
        assert!(Role::Manager.is_lead());
        assert!(!Role::Member.is_lead());
    }

    #[test]
    fn role_parsing_accepts_both_spellings() {
        assert_eq!(Role::from_str("team-lead"), Some(Role::TeamLead));
        assert_eq!(Role::from_str("team_lead"), Some(Role::TeamLead));
        assert_eq!(Role::from_str("Manager"), Some(Role::Manager));
        assert_eq!(Role::from_str("admin"), None);
    }

    #[test]
    fn status_serializes_with_hyphen() {
        let json = serde_json::to_string(&TaskStatus::InProgress).unwrap();
        assert_eq!(json, "\"in-progress\"");
        assert_eq!(TaskStatus::from_str("in_progress"), None);
    }
}
