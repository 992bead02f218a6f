//! Authorization policy.
//!
//! Every mutation is gated by `Policy::check`, which decides from the acting
//! user's role and, for status changes, their relationship to the task.
//! Denials are `FORBIDDEN` errors with a stable message per rule. Visibility
//! (which entities a user may see at all) is decided separately in
//! [`crate::visibility`] and is checked by callers before relationship rules.

use crate::error::{ApiError, ApiResult};
use crate::types::Role;
use serde::{Deserialize, Serialize};

/// The authenticated user performing an operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: String,
    pub role: Role,
}

impl Actor {
    pub fn new(user_id: impl Into<String>, role: Role) -> Self {
        Self {
            user_id: user_id.into(),
            role,
        }
    }
}

/// How the actor relates to a specific task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Relationship {
    pub is_leader: bool,
    pub is_collaborator: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    CreateParentTask,
    EditParentTask,
    DeleteParentTask,
    CreateTask,
    EditTaskDetails,
    ChangeTaskStatus(Relationship),
    DeleteTask,
    ManageCollaborators,
    ChangeUserRole,
    ManageUserTopics,
    ManageDomains,
    /// Pinning only ever touches the actor's own pins.
    PinTask,
    /// Commenting is gated by visibility alone.
    PostComment,
}

/// Role thresholds that come from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Policy {
    pub domain_min_role: Role,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            domain_min_role: Role::TeamLead,
        }
    }
}

impl Policy {
    pub fn new(domain_min_role: Role) -> Self {
        Self { domain_min_role }
    }

    /// Whether `actor` may perform `action`.
    pub fn allows(&self, actor: &Actor, action: Action) -> bool {
        let role = actor.role;
        match action {
            Action::CreateParentTask
            | Action::EditParentTask
            | Action::CreateTask
            | Action::EditTaskDetails
            | Action::DeleteTask
            | Action::ManageCollaborators => role.is_lead(),
            Action::DeleteParentTask | Action::ChangeUserRole | Action::ManageUserTopics => {
                role.is_manager()
            }
            Action::ChangeTaskStatus(rel) => {
                role.is_lead() || rel.is_leader || rel.is_collaborator
            }
            Action::ManageDomains => role >= self.domain_min_role,
            Action::PinTask | Action::PostComment => true,
        }
    }

    /// Like [`Policy::allows`], but returns the denial as an error.
    pub fn check(&self, actor: &Actor, action: Action) -> ApiResult<()> {
        if self.allows(actor, action) {
            return Ok(());
        }
        tracing::debug!(user_id = %actor.user_id, role = %actor.role, ?action, "Denied by policy");
        Err(ApiError::forbidden(self.denial_message(action)))
    }

    fn denial_message(&self, action: Action) -> String {
        let msg = match action {
            Action::CreateParentTask => "only team leads and managers may create parent tasks",
            Action::EditParentTask => "only team leads and managers may edit parent tasks",
            Action::DeleteParentTask => "only managers may delete parent tasks",
            Action::CreateTask => "only team leads and managers may create tasks",
            Action::EditTaskDetails => "only team leads and managers may edit task details",
            Action::ChangeTaskStatus(_) => {
                "only the task leader, its collaborators, team leads and managers may change task status"
            }
            Action::DeleteTask => "only team leads and managers may delete tasks",
            Action::ManageCollaborators => {
                "only team leads and managers may change task collaborators"
            }
            Action::ChangeUserRole => "only managers may change user roles",
            Action::ManageUserTopics => "only managers may manage user topics",
            Action::ManageDomains => {
                return match self.domain_min_role {
                    Role::Member => "domains may be managed by any user".to_string(),
                    Role::TeamLead => "only team leads and managers may manage domains".to_string(),
                    Role::Manager => "only managers may manage domains".to_string(),
                };
            }
            Action::PinTask | Action::PostComment => "not permitted",
        };
        msg.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    fn actor(role: Role) -> Actor {
        Actor::new("u1", role)
    }

    fn allowed_roles(policy: &Policy, action: Action) -> Vec<Role> {
        Role::ALL
            .into_iter()
            .filter(|r| policy.allows(&actor(*r), action))
            .collect()
    }

    #[test]
    fn lead_only_actions() {
        let policy = Policy::default();
        for action in [
            Action::CreateParentTask,
            Action::EditParentTask,
            Action::CreateTask,
            Action::EditTaskDetails,
            Action::DeleteTask,
            Action::ManageCollaborators,
        ] {
            assert_eq!(
                allowed_roles(&policy, action),
                vec![Role::TeamLead, Role::Manager],
                "{:?}",
                action
            );
        }
    }

    #[test]
    fn manager_only_actions() {
        let policy = Policy::default();
        for action in [
            Action::DeleteParentTask,
            Action::ChangeUserRole,
            Action::ManageUserTopics,
        ] {
            assert_eq!(allowed_roles(&policy, action), vec![Role::Manager], "{:?}", action);
        }
    }

    #[test]
    fn status_change_follows_relationship() {
        let policy = Policy::default();
        let stranger = Action::ChangeTaskStatus(Relationship::default());
        let leader = Action::ChangeTaskStatus(Relationship {
            is_leader: true,
            is_collaborator: false,
        });
        let collaborator = Action::ChangeTaskStatus(Relationship {
            is_leader: false,
            is_collaborator: true,
        });

        assert!(!policy.allows(&actor(Role::Member), stranger));
        assert!(policy.allows(&actor(Role::Member), leader));
        assert!(policy.allows(&actor(Role::Member), collaborator));
        assert!(policy.allows(&actor(Role::TeamLead), stranger));
        assert!(policy.allows(&actor(Role::Manager), stranger));
    }

    #[test]
    fn domain_threshold_is_configurable() {
        assert_eq!(
            allowed_roles(&Policy::new(Role::Member), Action::ManageDomains),
            Role::ALL.to_vec()
        );
        assert_eq!(
            allowed_roles(&Policy::default(), Action::ManageDomains),
            vec![Role::TeamLead, Role::Manager]
        );
        assert_eq!(
            allowed_roles(&Policy::new(Role::Manager), Action::ManageDomains),
            vec![Role::Manager]
        );
    }

    #[test]
    fn pins_and_comments_have_no_role_gate() {
        let policy = Policy::new(Role::Manager);
        assert!(policy.allows(&actor(Role::Member), Action::PinTask));
        assert!(policy.allows(&actor(Role::Member), Action::PostComment));
    }

    #[test]
    fn denial_is_forbidden_with_rule_message() {
        let err = Policy::default()
            .check(&actor(Role::TeamLead), Action::DeleteParentTask)
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);
        assert_eq!(err.message, "only managers may delete parent tasks");

        let err = Policy::default()
            .check(&actor(Role::Member), Action::EditTaskDetails)
            .unwrap_err();
        assert_eq!(err.message, "only team leads and managers may edit task details");
    }
}
