//! Users, roles and topic grants.

use super::{Board, required_text};
use crate::error::{ApiError, ApiResult};
use crate::policy::{Action, Actor};
use crate::types::{Role, User, UserTopic};
use serde::{Deserialize, Serialize};
use tracing::info;

/// The current user with their grants.
#[derive(Debug, Clone, Serialize)]
pub struct Me {
    #[serde(flatten)]
    pub user: User,
    pub topics: Vec<UserTopic>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SetRoleInput {
    pub role: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserTopicInput {
    pub section: Option<String>,
    pub topic: Option<String>,
}

impl Board {
    pub fn me(&self, actor: &Actor) -> ApiResult<Me> {
        let user = self
            .db
            .get_user(&actor.user_id)?
            .ok_or_else(ApiError::unauthorized)?;
        let topics = self.db.user_topics(&actor.user_id)?;
        Ok(Me { user, topics })
    }

    pub fn list_users(&self, _actor: &Actor) -> ApiResult<Vec<User>> {
        Ok(self.db.list_users()?)
    }

    /// Change a user's role. Managers only; the value must be one of the
    /// three roles.
    pub fn set_user_role(&self, actor: &Actor, user_id: &str, input: SetRoleInput) -> ApiResult<User> {
        self.policy.check(actor, Action::ChangeUserRole)?;

        if self.db.get_user(user_id)?.is_none() {
            return Err(ApiError::not_found("user"));
        }

        let raw = required_text("role", input.role.as_deref())?;
        let role = Role::from_str(&raw).ok_or_else(|| {
            ApiError::invalid_value("role", "role must be one of: member, team_lead, manager")
        })?;

        let user = self
            .db
            .set_user_role(user_id, role)?
            .ok_or_else(|| ApiError::not_found("user"))?;
        info!(user_id = %user.id, role = %role, by = %actor.user_id, "Changed user role");
        Ok(user)
    }

    /// A user's topic grants. Users may read their own; managers anyone's.
    pub fn user_topics(&self, actor: &Actor, user_id: &str) -> ApiResult<Vec<UserTopic>> {
        if actor.user_id != user_id {
            self.policy.check(actor, Action::ManageUserTopics)?;
        }
        if self.db.get_user(user_id)?.is_none() {
            return Err(ApiError::not_found("user"));
        }
        Ok(self.db.user_topics(user_id)?)
    }

    /// Grant a topic. Granting twice is a no-op. Returns the user's grants.
    pub fn add_user_topic(&self, actor: &Actor, user_id: &str, input: UserTopicInput) -> ApiResult<Vec<UserTopic>> {
        self.policy.check(actor, Action::ManageUserTopics)?;
        if self.db.get_user(user_id)?.is_none() {
            return Err(ApiError::not_found("user"));
        }

        let section = required_text("section", input.section.as_deref())?;
        let topic = required_text("topic", input.topic.as_deref())?;
        self.catalog.check_topic(&section, &topic)?;

        if self.db.add_user_topic(user_id, &section, &topic)? {
            info!(user_id, section = %section, topic = %topic, "Granted topic");
        }
        Ok(self.db.user_topics(user_id)?)
    }

    /// Revoke a topic. Revoking a grant the user does not hold is a no-op.
    pub fn remove_user_topic(&self, actor: &Actor, user_id: &str, input: UserTopicInput) -> ApiResult<Vec<UserTopic>> {
        self.policy.check(actor, Action::ManageUserTopics)?;
        if self.db.get_user(user_id)?.is_none() {
            return Err(ApiError::not_found("user"));
        }

        let section = required_text("section", input.section.as_deref())?;
        let topic = required_text("topic", input.topic.as_deref())?;

        if self.db.remove_user_topic(user_id, &section, &topic)? {
            info!(user_id, section = %section, topic = %topic, "Revoked topic");
        }
        Ok(self.db.user_topics(user_id)?)
    }
}
