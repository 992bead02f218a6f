//! Discussion threads on tasks and parent tasks.
//!
//! Fetching a thread marks it read for the viewer; posting marks it read for
//! the author. Both require the entity to be visible.

use super::{Board, required_text};
use crate::error::{ApiError, ApiResult};
use crate::policy::{Action, Actor};
use crate::types::{DiscussionMessage, EntityType};
use serde::Deserialize;
use tracing::info;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostMessageInput {
    pub content: Option<String>,
}

impl Board {
    fn require_visible_entity(&self, actor: &Actor, entity_type: EntityType, entity_id: &str) -> ApiResult<()> {
        let visible = match entity_type {
            EntityType::Task => self.db.can_see_task(actor, entity_id)?,
            EntityType::ParentTask => self.db.can_see_parent_task(actor, entity_id)?,
        };
        if visible {
            Ok(())
        } else {
            Err(ApiError::not_found(match entity_type {
                EntityType::Task => "task",
                EntityType::ParentTask => "parent task",
            }))
        }
    }

    pub fn messages(
        &self,
        actor: &Actor,
        entity_type: EntityType,
        entity_id: &str,
    ) -> ApiResult<Vec<DiscussionMessage>> {
        self.require_visible_entity(actor, entity_type, entity_id)?;
        Ok(self.db.read_thread(&actor.user_id, entity_type, entity_id)?)
    }

    pub fn post_message(
        &self,
        actor: &Actor,
        entity_type: EntityType,
        entity_id: &str,
        input: PostMessageInput,
    ) -> ApiResult<DiscussionMessage> {
        self.require_visible_entity(actor, entity_type, entity_id)?;
        self.policy.check(actor, Action::PostComment)?;

        let content = required_text("content", input.content.as_deref())?;
        let message = self
            .db
            .post_message(entity_type, entity_id, &actor.user_id, &content)?;
        info!(
            entity_type = entity_type.as_str(),
            entity_id,
            message_id = %message.id,
            author_id = %actor.user_id,
            "Posted message"
        );
        Ok(message)
    }
}
