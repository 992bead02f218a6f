//! Visibility filter over the store.
//!
//! List queries splice in the SQL form of the rules from
//! [`crate::visibility`]; single-entity checks load the facts and apply the
//! predicates directly. Both treat an absent entity like an invisible one.

use super::collaborators::collaborator_ids_internal;
use super::parent_tasks::{PARENT_TASK_COLUMNS, get_parent_task_internal, parse_parent_task_row};
use super::tasks::get_task_internal;
use super::topics::user_topics_internal;
use super::{Database, bind};
use crate::policy::Actor;
use crate::types::{ParentTask, Task};
use crate::visibility::{TaskFacts, Viewer};
use anyhow::Result;
use rusqlite::params_from_iter;
use rusqlite::types::Value;

/// WHERE fragment restricting tasks aliased as `alias` to those `actor` may see.
///
/// Each rule is an EXISTS check, so a task reachable through several paths
/// still appears once.
pub(crate) fn task_visibility_clause(alias: &str, actor: &Actor, params: &mut Vec<Value>) -> String {
    if actor.role.is_manager() {
        return "1 = 1".to_string();
    }
    let user = bind(params, actor.user_id.clone());
    format!(
        "(({a}.is_general = 1 AND ({a}.leader_id = {u} OR EXISTS (
              SELECT 1 FROM task_collaborators vc WHERE vc.task_id = {a}.id AND vc.user_id = {u})))
          OR ({a}.is_general = 0 AND EXISTS (
              SELECT 1 FROM user_topics vt
              WHERE vt.user_id = {u} AND vt.section = {a}.section AND vt.topic = {a}.topic)))",
        a = alias,
        u = user
    )
}

/// WHERE fragment restricting parent tasks aliased as `alias`.
pub(crate) fn parent_visibility_clause(alias: &str, actor: &Actor, params: &mut Vec<Value>) -> String {
    if actor.role.is_manager() {
        return "1 = 1".to_string();
    }
    let user = bind(params, actor.user_id.clone());
    format!(
        "EXISTS (SELECT 1 FROM user_topics vt
                 WHERE vt.user_id = {u} AND vt.section = {a}.section AND vt.topic = {a}.topic)",
        a = alias,
        u = user
    )
}

impl Database {
    /// The task, if it exists and `actor` may see it.
    pub fn visible_task(&self, actor: &Actor, task_id: &str) -> Result<Option<Task>> {
        self.with_conn(|conn| {
            let Some(task) = get_task_internal(conn, task_id)? else {
                return Ok(None);
            };
            if actor.role.is_manager() {
                return Ok(Some(task));
            }
            let collaborators = collaborator_ids_internal(conn, task_id)?;
            let viewer = Viewer::new(actor, user_topics_internal(conn, &actor.user_id)?);
            let visible = viewer.can_see_task(&TaskFacts::new(&task, &collaborators));
            Ok(visible.then_some(task))
        })
    }

    /// The parent task, if it exists and `actor` may see it.
    pub fn visible_parent_task(&self, actor: &Actor, parent_id: &str) -> Result<Option<ParentTask>> {
        self.with_conn(|conn| {
            let Some(parent) = get_parent_task_internal(conn, parent_id)? else {
                return Ok(None);
            };
            if actor.role.is_manager() {
                return Ok(Some(parent));
            }
            let viewer = Viewer::new(actor, user_topics_internal(conn, &actor.user_id)?);
            Ok(viewer.can_see_parent_task(&parent).then_some(parent))
        })
    }

    pub fn can_see_task(&self, actor: &Actor, task_id: &str) -> Result<bool> {
        Ok(self.visible_task(actor, task_id)?.is_some())
    }

    pub fn can_see_parent_task(&self, actor: &Actor, parent_id: &str) -> Result<bool> {
        Ok(self.visible_parent_task(actor, parent_id)?.is_some())
    }

    /// Every parent task `actor` may see, newest first.
    pub fn visible_parent_tasks(&self, actor: &Actor) -> Result<Vec<ParentTask>> {
        let mut params = Vec::new();
        let clause = parent_visibility_clause("p", actor, &mut params);
        let sql = format!(
            "SELECT {} FROM parent_tasks p WHERE {} ORDER BY p.created_at DESC, p.id DESC",
            PARENT_TASK_COLUMNS, clause
        );
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&sql)?;
            let parents = stmt
                .query_map(params_from_iter(params.iter()), parse_parent_task_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(parents)
        })
    }
}
