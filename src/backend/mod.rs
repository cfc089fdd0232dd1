//! Remote operations the client consumes from the managed backend.
//!
//! The hosted platform owns persistence, row security and the streak rule.
//! [`RestBackend`] speaks its REST dialect; [`LocalBackend`] stands in for it
//! in-process so the app runs offline and tests need no network.

mod local;
mod rest;

pub use local::{BackendData, GoalRecord, GroupRecord, LocalBackend, LogRecord};
pub use rest::RestBackend;

use crate::errors::BackendError;
use crate::models::{
    GoalRow, GroupRow, GroupStats, JoinResult, LogKey, MemberRow, NewGoal, NewGroup, NewMembership,
    Session,
};
use async_trait::async_trait;
use chrono::NaiveDate;

pub type BackendResult<T> = Result<T, BackendError>;

#[async_trait]
pub trait Backend: Send + Sync {
    /// `get_my_group_stats`: at most one row for the caller.
    async fn my_group_stats(&self, session: &Session) -> BackendResult<Option<GroupStats>>;

    /// Group roster joined with profile display names.
    async fn list_members(&self, session: &Session, group_id: &str) -> BackendResult<Vec<MemberRow>>;

    /// Group goals, each joined with its logs for `date` only.
    async fn list_goals(
        &self,
        session: &Session,
        group_id: &str,
        date: NaiveDate,
    ) -> BackendResult<Vec<GoalRow>>;

    async fn insert_log(&self, session: &Session, key: &LogKey) -> BackendResult<()>;

    async fn delete_log(&self, session: &Session, key: &LogKey) -> BackendResult<()>;

    async fn insert_goal(&self, session: &Session, goal: &NewGoal) -> BackendResult<GoalRow>;

    /// Deletes rows matching `(id, user_id)`; returns how many matched.
    async fn delete_goal(&self, session: &Session, goal_id: &str, user_id: &str) -> BackendResult<usize>;

    /// Retitles rows matching `(id, user_id)`; returns how many matched.
    async fn update_goal_title(
        &self,
        session: &Session,
        goal_id: &str,
        user_id: &str,
        title: &str,
    ) -> BackendResult<usize>;

    /// `join_group_via_code(code_input)`.
    async fn join_group_via_code(&self, session: &Session, code: &str) -> BackendResult<JoinResult>;

    async fn insert_group(&self, session: &Session, group: &NewGroup) -> BackendResult<GroupRow>;

    async fn insert_membership(&self, session: &Session, membership: &NewMembership) -> BackendResult<()>;
}
