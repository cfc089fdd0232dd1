use super::{Backend, BackendResult};
use crate::errors::BackendError;
use crate::models::{
    GoalRow, GroupRow, GroupStats, JoinResult, LogKey, LogRef, MemberRow, NewGoal, NewGroup,
    NewMembership, ProfileRef, Session,
};
use crate::storage::{load_data, persist_data};
use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::info;
use uuid::Uuid;

const POLICY_VIOLATION: &str = "new row violates row-level security policy";
const ALREADY_IN_GROUP: &str = "You are already in a group";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupRecord {
    pub id: String,
    pub name: String,
    pub creator_id: String,
    pub invite_code: String,
    #[serde(default)]
    pub current_streak: u32,
    #[serde(default)]
    pub last_streak_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoalRecord {
    pub id: String,
    pub title: String,
    pub user_id: String,
    pub group_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogRecord {
    pub id: String,
    pub goal_id: String,
    pub user_id: String,
    pub date: NaiveDate,
}

/// Everything the local backend owns; persisted as one JSON document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BackendData {
    #[serde(default)]
    pub profiles: BTreeMap<String, String>,
    #[serde(default)]
    pub groups: Vec<GroupRecord>,
    #[serde(default)]
    pub members: Vec<NewMembership>,
    #[serde(default)]
    pub goals: Vec<GoalRecord>,
    #[serde(default)]
    pub logs: Vec<LogRecord>,
}

impl BackendData {
    fn group_of(&self, user_id: &str) -> Option<&GroupRecord> {
        let membership = self.members.iter().find(|m| m.user_id == user_id)?;
        self.groups.iter().find(|g| g.id == membership.group_id)
    }

    fn is_member(&self, group_id: &str, user_id: &str) -> bool {
        self.members
            .iter()
            .any(|m| m.group_id == group_id && m.user_id == user_id)
    }

    fn unused_invite_code(&self) -> String {
        loop {
            let raw = Uuid::new_v4().simple().to_string().to_ascii_uppercase();
            let code = format!("{}-{}", &raw[..3], &raw[3..6]);
            if !self.groups.iter().any(|g| g.invite_code == code) {
                return code;
            }
        }
    }

    /// Advances the group streak once every member has a log for `date`.
    fn advance_streak(&mut self, group_id: &str, date: NaiveDate) {
        let everyone_done = self
            .members
            .iter()
            .filter(|m| m.group_id == group_id)
            .all(|m| {
                self.logs.iter().any(|log| {
                    log.user_id == m.user_id
                        && log.date == date
                        && self
                            .goals
                            .iter()
                            .any(|goal| goal.id == log.goal_id && goal.group_id == group_id)
                })
            });
        if !everyone_done {
            return;
        }

        let Some(group) = self.groups.iter_mut().find(|g| g.id == group_id) else {
            return;
        };
        if group.last_streak_date == Some(date) {
            return;
        }
        group.current_streak = if group.last_streak_date == Some(date - Duration::days(1)) {
            group.current_streak.saturating_add(1)
        } else {
            1
        };
        group.last_streak_date = Some(date);
        info!(group = %group.id, streak = group.current_streak, "group streak advanced");
    }
}

/// In-process stand-in for the hosted platform, optionally backed by a JSON file.
pub struct LocalBackend {
    data: Mutex<BackendData>,
    path: Option<PathBuf>,
}

impl LocalBackend {
    pub fn in_memory() -> Self {
        Self::with_data(BackendData::default())
    }

    pub fn with_data(data: BackendData) -> Self {
        Self {
            data: Mutex::new(data),
            path: None,
        }
    }

    pub async fn open(path: &Path) -> Self {
        Self {
            data: Mutex::new(load_data(path).await),
            path: Some(path.to_path_buf()),
        }
    }

    pub async fn snapshot(&self) -> BackendData {
        self.data.lock().await.clone()
    }

    pub async fn upsert_profile(&self, user_id: &str, full_name: &str) -> BackendResult<()> {
        self.write(|data| {
            data.profiles.insert(user_id.to_string(), full_name.to_string());
            Ok(())
        })
        .await
    }

    async fn write<T>(&self, apply: impl FnOnce(&mut BackendData) -> BackendResult<T>) -> BackendResult<T> {
        let mut data = self.data.lock().await;
        let mut next = data.clone();
        let value = apply(&mut next)?;
        if let Some(path) = &self.path {
            persist_data(path, &next).await?;
        }
        *data = next;
        Ok(value)
    }
}

#[async_trait]
impl Backend for LocalBackend {
    async fn my_group_stats(&self, session: &Session) -> BackendResult<Option<GroupStats>> {
        let data = self.data.lock().await;
        Ok(data.group_of(&session.user_id).map(|group| GroupStats {
            group_id: group.id.clone(),
            name: Some(group.name.clone()),
            current_streak: Some(group.current_streak),
            invite_code: Some(group.invite_code.clone()),
            last_streak_date: group.last_streak_date,
        }))
    }

    async fn list_members(&self, session: &Session, group_id: &str) -> BackendResult<Vec<MemberRow>> {
        let data = self.data.lock().await;
        if !data.is_member(group_id, &session.user_id) {
            return Ok(Vec::new());
        }
        Ok(data
            .members
            .iter()
            .filter(|m| m.group_id == group_id)
            .map(|m| MemberRow {
                user_id: m.user_id.clone(),
                profiles: data.profiles.get(&m.user_id).map(|name| ProfileRef {
                    full_name: Some(name.clone()),
                }),
            })
            .collect())
    }

    async fn list_goals(
        &self,
        session: &Session,
        group_id: &str,
        date: NaiveDate,
    ) -> BackendResult<Vec<GoalRow>> {
        let data = self.data.lock().await;
        if !data.is_member(group_id, &session.user_id) {
            return Ok(Vec::new());
        }
        Ok(data
            .goals
            .iter()
            .filter(|goal| goal.group_id == group_id)
            .map(|goal| GoalRow {
                id: goal.id.clone(),
                title: goal.title.clone(),
                user_id: goal.user_id.clone(),
                group_id: goal.group_id.clone(),
                logs: data
                    .logs
                    .iter()
                    .filter(|log| log.goal_id == goal.id && log.date == date)
                    .map(|log| LogRef { id: log.id.clone() })
                    .collect(),
            })
            .collect())
    }

    async fn insert_log(&self, session: &Session, key: &LogKey) -> BackendResult<()> {
        self.write(|data| {
            let group_id = data
                .goals
                .iter()
                .find(|goal| goal.id == key.goal_id && goal.user_id == key.user_id)
                .filter(|_| key.user_id == session.user_id)
                .map(|goal| goal.group_id.clone())
                .ok_or_else(|| BackendError::Rejected(POLICY_VIOLATION.to_string()))?;

            let duplicate = data
                .logs
                .iter()
                .any(|log| log.goal_id == key.goal_id && log.user_id == key.user_id && log.date == key.date);
            if duplicate {
                return Err(BackendError::Rejected("duplicate key value violates unique constraint".to_string()));
            }

            data.logs.push(LogRecord {
                id: Uuid::new_v4().to_string(),
                goal_id: key.goal_id.clone(),
                user_id: key.user_id.clone(),
                date: key.date,
            });
            data.advance_streak(&group_id, key.date);
            Ok(())
        })
        .await
    }

    async fn delete_log(&self, session: &Session, key: &LogKey) -> BackendResult<()> {
        self.write(|data| {
            data.logs.retain(|log| {
                !(log.goal_id == key.goal_id
                    && log.user_id == key.user_id
                    && log.user_id == session.user_id
                    && log.date == key.date)
            });
            Ok(())
        })
        .await
    }

    async fn insert_goal(&self, session: &Session, goal: &NewGoal) -> BackendResult<GoalRow> {
        self.write(|data| {
            if goal.user_id != session.user_id || !data.is_member(&goal.group_id, &goal.user_id) {
                return Err(BackendError::Rejected(POLICY_VIOLATION.to_string()));
            }
            let record = GoalRecord {
                id: Uuid::new_v4().to_string(),
                title: goal.title.clone(),
                user_id: goal.user_id.clone(),
                group_id: goal.group_id.clone(),
            };
            data.goals.push(record.clone());
            Ok(GoalRow {
                id: record.id,
                title: record.title,
                user_id: record.user_id,
                group_id: record.group_id,
                logs: Vec::new(),
            })
        })
        .await
    }

    async fn delete_goal(&self, session: &Session, goal_id: &str, user_id: &str) -> BackendResult<usize> {
        self.write(|data| {
            if user_id != session.user_id {
                return Ok(0);
            }
            let before = data.goals.len();
            data.goals.retain(|goal| !(goal.id == goal_id && goal.user_id == user_id));
            let removed = before - data.goals.len();
            if removed > 0 {
                data.logs.retain(|log| log.goal_id != goal_id);
            }
            Ok(removed)
        })
        .await
    }

    async fn update_goal_title(
        &self,
        session: &Session,
        goal_id: &str,
        user_id: &str,
        title: &str,
    ) -> BackendResult<usize> {
        self.write(|data| {
            if user_id != session.user_id {
                return Ok(0);
            }
            let mut matched = 0;
            for goal in data
                .goals
                .iter_mut()
                .filter(|goal| goal.id == goal_id && goal.user_id == user_id)
            {
                goal.title = title.to_string();
                matched += 1;
            }
            Ok(matched)
        })
        .await
    }

    async fn join_group_via_code(&self, session: &Session, code: &str) -> BackendResult<JoinResult> {
        self.write(|data| {
            if data.group_of(&session.user_id).is_some() {
                return Ok(JoinResult {
                    success: false,
                    message: Some(ALREADY_IN_GROUP.to_string()),
                });
            }
            let code = code.trim();
            let Some(group) = data
                .groups
                .iter()
                .find(|g| g.invite_code.eq_ignore_ascii_case(code))
            else {
                return Ok(JoinResult {
                    success: false,
                    message: Some("Invalid invite code".to_string()),
                });
            };
            let message = format!("Joined {}", group.name);
            data.members.push(NewMembership {
                group_id: group.id.clone(),
                user_id: session.user_id.clone(),
            });
            Ok(JoinResult {
                success: true,
                message: Some(message),
            })
        })
        .await
    }

    async fn insert_group(&self, session: &Session, group: &NewGroup) -> BackendResult<GroupRow> {
        self.write(|data| {
            if group.creator_id != session.user_id {
                return Err(BackendError::Rejected(POLICY_VIOLATION.to_string()));
            }
            if group.name.trim().is_empty() {
                return Err(BackendError::Rejected("group name must not be empty".to_string()));
            }
            if data.group_of(&session.user_id).is_some() {
                return Err(BackendError::Rejected(ALREADY_IN_GROUP.to_string()));
            }
            let record = GroupRecord {
                id: Uuid::new_v4().to_string(),
                name: group.name.clone(),
                creator_id: group.creator_id.clone(),
                invite_code: data.unused_invite_code(),
                current_streak: 0,
                last_streak_date: None,
            };
            data.groups.push(record.clone());
            Ok(GroupRow {
                id: record.id,
                name: record.name,
                invite_code: Some(record.invite_code),
            })
        })
        .await
    }

    async fn insert_membership(&self, session: &Session, membership: &NewMembership) -> BackendResult<()> {
        self.write(|data| {
            if membership.user_id != session.user_id {
                return Err(BackendError::Rejected(POLICY_VIOLATION.to_string()));
            }
            if !data.groups.iter().any(|g| g.id == membership.group_id) {
                return Err(BackendError::Rejected("group does not exist".to_string()));
            }
            if data.group_of(&membership.user_id).is_some() {
                return Err(BackendError::Rejected(ALREADY_IN_GROUP.to_string()));
            }
            data.members.push(membership.clone());
            Ok(())
        })
        .await
    }
}
