use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Signed-in caller. Every backend call carries it explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: String,
    pub access_token: Option<String>,
}

impl Session {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            access_token: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }
}

/// One row of `get_my_group_stats`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupStats {
    pub group_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub current_streak: Option<u32>,
    #[serde(default)]
    pub invite_code: Option<String>,
    #[serde(default)]
    pub last_streak_date: Option<NaiveDate>,
}

/// Group header as the dashboard shows it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSummary {
    pub id: String,
    pub name: String,
    pub invite_code: String,
    pub server_streak: u32,
    pub last_streak_date: Option<NaiveDate>,
}

impl From<GroupStats> for GroupSummary {
    fn from(stats: GroupStats) -> Self {
        Self {
            id: stats.group_id,
            name: stats
                .name
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| "My Group".to_string()),
            invite_code: stats.invite_code.unwrap_or_default(),
            server_streak: stats.current_streak.unwrap_or(0),
            last_streak_date: stats.last_streak_date,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileRef {
    #[serde(default)]
    pub full_name: Option<String>,
}

/// Membership joined with the member's profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberRow {
    pub user_id: String,
    #[serde(default)]
    pub profiles: Option<ProfileRef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogRef {
    pub id: String,
}

/// Goal joined with the logs recorded for the queried date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoalRow {
    pub id: String,
    pub title: String,
    pub user_id: String,
    pub group_id: String,
    #[serde(default)]
    pub logs: Vec<LogRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Goal {
    pub id: String,
    pub title: String,
    pub user_id: String,
    pub group_id: String,
    pub completed_today: bool,
}

impl From<GoalRow> for Goal {
    fn from(row: GoalRow) -> Self {
        Self {
            completed_today: !row.logs.is_empty(),
            id: row.id,
            title: row.title,
            user_id: row.user_id,
            group_id: row.group_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub user_id: String,
    pub full_name: String,
    pub goals: Vec<Goal>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewGoal {
    pub title: String,
    pub user_id: String,
    pub group_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewGroup {
    pub name: String,
    pub creator_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupRow {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub invite_code: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMembership {
    pub group_id: String,
    pub user_id: String,
}

/// Key of a completion log: one per (goal, user, date).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogKey {
    pub goal_id: String,
    pub user_id: String,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinResult {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TitleRequest {
    pub title: String,
}

#[derive(Debug, Deserialize)]
pub struct JoinRequest {
    pub code: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateGroupRequest {
    pub name: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    pub member: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct JoinQuery {
    pub mode: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DashboardResponse {
    pub user_id: Option<String>,
    pub loading: bool,
    pub needs_group: bool,
    pub group_name: String,
    pub invite_code: String,
    pub streak: u32,
    pub is_waiting: bool,
    pub members: Vec<Member>,
}
