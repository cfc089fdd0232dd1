//! Dashboard view state and the actions that keep it in step with the backend.
//!
//! Every action patches local state first and then reconciles with a
//! forced re-fetch that replaces the state wholesale. Each fetch takes a
//! sequence number when dispatched, and each mutation takes one under the
//! state lock together with its local patch. A fetch result is only committed
//! if nothing newer has been dispatched since, so late responses cannot
//! overwrite fresher state. Because a mutation supersedes any reconcile in
//! flight, every successful mutation ends with a reconcile of its own.

use crate::backend::Backend;
use crate::errors::DashboardError;
use crate::models::{Goal, GroupSummary, LogKey, Member, NewGoal, Session};
use crate::status::{derive_status_at, local_today, normalize_members, StreakRule};
use chrono::NaiveDate;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

pub type Clock = Arc<dyn Fn() -> NaiveDate + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToggleMode {
    /// Toggling a completed goal removes today's log.
    #[default]
    Flip,
    /// A goal completed today stays completed.
    Lock,
}

impl ToggleMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "flip" => Some(Self::Flip),
            "lock" => Some(Self::Lock),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DashboardOptions {
    pub toggle_mode: ToggleMode,
    pub streak_rule: StreakRule,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DashboardState {
    pub loading: bool,
    pub needs_group: bool,
    pub group: Option<GroupSummary>,
    pub streak: u32,
    pub is_waiting: bool,
    pub members: Vec<Member>,
}

impl DashboardState {
    pub fn group_name(&self) -> &str {
        self.group.as_ref().map_or("Loading...", |group| group.name.as_str())
    }

    pub fn invite_code(&self) -> &str {
        self.group.as_ref().map_or("", |group| group.invite_code.as_str())
    }

    pub fn member(&self, user_id: &str) -> Option<&Member> {
        self.members.iter().find(|member| member.user_id == user_id)
    }

    fn member_mut(&mut self, user_id: &str) -> Option<&mut Member> {
        self.members.iter_mut().find(|member| member.user_id == user_id)
    }

    fn goal_mut(&mut self, user_id: &str, goal_id: &str) -> Option<&mut Goal> {
        self.member_mut(user_id)?
            .goals
            .iter_mut()
            .find(|goal| goal.id == goal_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Applied,
    /// The caller belongs to no group and should be sent to onboarding.
    NoGroup,
    /// A newer request was dispatched while this one was in flight.
    Superseded,
    Failed,
    NoSession,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Completed,
    Uncompleted,
    Unchanged,
}

pub struct Dashboard {
    backend: Arc<dyn Backend>,
    session: RwLock<Option<Session>>,
    state: Mutex<DashboardState>,
    latest: AtomicU64,
    options: DashboardOptions,
    clock: Clock,
}

impl Dashboard {
    pub fn new(backend: Arc<dyn Backend>, session: Option<Session>, options: DashboardOptions) -> Self {
        Self {
            backend,
            session: RwLock::new(session),
            state: Mutex::new(DashboardState {
                loading: true,
                ..DashboardState::default()
            }),
            latest: AtomicU64::new(0),
            options,
            clock: Arc::new(local_today),
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn options(&self) -> DashboardOptions {
        self.options
    }

    pub fn backend(&self) -> Arc<dyn Backend> {
        Arc::clone(&self.backend)
    }

    pub async fn session(&self) -> Option<Session> {
        self.session.read().await.clone()
    }

    pub async fn user_id(&self) -> Option<String> {
        self.session.read().await.as_ref().map(|session| session.user_id.clone())
    }

    pub async fn snapshot(&self) -> DashboardState {
        self.state.lock().await.clone()
    }

    pub fn today(&self) -> NaiveDate {
        (self.clock)()
    }

    pub async fn sign_in(&self, session: Session) {
        *self.session.write().await = Some(session);
        self.reset().await;
    }

    /// Drops the session and everything fetched for it.
    pub async fn sign_out(&self) {
        *self.session.write().await = None;
        self.reset().await;
    }

    async fn reset(&self) {
        let mut state = self.state.lock().await;
        self.begin_request();
        *state = DashboardState {
            loading: true,
            ..DashboardState::default()
        };
    }

    fn begin_request(&self) -> u64 {
        self.latest.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_latest(&self, seq: u64) -> bool {
        self.latest.load(Ordering::SeqCst) == seq
    }

    pub async fn fetch(&self, force_refresh: bool) -> FetchOutcome {
        let Some(session) = self.session().await else {
            return FetchOutcome::NoSession;
        };

        let seq = self.begin_request();
        if !force_refresh {
            self.state.lock().await.loading = true;
        }

        let outcome = self.load(&session, self.today(), seq).await;

        if !force_refresh {
            self.state.lock().await.loading = false;
        }
        outcome
    }

    async fn load(&self, session: &Session, today: NaiveDate, seq: u64) -> FetchOutcome {
        let stats = match self.backend.my_group_stats(session).await {
            Ok(Some(stats)) => stats,
            Ok(None) => {
                info!(user = %session.user_id, "user has no group");
                return self.commit_no_group(seq).await;
            }
            Err(err) => {
                warn!(error = %err, "group stats fetch failed");
                return self.commit_no_group(seq).await;
            }
        };
        let group = GroupSummary::from(stats);

        let (members, goals) = tokio::join!(
            self.backend.list_members(session, &group.id),
            self.backend.list_goals(session, &group.id, today),
        );
        let (members, goals) = match (members, goals) {
            (Ok(members), Ok(goals)) => (members, goals),
            (Err(err), _) | (_, Err(err)) => {
                warn!(group = %group.id, error = %err, "dashboard fetch failed, keeping previous state");
                return FetchOutcome::Failed;
            }
        };

        let members = normalize_members(members, goals);
        let status = derive_status_at(
            today,
            self.options.streak_rule,
            group.server_streak,
            group.last_streak_date,
            &members,
            &session.user_id,
        );

        let mut state = self.state.lock().await;
        if !self.is_latest(seq) {
            debug!(seq, "dropping superseded dashboard response");
            return FetchOutcome::Superseded;
        }
        state.needs_group = false;
        state.group = Some(group);
        state.streak = status.streak;
        state.is_waiting = status.is_waiting;
        state.members = members;
        FetchOutcome::Applied
    }

    async fn commit_no_group(&self, seq: u64) -> FetchOutcome {
        let mut state = self.state.lock().await;
        if !self.is_latest(seq) {
            return FetchOutcome::Superseded;
        }
        state.needs_group = true;
        FetchOutcome::NoGroup
    }

    /// Completes or un-completes one of the viewer's goals for today.
    pub async fn toggle_goal(&self, goal_id: &str) -> Result<ToggleOutcome, DashboardError> {
        let session = self.session().await.ok_or(DashboardError::NoSession)?;
        let today = self.today();

        let completing = {
            let mut state = self.state.lock().await;
            let goal = state
                .goal_mut(&session.user_id, goal_id)
                .ok_or(DashboardError::GoalNotFound)?;
            if goal.completed_today && self.options.toggle_mode == ToggleMode::Lock {
                return Ok(ToggleOutcome::Unchanged);
            }
            goal.completed_today = !goal.completed_today;
            let completing = goal.completed_today;
            self.begin_request();
            completing
        };

        let key = LogKey {
            goal_id: goal_id.to_string(),
            user_id: session.user_id.clone(),
            date: today,
        };
        let written = if completing {
            self.backend.insert_log(&session, &key).await
        } else {
            self.backend.delete_log(&session, &key).await
        };
        if let Err(err) = written {
            warn!(goal = %goal_id, error = %err, "log write failed");
        }

        self.fetch(true).await;
        Ok(if completing {
            ToggleOutcome::Completed
        } else {
            ToggleOutcome::Uncompleted
        })
    }

    /// Returns `Ok(None)` without touching the backend for blank titles or
    /// when there is no session or group yet.
    pub async fn add_goal(&self, title: &str) -> Result<Option<Goal>, DashboardError> {
        let title = title.trim();
        if title.is_empty() {
            return Ok(None);
        }
        let Some(session) = self.session().await else {
            return Ok(None);
        };
        let Some(group_id) = self.state.lock().await.group.as_ref().map(|group| group.id.clone()) else {
            return Ok(None);
        };

        let new_goal = NewGoal {
            title: title.to_string(),
            user_id: session.user_id.clone(),
            group_id,
        };
        let row = self.backend.insert_goal(&session, &new_goal).await.map_err(|err| {
            warn!(error = %err, "goal insert failed");
            DashboardError::from(err)
        })?;

        let goal = Goal {
            completed_today: false,
            ..Goal::from(row)
        };
        {
            let mut state = self.state.lock().await;
            if let Some(member) = state.member_mut(&session.user_id) {
                member.goals.push(goal.clone());
            }
            self.begin_request();
        }
        info!(goal = %goal.id, "goal added");
        self.fetch(true).await;
        Ok(Some(goal))
    }

    pub async fn delete_goal(&self, goal_id: &str) -> Result<(), DashboardError> {
        let session = self.session().await.ok_or(DashboardError::NoSession)?;

        let matched = self
            .backend
            .delete_goal(&session, goal_id, &session.user_id)
            .await
            .map_err(|err| {
                warn!(goal = %goal_id, error = %err, "goal delete failed");
                DashboardError::from(err)
            })?;
        if matched == 0 {
            warn!(goal = %goal_id, "goal delete matched no rows");
            return Err(DashboardError::Rejected(
                "Could not delete this habit. It may not be yours or was already removed.".to_string(),
            ));
        }

        {
            let mut state = self.state.lock().await;
            if let Some(member) = state.member_mut(&session.user_id) {
                member.goals.retain(|goal| goal.id != goal_id);
            }
            self.begin_request();
        }
        self.fetch(true).await;
        Ok(())
    }

    /// Returns `Ok(false)` for blank titles.
    pub async fn rename_goal(&self, goal_id: &str, title: &str) -> Result<bool, DashboardError> {
        let title = title.trim();
        if title.is_empty() {
            return Ok(false);
        }
        let session = self.session().await.ok_or(DashboardError::NoSession)?;

        let matched = self
            .backend
            .update_goal_title(&session, goal_id, &session.user_id, title)
            .await
            .map_err(|err| {
                warn!(goal = %goal_id, error = %err, "goal rename failed");
                DashboardError::from(err)
            })?;
        if matched == 0 {
            return Err(DashboardError::Rejected(
                "Could not rename this habit. It may not be yours or was already removed.".to_string(),
            ));
        }

        {
            let mut state = self.state.lock().await;
            if let Some(goal) = state.goal_mut(&session.user_id, goal_id) {
                goal.title = title.to_string();
            }
            self.begin_request();
        }
        self.fetch(true).await;
        Ok(true)
    }
}
