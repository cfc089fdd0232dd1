use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use habit_squad::backend::{Backend, BackendResult};
use habit_squad::errors::{BackendError, DashboardError};
use habit_squad::models::{
    GoalRow, GroupRow, GroupStats, JoinResult, LogKey, LogRef, MemberRow, NewGoal, NewGroup,
    NewMembership, ProfileRef, Session,
};
use habit_squad::status::StreakRule;
use habit_squad::{Dashboard, DashboardOptions, FetchOutcome, ToggleMode, ToggleOutcome};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, Notify};

const ME: &str = "me";
const FRIEND: &str = "friend";

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 5, 14).unwrap()
}

struct Gate {
    entered: Arc<Notify>,
    release: Arc<Notify>,
}

#[derive(Default)]
struct FakeBackend {
    stats: Mutex<Option<GroupStats>>,
    members: Mutex<Vec<MemberRow>>,
    goals: Mutex<Vec<GoalRow>>,
    logs: Mutex<Vec<LogKey>>,
    calls: AtomicUsize,
    fail_members: AtomicBool,
    fail_writes: AtomicBool,
    fail_logs: AtomicBool,
    stats_gate: Mutex<Option<Gate>>,
}

impl FakeBackend {
    fn with_group(streak: u32, last_streak_date: Option<NaiveDate>) -> Self {
        let backend = FakeBackend::default();
        *backend.stats.try_lock().unwrap() = Some(GroupStats {
            group_id: "grp".to_string(),
            name: Some("Swole Mates".to_string()),
            current_streak: Some(streak),
            invite_code: Some("A8X-992".to_string()),
            last_streak_date,
        });
        *backend.members.try_lock().unwrap() = vec![
            MemberRow {
                user_id: ME.to_string(),
                profiles: Some(ProfileRef {
                    full_name: Some("Me Myself".to_string()),
                }),
            },
            MemberRow {
                user_id: FRIEND.to_string(),
                profiles: Some(ProfileRef {
                    full_name: Some("Friendly Face".to_string()),
                }),
            },
        ];
        backend
    }

    async fn add_goal_row(&self, id: &str, user_id: &str) {
        self.goals.lock().await.push(GoalRow {
            id: id.to_string(),
            title: format!("Habit {id}"),
            user_id: user_id.to_string(),
            group_id: "grp".to_string(),
            logs: Vec::new(),
        });
    }

    async fn has_log(&self, goal_id: &str, date: NaiveDate) -> bool {
        self.logs
            .lock()
            .await
            .iter()
            .any(|log| log.goal_id == goal_id && log.user_id == ME && log.date == date)
    }

    /// Parks the next `my_group_stats` call until `release` is notified.
    async fn hold_next_stats(&self) -> (Arc<Notify>, Arc<Notify>) {
        let entered = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        *self.stats_gate.lock().await = Some(Gate {
            entered: entered.clone(),
            release: release.clone(),
        });
        (entered, release)
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn touch(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }

    fn check_writes(&self) -> BackendResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(BackendError::Rejected("permission denied".to_string()));
        }
        Ok(())
    }

    fn check_log_writes(&self) -> BackendResult<()> {
        if self.fail_logs.load(Ordering::SeqCst) {
            return Err(BackendError::Transport("connection reset".to_string()));
        }
        self.check_writes()
    }
}

#[async_trait]
impl Backend for FakeBackend {
    async fn my_group_stats(&self, _session: &Session) -> BackendResult<Option<GroupStats>> {
        self.touch();
        let stats = self.stats.lock().await.clone();
        let gate = self.stats_gate.lock().await.take();
        if let Some(gate) = gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }
        Ok(stats)
    }

    async fn list_members(&self, _session: &Session, _group_id: &str) -> BackendResult<Vec<MemberRow>> {
        self.touch();
        if self.fail_members.load(Ordering::SeqCst) {
            return Err(BackendError::Transport("connection reset".to_string()));
        }
        Ok(self.members.lock().await.clone())
    }

    async fn list_goals(
        &self,
        _session: &Session,
        group_id: &str,
        date: NaiveDate,
    ) -> BackendResult<Vec<GoalRow>> {
        self.touch();
        let logs = self.logs.lock().await.clone();
        Ok(self
            .goals
            .lock()
            .await
            .iter()
            .filter(|goal| goal.group_id == group_id)
            .map(|goal| GoalRow {
                logs: logs
                    .iter()
                    .filter(|log| log.goal_id == goal.id && log.date == date)
                    .map(|log| LogRef {
                        id: format!("{}-{}", log.goal_id, log.date),
                    })
                    .collect(),
                ..goal.clone()
            })
            .collect())
    }

    async fn insert_log(&self, _session: &Session, key: &LogKey) -> BackendResult<()> {
        self.touch();
        self.check_log_writes()?;
        self.logs.lock().await.push(key.clone());
        Ok(())
    }

    async fn delete_log(&self, _session: &Session, key: &LogKey) -> BackendResult<()> {
        self.touch();
        self.check_log_writes()?;
        self.logs.lock().await.retain(|log| log != key);
        Ok(())
    }

    async fn insert_goal(&self, _session: &Session, goal: &NewGoal) -> BackendResult<GoalRow> {
        self.touch();
        self.check_writes()?;
        let mut goals = self.goals.lock().await;
        let row = GoalRow {
            id: format!("goal-{}", goals.len() + 1),
            title: goal.title.clone(),
            user_id: goal.user_id.clone(),
            group_id: goal.group_id.clone(),
            logs: Vec::new(),
        };
        goals.push(row.clone());
        Ok(row)
    }

    async fn delete_goal(&self, _session: &Session, goal_id: &str, user_id: &str) -> BackendResult<usize> {
        self.touch();
        let mut goals = self.goals.lock().await;
        let before = goals.len();
        goals.retain(|goal| !(goal.id == goal_id && goal.user_id == user_id));
        Ok(before - goals.len())
    }

    async fn update_goal_title(
        &self,
        _session: &Session,
        goal_id: &str,
        user_id: &str,
        title: &str,
    ) -> BackendResult<usize> {
        self.touch();
        let mut matched = 0;
        for goal in self
            .goals
            .lock()
            .await
            .iter_mut()
            .filter(|goal| goal.id == goal_id && goal.user_id == user_id)
        {
            goal.title = title.to_string();
            matched += 1;
        }
        Ok(matched)
    }

    async fn join_group_via_code(&self, _session: &Session, _code: &str) -> BackendResult<JoinResult> {
        self.touch();
        Ok(JoinResult {
            success: false,
            message: None,
        })
    }

    async fn insert_group(&self, _session: &Session, _group: &NewGroup) -> BackendResult<GroupRow> {
        self.touch();
        Err(BackendError::Rejected("not supported".to_string()))
    }

    async fn insert_membership(&self, _session: &Session, _membership: &NewMembership) -> BackendResult<()> {
        self.touch();
        Err(BackendError::Rejected("not supported".to_string()))
    }
}

fn dashboard(backend: Arc<FakeBackend>, options: DashboardOptions) -> Dashboard {
    Dashboard::new(backend, Some(Session::new(ME)), options).with_clock(Arc::new(today))
}

fn my_goal(state: &habit_squad::DashboardState, goal_id: &str) -> Option<habit_squad::models::Goal> {
    state
        .member(ME)
        .and_then(|member| member.goals.iter().find(|goal| goal.id == goal_id))
        .cloned()
}

/// The viewer's goals on screen are exactly the backend's rows, with
/// completion matching today's logs.
async fn assert_matches_backend(dashboard: &Dashboard, backend: &FakeBackend) {
    let state = dashboard.snapshot().await;
    let shown = &state.member(ME).unwrap().goals;
    let rows: Vec<GoalRow> = backend
        .goals
        .lock()
        .await
        .iter()
        .filter(|goal| goal.user_id == ME)
        .cloned()
        .collect();

    assert_eq!(shown.len(), rows.len());
    for (goal, row) in shown.iter().zip(&rows) {
        assert_eq!(goal.id, row.id);
        assert_eq!(goal.title, row.title);
        assert_eq!(goal.completed_today, backend.has_log(&row.id, today()).await, "goal {}", row.id);
    }
}

#[tokio::test]
async fn fetch_normalizes_members_and_goals() {
    let backend = Arc::new(FakeBackend::with_group(3, Some(today())));
    backend.add_goal_row("g1", ME).await;
    backend.add_goal_row("g2", FRIEND).await;
    let dashboard = dashboard(backend.clone(), DashboardOptions::default());

    assert_eq!(dashboard.fetch(false).await, FetchOutcome::Applied);
    let state = dashboard.snapshot().await;
    assert!(!state.loading);
    assert_eq!(state.group_name(), "Swole Mates");
    assert_eq!(state.invite_code(), "A8X-992");
    assert_eq!(state.streak, 3);
    assert_eq!(state.members.len(), 2);
    assert_eq!(state.member(ME).unwrap().goals.len(), 1);
    assert_eq!(state.member(FRIEND).unwrap().goals[0].id, "g2");
}

#[tokio::test]
async fn toggle_flip_tracks_log_presence() {
    let backend = Arc::new(FakeBackend::with_group(0, None));
    backend.add_goal_row("g1", ME).await;
    let dashboard = dashboard(backend.clone(), DashboardOptions::default());
    dashboard.fetch(false).await;

    let outcome = dashboard.toggle_goal("g1").await.unwrap();
    assert_eq!(outcome, ToggleOutcome::Completed);
    assert!(backend.has_log("g1", today()).await);
    assert!(my_goal(&dashboard.snapshot().await, "g1").unwrap().completed_today);

    let outcome = dashboard.toggle_goal("g1").await.unwrap();
    assert_eq!(outcome, ToggleOutcome::Uncompleted);
    assert!(!backend.has_log("g1", today()).await);
    assert!(!my_goal(&dashboard.snapshot().await, "g1").unwrap().completed_today);
}

#[tokio::test]
async fn toggle_lock_keeps_completed_goals() {
    let backend = Arc::new(FakeBackend::with_group(0, None));
    backend.add_goal_row("g1", ME).await;
    let options = DashboardOptions {
        toggle_mode: ToggleMode::Lock,
        ..DashboardOptions::default()
    };
    let dashboard = dashboard(backend.clone(), options);
    dashboard.fetch(false).await;

    assert_eq!(dashboard.toggle_goal("g1").await.unwrap(), ToggleOutcome::Completed);
    let calls = backend.calls();

    assert_eq!(dashboard.toggle_goal("g1").await.unwrap(), ToggleOutcome::Unchanged);
    assert_eq!(backend.calls(), calls);
    assert!(backend.has_log("g1", today()).await);
    assert!(my_goal(&dashboard.snapshot().await, "g1").unwrap().completed_today);
}

#[tokio::test]
async fn failed_log_write_is_reverted_by_reconcile() {
    let backend = Arc::new(FakeBackend::with_group(0, None));
    backend.add_goal_row("g1", ME).await;
    let dashboard = dashboard(backend.clone(), DashboardOptions::default());
    dashboard.fetch(false).await;

    backend.fail_writes.store(true, Ordering::SeqCst);
    dashboard.toggle_goal("g1").await.unwrap();
    assert!(!my_goal(&dashboard.snapshot().await, "g1").unwrap().completed_today);
}

#[tokio::test]
async fn toggle_rejects_goals_of_other_members() {
    let backend = Arc::new(FakeBackend::with_group(0, None));
    backend.add_goal_row("g2", FRIEND).await;
    let dashboard = dashboard(backend.clone(), DashboardOptions::default());
    dashboard.fetch(false).await;

    let result = dashboard.toggle_goal("g2").await;
    assert!(matches!(result, Err(DashboardError::GoalNotFound)));
}

#[tokio::test]
async fn broken_streak_while_waiting_on_others() {
    let backend = Arc::new(FakeBackend::with_group(5, Some(today() - Duration::days(2))));
    backend.add_goal_row("g1", ME).await;
    backend.logs.lock().await.push(LogKey {
        goal_id: "g1".to_string(),
        user_id: ME.to_string(),
        date: today(),
    });
    let dashboard = dashboard(backend.clone(), DashboardOptions::default());

    dashboard.fetch(false).await;
    let state = dashboard.snapshot().await;
    assert_eq!(state.streak, 0);
    assert!(state.is_waiting);
}

#[tokio::test]
async fn raw_rule_shows_server_streak() {
    let backend = Arc::new(FakeBackend::with_group(5, Some(today() - Duration::days(2))));
    let options = DashboardOptions {
        streak_rule: StreakRule::Raw,
        ..DashboardOptions::default()
    };
    let dashboard = dashboard(backend, options);

    dashboard.fetch(false).await;
    let state = dashboard.snapshot().await;
    assert_eq!(state.streak, 5);
    assert!(!state.is_waiting);
}

#[tokio::test]
async fn streak_advanced_today_is_not_waiting() {
    let backend = Arc::new(FakeBackend::with_group(4, Some(today())));
    backend.add_goal_row("g1", ME).await;
    let dashboard = dashboard(backend.clone(), DashboardOptions::default());
    dashboard.fetch(false).await;

    dashboard.toggle_goal("g1").await.unwrap();
    let state = dashboard.snapshot().await;
    assert_eq!(state.streak, 4);
    assert!(!state.is_waiting);
}

#[tokio::test]
async fn blank_titles_make_no_calls() {
    let backend = Arc::new(FakeBackend::with_group(0, None));
    let dashboard = dashboard(backend.clone(), DashboardOptions::default());
    dashboard.fetch(false).await;
    let before = dashboard.snapshot().await;
    let calls = backend.calls();

    assert_eq!(dashboard.add_goal("").await.unwrap(), None);
    assert_eq!(dashboard.add_goal("   ").await.unwrap(), None);
    assert_eq!(backend.calls(), calls);
    assert_eq!(dashboard.snapshot().await, before);
}

#[tokio::test]
async fn add_goal_appends_incomplete_goal() {
    let backend = Arc::new(FakeBackend::with_group(0, None));
    let dashboard = dashboard(backend.clone(), DashboardOptions::default());
    dashboard.fetch(false).await;
    assert!(dashboard.snapshot().await.member(ME).unwrap().goals.is_empty());

    let goal = dashboard.add_goal("  Drink water ").await.unwrap().unwrap();
    assert_eq!(goal.title, "Drink water");

    let state = dashboard.snapshot().await;
    let goals = &state.member(ME).unwrap().goals;
    assert_eq!(goals.len(), 1);
    assert_eq!(goals[0].title, "Drink water");
    assert!(!goals[0].completed_today);
}

#[tokio::test]
async fn add_goal_failure_leaves_state() {
    let backend = Arc::new(FakeBackend::with_group(0, None));
    let dashboard = dashboard(backend.clone(), DashboardOptions::default());
    dashboard.fetch(false).await;
    let before = dashboard.snapshot().await;

    backend.fail_writes.store(true, Ordering::SeqCst);
    let result = dashboard.add_goal("Meditate").await;
    assert!(matches!(result, Err(DashboardError::Rejected(_))));
    assert_eq!(dashboard.snapshot().await, before);
}

#[tokio::test]
async fn add_goal_without_group_is_a_no_op() {
    let backend = Arc::new(FakeBackend::default());
    let dashboard = dashboard(backend.clone(), DashboardOptions::default());

    assert_eq!(dashboard.add_goal("Read").await.unwrap(), None);
    assert_eq!(backend.calls(), 0);
}

#[tokio::test]
async fn delete_of_foreign_goal_fails_visibly() {
    let backend = Arc::new(FakeBackend::with_group(0, None));
    backend.add_goal_row("g2", FRIEND).await;
    let dashboard = dashboard(backend.clone(), DashboardOptions::default());
    dashboard.fetch(false).await;

    let result = dashboard.delete_goal("g2").await;
    assert!(matches!(result, Err(DashboardError::Rejected(_))));
    let state = dashboard.snapshot().await;
    assert_eq!(state.member(FRIEND).unwrap().goals.len(), 1);
}

#[tokio::test]
async fn delete_own_goal_removes_it() {
    let backend = Arc::new(FakeBackend::with_group(0, None));
    backend.add_goal_row("g1", ME).await;
    backend.add_goal_row("g3", ME).await;
    let dashboard = dashboard(backend.clone(), DashboardOptions::default());
    dashboard.fetch(false).await;

    dashboard.delete_goal("g1").await.unwrap();
    let state = dashboard.snapshot().await;
    let ids: Vec<_> = state.member(ME).unwrap().goals.iter().map(|goal| goal.id.as_str()).collect();
    assert_eq!(ids, vec!["g3"]);
}

#[tokio::test]
async fn rename_goal_patches_title() {
    let backend = Arc::new(FakeBackend::with_group(0, None));
    backend.add_goal_row("g1", ME).await;
    backend.add_goal_row("g2", FRIEND).await;
    let dashboard = dashboard(backend.clone(), DashboardOptions::default());
    dashboard.fetch(false).await;

    assert!(!dashboard.rename_goal("g1", "  ").await.unwrap());
    assert!(dashboard.rename_goal("g1", "Walk 10k steps").await.unwrap());
    assert_eq!(my_goal(&dashboard.snapshot().await, "g1").unwrap().title, "Walk 10k steps");

    let result = dashboard.rename_goal("g2", "Mine now").await;
    assert!(matches!(result, Err(DashboardError::Rejected(_))));
}

#[tokio::test]
async fn sub_fetch_failure_keeps_previous_state() {
    let backend = Arc::new(FakeBackend::with_group(2, Some(today())));
    backend.add_goal_row("g1", ME).await;
    let dashboard = dashboard(backend.clone(), DashboardOptions::default());
    dashboard.fetch(false).await;
    let before = dashboard.snapshot().await;

    backend.stats.lock().await.as_mut().unwrap().name = Some("Renamed".to_string());
    backend.fail_members.store(true, Ordering::SeqCst);

    assert_eq!(dashboard.fetch(true).await, FetchOutcome::Failed);
    assert_eq!(dashboard.snapshot().await, before);
}

#[tokio::test]
async fn missing_group_routes_to_onboarding() {
    let backend = Arc::new(FakeBackend::default());
    let dashboard = dashboard(backend, DashboardOptions::default());

    assert_eq!(dashboard.fetch(false).await, FetchOutcome::NoGroup);
    let state = dashboard.snapshot().await;
    assert!(state.needs_group);
    assert!(!state.loading);
    assert_eq!(state.group_name(), "Loading...");
}

#[tokio::test]
async fn signed_out_dashboard_does_nothing() {
    let backend = Arc::new(FakeBackend::with_group(0, None));
    let dashboard = Dashboard::new(backend.clone(), None, DashboardOptions::default());

    assert_eq!(dashboard.fetch(false).await, FetchOutcome::NoSession);
    assert!(matches!(dashboard.toggle_goal("g1").await, Err(DashboardError::NoSession)));
    assert_eq!(backend.calls(), 0);
}

#[tokio::test]
async fn sign_out_discards_view_state() {
    let backend = Arc::new(FakeBackend::with_group(1, Some(today())));
    let dashboard = dashboard(backend, DashboardOptions::default());
    dashboard.fetch(false).await;
    assert!(dashboard.snapshot().await.group.is_some());

    dashboard.sign_out().await;
    let state = dashboard.snapshot().await;
    assert!(state.group.is_none());
    assert!(state.members.is_empty());
    assert_eq!(dashboard.user_id().await, None);
}

#[tokio::test]
async fn late_response_does_not_overwrite_newer_state() {
    let backend = Arc::new(FakeBackend::with_group(1, Some(today())));
    backend.stats.lock().await.as_mut().unwrap().name = Some("Older".to_string());
    let (entered, release) = backend.hold_next_stats().await;
    let dashboard = Arc::new(dashboard(backend.clone(), DashboardOptions::default()));

    let slow = {
        let dashboard = dashboard.clone();
        tokio::spawn(async move { dashboard.fetch(true).await })
    };
    entered.notified().await;

    backend.stats.lock().await.as_mut().unwrap().name = Some("Newer".to_string());
    assert_eq!(dashboard.fetch(true).await, FetchOutcome::Applied);

    release.notify_one();
    assert_eq!(slow.await.unwrap(), FetchOutcome::Superseded);
    assert_eq!(dashboard.snapshot().await.group_name(), "Newer");
}

#[tokio::test]
async fn toggle_supersedes_fetch_already_in_flight() {
    let backend = Arc::new(FakeBackend::with_group(0, None));
    backend.add_goal_row("g1", ME).await;
    let dashboard = Arc::new(dashboard(backend.clone(), DashboardOptions::default()));
    dashboard.fetch(false).await;

    let (entered, release) = backend.hold_next_stats().await;
    let stale = {
        let dashboard = dashboard.clone();
        tokio::spawn(async move { dashboard.fetch(true).await })
    };
    entered.notified().await;

    assert_eq!(dashboard.toggle_goal("g1").await.unwrap(), ToggleOutcome::Completed);
    release.notify_one();
    assert_eq!(stale.await.unwrap(), FetchOutcome::Superseded);

    assert!(my_goal(&dashboard.snapshot().await, "g1").unwrap().completed_today);
    assert_matches_backend(&dashboard, &backend).await;
}

#[tokio::test]
async fn add_during_toggle_reconcile_still_settles_on_backend_state() {
    let backend = Arc::new(FakeBackend::with_group(2, Some(today() - Duration::days(1))));
    backend.add_goal_row("g1", ME).await;
    let dashboard = Arc::new(dashboard(backend.clone(), DashboardOptions::default()));
    dashboard.fetch(false).await;
    assert!(!dashboard.snapshot().await.is_waiting);

    let (entered, release) = backend.hold_next_stats().await;
    let toggle = {
        let dashboard = dashboard.clone();
        tokio::spawn(async move { dashboard.toggle_goal("g1").await })
    };
    entered.notified().await;

    let added = dashboard.add_goal("Drink water").await.unwrap().unwrap();
    release.notify_one();
    assert_eq!(toggle.await.unwrap().unwrap(), ToggleOutcome::Completed);

    let state = dashboard.snapshot().await;
    assert!(state.is_waiting);
    assert_eq!(state.streak, 2);
    assert!(my_goal(&state, "g1").unwrap().completed_today);
    assert!(!my_goal(&state, &added.id).unwrap().completed_today);
    assert_matches_backend(&dashboard, &backend).await;
}

#[tokio::test]
async fn add_during_failed_toggle_reconcile_reverts_completion() {
    let backend = Arc::new(FakeBackend::with_group(2, Some(today() - Duration::days(1))));
    backend.add_goal_row("g1", ME).await;
    let dashboard = Arc::new(dashboard(backend.clone(), DashboardOptions::default()));
    dashboard.fetch(false).await;

    backend.fail_logs.store(true, Ordering::SeqCst);
    let (entered, release) = backend.hold_next_stats().await;
    let toggle = {
        let dashboard = dashboard.clone();
        tokio::spawn(async move { dashboard.toggle_goal("g1").await })
    };
    entered.notified().await;

    dashboard.add_goal("Drink water").await.unwrap().unwrap();
    release.notify_one();
    toggle.await.unwrap().unwrap();

    let state = dashboard.snapshot().await;
    assert!(!backend.has_log("g1", today()).await);
    assert!(!my_goal(&state, "g1").unwrap().completed_today);
    assert!(!state.is_waiting);
    assert_matches_backend(&dashboard, &backend).await;
}

#[tokio::test]
async fn rename_during_toggle_reconcile_still_settles_on_backend_state() {
    let backend = Arc::new(FakeBackend::with_group(2, Some(today() - Duration::days(1))));
    backend.add_goal_row("g1", ME).await;
    let dashboard = Arc::new(dashboard(backend.clone(), DashboardOptions::default()));
    dashboard.fetch(false).await;

    let (entered, release) = backend.hold_next_stats().await;
    let toggle = {
        let dashboard = dashboard.clone();
        tokio::spawn(async move { dashboard.toggle_goal("g1").await })
    };
    entered.notified().await;

    assert!(dashboard.rename_goal("g1", "Walk 10k steps").await.unwrap());
    release.notify_one();
    toggle.await.unwrap().unwrap();

    let state = dashboard.snapshot().await;
    let goal = my_goal(&state, "g1").unwrap();
    assert_eq!(goal.title, "Walk 10k steps");
    assert!(goal.completed_today);
    assert!(state.is_waiting);
    assert_matches_backend(&dashboard, &backend).await;
}

#[tokio::test]
async fn add_during_delete_reconcile_still_settles_on_backend_state() {
    let backend = Arc::new(FakeBackend::with_group(2, Some(today() - Duration::days(1))));
    backend.add_goal_row("g1", ME).await;
    backend.add_goal_row("g3", ME).await;
    backend.logs.lock().await.push(LogKey {
        goal_id: "g1".to_string(),
        user_id: ME.to_string(),
        date: today(),
    });
    let dashboard = Arc::new(dashboard(backend.clone(), DashboardOptions::default()));
    dashboard.fetch(false).await;
    assert!(dashboard.snapshot().await.is_waiting);

    let (entered, release) = backend.hold_next_stats().await;
    let delete = {
        let dashboard = dashboard.clone();
        tokio::spawn(async move { dashboard.delete_goal("g1").await })
    };
    entered.notified().await;

    let added = dashboard.add_goal("Stretch").await.unwrap().unwrap();
    release.notify_one();
    delete.await.unwrap().unwrap();

    let state = dashboard.snapshot().await;
    let ids: Vec<_> = state.member(ME).unwrap().goals.iter().map(|goal| goal.id.clone()).collect();
    assert_eq!(ids, vec!["g3".to_string(), added.id]);
    assert!(!state.is_waiting);
    assert_matches_backend(&dashboard, &backend).await;
}
