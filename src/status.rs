use crate::models::{Goal, GoalRow, Member, MemberRow};
use chrono::{Duration, Local, NaiveDate};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StreakRule {
    /// A streak not advanced today or yesterday is shown as broken.
    #[default]
    TodayOrYesterday,
    /// Show whatever the server stores.
    Raw,
}

impl StreakRule {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "today-or-yesterday" | "alive" => Some(Self::TodayOrYesterday),
            "raw" => Some(Self::Raw),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DerivedStatus {
    pub streak: u32,
    pub is_waiting: bool,
}

pub fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub fn is_streak_alive(last_streak_date: Option<NaiveDate>, today: NaiveDate) -> bool {
    match last_streak_date {
        Some(last) => last == today || last == today - Duration::days(1),
        None => false,
    }
}

pub fn effective_streak(
    rule: StreakRule,
    server_streak: u32,
    last_streak_date: Option<NaiveDate>,
    today: NaiveDate,
) -> u32 {
    match rule {
        StreakRule::Raw => server_streak,
        StreakRule::TodayOrYesterday if is_streak_alive(last_streak_date, today) => server_streak,
        StreakRule::TodayOrYesterday => 0,
    }
}

/// The viewer has done their part but the group streak has not moved today.
pub fn is_waiting(last_streak_date: Option<NaiveDate>, today: NaiveDate, viewer: Option<&Member>) -> bool {
    let not_updated_today = last_streak_date != Some(today);
    let contributed = viewer.is_some_and(|member| member.goals.iter().any(|goal| goal.completed_today));
    not_updated_today && contributed
}

pub fn derive_status_at(
    today: NaiveDate,
    rule: StreakRule,
    server_streak: u32,
    last_streak_date: Option<NaiveDate>,
    members: &[Member],
    user_id: &str,
) -> DerivedStatus {
    let viewer = members.iter().find(|member| member.user_id == user_id);
    DerivedStatus {
        streak: effective_streak(rule, server_streak, last_streak_date, today),
        is_waiting: is_waiting(last_streak_date, today, viewer),
    }
}

/// Each member keeps only their own goals, in fetch order.
pub fn normalize_members(rows: Vec<MemberRow>, goals: Vec<GoalRow>) -> Vec<Member> {
    let goals: Vec<Goal> = goals.into_iter().map(Goal::from).collect();
    rows.into_iter()
        .map(|row| {
            let full_name = row
                .profiles
                .and_then(|profile| profile.full_name)
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| "Unknown".to_string());
            let own = goals
                .iter()
                .filter(|goal| goal.user_id == row.user_id)
                .cloned()
                .collect();
            Member {
                user_id: row.user_id,
                full_name,
                goals: own,
            }
        })
        .collect()
}
