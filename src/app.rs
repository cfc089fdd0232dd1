use crate::handlers;
use crate::state::AppState;
use axum::{
    routing::{get, patch, post},
    Router,
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/refresh", post(handlers::refresh))
        .route("/goals", post(handlers::goal_add))
        .route("/goals/:id/toggle", post(handlers::goal_toggle))
        .route("/goals/:id/delete", post(handlers::goal_delete))
        .route("/goals/:id/rename", post(handlers::goal_rename))
        .route("/join", get(handlers::join_page).post(handlers::join_submit))
        .route("/groups", post(handlers::group_create))
        .route("/api/dashboard", get(handlers::api_dashboard))
        .route("/api/refresh", post(handlers::api_refresh))
        .route("/api/goals", post(handlers::api_goal_add))
        .route("/api/goals/:id/toggle", post(handlers::api_goal_toggle))
        .route(
            "/api/goals/:id",
            patch(handlers::api_goal_rename).delete(handlers::api_goal_delete),
        )
        .route("/api/join", post(handlers::api_join))
        .route("/api/groups", post(handlers::api_group_create))
        .with_state(state)
}
