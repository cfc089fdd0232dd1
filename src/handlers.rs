use crate::dashboard::{FetchOutcome, ToggleOutcome};
use crate::errors::{AppError, DashboardError};
use crate::models::{
    CreateGroupRequest, DashboardQuery, DashboardResponse, GroupRow, JoinQuery, JoinRequest,
    TitleRequest,
};
use crate::onboarding::{create_group, join_group};
use crate::state::AppState;
use crate::ui::{render_dashboard, render_join, DashboardView};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    Form, Json,
};
use serde_json::json;
use tracing::warn;

pub async fn index(State(state): State<AppState>, Query(query): Query<DashboardQuery>) -> Response {
    let dashboard = &state.dashboard;
    let Some(user_id) = dashboard.user_id().await else {
        return (StatusCode::UNAUTHORIZED, Html("<p>Not signed in.</p>".to_string())).into_response();
    };

    let mut snapshot = dashboard.snapshot().await;
    if snapshot.group.is_none() && !snapshot.needs_group {
        dashboard.fetch(false).await;
        snapshot = dashboard.snapshot().await;
    }
    if snapshot.needs_group {
        return Redirect::to("/join").into_response();
    }

    let alert = state.take_alert().await;
    Html(render_dashboard(&DashboardView {
        state: &snapshot,
        user_id: &user_id,
        selected: query.member.as_deref(),
        toggle_mode: dashboard.options().toggle_mode,
        alert: alert.as_deref(),
    }))
    .into_response()
}

pub async fn refresh(State(state): State<AppState>) -> Redirect {
    redirect_after_fetch(state.dashboard.fetch(true).await)
}

pub async fn goal_add(State(state): State<AppState>, Form(form): Form<TitleRequest>) -> Redirect {
    if let Err(err) = state.dashboard.add_goal(&form.title).await {
        state.set_alert(err.to_string()).await;
    }
    Redirect::to("/")
}

pub async fn goal_toggle(State(state): State<AppState>, Path(goal_id): Path<String>) -> Redirect {
    if let Err(err) = state.dashboard.toggle_goal(&goal_id).await {
        warn!(goal = %goal_id, error = %err, "toggle failed");
    }
    Redirect::to("/")
}

pub async fn goal_delete(State(state): State<AppState>, Path(goal_id): Path<String>) -> Redirect {
    if let Err(err) = state.dashboard.delete_goal(&goal_id).await {
        state.set_alert(err.to_string()).await;
    }
    Redirect::to("/")
}

pub async fn goal_rename(
    State(state): State<AppState>,
    Path(goal_id): Path<String>,
    Form(form): Form<TitleRequest>,
) -> Redirect {
    if let Err(err) = state.dashboard.rename_goal(&goal_id, &form.title).await {
        state.set_alert(err.to_string()).await;
    }
    Redirect::to("/")
}

pub async fn join_page(State(state): State<AppState>, Query(query): Query<JoinQuery>) -> Html<String> {
    let alert = state.take_alert().await;
    let create_mode = query.mode.as_deref() == Some("create");
    Html(render_join(create_mode, alert.as_deref()))
}

pub async fn join_submit(State(state): State<AppState>, Form(form): Form<JoinRequest>) -> Redirect {
    match join_group(&state.dashboard, &form.code).await {
        Ok(_) => Redirect::to("/"),
        Err(err) => {
            state.set_alert(err.to_string()).await;
            Redirect::to("/join")
        }
    }
}

pub async fn group_create(State(state): State<AppState>, Form(form): Form<CreateGroupRequest>) -> Redirect {
    match create_group(&state.dashboard, &form.name).await {
        Ok(_) => Redirect::to("/"),
        Err(err) => {
            state.set_alert(err.to_string()).await;
            Redirect::to("/join?mode=create")
        }
    }
}

fn redirect_after_fetch(outcome: FetchOutcome) -> Redirect {
    match outcome {
        FetchOutcome::NoGroup => Redirect::to("/join"),
        _ => Redirect::to("/"),
    }
}

pub async fn api_dashboard(State(state): State<AppState>) -> Result<Json<DashboardResponse>, AppError> {
    let dashboard = &state.dashboard;
    let user_id = dashboard.user_id().await.ok_or(DashboardError::NoSession)?;
    let snapshot = dashboard.snapshot().await;
    Ok(Json(DashboardResponse {
        user_id: Some(user_id),
        loading: snapshot.loading,
        needs_group: snapshot.needs_group,
        group_name: snapshot.group_name().to_string(),
        invite_code: snapshot.invite_code().to_string(),
        streak: snapshot.streak,
        is_waiting: snapshot.is_waiting,
        members: snapshot.members,
    }))
}

pub async fn api_refresh(State(state): State<AppState>) -> Result<Json<DashboardResponse>, AppError> {
    if state.dashboard.fetch(true).await == FetchOutcome::NoSession {
        return Err(DashboardError::NoSession.into());
    }
    api_dashboard(State(state)).await
}

pub async fn api_goal_add(
    State(state): State<AppState>,
    Json(payload): Json<TitleRequest>,
) -> Result<Response, AppError> {
    match state.dashboard.add_goal(&payload.title).await? {
        Some(goal) => Ok((StatusCode::CREATED, Json(goal)).into_response()),
        None => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}

pub async fn api_goal_toggle(
    State(state): State<AppState>,
    Path(goal_id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let outcome = state.dashboard.toggle_goal(&goal_id).await?;
    let completed = match outcome {
        ToggleOutcome::Completed => Some(true),
        ToggleOutcome::Uncompleted => Some(false),
        ToggleOutcome::Unchanged => None,
    };
    Ok(Json(json!({ "goal_id": goal_id, "changed": completed.is_some(), "completed": completed })))
}

pub async fn api_goal_rename(
    State(state): State<AppState>,
    Path(goal_id): Path<String>,
    Json(payload): Json<TitleRequest>,
) -> Result<StatusCode, AppError> {
    if !state.dashboard.rename_goal(&goal_id, &payload.title).await? {
        return Err(AppError::bad_request("title must not be blank"));
    }
    Ok(StatusCode::NO_CONTENT)
}

pub async fn api_goal_delete(
    State(state): State<AppState>,
    Path(goal_id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.dashboard.delete_goal(&goal_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn api_join(
    State(state): State<AppState>,
    Json(payload): Json<JoinRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let message = join_group(&state.dashboard, &payload.code).await?;
    Ok(Json(json!({ "success": true, "message": message })))
}

pub async fn api_group_create(
    State(state): State<AppState>,
    Json(payload): Json<CreateGroupRequest>,
) -> Result<(StatusCode, Json<GroupRow>), AppError> {
    let group = create_group(&state.dashboard, &payload.name).await?;
    Ok((StatusCode::CREATED, Json(group)))
}
