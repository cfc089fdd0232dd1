use crate::dashboard::Dashboard;
use crate::errors::DashboardError;
use crate::models::{GroupRow, NewGroup, NewMembership};
use tracing::{info, warn};

/// Joins an existing group by invite code, then reloads the dashboard.
pub async fn join_group(dashboard: &Dashboard, code: &str) -> Result<String, DashboardError> {
    let code = code.trim();
    if code.is_empty() {
        return Err(DashboardError::Validation("Please enter a code".to_string()));
    }
    let session = dashboard.session().await.ok_or(DashboardError::NoSession)?;

    let result = dashboard.backend().join_group_via_code(&session, code).await?;
    if !result.success {
        let message = result.message.unwrap_or_else(|| "Invalid code".to_string());
        warn!(user = %session.user_id, %message, "join rejected");
        return Err(DashboardError::Rejected(message));
    }

    info!(user = %session.user_id, "joined group");
    dashboard.fetch(false).await;
    Ok(result
        .message
        .unwrap_or_else(|| "You have joined the squad.".to_string()))
}

/// Creates a group and adds the caller as its first member.
pub async fn create_group(dashboard: &Dashboard, name: &str) -> Result<GroupRow, DashboardError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(DashboardError::Validation("Name your group".to_string()));
    }
    let session = dashboard.session().await.ok_or(DashboardError::NoSession)?;
    let backend = dashboard.backend();

    let group = backend
        .insert_group(
            &session,
            &NewGroup {
                name: name.to_string(),
                creator_id: session.user_id.clone(),
            },
        )
        .await?;

    let membership = NewMembership {
        group_id: group.id.clone(),
        user_id: session.user_id.clone(),
    };
    if let Err(err) = backend.insert_membership(&session, &membership).await {
        warn!(group = %group.id, error = %err, "group created but membership failed");
        return Err(DashboardError::Rejected(
            "Group created but joining failed.".to_string(),
        ));
    }

    info!(group = %group.id, "group created");
    dashboard.fetch(false).await;
    Ok(group)
}
