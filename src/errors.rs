use axum::http::StatusCode;
use thiserror::Error;

/// Failure talking to the managed backend.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("backend returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("unexpected response: {0}")]
    Decode(String),

    #[error("{0}")]
    Rejected(String),

    #[error("storage failed: {0}")]
    Storage(String),
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for BackendError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

/// Failure of a dashboard or onboarding action, shown to the user as an alert.
#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("not signed in")]
    NoSession,

    #[error("goal not found")]
    GoalNotFound,

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Rejected(String),

    #[error(transparent)]
    Backend(BackendError),
}

impl From<BackendError> for DashboardError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::Rejected(message) => Self::Rejected(message),
            BackendError::Status { status, message } if (400..500).contains(&status) => {
                Self::Rejected(message)
            }
            other => Self::Backend(other),
        }
    }
}

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl From<DashboardError> for AppError {
    fn from(err: DashboardError) -> Self {
        let status = match &err {
            DashboardError::NoSession => StatusCode::UNAUTHORIZED,
            DashboardError::GoalNotFound => StatusCode::NOT_FOUND,
            DashboardError::Validation(_) => StatusCode::BAD_REQUEST,
            DashboardError::Rejected(_) => StatusCode::CONFLICT,
            DashboardError::Backend(_) => StatusCode::BAD_GATEWAY,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        (self.status, self.message).into_response()
    }
}
