pub mod app;
pub mod backend;
pub mod config;
pub mod dashboard;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod onboarding;
pub mod state;
pub mod status;
pub mod storage;
pub mod ui;

pub use app::router;
pub use backend::{Backend, LocalBackend, RestBackend};
pub use config::Config;
pub use dashboard::{Dashboard, DashboardOptions, DashboardState, FetchOutcome, ToggleMode, ToggleOutcome};
pub use state::AppState;
