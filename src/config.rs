use crate::dashboard::{DashboardOptions, ToggleMode};
use crate::models::Session;
use crate::status::StreakRule;
use std::{env, path::PathBuf};
use tracing::warn;

#[derive(Debug, Clone)]
pub enum BackendConfig {
    Rest { url: String, api_key: String },
    Local { data_path: PathBuf },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub backend: BackendConfig,
    pub session: Option<Session>,
    pub display_name: Option<String>,
    pub options: DashboardOptions,
}

impl Config {
    pub fn from_env() -> Self {
        let port = env::var("PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(8080);

        let backend = match non_empty("SQUAD_BACKEND_URL") {
            Some(url) => BackendConfig::Rest {
                url,
                api_key: non_empty("SQUAD_API_KEY").unwrap_or_default(),
            },
            None => BackendConfig::Local {
                data_path: resolve_data_path(),
            },
        };

        let session = non_empty("SQUAD_USER_ID").map(|user_id| {
            let session = Session::new(user_id);
            match non_empty("SQUAD_ACCESS_TOKEN") {
                Some(token) => session.with_token(token),
                None => session,
            }
        });

        let toggle_mode = non_empty("SQUAD_TOGGLE_MODE")
            .and_then(|value| {
                let parsed = ToggleMode::parse(&value);
                if parsed.is_none() {
                    warn!("ignoring unknown SQUAD_TOGGLE_MODE {value:?}");
                }
                parsed
            })
            .unwrap_or_default();
        let streak_rule = non_empty("SQUAD_STREAK_RULE")
            .and_then(|value| {
                let parsed = StreakRule::parse(&value);
                if parsed.is_none() {
                    warn!("ignoring unknown SQUAD_STREAK_RULE {value:?}");
                }
                parsed
            })
            .unwrap_or_default();

        Self {
            port,
            backend,
            session,
            display_name: non_empty("SQUAD_DISPLAY_NAME"),
            options: DashboardOptions {
                toggle_mode,
                streak_rule,
            },
        }
    }
}

pub fn resolve_data_path() -> PathBuf {
    if let Ok(path) = env::var("APP_DATA_PATH") {
        return PathBuf::from(path);
    }

    PathBuf::from("data/squad.json")
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
