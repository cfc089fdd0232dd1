use habit_squad::backend::{Backend, LocalBackend, RestBackend};
use habit_squad::config::{BackendConfig, Config};
use habit_squad::{router, AppState, Dashboard, FetchOutcome};
use std::{net::SocketAddr, sync::Arc};
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let config = Config::from_env();

    let backend: Arc<dyn Backend> = match &config.backend {
        BackendConfig::Rest { url, api_key } => {
            info!("using hosted backend at {url}");
            Arc::new(RestBackend::new(url.clone(), api_key.clone()))
        }
        BackendConfig::Local { data_path } => {
            info!("using local backend at {}", data_path.display());
            let local = LocalBackend::open(data_path).await;
            if let (Some(session), Some(name)) = (&config.session, &config.display_name) {
                local.upsert_profile(&session.user_id, name).await?;
            }
            Arc::new(local)
        }
    };

    if config.session.is_none() {
        warn!("SQUAD_USER_ID is not set; running signed out");
    }

    let dashboard = Dashboard::new(backend, config.session.clone(), config.options);
    match dashboard.fetch(false).await {
        FetchOutcome::Applied => info!("dashboard loaded"),
        FetchOutcome::NoGroup => info!("no group yet; onboarding at /join"),
        outcome => warn!(?outcome, "initial dashboard load did not apply"),
    }

    let app = router(AppState::new(dashboard));
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));

    info!("listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
