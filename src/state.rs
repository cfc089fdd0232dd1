use crate::dashboard::Dashboard;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct AppState {
    pub dashboard: Arc<Dashboard>,
    /// One-shot message shown on the next page render.
    pub alert: Arc<Mutex<Option<String>>>,
}

impl AppState {
    pub fn new(dashboard: Dashboard) -> Self {
        Self {
            dashboard: Arc::new(dashboard),
            alert: Arc::new(Mutex::new(None)),
        }
    }

    pub async fn set_alert(&self, message: impl Into<String>) {
        *self.alert.lock().await = Some(message.into());
    }

    pub async fn take_alert(&self) -> Option<String> {
        self.alert.lock().await.take()
    }
}
