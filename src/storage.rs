use crate::backend::BackendData;
use crate::errors::BackendError;
use std::path::Path;
use tokio::fs;
use tracing::error;

pub async fn load_data(path: &Path) -> BackendData {
    match fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice(&bytes) {
            Ok(data) => data,
            Err(err) => {
                error!("failed to parse data file: {err}");
                BackendData::default()
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => BackendData::default(),
        Err(err) => {
            error!("failed to read data file: {err}");
            BackendData::default()
        }
    }
}

pub async fn persist_data(path: &Path, data: &BackendData) -> Result<(), BackendError> {
    let payload = serde_json::to_vec_pretty(data)?;
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .map_err(|err| BackendError::Storage(err.to_string()))?;
    }
    fs::write(path, payload)
        .await
        .map_err(|err| BackendError::Storage(err.to_string()))?;
    Ok(())
}
