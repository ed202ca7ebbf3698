use std::path::PathBuf;
use std::sync::Arc;

use finetrack_db::Database;
use tracing::error;

use crate::error::ApiError;

pub type AppState = Arc<AppStateInner>;

/// Shared application state: constructed once in the server binary and
/// injected everywhere. The JWT secret lives here, not in ambient env
/// lookups.
pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
    pub upload_dir: PathBuf,
}

/// Run a storage closure off the async runtime. rusqlite calls block,
/// so every handler goes through here.
pub async fn with_db<T, F>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&Database) -> finetrack_db::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    let result = tokio::task::spawn_blocking(move || f(&state.db))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Dependency(format!("blocking task failed: {e}"))
        })?;
    result.map_err(ApiError::from)
}
