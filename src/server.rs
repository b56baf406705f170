//! HTTP API over the file store

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tracing::{error, info};

use crate::config::EditorConfig;
use crate::error::StoreError;
use crate::history::HistoryEntry;
use crate::store::FileStore;

/// Shared server state injected into all handlers.
#[derive(Clone)]
pub struct AppState {
    store: Arc<FileStore>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FileResponse {
    pub content: String,
    pub filename: String,
}

#[derive(Debug, Deserialize)]
pub struct SaveRequest {
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveResponse {
    pub success: bool,
    pub message: String,
    pub commit_id: String,
    pub timestamp: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub history: Vec<HistoryEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RestoreResponse {
    pub success: bool,
    pub content: String,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FilesResponse {
    pub files: Vec<String>,
}

/// Error body `{"error": "..."}` with a status derived from the store error
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        let status = if err.is_validation() || matches!(err, StoreError::InvalidFilename(_)) {
            StatusCode::BAD_REQUEST
        } else if err.is_not_found() {
            // Includes unsupported extensions, on POST as well as GET
            StatusCode::NOT_FOUND
        } else {
            error!("store error: {}", err);
            StatusCode::INTERNAL_SERVER_ERROR
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(serde_json::json!({ "error": self.message }))).into_response()
    }
}

/// Build the API router
pub fn router(store: Arc<FileStore>, cors: bool) -> Router {
    let app = Router::new()
        .route("/", get(|| async { "edit-store ok" }))
        .route("/api/file/{filename}", get(get_file).post(save_file))
        .route("/api/history/{filename}", get(get_history))
        .route("/api/restore/{filename}/{id}", post(restore_version))
        .route("/api/files", get(list_files))
        .with_state(AppState { store });

    if cors {
        app.layer(CorsLayer::permissive())
    } else {
        app
    }
}

/// Open the store and serve the API until the process stops
pub async fn run(config: EditorConfig) -> anyhow::Result<()> {
    let store = Arc::new(FileStore::open(&config.store)?);
    info!(path = %store.root().display(), backend = ?config.store.backend, "store ready");

    let app = router(store, config.server.cors);
    let addr = config.server.bind_addr();
    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

/// Run a store operation on the blocking pool
async fn blocking<T, F>(state: &AppState, op: F) -> Result<T, ApiError>
where
    F: FnOnce(&FileStore) -> crate::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let store = state.store.clone();
    tokio::task::spawn_blocking(move || op(&store))
        .await
        .map_err(|e| ApiError::internal(e.to_string()))?
        .map_err(ApiError::from)
}

async fn get_file(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Json<FileResponse>, ApiError> {
    let name = filename.clone();
    let outcome = blocking(&state, move |store| store.read(&name)).await?;
    Ok(Json(FileResponse {
        content: outcome.content,
        filename,
    }))
}

async fn save_file(
    State(state): State<AppState>,
    Path(filename): Path<String>,
    Json(payload): Json<SaveRequest>,
) -> Result<Json<SaveResponse>, ApiError> {
    let entry = blocking(&state, move |store| store.write(&filename, &payload.content)).await?;
    Ok(Json(SaveResponse {
        success: true,
        message: "File saved and committed".to_string(),
        commit_id: entry.id,
        timestamp: entry.timestamp,
    }))
}

async fn get_history(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Json<HistoryResponse> {
    let history = blocking(&state, move |store| Ok(store.history_default(&filename)))
        .await
        .unwrap_or_default();
    Json(HistoryResponse { history })
}

async fn restore_version(
    State(state): State<AppState>,
    Path((filename, id)): Path<(String, String)>,
) -> Result<Json<RestoreResponse>, ApiError> {
    let restored = blocking(&state, move |store| store.restore(&filename, &id)).await?;
    Ok(Json(RestoreResponse {
        success: true,
        content: restored.content,
        message: restored.entry.message,
    }))
}

async fn list_files(State(state): State<AppState>) -> Json<FilesResponse> {
    let files = match blocking(&state, |store| store.list()).await {
        Ok(files) => files.into_iter().collect(),
        Err(e) => {
            error!("listing files failed: {}", e.message);
            Vec::new()
        }
    };
    Json(FilesResponse { files })
}
