use axum::{
    extract::{Multipart, Path, State},
    http::{header, Method},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use crate::{
    AppState,
    error::AppError,
    models::{ChartSummary, CleaningDirective, ColumnSelection, ExportFormat, UploadedFile},
    services::sessions::{ExportTicket, FileView, UploadOutcome},
};
use tower_http::cors::{CorsLayer, Any};

pub fn routes() -> Router<Arc<AppState>> {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any)
        .expose_headers([header::CONTENT_DISPOSITION])
        .max_age(std::time::Duration::from_secs(3600));

    Router::new()
        .route("/files", post(upload_files))
        .route("/files/:id", get(show_file).delete(close_file))
        .route("/files/:id/cleaning", put(update_cleaning))
        .route("/files/:id/columns", put(update_columns))
        .route("/files/:id/chart", get(show_chart))
        .route("/files/:id/export", post(export_file))
        .route("/files/:id/download", get(download_file))
        .layer(cors)
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    files: Vec<UploadOutcome>,
}

#[derive(Debug, Deserialize)]
pub struct ColumnsRequest {
    #[serde(default)]
    columns: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct ExportRequest {
    format: ExportFormat,
}

async fn upload_files(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let mut files = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidInput(format!("Malformed upload: {}", e)))?
    {
        let Some(name) = field.file_name().map(str::to_string) else {
            continue;
        };
        let payload = field
            .bytes()
            .await
            .map_err(|e| AppError::InvalidInput(format!("Failed to read {}: {}", name, e)))?;
        files.push(UploadedFile::new(name, payload));
    }

    if files.is_empty() {
        return Err(AppError::InvalidInput("No file provided".to_string()));
    }

    tracing::info!("Received {} files", files.len());
    Ok(Json(UploadResponse {
        files: state.sessions.ingest_batch(files, state.config.preview_rows),
    }))
}

async fn show_file(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<FileView>, AppError> {
    let session = state.sessions.get(&id)?;
    let view = session.lock().view(&id, state.config.preview_rows)?;
    Ok(Json(view))
}

async fn update_cleaning(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(directive): Json<CleaningDirective>,
) -> Result<Json<FileView>, AppError> {
    let session = state.sessions.get(&id)?;
    let mut session = session.lock();
    tracing::info!("Session {}: cleaning set to {:?}", id, directive);
    session.directive = directive;
    Ok(Json(session.view(&id, state.config.preview_rows)?))
}

async fn update_columns(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(request): Json<ColumnsRequest>,
) -> Result<Json<FileView>, AppError> {
    let session = state.sessions.get(&id)?;
    let mut session = session.lock();

    let selection = match request.columns {
        Some(columns) => {
            let known = session.source.column_names();
            for unknown in columns.iter().filter(|name| !known.contains(*name)) {
                tracing::warn!("Session {}: ignoring unknown column {}", id, unknown);
            }
            ColumnSelection::only(columns)
        }
        None => ColumnSelection::All,
    };
    session.selection = selection;
    Ok(Json(session.view(&id, state.config.preview_rows)?))
}

async fn show_chart(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ChartSummary>, AppError> {
    let session = state.sessions.get(&id)?;
    let summary = session.lock().chart()?;
    Ok(Json(summary))
}

async fn export_file(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(request): Json<ExportRequest>,
) -> Result<Json<ExportTicket>, AppError> {
    let session = state.sessions.get(&id)?;
    let ticket = session.lock().export(request.format)?;
    Ok(Json(ticket))
}

async fn download_file(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let session = state.sessions.get(&id)?;
    let result = session
        .lock()
        .take_export()
        .ok_or_else(|| AppError::NotFound(format!("No pending export for {}", id)))?;

    let disposition = format!(
        "attachment; filename=\"{}\"",
        result.file_name.replace('"', "'")
    );
    Ok((
        [
            (header::CONTENT_TYPE, result.mime_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        result.payload,
    )
        .into_response())
}

async fn close_file(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.sessions.remove(&id)?;
    Ok(Json(serde_json::json!({ "closed": id })))
}
