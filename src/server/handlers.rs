//! HTTP request handlers.
//!
//! Every session-scoped handler locks the session for the whole request, so
//! a slow model turn holds back later requests for that session only.

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::{Html, IntoResponse},
    Json,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use super::page::INDEX_HTML;
use super::state::AppState;
use crate::chat::{PdfSummary, TableSummary, TurnOutcome};
use crate::error::ChatError;
use crate::session::SessionSnapshot;

/// Name of the multipart field carrying the upload.
pub const UPLOAD_FIELD: &str = "file";

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub provider: String,
    pub candidate_models: Vec<String>,
    pub sessions: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreatedSession {
    pub session_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct MessageRequest {
    pub content: String,
}

/// A generated report, inlined into the turn response.
#[derive(Debug, Serialize)]
pub struct ReportPayload {
    pub file_name: String,
    pub mime_type: String,
    /// Standard base64 of the PDF bytes.
    pub data_base64: String,
}

#[derive(Debug, Serialize)]
pub struct TurnResponse {
    pub reply: String,
    pub model: String,
    pub request_count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<ReportPayload>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_error: Option<String>,
}

impl From<TurnOutcome> for TurnResponse {
    fn from(outcome: TurnOutcome) -> Self {
        Self {
            reply: outcome.reply,
            model: outcome.model,
            request_count: outcome.request_count,
            report: outcome.report.map(|r| ReportPayload {
                mime_type: r.mime_type().to_string(),
                data_base64: STANDARD.encode(&r.bytes),
                file_name: r.file_name,
            }),
            report_error: outcome.report_error,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UploadResponse<T: Serialize> {
    /// Status line for the sidebar, e.g. `PDF loaded (1234 characters)`.
    pub message: String,
    #[serde(flatten)]
    pub summary: T,
}

/// GET /
pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// GET /health
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let config = state.engine.config();
    Json(HealthResponse {
        status: "healthy".to_string(),
        provider: config.provider_name.clone(),
        candidate_models: config.candidate_models.clone(),
        sessions: state.sessions.len(),
    })
}

/// POST /api/sessions
pub async fn create_session(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let session_id = state.sessions.create();
    (StatusCode::CREATED, Json(CreatedSession { session_id }))
}

/// GET /api/sessions/{id}
pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionSnapshot>, ChatError> {
    let handle = state.session(id)?;
    let session = handle.lock().await;
    Ok(Json(SessionSnapshot::of(id, &session)))
}

/// DELETE /api/sessions/{id}
pub async fn delete_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ChatError> {
    if state.sessions.remove(&id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ChatError::SessionNotFound(id))
    }
}

/// POST /api/sessions/{id}/messages
pub async fn send_message(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(request): Json<MessageRequest>,
) -> Result<Json<TurnResponse>, ChatError> {
    let handle = state.session(id)?;
    let mut session = handle.lock().await;
    let outcome = state.engine.send_message(&mut session, &request.content).await?;
    Ok(Json(outcome.into()))
}

/// POST /api/sessions/{id}/pdf
pub async fn upload_pdf(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<Json<UploadResponse<PdfSummary>>, ChatError> {
    let handle = state.session(id)?;
    let (file_name, bytes) = read_upload(multipart).await?;

    let mut session = handle.lock().await;
    let summary = state.engine.ingest_pdf(&mut session, &file_name, bytes).await?;
    Ok(Json(UploadResponse {
        message: summary.status_line(),
        summary,
    }))
}

/// POST /api/sessions/{id}/data
pub async fn upload_data(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<Json<UploadResponse<TableSummary>>, ChatError> {
    let handle = state.session(id)?;
    let (file_name, bytes) = read_upload(multipart).await?;

    let mut session = handle.lock().await;
    let summary = state.engine.ingest_table(&mut session, &file_name, &bytes)?;
    Ok(Json(UploadResponse {
        message: summary.status_line(),
        summary,
    }))
}

/// POST /api/sessions/{id}/clear
pub async fn clear_chat(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionSnapshot>, ChatError> {
    let handle = state.session(id)?;
    let mut session = handle.lock().await;
    session.clear_chat();
    tracing::info!(session = %id, "Chat cleared");
    Ok(Json(SessionSnapshot::of(id, &session)))
}

/// DELETE /api/sessions/{id}/files
pub async fn remove_files(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionSnapshot>, ChatError> {
    let handle = state.session(id)?;
    let mut session = handle.lock().await;
    session.remove_files();
    tracing::info!(session = %id, "Files removed");
    Ok(Json(SessionSnapshot::of(id, &session)))
}

/// Pull the `file` part out of a multipart body.
async fn read_upload(mut multipart: Multipart) -> Result<(String, Vec<u8>), ChatError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ChatError::InvalidUpload(e.body_text()))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or("upload").to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ChatError::InvalidUpload(e.body_text()))?;
        tracing::debug!(file = %file_name, bytes = bytes.len(), "Upload received");
        return Ok((file_name, bytes.to_vec()));
    }
    Err(ChatError::InvalidUpload(format!(
        "multipart field '{UPLOAD_FIELD}' is missing"
    )))
}
