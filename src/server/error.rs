//! HTTP mapping for [`ChatError`].

use crate::error::ChatError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// Error response body for every API endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable message, ready to show in the chat window.
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ChatError {
    /// Status code and machine-readable code for this error.
    pub fn status(&self) -> (StatusCode, &'static str) {
        match self {
            Self::MissingApiKey { .. } | Self::InvalidConfig(_) | Self::ProviderNotConfigured { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "CONFIGURATION_ERROR")
            }
            Self::NotAPdf { .. } => (StatusCode::UNPROCESSABLE_ENTITY, "NOT_A_PDF"),
            Self::CorruptPdf { .. } => (StatusCode::UNPROCESSABLE_ENTITY, "CORRUPT_PDF"),
            Self::TabularParse { .. } => (StatusCode::UNPROCESSABLE_ENTITY, "TABULAR_PARSE_ERROR"),
            Self::UnsupportedFormat { .. } => {
                (StatusCode::UNSUPPORTED_MEDIA_TYPE, "UNSUPPORTED_FORMAT")
            }
            Self::InvalidUpload(_) => (StatusCode::BAD_REQUEST, "INVALID_UPLOAD"),
            Self::ModelUnreachable { .. } => (StatusCode::BAD_GATEWAY, "MODEL_UNREACHABLE"),
            Self::QuotaExceeded { .. } => (StatusCode::TOO_MANY_REQUESTS, "QUOTA_EXCEEDED"),
            Self::ModelCall { .. } => (StatusCode::BAD_GATEWAY, "MODEL_ERROR"),
            Self::SessionNotFound(_) => (StatusCode::NOT_FOUND, "SESSION_NOT_FOUND"),
            Self::EmptyMessage => (StatusCode::BAD_REQUEST, "EMPTY_MESSAGE"),
            Self::ReportRender(_) => (StatusCode::INTERNAL_SERVER_ERROR, "REPORT_ERROR"),
            Self::Server(_) => (StatusCode::INTERNAL_SERVER_ERROR, "SERVER_ERROR"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for ChatError {
    fn into_response(self) -> Response {
        let (status, code) = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, code, "Request failed");
        } else {
            tracing::warn!(error = %self, code, "Request rejected");
        }

        let details = match &self {
            Self::MissingApiKey { .. } | Self::ProviderNotConfigured { .. } => {
                Some(self.to_string())
            }
            other => other.hint().map(str::to_string),
        };
        let body = ErrorResponse {
            error: self.user_message(),
            code: code.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}
