//! ConsultError to RFC 7807 problem details.

use crate::utils::error::ConsultError;
use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug)]
pub struct AppError(pub ConsultError);

impl From<ConsultError> for AppError {
    fn from(err: ConsultError) -> Self {
        Self(err)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self(ConsultError::InvalidRequestError {
            message: rejection.body_text(),
        })
    }
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match &self.0 {
            ConsultError::MissingFieldsError { .. }
            | ConsultError::ValidationError { .. }
            | ConsultError::QueryDeclinedError { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ConsultError::InvalidConfigValueError { .. }
            | ConsultError::InvalidRequestError { .. } => StatusCode::BAD_REQUEST,
            ConsultError::IntakeIncompleteError { .. } => StatusCode::CONFLICT,
            ConsultError::NotFoundError { .. } => StatusCode::NOT_FOUND,
            ConsultError::ProviderError { .. } | ConsultError::HttpError(_) => {
                StatusCode::BAD_GATEWAY
            }
            ConsultError::NoProviderError => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    #[serde(rename = "type")]
    problem_type: Option<String>,
    title: String,
    status: u16,
    detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    suggestion: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    fields: Option<Vec<String>>,
}

impl ErrorResponse {
    pub fn from_error(err: &AppError) -> Self {
        let status = err.status_code();
        let title = status
            .canonical_reason()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "Error".to_string());

        // internal failures never echo paths or parser output
        let detail = if status == StatusCode::INTERNAL_SERVER_ERROR {
            "An internal error occurred while processing the request.".to_string()
        } else if status.is_server_error() {
            err.0.user_friendly_message()
        } else {
            err.0.to_string()
        };
        let fields = match &err.0 {
            ConsultError::MissingFieldsError { fields } => Some(fields.clone()),
            ConsultError::ValidationError { field, .. } => Some(vec![field.clone()]),
            _ => None,
        };

        Self {
            problem_type: None,
            title,
            status: status.as_u16(),
            detail,
            suggestion: Some(err.0.recovery_suggestion()),
            fields,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(
                "❌ Request failed: {} (Category: {:?}, Severity: {:?})",
                self.0,
                self.0.category(),
                self.0.severity()
            );
        } else {
            tracing::debug!("Request rejected: {}", self.0);
        }
        let response = ErrorResponse::from_error(&self);
        (status, Json(response)).into_response()
    }
}
