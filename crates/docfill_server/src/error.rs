//! Error types for the HTTP surface.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use docfill_convert::ConvertError;
use docfill_core::CoreError;
use docfill_templates::TemplateError;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Result type alias for server startup.
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors that prevent the server from starting or running.
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Invalid listen address: {0}")]
    InvalidAddress(String),

    #[error("Invalid translations file: {0}")]
    Translations(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// JSON error body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,
}

/// A request failure mapped to an HTTP status.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorResponse,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorResponse {
                error: message.into(),
                field: None,
                expected: None,
            },
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(e: CoreError) -> Self {
        let message = e.to_string();
        match e {
            CoreError::MissingTemplate => Self::new(StatusCode::BAD_REQUEST, message),
            CoreError::Template(TemplateError::NotFound(_)) => {
                Self::new(StatusCode::NOT_FOUND, message)
            }
            CoreError::Template(TemplateError::FieldInvalid { field, expected }) => Self {
                status: StatusCode::UNPROCESSABLE_ENTITY,
                body: ErrorResponse {
                    error: message,
                    field: Some(field),
                    expected: Some(expected),
                },
            },
            CoreError::Convert(ConvertError::UnsupportedFormat(_)) => {
                Self::new(StatusCode::BAD_REQUEST, message)
            }
            _ => {
                error!("Request failed: {}", message);
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (CoreError::MissingTemplate, StatusCode::BAD_REQUEST),
            (
                CoreError::Template(TemplateError::NotFound("x.docx".into())),
                StatusCode::NOT_FOUND,
            ),
            (
                CoreError::Template(TemplateError::FieldInvalid {
                    field: "due".into(),
                    expected: "date".into(),
                }),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                CoreError::Template(TemplateError::TemplateCorrupt {
                    template: "x.docx".into(),
                    reason: "bad zip".into(),
                }),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                CoreError::Convert(ConvertError::UnsupportedFormat("html".into())),
                StatusCode::BAD_REQUEST,
            ),
            (
                CoreError::Convert(ConvertError::ConverterNotFound("none".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (error, status) in cases {
            assert_eq!(ApiError::from(error).status, status);
        }
    }

    #[test]
    fn test_field_invalid_body() {
        let api = ApiError::from(CoreError::Template(TemplateError::FieldInvalid {
            field: "due".into(),
            expected: "date".into(),
        }));
        let json = serde_json::to_value(&api.body).unwrap();
        assert_eq!(json["field"], "due");
        assert_eq!(json["expected"], "date");
    }
}
