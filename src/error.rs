use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use log::error;
use serde_json::json;
use thiserror::Error;

/// Errors surfaced to API clients. Database and other internal failures are
/// logged at the point of conversion and reach the client only as a generic
/// per-operation message.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{}", .0.join(", "))]
    Validation(Vec<String>),
    #[error("{0}")]
    InvalidArgument(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    /// Log the underlying cause and keep only `public_msg` for the response.
    pub fn internal(public_msg: &str, err: impl std::fmt::Display) -> Self {
        error!("{}: {}", public_msg, err);
        ApiError::Internal(public_msg.to_string())
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            ApiError::Validation(errors) => HttpResponse::BadRequest().json(json!({
                "success": false,
                "error": errors.join(", "),
            })),
            ApiError::InvalidArgument(msg) => HttpResponse::BadRequest().json(json!({
                "success": false,
                "error": msg,
            })),
            ApiError::NotFound(msg) => HttpResponse::NotFound().json(json!({
                "success": false,
                "message": msg,
            })),
            ApiError::Internal(msg) => HttpResponse::InternalServerError().json(json!({
                "success": false,
                "error": msg,
            })),
        }
    }
}
