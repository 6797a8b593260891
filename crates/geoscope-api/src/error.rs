//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  /// No usable caller identity on the request.
  #[error("unauthorized")]
  Unauthorized,

  #[error("forbidden: {0}")]
  Forbidden(String),

  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::Unauthorized => (
        StatusCode::UNAUTHORIZED,
        "Missing or invalid bearer identity".to_string(),
      ),
      ApiError::Forbidden(m) => (StatusCode::FORBIDDEN, m.clone()),
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Store(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}

impl From<geoscope_core::Error> for ApiError {
  fn from(e: geoscope_core::Error) -> Self {
    use geoscope_core::Error as E;
    match e {
      E::Validation(m) => ApiError::BadRequest(m),
      E::NotFound(_) => ApiError::NotFound("Not found".to_string()),
      E::Forbidden => {
        ApiError::Forbidden("Forbidden: Subscription required".to_string())
      }
      E::Store(inner) => ApiError::Store(inner),
    }
  }
}
